use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::OUTBOUND_QUEUE_LIMIT;
use crate::game::engine::Command;
use crate::protocol::messages::ClientMessage;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone)]
pub struct WsState {
    pub commands: mpsc::UnboundedSender<Command>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Transport adapter: parse, validate, enqueue. All world mutation
/// happens on the simulation task.
async fn handle_socket(socket: WebSocket, state: WsState) {
    let conn_id = NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed);
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_LIMIT);

    if state.commands.send(Command::Connect { conn_id, tx }).is_err() {
        return; // simulation is gone, nothing to join
    }
    debug!(conn_id, "client connected");

    // Task: forward queued frames to the socket
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    // Task: receive input from the client
    let commands = state.commands.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(parsed) => {
                        if let Some(cmd) = intake(conn_id, parsed) {
                            if commands.send(cmd).is_err() {
                                break;
                            }
                        }
                    }
                    Err(err) => debug!(conn_id, %err, "dropping malformed message"),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Either direction ending tears the connection down
    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    debug!(conn_id, "client disconnected");
    let _ = state.commands.send(Command::Disconnect { conn_id });
}

/// Map a wire event to a simulation command, rejecting payloads the
/// simulation must never see.
fn intake(conn_id: u64, msg: ClientMessage) -> Option<Command> {
    match msg {
        ClientMessage::JoinGame { name } => Some(Command::Join { conn_id, name }),
        ClientMessage::Respawn { name } => Some(Command::Respawn { conn_id, name }),
        ClientMessage::PlayerMove { x, y } => {
            if !x.is_finite() || !y.is_finite() {
                debug!(conn_id, "dropping move with non-finite target");
                return None;
            }
            Some(Command::Move { conn_id, x, y })
        }
        ClientMessage::PlayerBoost => Some(Command::Boost { conn_id }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intake_maps_events_to_commands() {
        assert!(matches!(
            intake(7, ClientMessage::JoinGame { name: "a".into() }),
            Some(Command::Join { conn_id: 7, .. })
        ));
        assert!(matches!(
            intake(7, ClientMessage::Respawn { name: "a".into() }),
            Some(Command::Respawn { conn_id: 7, .. })
        ));
        assert!(matches!(
            intake(7, ClientMessage::PlayerMove { x: 1.0, y: 2.0 }),
            Some(Command::Move { conn_id: 7, x, y }) if x == 1.0 && y == 2.0
        ));
        assert!(matches!(
            intake(7, ClientMessage::PlayerBoost),
            Some(Command::Boost { conn_id: 7 })
        ));
    }

    #[test]
    fn intake_rejects_non_finite_targets() {
        assert!(intake(1, ClientMessage::PlayerMove { x: f64::NAN, y: 0.0 }).is_none());
        assert!(intake(1, ClientMessage::PlayerMove { x: 0.0, y: f64::INFINITY }).is_none());
    }
}
