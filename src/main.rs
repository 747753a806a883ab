mod config;
mod game;
mod protocol;
mod server;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio::sync::{mpsc, watch};
use tower_http::services::ServeDir;
use tracing::info;

use crate::game::engine::{Engine, ServerStats};
use crate::server::{http, ws};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let stats = Arc::new(ServerStats::default());
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // The simulation task exclusively owns the world; everything else
    // talks to it through the command queue.
    let engine = Engine::new(stats.clone());
    tokio::spawn(engine.run(command_rx, shutdown_rx));
    info!(
        width = config::MAP_WIDTH,
        height = config::MAP_HEIGHT,
        tick_rate = config::TICK_RATE,
        food = config::FOOD_COUNT,
        "world created"
    );

    let ws_state = ws::WsState {
        commands: command_tx,
    };
    let app = Router::new()
        .route("/ws", get(ws::ws_handler).with_state(ws_state))
        .merge(http::routes(stats))
        .fallback_service(ServeDir::new("static"));

    let port = config::server_port();
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!(port, "arena server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
            let _ = shutdown_tx.send(true);
        })
        .await
        .unwrap();
}
