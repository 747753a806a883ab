use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::*;
use crate::game::player::Player;
use crate::game::world::{World, WorldEvent};
use crate::protocol::messages::{
    FoodSnapshot, LeaderEntry, ObstacleSnapshot, PlayerSnapshot, ServerMessage,
};

/// Validated command from a connection, applied on the simulation task.
#[derive(Debug)]
pub enum Command {
    Connect {
        conn_id: u64,
        tx: mpsc::Sender<String>,
    },
    Disconnect {
        conn_id: u64,
    },
    Join {
        conn_id: u64,
        name: String,
    },
    Respawn {
        conn_id: u64,
        name: String,
    },
    Move {
        conn_id: u64,
        x: f64,
        y: f64,
    },
    Boost {
        conn_id: u64,
    },
}

/// Gauges the /health endpoint reads without touching world state.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub players: AtomicUsize,
    pub food: AtomicUsize,
}

struct Session {
    tx: mpsc::Sender<String>,
    player_id: Option<String>,
}

/// Owns the world and the session registry. Everything here runs on a
/// single task: commands arrive through one FIFO and are drained at
/// tick boundaries, snapshots leave through per-connection queues.
pub struct Engine {
    pub(crate) world: World,
    sessions: HashMap<u64, Session>,
    stats: Arc<ServerStats>,
}

impl Engine {
    pub fn new(stats: Arc<ServerStats>) -> Self {
        Engine {
            world: World::new(),
            sessions: HashMap::new(),
            stats,
        }
    }

    pub fn apply(&mut self, cmd: Command) {
        match cmd {
            Command::Connect { conn_id, tx } => {
                debug!(conn_id, "connection registered");
                self.sessions.insert(
                    conn_id,
                    Session {
                        tx,
                        player_id: None,
                    },
                );
            }
            Command::Disconnect { conn_id } => {
                // Idempotent: a second disconnect finds no session.
                if let Some(session) = self.sessions.remove(&conn_id) {
                    if let Some(player_id) = session.player_id {
                        debug!(conn_id, player = %player_id, "removing disconnected player");
                        self.world.remove_player(&player_id);
                    }
                }
            }
            Command::Join { conn_id, name } | Command::Respawn { conn_id, name } => {
                self.handle_join(conn_id, &name);
            }
            Command::Move { conn_id, x, y } => {
                if !x.is_finite() || !y.is_finite() {
                    debug!(conn_id, "dropping move with non-finite target");
                    return;
                }
                if let Some(player_id) = self.player_of(conn_id) {
                    self.world.set_target(&player_id, x, y);
                }
            }
            Command::Boost { conn_id } => {
                if let Some(player_id) = self.player_of(conn_id) {
                    self.world.boost(&player_id);
                }
            }
        }
    }

    fn player_of(&self, conn_id: u64) -> Option<String> {
        self.sessions.get(&conn_id)?.player_id.clone()
    }

    fn handle_join(&mut self, conn_id: u64, name: &str) {
        let Some(session) = self.sessions.get(&conn_id) else {
            return;
        };
        // A connection that already owns a live player joins nothing.
        if let Some(player_id) = &session.player_id {
            if self.world.players.contains_key(player_id) {
                debug!(conn_id, "join ignored: player already alive");
                return;
            }
        }

        let name = sanitize_name(name);
        let Some(player) = self.world.add_player(&name) else {
            info!(conn_id, "join refused: server full");
            return;
        };
        let player_id = player.id.clone();
        let snapshot = player_snapshot(player);

        if let Some(session) = self.sessions.get_mut(&conn_id) {
            session.player_id = Some(player_id.clone());
            send_to(
                &session.tx,
                &ServerMessage::PlayerJoined {
                    player_id,
                    player: snapshot,
                },
            );
        }
    }

    /// One simulation step plus the broadcast fan-out for it.
    pub fn step(&mut self, dt: f64) {
        let events = self.world.tick(dt);

        // Death frees the connection slot for a future respawn.
        for event in &events {
            let WorldEvent::PlayerDied { player_id } = event;
            for session in self.sessions.values_mut() {
                if session.player_id.as_deref() == Some(player_id) {
                    session.player_id = None;
                }
            }
        }

        let mut frames: Vec<String> = Vec::with_capacity(events.len() + 1);
        for event in events {
            let WorldEvent::PlayerDied { player_id } = event;
            if let Some(json) = encode(&ServerMessage::PlayerDied { player_id }) {
                frames.push(json);
            }
        }
        if let Some(json) = encode(&self.snapshot_message()) {
            frames.push(json);
        }

        for session in self.sessions.values() {
            for frame in &frames {
                push_frame(&session.tx, frame.clone());
            }
        }

        self.stats
            .players
            .store(self.world.alive_count(), Ordering::Relaxed);
        self.stats.food.store(self.world.food.len(), Ordering::Relaxed);
    }

    fn snapshot_message(&self) -> ServerMessage {
        let mut players: Vec<&_> = self.world.players.values().filter(|p| p.alive).collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));
        let players = players.into_iter().map(player_snapshot).collect();

        let mut food: Vec<&_> = self.world.food.values().collect();
        food.sort_by(|a, b| a.id.cmp(&b.id));
        let food = food
            .into_iter()
            .map(|f| FoodSnapshot {
                id: f.id.clone(),
                x: f.x.round(),
                y: f.y.round(),
                radius: FOOD_RADIUS,
                color: f.color.clone(),
            })
            .collect();

        let obstacles = self
            .world
            .obstacles
            .iter()
            .map(|o| ObstacleSnapshot {
                x: o.x,
                y: o.y,
                width: o.width,
                height: o.height,
            })
            .collect();

        let leaderboard = self
            .world
            .leaderboard()
            .into_iter()
            .map(|(name, mass)| LeaderEntry { name, mass })
            .collect();

        ServerMessage::GameState {
            players,
            food,
            obstacles,
            leaderboard,
        }
    }

    /// Fixed-rate simulation loop. Drains the command FIFO, steps the
    /// world with the measured (capped) delta and broadcasts. On
    /// shutdown one final tick drains remaining events before the
    /// outbound queues close.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = interval(Duration::from_millis(TICK_DURATION_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = Instant::now();

        loop {
            let stopping = tokio::select! {
                _ = ticker.tick() => false,
                _ = shutdown.changed() => true,
            };

            self.drain_commands(&mut commands);
            let now = Instant::now();
            let dt = (now - last).as_secs_f64().min(TICK_DELTA_CAP);
            last = now;
            self.step(dt);

            if stopping {
                info!("simulation stopped");
                break;
            }
        }
    }

    fn drain_commands(&mut self, commands: &mut mpsc::UnboundedReceiver<Command>) {
        while let Ok(cmd) = commands.try_recv() {
            self.apply(cmd);
        }
    }
}

/// Strip control characters, trim, cap the length; empty names fall
/// back to the default.
pub fn sanitize_name(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !c.is_control()).collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return DEFAULT_NAME.to_string();
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}

fn player_snapshot(p: &Player) -> PlayerSnapshot {
    PlayerSnapshot {
        id: p.id.clone(),
        name: p.name.clone(),
        x: p.x,
        y: p.y,
        mass: p.mass,
        radius: p.radius(),
        color: p.color.clone(),
    }
}

fn encode(msg: &ServerMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(json),
        Err(err) => {
            warn!(%err, "failed to encode server message");
            None
        }
    }
}

fn send_to(tx: &mpsc::Sender<String>, msg: &ServerMessage) {
    if let Some(json) = encode(msg) {
        push_frame(tx, json);
    }
}

/// Snapshots are absolute state; a slow client loses frames, never
/// stalls the simulation.
fn push_frame(tx: &mpsc::Sender<String>, frame: String) {
    match tx.try_send(frame) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!("outbound queue full, dropping frame");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}
