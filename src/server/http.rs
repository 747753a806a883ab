use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

use crate::game::engine::ServerStats;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    players: usize,
    food: usize,
}

pub fn routes(stats: Arc<ServerStats>) -> Router {
    Router::new().route("/health", get(health)).with_state(stats)
}

async fn health(State(stats): State<Arc<ServerStats>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        players: stats.players.load(Ordering::Relaxed),
        food: stats.food.load(Ordering::Relaxed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_payload_shape() {
        let body = HealthResponse {
            status: "healthy",
            players: 3,
            food: 200,
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"status":"healthy","players":3,"food":200}"#);
    }
}
