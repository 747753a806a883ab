use serde::{Deserialize, Serialize};

// ── Client → Server ──

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    JoinGame { name: String },
    Respawn { name: String },
    PlayerMove { x: f64, y: f64 },
    PlayerBoost,
}

// ── Server → Client ──

#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    PlayerJoined {
        #[serde(rename = "playerId")]
        player_id: String,
        player: PlayerSnapshot,
    },
    GameState {
        players: Vec<PlayerSnapshot>,
        food: Vec<FoodSnapshot>,
        obstacles: Vec<ObstacleSnapshot>,
        leaderboard: Vec<LeaderEntry>,
    },
    PlayerDied {
        #[serde(rename = "playerId")]
        player_id: String,
    },
}

#[derive(Debug, Serialize, Clone)]
pub struct PlayerSnapshot {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub mass: f64,
    pub radius: f64,
    pub color: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct FoodSnapshot {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub color: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct ObstacleSnapshot {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Serialize, Clone)]
pub struct LeaderEntry {
    pub name: String,
    pub mass: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_events_parse() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"join_game","name":"alice"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::JoinGame { name } if name == "alice"));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"player_move","x":120.5,"y":-4.0}"#).unwrap();
        assert!(matches!(msg, ClientMessage::PlayerMove { x, y } if x == 120.5 && y == -4.0));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"player_boost"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::PlayerBoost));

        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"respawn","name":"bob"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Respawn { name } if name == "bob"));
    }

    #[test]
    fn malformed_client_events_are_errors() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"join_game"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"player_move","x":"a","y":0}"#)
            .is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type":"split"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }

    #[test]
    fn server_events_use_the_wire_names() {
        let json = serde_json::to_string(&ServerMessage::PlayerDied {
            player_id: "player_3".into(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"player_died","playerId":"player_3"}"#);

        let json = serde_json::to_string(&ServerMessage::PlayerJoined {
            player_id: "player_1".into(),
            player: PlayerSnapshot {
                id: "player_1".into(),
                name: "alice".into(),
                x: 100.0,
                y: 200.0,
                mass: 10.0,
                radius: 4.74,
                color: "#FF4136".into(),
            },
        })
        .unwrap();
        assert!(json.starts_with(r#"{"type":"player_joined","playerId":"player_1""#));
        assert!(json.contains(r#""name":"alice""#));

        let json = serde_json::to_string(&ServerMessage::GameState {
            players: vec![],
            food: vec![],
            obstacles: vec![],
            leaderboard: vec![],
        })
        .unwrap();
        assert!(json.contains(r#""type":"game_state""#));
        assert!(json.contains(r#""players":[]"#));
        assert!(json.contains(r#""leaderboard":[]"#));
    }
}
