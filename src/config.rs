// Game world constants
pub const MAP_WIDTH: f64 = 2000.0;
pub const MAP_HEIGHT: f64 = 2000.0;
pub const TICK_RATE: u64 = 20; // ticks per second (20 TPS = 50ms per tick)
pub const TICK_DURATION_MS: u64 = 1000 / TICK_RATE;
pub const TICK_DELTA_CAP: f64 = 4.0 / TICK_RATE as f64; // bounds catch-up after stalls
pub const MAX_PLAYERS: usize = 100;

// Player constants
pub const PLAYER_START_MASS: f64 = 10.0;
pub const PLAYER_BASE_SPEED: f64 = 300.0; // pixels per second at mass=1
pub const PLAYER_RADIUS_MULTIPLIER: f64 = 1.5; // radius = sqrt(mass) * multiplier
pub const SPEED_MASS_EXPONENT: f64 = 0.5; // speed = BASE_SPEED / mass^exponent
pub const EAT_MASS_RATIO: f64 = 1.1; // must be 10% heavier to eat another player
pub const MOVE_EPSILON: f64 = 1.0; // dead zone to prevent jittering
pub const MAX_NAME_LEN: usize = 20;
pub const DEFAULT_NAME: &str = "Anonymous";
pub const SPAWN_ATTEMPTS: u32 = 20;

// Boost constants
pub const BOOST_MULTIPLIER: f64 = 2.0;
pub const BOOST_DURATION_SECS: f64 = 0.5;

// Food constants
pub const FOOD_COUNT: usize = 200;
pub const FOOD_MASS: f64 = 1.0;
pub const FOOD_RADIUS: f64 = 5.0;

// Spatial grid
pub const SPATIAL_CELL_SIZE: f64 = MAP_WIDTH / 10.0;

// Broadcast
pub const LEADERBOARD_SIZE: usize = 10;
pub const OUTBOUND_QUEUE_LIMIT: usize = 5; // snapshots buffered per slow client

// Safe-zone obstacles: (x, y, width, height)
pub const OBSTACLES: [(f64, f64, f64, f64); 5] = [
    (400.0, 400.0, 200.0, 200.0),   // center
    (100.0, 100.0, 150.0, 150.0),   // top-left
    (1750.0, 100.0, 150.0, 150.0),  // top-right
    (100.0, 1750.0, 150.0, 150.0),  // bottom-left
    (1750.0, 1750.0, 150.0, 150.0), // bottom-right
];

pub const PLAYER_COLORS: [&str; 15] = [
    "#FF4136", "#FF6B35", "#FFDC00", "#2ECC40", "#0074D9",
    "#7FDBFF", "#B10DC9", "#F012BE", "#FF69B4", "#01FF70",
    "#3D9970", "#39CCCC", "#E65100", "#00BCD4", "#8BC34A",
];

pub const FOOD_COLORS: [&str; 10] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#FFA07A", "#98D8C8",
    "#F7DC6F", "#BB8FCE", "#85C1E2", "#F8B739", "#52C285",
];

// Server
pub const DEFAULT_PORT: u16 = 8080;

// Helper: mass to radius
pub fn mass_to_radius(mass: f64) -> f64 {
    mass.sqrt() * PLAYER_RADIUS_MULTIPLIER
}

// Helper: speed based on mass
pub fn speed_for_mass(mass: f64) -> f64 {
    PLAYER_BASE_SPEED / mass.powf(SPEED_MASS_EXPONENT)
}

pub fn server_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}
