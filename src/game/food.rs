use crate::config::*;
use rand::Rng;

#[derive(Debug, Clone)]
pub struct Food {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
}

impl Food {
    /// Drop a pellet anywhere on the map. Obstacle overlap is allowed:
    /// food may sit inside safe zones.
    pub fn scatter(id: String) -> Self {
        let mut rng = rand::thread_rng();
        Food::at(
            id,
            rng.gen_range(0.0..MAP_WIDTH),
            rng.gen_range(0.0..MAP_HEIGHT),
        )
    }

    pub fn at(id: String, x: f64, y: f64) -> Self {
        let mut rng = rand::thread_rng();
        Food {
            id,
            x,
            y,
            color: FOOD_COLORS[rng.gen_range(0..FOOD_COLORS.len())].to_string(),
        }
    }
}
