use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::config::*;

#[derive(Debug, Clone)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub mass: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub color: String,
    pub alive: bool,
    /// Simulation-clock deadline of the current boost window.
    pub boost_until: f64,
}

impl Player {
    pub fn new(id: String, name: String, x: f64, y: f64) -> Self {
        let color = color_for_id(&id);
        Player {
            id,
            name,
            x,
            y,
            mass: PLAYER_START_MASS,
            target_x: x,
            target_y: y,
            color,
            alive: true,
            boost_until: 0.0,
        }
    }

    pub fn radius(&self) -> f64 {
        mass_to_radius(self.mass)
    }

    pub fn speed(&self) -> f64 {
        speed_for_mass(self.mass)
    }

    pub fn boosting(&self, now: f64) -> bool {
        now < self.boost_until
    }
}

/// Pick a palette color by hashing the identifier, so a player keeps
/// the same color in every snapshot without storing extra state.
fn color_for_id(id: &str) -> String {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let idx = (hasher.finish() % PLAYER_COLORS.len() as u64) as usize;
    PLAYER_COLORS[idx].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_fields_follow_mass() {
        let mut p = Player::new("player_1".into(), "tester".into(), 100.0, 100.0);
        assert!((p.radius() - 1.5 * 10.0_f64.sqrt()).abs() < 1e-9);
        assert!((p.speed() - 300.0 / 10.0_f64.sqrt()).abs() < 1e-9);

        p.mass = 40.0;
        assert!((p.radius() - 1.5 * 40.0_f64.sqrt()).abs() < 1e-9);
        assert!((p.speed() - 300.0 / 40.0_f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn color_is_stable_per_id() {
        let a = Player::new("player_7".into(), "a".into(), 0.0, 0.0);
        let b = Player::new("player_7".into(), "b".into(), 50.0, 50.0);
        assert_eq!(a.color, b.color);
        assert!(PLAYER_COLORS.contains(&a.color.as_str()));
    }

    #[test]
    fn boost_window() {
        let mut p = Player::new("player_1".into(), "tester".into(), 0.0, 0.0);
        assert!(!p.boosting(0.0));
        p.boost_until = 0.5;
        assert!(p.boosting(0.49));
        assert!(!p.boosting(0.5));
    }
}
