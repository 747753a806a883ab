use std::collections::{HashMap, HashSet};

use rand::Rng;
use tracing::{debug, warn};

use crate::config::*;
use crate::game::food::Food;
use crate::game::obstacle::Obstacle;
use crate::game::physics;
use crate::game::player::Player;
use crate::game::spatial::{EntityKind, SpatialGrid};

/// One-shot event produced by a simulation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    PlayerDied { player_id: String },
}

/// Authoritative world: entity store, spatial index and the
/// fixed-timestep simulation over them. All position mutation funnels
/// through helpers that keep the grid in sync with the stores.
pub struct World {
    pub players: HashMap<String, Player>,
    pub food: HashMap<String, Food>,
    pub obstacles: Vec<Obstacle>,
    grid: SpatialGrid,
    /// Simulation clock: total capped delta time applied so far.
    elapsed: f64,
    next_player_id: u64,
    next_food_id: u64,
    pub(crate) max_players: usize,
    pub(crate) food_count: usize,
}

impl World {
    pub fn new() -> Self {
        let mut world = World {
            players: HashMap::new(),
            food: HashMap::new(),
            obstacles: Obstacle::from_config(),
            grid: SpatialGrid::default(),
            elapsed: 0.0,
            next_player_id: 1,
            next_food_id: 1,
            max_players: MAX_PLAYERS,
            food_count: FOOD_COUNT,
        };
        world.replenish_food();
        world
    }

    pub fn alive_count(&self) -> usize {
        self.players.values().filter(|p| p.alive).count()
    }

    /// Admit a new player at a random non-colliding spawn point.
    /// Returns None when the player cap is reached.
    pub fn add_player(&mut self, name: &str) -> Option<&Player> {
        if self.alive_count() >= self.max_players {
            debug!(name, "join refused: player cap reached");
            return None;
        }
        let (x, y) = self.spawn_point();
        let id = format!("player_{}", self.next_player_id);
        self.next_player_id += 1;
        let id = self.insert_player(id, name, x, y);
        self.players.get(&id)
    }

    fn insert_player(&mut self, id: String, name: &str, x: f64, y: f64) -> String {
        let player = Player::new(id.clone(), name.to_string(), x, y);
        self.grid.insert(EntityKind::Player, &id, x, y);
        self.players.insert(id.clone(), player);
        id
    }

    /// Remove a player from store and index. Idempotent.
    pub fn remove_player(&mut self, id: &str) {
        if let Some(p) = self.players.remove(id) {
            if !self.grid.remove(EntityKind::Player, id, p.x, p.y) {
                self.grid.purge(EntityKind::Player, id);
            }
        }
    }

    /// Store the latest move target, clamped to map bounds.
    pub fn set_target(&mut self, id: &str, x: f64, y: f64) {
        if let Some(p) = self.players.get_mut(id) {
            p.target_x = x.clamp(0.0, MAP_WIDTH);
            p.target_y = y.clamp(0.0, MAP_HEIGHT);
        }
    }

    /// Open a boost window unless one is already active.
    pub fn boost(&mut self, id: &str) {
        let now = self.elapsed;
        if let Some(p) = self.players.get_mut(id) {
            if p.alive && now >= p.boost_until {
                p.boost_until = now + BOOST_DURATION_SECS;
            }
        }
    }

    /// Rejection-sample a spawn point clear of obstacles and other
    /// players; after SPAWN_ATTEMPTS the last candidate is accepted.
    fn spawn_point(&self) -> (f64, f64) {
        let mut rng = rand::thread_rng();
        let r = mass_to_radius(PLAYER_START_MASS);
        let mut candidate = (MAP_WIDTH / 2.0, MAP_HEIGHT / 2.0);
        for _ in 0..SPAWN_ATTEMPTS {
            candidate = (
                rng.gen_range(r..MAP_WIDTH - r),
                rng.gen_range(r..MAP_HEIGHT - r),
            );
            let clear_of_obstacles = self
                .obstacles
                .iter()
                .all(|o| !o.overlaps_circle(candidate.0, candidate.1, r));
            let clear_of_players = self.players.values().filter(|p| p.alive).all(|p| {
                physics::distance(candidate.0, candidate.1, p.x, p.y) >= p.radius() + r
            });
            if clear_of_obstacles && clear_of_players {
                break;
            }
        }
        candidate
    }

    fn spawn_food(&mut self) {
        let id = format!("food_{}", self.next_food_id);
        self.next_food_id += 1;
        let food = Food::scatter(id.clone());
        self.grid.insert(EntityKind::Food, &id, food.x, food.y);
        self.food.insert(id, food);
    }

    fn remove_food(&mut self, id: &str) -> Option<Food> {
        let food = self.food.remove(id)?;
        self.grid.remove(EntityKind::Food, id, food.x, food.y);
        Some(food)
    }

    /// Advance the world by dt seconds. Order matters: motion (with map
    /// clamp and obstacle push-out), then food pickup, then
    /// player-vs-player eating, then food replenishment.
    pub fn tick(&mut self, dt: f64) -> Vec<WorldEvent> {
        self.elapsed += dt;
        self.sweep_invalid();
        let ids = self.sorted_player_ids();
        self.integrate_motion(&ids, dt);
        self.eat_food(&ids);
        let events = self.eat_players(&ids);
        self.replenish_food();
        events
    }

    fn sorted_player_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.players.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// A single corrupted entity must not take the tick down: drop any
    /// player whose state stopped being finite and move on.
    fn sweep_invalid(&mut self) {
        let bad: Vec<String> = self
            .players
            .iter()
            .filter(|(_, p)| !(p.x.is_finite() && p.y.is_finite() && p.mass.is_finite()))
            .map(|(id, _)| id.clone())
            .collect();
        for id in bad {
            warn!(player = %id, "removing player with non-finite state");
            self.grid.purge(EntityKind::Player, &id);
            self.players.remove(&id);
        }
    }

    fn integrate_motion(&mut self, ids: &[String], dt: f64) {
        for id in ids {
            let Some(p) = self.players.get_mut(id) else {
                continue;
            };
            if !p.alive {
                continue;
            }
            let (old_x, old_y) = (p.x, p.y);

            let dx = p.target_x - p.x;
            let dy = p.target_y - p.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist >= MOVE_EPSILON {
                let mut speed = p.speed();
                if p.boosting(self.elapsed) {
                    speed *= BOOST_MULTIPLIER;
                }
                let step = (speed * dt).min(dist);
                let (nx, ny) = physics::normalize(dx, dy);
                p.x += nx * step;
                p.y += ny * step;
            }

            let r = p.radius();
            let (cx, cy) = physics::clamp_to_map(p.x, p.y, r);
            p.x = cx;
            p.y = cy;
            for o in &self.obstacles {
                if let Some((px, py)) = physics::resolve_obstacle(p.x, p.y, r, o) {
                    p.x = px;
                    p.y = py;
                }
            }

            if (p.x, p.y) != (old_x, old_y) {
                self.grid
                    .relocate(EntityKind::Player, id, (old_x, old_y), (p.x, p.y));
            }
        }
    }

    fn eat_food(&mut self, ids: &[String]) {
        for id in ids {
            let Some(p) = self.players.get(id) else {
                continue;
            };
            if !p.alive {
                continue;
            }
            let (px, py, pr) = (p.x, p.y, p.radius());

            let eaten: Vec<String> = self
                .grid
                .query(px, py, pr)
                .filter(|(kind, _)| *kind == EntityKind::Food)
                .filter(|(_, fid)| {
                    self.food
                        .get(fid)
                        .is_some_and(|f| physics::distance(px, py, f.x, f.y) < pr)
                })
                .map(|(_, fid)| fid.clone())
                .collect();

            let mut gained = 0.0;
            for fid in eaten {
                if self.remove_food(&fid).is_some() {
                    gained += FOOD_MASS;
                }
            }
            if gained > 0.0 {
                if let Some(p) = self.players.get_mut(id) {
                    p.mass += gained;
                }
            }
        }
    }

    /// Player-vs-player resolution. Candidates come from the grid and
    /// are visited in ascending identifier order so the same world
    /// always produces the same outcome. The heavier player eats when
    /// it clears the mass ratio and the prey's center lies inside its
    /// radius; equal masses never eat. A player eats at most once per
    /// tick and an eater cannot itself be eaten in the same tick.
    fn eat_players(&mut self, ids: &[String]) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        let mut ate: HashSet<String> = HashSet::new();

        for id in ids {
            let Some(p) = self.players.get(id) else {
                continue;
            };
            if !p.alive {
                continue;
            }
            let (px, py, pr) = (p.x, p.y, p.radius());

            let mut candidates: Vec<String> = self
                .grid
                .query(px, py, pr)
                .filter(|(kind, other)| *kind == EntityKind::Player && other != id)
                .map(|(_, other)| other.clone())
                .collect();
            candidates.sort();

            for other_id in candidates {
                let Some(p) = self.players.get(id) else {
                    break;
                };
                let Some(other) = self.players.get(&other_id) else {
                    continue;
                };
                if !p.alive || !other.alive {
                    continue;
                }

                let (pred_id, prey_id) = if p.mass > other.mass {
                    (id.clone(), other_id.clone())
                } else if other.mass > p.mass {
                    (other_id.clone(), id.clone())
                } else {
                    continue;
                };
                if ate.contains(&pred_id) || ate.contains(&prey_id) {
                    continue;
                }
                let (Some(pred), Some(prey)) =
                    (self.players.get(&pred_id), self.players.get(&prey_id))
                else {
                    continue;
                };
                if pred.mass < EAT_MASS_RATIO * prey.mass {
                    continue;
                }
                if physics::distance(pred.x, pred.y, prey.x, prey.y) >= pred.radius() {
                    continue;
                }

                let prey_mass = prey.mass;
                let (prey_x, prey_y) = (prey.x, prey.y);
                if let Some(mut dead) = self.players.remove(&prey_id) {
                    dead.alive = false;
                    self.grid
                        .remove(EntityKind::Player, &prey_id, prey_x, prey_y);
                    events.push(WorldEvent::PlayerDied {
                        player_id: prey_id.clone(),
                    });
                }
                if let Some(pred) = self.players.get_mut(&pred_id) {
                    pred.mass += prey_mass;
                }
                ate.insert(pred_id);
                if prey_id == *id {
                    break;
                }
            }
        }
        events
    }

    fn replenish_food(&mut self) {
        while self.food.len() < self.food_count {
            self.spawn_food();
        }
    }

    /// Top alive players by mass descending, identifier ascending on ties.
    pub fn leaderboard(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<&Player> = self.players.values().filter(|p| p.alive).collect();
        entries.sort_by(|a, b| b.mass.total_cmp(&a.mass).then_with(|| a.id.cmp(&b.id)));
        entries
            .into_iter()
            .take(LEADERBOARD_SIZE)
            .map(|p| (p.name.clone(), p.mass))
            .collect()
    }

    /// Test support: empty the map of pellets and stop replenishment.
    #[cfg(test)]
    pub(crate) fn clear_food(&mut self) {
        let ids: Vec<String> = self.food.keys().cloned().collect();
        for id in ids {
            self.remove_food(&id);
        }
        self.food_count = 0;
    }

    /// Test support: reposition a player through the index-preserving path.
    #[cfg(test)]
    pub(crate) fn place_at(&mut self, id: &str, x: f64, y: f64) {
        if let Some(p) = self.players.get_mut(id) {
            let old = (p.x, p.y);
            p.x = x;
            p.y = y;
            self.grid.relocate(EntityKind::Player, id, old, (x, y));
        }
    }

    #[cfg(test)]
    fn index_matches_store(&self) -> bool {
        use crate::game::spatial::EntityKind;
        let total = self.players.len() + self.food.len();
        if self.grid.len() != total {
            return false;
        }
        self.players
            .iter()
            .all(|(id, p)| self.grid.contains(EntityKind::Player, id, p.x, p.y))
            && self
                .food
                .iter()
                .all(|(id, f)| self.grid.contains(EntityKind::Food, id, f.x, f.y))
    }
}
