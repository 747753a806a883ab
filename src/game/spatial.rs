#![allow(dead_code)] // inspection helpers used by tests

use std::collections::HashMap;

use crate::config::{MAP_HEIGHT, MAP_WIDTH, SPATIAL_CELL_SIZE};

/// Entity tag stored alongside an identifier in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Food,
}

type CellKey = (i32, i32);

/// Uniform grid over the map for broad-phase collision queries.
///
/// Each entity occupies exactly one cell, keyed by its center position.
/// Queries return every entity whose cell overlaps the bounding box of
/// the query circle; callers refine with an exact distance check.
pub struct SpatialGrid {
    cell_size: f64,
    cols: i32,
    rows: i32,
    cells: HashMap<CellKey, Vec<(EntityKind, String)>>,
}

impl SpatialGrid {
    pub fn new(width: f64, height: f64, cell_size: f64) -> Self {
        SpatialGrid {
            cell_size,
            cols: (width / cell_size).ceil() as i32,
            rows: (height / cell_size).ceil() as i32,
            cells: HashMap::new(),
        }
    }

    fn cell_at(&self, x: f64, y: f64) -> CellKey {
        let cx = ((x / self.cell_size).floor() as i32).clamp(0, self.cols - 1);
        let cy = ((y / self.cell_size).floor() as i32).clamp(0, self.rows - 1);
        (cx, cy)
    }

    pub fn insert(&mut self, kind: EntityKind, id: &str, x: f64, y: f64) {
        let key = self.cell_at(x, y);
        self.cells
            .entry(key)
            .or_default()
            .push((kind, id.to_string()));
    }

    /// Remove an entity via its cached position. Returns false if the
    /// entity was not in the cell that position maps to.
    pub fn remove(&mut self, kind: EntityKind, id: &str, x: f64, y: f64) -> bool {
        let key = self.cell_at(x, y);
        if let Some(cell) = self.cells.get_mut(&key) {
            if let Some(idx) = cell.iter().position(|(k, i)| *k == kind && i == id) {
                cell.swap_remove(idx);
                if cell.is_empty() {
                    self.cells.remove(&key);
                }
                return true;
            }
        }
        false
    }

    /// Move an entity between positions. No-op when the cell key is unchanged.
    pub fn relocate(&mut self, kind: EntityKind, id: &str, old: (f64, f64), new: (f64, f64)) {
        let old_key = self.cell_at(old.0, old.1);
        let new_key = self.cell_at(new.0, new.1);
        if old_key == new_key {
            return;
        }
        self.remove(kind, id, old.0, old.1);
        self.insert(kind, id, new.0, new.1);
    }

    /// All entities whose cell overlaps the bounding box of the query
    /// circle. Each entity lives in exactly one cell, so candidates are
    /// yielded at most once.
    pub fn query(
        &self,
        x: f64,
        y: f64,
        radius: f64,
    ) -> impl Iterator<Item = &(EntityKind, String)> + '_ {
        let (min_cx, min_cy) = self.cell_at(x - radius, y - radius);
        let (max_cx, max_cy) = self.cell_at(x + radius, y + radius);
        (min_cx..=max_cx).flat_map(move |cx| {
            (min_cy..=max_cy).flat_map(move |cy| {
                self.cells.get(&(cx, cy)).into_iter().flatten()
            })
        })
    }

    /// Remove an entity wherever it is. Slow path for entities whose
    /// cached position can no longer be trusted.
    pub fn purge(&mut self, kind: EntityKind, id: &str) -> bool {
        let mut found = None;
        for (key, cell) in self.cells.iter_mut() {
            if let Some(idx) = cell.iter().position(|(k, i)| *k == kind && i == id) {
                cell.swap_remove(idx);
                found = Some(*key);
                break;
            }
        }
        if let Some(key) = found {
            if self.cells.get(&key).is_some_and(|c| c.is_empty()) {
                self.cells.remove(&key);
            }
            return true;
        }
        false
    }

    pub fn contains(&self, kind: EntityKind, id: &str, x: f64, y: f64) -> bool {
        let key = self.cell_at(x, y);
        self.cells
            .get(&key)
            .is_some_and(|cell| cell.iter().any(|(k, i)| *k == kind && i == id))
    }

    pub fn len(&self) -> usize {
        self.cells.values().map(Vec::len).sum()
    }
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(MAP_WIDTH, MAP_HEIGHT, SPATIAL_CELL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_query() {
        let mut grid = SpatialGrid::default();
        grid.insert(EntityKind::Player, "p1", 100.0, 100.0);

        let results: Vec<_> = grid.query(100.0, 100.0, 20.0).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0], &(EntityKind::Player, "p1".to_string()));
    }

    #[test]
    fn query_reaches_neighbor_cells() {
        let mut grid = SpatialGrid::default();
        // Same world position, cells (0,0) and (1,0) with 200px cells.
        grid.insert(EntityKind::Player, "p1", 190.0, 50.0);
        grid.insert(EntityKind::Food, "f1", 210.0, 50.0);

        let results: Vec<_> = grid.query(190.0, 50.0, 30.0).collect();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn query_yields_each_candidate_once() {
        let mut grid = SpatialGrid::default();
        grid.insert(EntityKind::Player, "p1", 500.0, 500.0);

        // Query box spans many cells; the entity sits in exactly one.
        let hits = grid
            .query(500.0, 500.0, 600.0)
            .filter(|(_, id)| id == "p1")
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn remove_via_cached_position() {
        let mut grid = SpatialGrid::default();
        grid.insert(EntityKind::Food, "f1", 300.0, 300.0);

        assert!(grid.remove(EntityKind::Food, "f1", 300.0, 300.0));
        assert!(!grid.remove(EntityKind::Food, "f1", 300.0, 300.0));
        assert_eq!(grid.len(), 0);
    }

    #[test]
    fn relocate_is_noop_within_cell() {
        let mut grid = SpatialGrid::default();
        grid.insert(EntityKind::Player, "p1", 100.0, 100.0);
        grid.relocate(EntityKind::Player, "p1", (100.0, 100.0), (150.0, 150.0));

        assert!(grid.contains(EntityKind::Player, "p1", 150.0, 150.0));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn relocate_moves_between_cells() {
        let mut grid = SpatialGrid::default();
        grid.insert(EntityKind::Player, "p1", 100.0, 100.0);
        grid.relocate(EntityKind::Player, "p1", (100.0, 100.0), (900.0, 900.0));

        assert!(!grid.contains(EntityKind::Player, "p1", 100.0, 100.0));
        assert!(grid.contains(EntityKind::Player, "p1", 900.0, 900.0));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn positions_outside_map_clamp_to_edge_cells() {
        let mut grid = SpatialGrid::default();
        grid.insert(EntityKind::Player, "p1", -50.0, 2500.0);

        assert!(grid.contains(EntityKind::Player, "p1", 0.0, MAP_HEIGHT));
        let results: Vec<_> = grid.query(0.0, MAP_HEIGHT, 10.0).collect();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn purge_finds_entity_anywhere() {
        let mut grid = SpatialGrid::default();
        grid.insert(EntityKind::Player, "p1", 700.0, 700.0);

        assert!(grid.purge(EntityKind::Player, "p1"));
        assert!(!grid.purge(EntityKind::Player, "p1"));
        assert_eq!(grid.len(), 0);
    }

    #[test]
    fn players_and_food_are_distinct() {
        let mut grid = SpatialGrid::default();
        grid.insert(EntityKind::Player, "x", 100.0, 100.0);
        grid.insert(EntityKind::Food, "x", 100.0, 100.0);

        assert!(grid.remove(EntityKind::Player, "x", 100.0, 100.0));
        assert!(grid.contains(EntityKind::Food, "x", 100.0, 100.0));
    }
}
