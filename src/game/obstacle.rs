use crate::config::OBSTACLES;

/// Static axis-aligned safe-zone rectangle. Blocks player movement.
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Obstacle {
    pub fn from_config() -> Vec<Obstacle> {
        OBSTACLES
            .iter()
            .map(|&(x, y, width, height)| Obstacle {
                x,
                y,
                width,
                height,
            })
            .collect()
    }

    pub fn min_x(&self) -> f64 {
        self.x
    }

    pub fn min_y(&self) -> f64 {
        self.y
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// True when the point lies strictly inside the rectangle (edges allowed).
    #[allow(dead_code)] // invariant check used by tests
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > self.min_x() && x < self.max_x() && y > self.min_y() && y < self.max_y()
    }

    /// True when a circle at (cx, cy) overlaps the rectangle.
    pub fn overlaps_circle(&self, cx: f64, cy: f64, radius: f64) -> bool {
        let nx = cx.clamp(self.min_x(), self.max_x());
        let ny = cy.clamp(self.min_y(), self.max_y());
        let dx = cx - nx;
        let dy = cy - ny;
        dx * dx + dy * dy < radius * radius
    }
}
