//! Screen-space geometry
//!
//! All coordinates are screen pixels with the origin at the top-left corner.

use serde::{Deserialize, Serialize};

/// Integer pixel position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: i32,
    /// Y coordinate
    pub y: i32,
}

impl Point {
    /// Create a new point
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Offset by a relative amount
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Euclidean distance to another point
    pub fn distance_to(self, other: Point) -> f64 {
        let dx = (other.x - self.x) as f64;
        let dy = (other.y - self.y) as f64;
        dx.hypot(dy)
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

/// Axis-aligned bounding box reported by the vision matcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rectangle {
    /// Left edge
    pub x: i32,
    /// Top edge
    pub y: i32,
    /// Width (never negative)
    pub width: u32,
    /// Height (never negative)
    pub height: u32,
}

impl Rectangle {
    /// Create a new rectangle
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Middle of the box, truncated toward zero like the matcher's own
    /// `(2x + w) / 2` convention
    pub fn center(&self) -> Point {
        let cx = (2 * self.x as i64 + self.width as i64) / 2;
        let cy = (2 * self.y as i64 + self.height as i64) / 2;
        Point::new(cx as i32, cy as i32)
    }
}

/// Fixed screen dimensions used for clamping and aim points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenGeometry {
    /// Screen width in pixels
    pub width: u32,
    /// Screen height in pixels
    pub height: u32,
}

impl ScreenGeometry {
    /// Create screen geometry
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Clamp an x coordinate into `[0, width]`
    ///
    /// The upper bound is inclusive: the cursor may sit exactly on the right
    /// edge.
    pub fn clamp_x(&self, x: i32) -> i32 {
        x.clamp(0, self.width as i32)
    }

    /// Clamp a y coordinate into `[0, height]`
    pub fn clamp_y(&self, y: i32) -> i32 {
        y.clamp(0, self.height as i32)
    }
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}
