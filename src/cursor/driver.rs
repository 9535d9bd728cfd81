//! Pointer driver
//!
//! Turns a relative camera correction into an absolute pointer destination and
//! walks the OS cursor there along a stochastic trajectory.

use std::sync::Arc;
use tracing::debug;

use super::trajectory::{Trajectory, TrajectoryConfig};
use crate::error::Result;
use crate::geometry::{Point, ScreenGeometry};

/// OS-level cursor access
///
/// Implementations are best effort; any error is treated as fatal by the
/// caller.
pub trait CursorIo: Send + Sync {
    /// Current cursor position
    fn position(&self) -> Result<Point>;

    /// Warp the cursor to an absolute position
    fn set_position(&self, point: Point) -> Result<()>;
}

/// Relative pointer mover backed by [`Trajectory`]
pub struct PointerDriver {
    cursor: Arc<dyn CursorIo>,
    screen: ScreenGeometry,
    clamp_vertical: bool,
    trajectory: TrajectoryConfig,
}

impl PointerDriver {
    /// Create a driver for the given screen
    pub fn new(
        cursor: Arc<dyn CursorIo>,
        screen: ScreenGeometry,
        trajectory: TrajectoryConfig,
    ) -> Self {
        Self {
            cursor,
            screen,
            clamp_vertical: false,
            trajectory,
        }
    }

    /// Also clamp the vertical destination into `[0, height]`
    ///
    /// Off by default: camera pitch has no hard screen edge.
    pub fn with_vertical_clamp(mut self, clamp_vertical: bool) -> Self {
        self.clamp_vertical = clamp_vertical;
        self
    }

    /// Step used by [`move_by_default`](Self::move_by_default)
    pub fn default_step(&self) -> f64 {
        self.trajectory.default_step
    }

    /// Screen this driver clamps against
    pub fn screen(&self) -> ScreenGeometry {
        self.screen
    }

    /// Compute the absolute destination for a relative move
    pub fn destination_for(&self, current: Point, dx: i32, dy: i32) -> Point {
        let raw = current.offset(dx, dy);
        let y = if self.clamp_vertical {
            self.screen.clamp_y(raw.y)
        } else {
            raw.y
        };
        Point::new(self.screen.clamp_x(raw.x), y)
    }

    /// Move the cursor by `(dx, dy)` using `step` as both the step cap and the
    /// damping distance
    ///
    /// Returns the final cursor position.
    pub fn move_by(&self, dx: i32, dy: i32, step: f64, with_pacing: bool) -> Result<Point> {
        let current = self.cursor.position()?;
        let destination = self.destination_for(current, dx, dy);

        debug!(
            "Pointer move ({}, {}) step={}: {:?} -> {:?}",
            dx, dy, step, current, destination
        );

        let params = self.trajectory.params_for_step(step);
        let pacing = if with_pacing {
            self.trajectory.pacing()
        } else {
            None
        };

        Trajectory::new(current, destination, params, rand::thread_rng())?
            .with_max_iterations(self.trajectory.max_iterations)
            .run(pacing, |point| self.cursor.set_position(point))
    }

    /// Move by `(dx, dy)` with the configured default step and pacing
    pub fn move_by_default(&self, dx: i32, dy: i32) -> Result<Point> {
        self.move_by(dx, dy, self.trajectory.default_step, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::VirtualCursor;
    use proptest::prelude::*;

    fn driver(cursor: Arc<VirtualCursor>) -> PointerDriver {
        let config = TrajectoryConfig {
            pacing_us: 0,
            ..Default::default()
        };
        PointerDriver::new(cursor, ScreenGeometry::default(), config)
    }

    #[test]
    fn test_horizontal_destination_is_clamped() {
        let cursor = Arc::new(VirtualCursor::new(Point::new(1900, 500)));
        let driver = driver(cursor);

        assert_eq!(
            driver.destination_for(Point::new(1900, 500), 200, 0),
            Point::new(1920, 500)
        );
        assert_eq!(
            driver.destination_for(Point::new(20, 500), -300, 0),
            Point::new(0, 500)
        );
    }

    #[test]
    fn test_vertical_destination_is_not_clamped_by_default() {
        let cursor = Arc::new(VirtualCursor::new(Point::new(960, 1000)));
        let driver = driver(cursor);

        assert_eq!(
            driver.destination_for(Point::new(960, 1000), 0, 400),
            Point::new(960, 1400)
        );
        assert_eq!(
            driver.destination_for(Point::new(960, 10), 0, -400),
            Point::new(960, -390)
        );
    }

    #[test]
    fn test_vertical_clamp_when_enabled() {
        let cursor = Arc::new(VirtualCursor::new(Point::new(960, 1000)));
        let driver = driver(cursor).with_vertical_clamp(true);

        assert_eq!(
            driver.destination_for(Point::new(960, 1000), 0, 400),
            Point::new(960, 1080)
        );
    }

    #[test]
    fn test_move_by_reaches_clamped_destination() {
        let cursor = Arc::new(VirtualCursor::new(Point::new(1800, 540)));
        let driver = driver(Arc::clone(&cursor));

        let end = driver.move_by(500, 0, 20.0, false).unwrap();

        assert_eq!(end, Point::new(1920, 540));
        assert_eq!(cursor.current(), Point::new(1920, 540));
        assert!(cursor.event_count() > 0);
    }

    #[test]
    fn test_zero_move_emits_nothing() {
        let cursor = Arc::new(VirtualCursor::new(Point::new(300, 300)));
        let driver = driver(Arc::clone(&cursor));

        driver.move_by(0, 0, 13.0, false).unwrap();
        assert_eq!(cursor.event_count(), 0);
    }

    proptest! {
        #[test]
        fn prop_horizontal_destination_stays_on_screen(
            x in -5000i32..7000,
            y in -5000i32..7000,
            dx in -10_000i32..10_000,
            dy in -3000i32..3000,
        ) {
            let cursor = Arc::new(VirtualCursor::new(Point::new(x, y)));
            let driver = driver(cursor);

            let dest = driver.destination_for(Point::new(x, y), dx, dy);

            prop_assert!((0..=1920).contains(&dest.x));
            prop_assert_eq!(dest.x, (x + dx).clamp(0, 1920));
            prop_assert_eq!(dest.y, y + dy);
        }
    }
}
