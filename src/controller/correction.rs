//! Camera correction math
//!
//! Pure functions deciding how far the camera should turn. They never touch
//! the pointer; the controller feeds their output to the pointer driver.

use crate::geometry::{Rectangle, ScreenGeometry};

/// Pick the focus target from a target set
///
/// Aims at the middle of the crowd: index `n / 2`, moved one down for even
/// counts. Returns `None` for an empty set.
pub fn select_target(targets: &[Rectangle]) -> Option<&Rectangle> {
    targets.get(median_index(targets.len())?)
}

/// Index [`select_target`] uses for `n` targets
pub fn median_index(n: usize) -> Option<usize> {
    if n == 0 {
        return None;
    }
    let index = n / 2;
    Some(if n % 2 == 0 { index - 1 } else { index })
}

/// Parameters for horizontal target following
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowParams {
    /// Offsets strictly below this on both axes produce no movement
    pub dead_zone: i32,
    /// Extra pixels added in the direction of travel
    pub overhead: i32,
    /// Vertical aim point as a fraction divisor of screen height
    pub vertical_aim_divisor: u32,
}

/// Horizontal correction that brings `target` toward the aim point
///
/// The aim point is screen-center horizontally and `height / divisor`
/// vertically. Returns `None` inside the dead zone.
pub fn follow_offset(target: &Rectangle, screen: ScreenGeometry, params: FollowParams) -> Option<i32> {
    let center = target.center();
    let aim_x = screen.width as f64 / 2.0;
    let aim_y = screen.height as f64 / params.vertical_aim_divisor.max(1) as f64;

    let move_x = (center.x as f64 - aim_x) as i32;
    let move_y = (center.y as f64 - aim_y) as i32;

    if move_x.abs() < params.dead_zone && move_y.abs() < params.dead_zone {
        return None;
    }

    Some(if move_x > 0 {
        move_x + params.overhead
    } else {
        move_x - params.overhead
    })
}

/// Parameters for vertical angle correction from the player marker
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleParams {
    /// Screen row where the marker center should sit
    pub anchor_y: i32,
    /// Offsets at or below this produce no movement
    pub dead_zone: i32,
    /// Extra pixels added in the direction of correction
    pub overhead: i32,
}

/// Vertical correction that moves the player marker toward the anchor row
///
/// Positive values move the pointer down. Returns `None` inside the dead zone.
pub fn angle_offset(marker: &Rectangle, params: AngleParams) -> Option<i32> {
    let move_y = params.anchor_y - marker.center().y;

    if move_y.abs() <= params.dead_zone {
        return None;
    }

    Some(if move_y > 0 {
        move_y + params.overhead
    } else {
        move_y - params.overhead
    })
}
