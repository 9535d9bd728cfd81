//! In-memory collaborators
//!
//! A virtual cursor and a synthetic scene that stand in for the OS input
//! layer, screen capture, the template matcher, and the bot state machine.
//! The scene is closed-loop: moving the virtual cursor turns the virtual
//! camera, so controller corrections show up in the next capture. Used by the
//! dry-run binary and by tests.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use crate::capture::{Frame, ScreenCapture};
use crate::cursor::CursorIo;
use crate::error::{PilotError, Result};
use crate::geometry::{Point, Rectangle, ScreenGeometry};
use crate::macro_state::{MacroState, MacroStateSource};
use crate::vision::VisionMatcher;

/// Cursor that only exists in memory and records every move
#[derive(Debug)]
pub struct VirtualCursor {
    position: Mutex<Point>,
    events: Mutex<Vec<Point>>,
}

impl VirtualCursor {
    /// Cursor resting at `start`
    pub fn new(start: Point) -> Self {
        Self {
            position: Mutex::new(start),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Current position
    pub fn current(&self) -> Point {
        *self.position.lock()
    }

    /// Number of `set_position` calls so far
    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    /// Every position written so far, oldest first
    pub fn events(&self) -> Vec<Point> {
        self.events.lock().clone()
    }
}

impl CursorIo for VirtualCursor {
    fn position(&self) -> Result<Point> {
        Ok(self.current())
    }

    fn set_position(&self, point: Point) -> Result<()> {
        *self.position.lock() = point;
        self.events.lock().push(point);
        Ok(())
    }
}

/// Synthetic game view driven by a [`VirtualCursor`]
///
/// Targets and the player marker live in world coordinates. Horizontal cursor
/// travel pans targets across the view one pixel per pixel. Vertical travel
/// moves the player marker the same direction, scaled by the tilt gain.
pub struct SimScene {
    screen: ScreenGeometry,
    cursor: Arc<VirtualCursor>,
    origin: Point,
    label: String,
    targets: Vec<Rectangle>,
    marker: Option<Rectangle>,
    tilt_gain: f64,
    states: Vec<MacroState>,
    state_period: u64,
    fail_after: Option<u64>,
    sequence: AtomicU64,
}

impl SimScene {
    /// Empty scene viewed through `cursor`'s current position
    pub fn new(screen: ScreenGeometry, cursor: Arc<VirtualCursor>) -> Self {
        let origin = cursor.current();
        Self {
            screen,
            cursor,
            origin,
            label: "vessel".to_string(),
            targets: Vec::new(),
            marker: None,
            tilt_gain: 1.0,
            states: vec![MacroState::Init],
            state_period: 1,
            fail_after: None,
            sequence: AtomicU64::new(0),
        }
    }

    /// A few targets right of center and a marker below the anchor row
    pub fn demo(screen: ScreenGeometry, cursor: Arc<VirtualCursor>) -> Self {
        let w = screen.width as i32;
        let h = screen.height as i32;
        Self::new(screen, cursor)
            .with_targets(vec![
                Rectangle::new(w / 2 + 180, h / 3 - 40, 60, 40),
                Rectangle::new(w / 2 + 320, h / 3 + 10, 60, 40),
                Rectangle::new(w / 2 + 460, h / 3 - 20, 60, 40),
            ])
            .with_marker(Rectangle::new(w / 2 - 12, 540, 24, 24))
            .with_tilt_gain(0.55)
            .with_state_schedule(
                vec![
                    MacroState::Init,
                    MacroState::Searching,
                    MacroState::Navigating,
                    MacroState::Killing,
                    MacroState::Repairing,
                    MacroState::Stashing,
                ],
                25,
            )
    }

    /// Label [`VisionMatcher::find_targets`] answers to
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Place targets in world coordinates
    pub fn with_targets(mut self, targets: Vec<Rectangle>) -> Self {
        self.targets = targets;
        self
    }

    /// Place the player marker in world coordinates
    pub fn with_marker(mut self, marker: Rectangle) -> Self {
        self.marker = Some(marker);
        self
    }

    /// Marker pixels moved per pixel of vertical cursor travel
    pub fn with_tilt_gain(mut self, gain: f64) -> Self {
        self.tilt_gain = gain;
        self
    }

    /// Cycle through `states`, advancing every `period` captures
    pub fn with_state_schedule(mut self, states: Vec<MacroState>, period: u64) -> Self {
        if !states.is_empty() {
            self.states = states;
        }
        self.state_period = period.max(1);
        self
    }

    /// Make the capture after the first `captures` fail
    pub fn with_capture_failure_after(mut self, captures: u64) -> Self {
        self.fail_after = Some(captures);
        self
    }

    /// Captures taken so far
    pub fn captures(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    fn view_offset(&self) -> (i32, i32) {
        let current = self.cursor.current();
        (current.x - self.origin.x, current.y - self.origin.y)
    }

    fn visible(&self, rect: &Rectangle) -> bool {
        let right = rect.x as i64 + rect.width as i64;
        let bottom = rect.y as i64 + rect.height as i64;
        right > 0
            && bottom > 0
            && (rect.x as i64) < self.screen.width as i64
            && (rect.y as i64) < self.screen.height as i64
    }
}

impl ScreenCapture for SimScene {
    fn grab(&self) -> Result<Frame> {
        let taken = self.sequence.load(Ordering::SeqCst);
        if let Some(limit) = self.fail_after {
            if taken >= limit {
                return Err(PilotError::CaptureFailed(
                    "simulated window disappeared".to_string(),
                ));
            }
        }

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("Simulated capture {}", sequence);

        // Synthetic frames carry only their sequence number as pixel data
        Ok(Frame::new(
            self.screen.width,
            self.screen.height,
            Bytes::from(sequence.to_le_bytes().to_vec()),
            sequence,
        ))
    }
}

impl VisionMatcher for SimScene {
    fn find_targets(&self, _frame: &Frame, label: &str) -> Result<Vec<Rectangle>> {
        if label != self.label {
            return Ok(Vec::new());
        }
        let (dx, _) = self.view_offset();
        Ok(self
            .targets
            .iter()
            .map(|t| Rectangle::new(t.x - dx, t.y, t.width, t.height))
            .filter(|t| self.visible(t))
            .collect())
    }

    fn find_template(&self, _frame: &Frame, threshold: f32) -> Result<Vec<Rectangle>> {
        if threshold > 1.0 {
            return Ok(Vec::new());
        }
        let (_, dy) = self.view_offset();
        let shift = (dy as f64 * self.tilt_gain).round() as i32;
        Ok(self
            .marker
            .iter()
            .map(|m| Rectangle::new(m.x, m.y + shift, m.width, m.height))
            .filter(|m| self.visible(m))
            .collect())
    }
}

impl MacroStateSource for SimScene {
    fn current_state(&self) -> MacroState {
        let sequence = self.sequence.load(Ordering::SeqCst);
        let index = (sequence / self.state_period) as usize % self.states.len();
        self.states[index]
    }
}
