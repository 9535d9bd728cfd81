//! Shared frame state
//!
//! The record the producer writes and the camera controller reads: latest
//! frame, detected targets, bot macro-state, plus the controller's own player
//! marker detection.
//!
//! # Consistency
//!
//! Frame, targets, and macro-state live in one immutable [`FrameSnapshot`]
//! behind a single lock. Writers replace the whole `Arc` and readers clone it,
//! so the lock is only held for a pointer swap:
//!
//! - [`SharedFrameState::publish`] replaces all three fields at once; a reader
//!   of [`SharedFrameState::snapshot`] always sees a triple from one producer
//!   cycle.
//! - The per-field setters copy the current snapshot and swap one field. Each
//!   field stays intact, but a reader may combine fields from different cycles.
//!
//! The player marker is written by the controller and read by the producer.
//! It has its own lock so it never blocks frame publication.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::trace;

use crate::capture::Frame;
use crate::geometry::Rectangle;
use crate::macro_state::MacroState;

/// One consistent view of the producer's output
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    /// Latest captured frame
    pub frame: Arc<Frame>,
    /// Targets detected in that frame
    pub targets: Arc<[Rectangle]>,
    /// Bot macro-state at publish time
    pub macro_state: MacroState,
    /// Incremented on every write
    pub revision: u64,
}

impl Default for FrameSnapshot {
    fn default() -> Self {
        Self {
            frame: Arc::new(Frame::empty()),
            targets: Arc::from(Vec::new()),
            macro_state: MacroState::default(),
            revision: 0,
        }
    }
}

/// State shared between the producer loop and the camera controller
#[derive(Debug, Default)]
pub struct SharedFrameState {
    snapshot: Mutex<Arc<FrameSnapshot>>,
    player_marker: RwLock<Option<Rectangle>>,
}

impl SharedFrameState {
    /// Create empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace frame, targets, and macro-state in one swap
    pub fn publish(&self, frame: Frame, targets: Vec<Rectangle>, macro_state: MacroState) {
        let frame = Arc::new(frame);
        let targets: Arc<[Rectangle]> = Arc::from(targets);

        let mut guard = self.snapshot.lock();
        let revision = guard.revision + 1;
        *guard = Arc::new(FrameSnapshot {
            frame,
            targets,
            macro_state,
            revision,
        });
        trace!("Published frame state revision {}", revision);
    }

    /// Replace the frame only
    pub fn set_frame(&self, frame: Frame) {
        let frame = Arc::new(frame);
        self.update(|snapshot| snapshot.frame = frame);
    }

    /// Replace the target set only
    pub fn set_targets(&self, targets: Vec<Rectangle>) {
        let targets: Arc<[Rectangle]> = Arc::from(targets);
        self.update(|snapshot| snapshot.targets = targets);
    }

    /// Replace the macro-state only
    pub fn set_macro_state(&self, macro_state: MacroState) {
        self.update(|snapshot| snapshot.macro_state = macro_state);
    }

    /// Latest consistent snapshot
    pub fn snapshot(&self) -> Arc<FrameSnapshot> {
        Arc::clone(&self.snapshot.lock())
    }

    /// Latest frame
    pub fn frame(&self) -> Arc<Frame> {
        Arc::clone(&self.snapshot.lock().frame)
    }

    /// Latest target set
    pub fn targets(&self) -> Arc<[Rectangle]> {
        Arc::clone(&self.snapshot.lock().targets)
    }

    /// Latest macro-state
    pub fn macro_state(&self) -> MacroState {
        self.snapshot.lock().macro_state
    }

    /// Record the controller's latest player marker detection
    pub fn set_player_marker(&self, marker: Option<Rectangle>) {
        *self.player_marker.write() = marker;
    }

    /// Controller's latest player marker detection
    pub fn player_marker(&self) -> Option<Rectangle> {
        *self.player_marker.read()
    }

    fn update<F>(&self, apply: F)
    where
        F: FnOnce(&mut FrameSnapshot),
    {
        let mut guard = self.snapshot.lock();
        let mut next = FrameSnapshot::clone(&guard);
        apply(&mut next);
        next.revision += 1;
        *guard = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use std::thread;

    fn frame(sequence: u64) -> Frame {
        Frame::new(4, 4, Bytes::from(vec![sequence as u8; 64]), sequence)
    }

    #[test]
    fn test_initial_state_is_empty() {
        let state = SharedFrameState::new();
        assert!(state.frame().is_empty());
        assert!(state.targets().is_empty());
        assert_eq!(state.macro_state(), MacroState::Init);
        assert_eq!(state.player_marker(), None);
    }

    #[test]
    fn test_per_field_setters() {
        let state = SharedFrameState::new();
        state.set_frame(frame(3));
        state.set_targets(vec![Rectangle::new(1, 2, 3, 4)]);
        state.set_macro_state(MacroState::Killing);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.frame.sequence, 3);
        assert_eq!(&*snapshot.targets, &[Rectangle::new(1, 2, 3, 4)]);
        assert_eq!(snapshot.macro_state, MacroState::Killing);
        assert_eq!(snapshot.revision, 3);
    }

    #[test]
    fn test_publish_replaces_all_fields() {
        let state = SharedFrameState::new();
        state.publish(frame(1), vec![Rectangle::new(0, 0, 10, 10)], MacroState::Searching);

        let before = state.snapshot();
        state.publish(frame(2), vec![], MacroState::Navigating);
        let after = state.snapshot();

        // Earlier readers keep their own consistent view
        assert_eq!(before.frame.sequence, 1);
        assert_eq!(before.targets.len(), 1);
        assert_eq!(before.macro_state, MacroState::Searching);

        assert_eq!(after.frame.sequence, 2);
        assert!(after.targets.is_empty());
        assert_eq!(after.macro_state, MacroState::Navigating);
    }

    #[test]
    fn test_player_marker_round_trip() {
        let state = SharedFrameState::new();
        state.set_player_marker(Some(Rectangle::new(950, 460, 20, 20)));
        assert_eq!(state.player_marker(), Some(Rectangle::new(950, 460, 20, 20)));
        state.set_player_marker(None);
        assert_eq!(state.player_marker(), None);
    }

    #[test]
    fn test_concurrent_writers_never_tear_fields() {
        let state = Arc::new(SharedFrameState::new());
        let mut handles = Vec::new();

        for writer in 0..4u32 {
            let state = Arc::clone(&state);
            handles.push(thread::spawn(move || {
                for i in 0..500u32 {
                    let n = (writer * 1000 + i) as i32;
                    // Every rectangle in a set carries the same marker value
                    state.set_targets(vec![Rectangle::new(n, n, n as u32, n as u32); 3]);
                    state.set_frame(frame(n as u64));
                    state.set_macro_state(MacroState::ALL[(i % 6) as usize]);
                    state.set_player_marker(Some(Rectangle::new(n, n, 1, 1)));
                }
            }));
        }

        for _ in 0..2 {
            let state = Arc::clone(&state);
            handles.push(thread::spawn(move || {
                for _ in 0..2000 {
                    let snapshot = state.snapshot();
                    if let Some(first) = snapshot.targets.first() {
                        assert!(snapshot.targets.iter().all(|r| r == first));
                        assert_eq!(first.x as u32, first.width);
                    }
                    let f = &snapshot.frame;
                    if !f.is_empty() {
                        assert!(f.data.iter().all(|b| *b == f.sequence as u8));
                    }
                    if let Some(marker) = state.player_marker() {
                        assert_eq!(marker.x, marker.y);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        // 4 writers * 500 iterations * 3 snapshot setters
        assert_eq!(state.snapshot().revision, 6000);
    }
}
