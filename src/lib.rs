//! # camera-pilot
//!
//! Automated camera operator for a real-time 3D game. Watches a continuously
//! refreshed screen capture, locates points of interest and the player's
//! on-screen marker, and turns the camera with smoothed, human-like pointer
//! movement.
//!
//! Screen capture, template matching, OS cursor access, and the bot's state
//! machine are external collaborators behind traits ([`capture::ScreenCapture`],
//! [`vision::VisionMatcher`], [`cursor::CursorIo`],
//! [`macro_state::MacroStateSource`]). The [`sim`] module implements all of
//! them in memory.
//!
//! # Architecture
//!
//! ```text
//! camera-pilot
//!   ├─> Supervisor (producer loop, caller's thread)
//!   │     capture ─> vision ─> macro-state ─> SharedFrameState::publish
//!   └─> CameraController ("camera-controller" thread)
//!         SharedFrameState::snapshot ─> correction math ─> PointerDriver
//!                                                            └─> Trajectory ─> CursorIo
//! ```
//!
//! # Failure Model
//!
//! Nothing found is an empty result. Any error (capture, input, vision, or a
//! worker panic) stops every worker; the supervisor returns the first error.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Screen capture seam and frame type
pub mod capture;

/// Configuration loading and validation
pub mod config;

/// Camera controller thread, correction math, and policies
pub mod controller;

/// Stochastic pointer trajectories and the pointer driver
pub mod cursor;

/// Error types
pub mod error;

/// Points, rectangles, and screen geometry
pub mod geometry;

/// Bot macro-state
pub mod macro_state;

/// In-memory collaborators for dry runs and tests
pub mod sim;

/// Frame state shared between producer and controller
pub mod state;

/// Producer loop and worker supervision
pub mod supervisor;

/// Vision matcher seam
pub mod vision;

pub use config::Config;
pub use controller::{CameraController, ControllerConfig, ControllerHandle, StopSignal};
pub use cursor::{CursorIo, PointerDriver, Trajectory, TrajectoryConfig, TrajectoryParams};
pub use error::{PilotError, Result};
pub use geometry::{Point, Rectangle, ScreenGeometry};
pub use macro_state::{MacroState, MacroStateSource};
pub use state::{FrameSnapshot, SharedFrameState};
pub use supervisor::{ProducerConfig, RunSummary, Supervisor, Worker};
