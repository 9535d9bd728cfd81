//! Pointer motion
//!
//! Human-like pointer movement for camera control.
//!
//! # Architecture
//!
//! ```text
//! CameraController
//!   └─> PointerDriver::move_by(dx, dy, step)
//!       ├─> CursorIo::position()          (current position)
//!       ├─> clamp destination x to screen
//!       └─> Trajectory (gravity + wind model)
//!           └─> CursorIo::set_position()  (once per whole-pixel step)
//! ```

mod driver;
mod trajectory;

pub use driver::{CursorIo, PointerDriver};
pub use trajectory::{
    plan, Regime, StepState, Trajectory, TrajectoryConfig, TrajectoryParams,
};
