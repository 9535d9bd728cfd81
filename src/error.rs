//! Camera Pilot Error Types
//!
//! Error handling for the capture → vision → controller → pointer pipeline.
//!
//! Absence of a target or marker is never an error: collaborators report it as
//! an empty result. Everything represented here is fatal to the run and is
//! propagated to the supervisor, which stops every worker.

use thiserror::Error;

/// Result type for camera pilot operations
pub type Result<T> = std::result::Result<T, PilotError>;

/// Camera pilot error types
#[derive(Error, Debug)]
pub enum PilotError {
    /// Screen capture collaborator failed (e.g. target window missing)
    #[error("Screen capture failed: {0}")]
    CaptureFailed(String),

    /// Cursor read or injection failed
    #[error("Pointer input failed: {0}")]
    InputFailed(String),

    /// Vision matcher failed (distinct from "nothing found")
    #[error("Vision matcher failed: {0}")]
    VisionFailed(String),

    /// Trajectory parameters out of range
    #[error("Invalid trajectory parameter {name}: {value}")]
    InvalidTrajectory {
        /// Parameter name
        name: &'static str,
        /// Offending value
        value: f64,
    },

    /// A component was configured or driven into an unusable state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A worker thread panicked
    #[error("Worker '{0}' panicked")]
    WorkerPanicked(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PilotError {
    /// Whether this error came from one of the OS-level collaborators
    /// (capture or input) rather than from the pipeline itself
    pub fn is_resource_unavailable(&self) -> bool {
        matches!(self, Self::CaptureFailed(_) | Self::InputFailed(_))
    }
}
