//! Screen capture seam
//!
//! The raw capture backend (window handle lookup, BitBlt, PipeWire, ...) lives
//! outside this crate. The pipeline only needs an opaque image plus its
//! dimensions.

use bytes::Bytes;

use crate::error::Result;

/// One captured screen image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Raw pixel data in the capture backend's format
    pub data: Bytes,
    /// Monotonic capture counter
    pub sequence: u64,
}

impl Frame {
    /// Create a frame
    pub fn new(width: u32, height: u32, data: Bytes, sequence: u64) -> Self {
        Self {
            width,
            height,
            data,
            sequence,
        }
    }

    /// Zero-sized placeholder used before the first capture arrives
    pub fn empty() -> Self {
        Self::new(0, 0, Bytes::new(), 0)
    }

    /// Whether this frame carries any pixels
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

/// Screen capture collaborator
///
/// A failure here means the capture source is gone and is fatal to the run.
pub trait ScreenCapture: Send + Sync {
    /// Grab the current screen contents
    fn grab(&self) -> Result<Frame>;
}
