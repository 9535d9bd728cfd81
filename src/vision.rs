//! Vision matcher seam
//!
//! Template matching is provided by an external collaborator. "Nothing found"
//! is an empty `Vec`, never an error.

use crate::capture::Frame;
use crate::error::Result;
use crate::geometry::Rectangle;

/// Template-matching image search
#[cfg_attr(test, mockall::automock)]
pub trait VisionMatcher: Send + Sync {
    /// Find every box matching the UI element `label`
    ///
    /// Order is matcher-defined; the controller applies its own selection.
    fn find_targets(&self, frame: &Frame, label: &str) -> Result<Vec<Rectangle>>;

    /// Find the player marker with at least `threshold` confidence
    fn find_template(&self, frame: &Frame, threshold: f32) -> Result<Vec<Rectangle>>;
}
