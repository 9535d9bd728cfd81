//! Configuration type definitions
//!
//! Sections owned by a single subsystem live next to that subsystem
//! ([`TrajectoryConfig`](crate::cursor::TrajectoryConfig),
//! [`ControllerConfig`](crate::controller::ControllerConfig),
//! [`IdleConfig`](crate::controller::IdleConfig),
//! [`ProducerConfig`](crate::supervisor::ProducerConfig)). The shared ones are
//! here.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::geometry::ScreenGeometry;

/// Screen configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenConfig {
    /// Screen width in pixels
    #[serde(default = "default_width")]
    pub width: u32,

    /// Screen height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    /// Clamp pointer destinations vertically as well as horizontally
    #[serde(default)]
    pub clamp_vertical: bool,
}

fn default_width() -> u32 {
    1920
}
fn default_height() -> u32 {
    1080
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            clamp_vertical: false,
        }
    }
}

impl ScreenConfig {
    /// Geometry used for clamping and aim points
    pub fn geometry(&self) -> ScreenGeometry {
        ScreenGeometry::new(self.width, self.height)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    #[serde(default = "default_format")]
    pub format: String,

    /// Log file (None = console only)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}
fn default_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
            file: None,
        }
    }
}
