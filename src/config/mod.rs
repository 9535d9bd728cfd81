//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - CLI arguments
//!
//! Every section and field is optional in the file; missing values take the
//! defaults of [`Config::default_config`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod types;

pub use types::{LoggingConfig, ScreenConfig};

use crate::controller::{ControllerConfig, IdleConfig};
use crate::cursor::TrajectoryConfig;
use crate::supervisor::ProducerConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    /// Screen geometry
    #[serde(default)]
    pub screen: ScreenConfig,
    /// Pointer trajectory model
    #[serde(default)]
    pub trajectory: TrajectoryConfig,
    /// Camera controller tuning
    #[serde(default)]
    pub controller: ControllerConfig,
    /// Idle behavior
    #[serde(default)]
    pub idle: IdleConfig,
    /// Producer loop
    #[serde(default)]
    pub producer: ProducerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.screen.width == 0 || self.screen.height == 0 {
            anyhow::bail!(
                "Screen size must be non-zero, got {}x{}",
                self.screen.width,
                self.screen.height
            );
        }
        if self.screen.width > i32::MAX as u32 || self.screen.height > i32::MAX as u32 {
            anyhow::bail!("Screen size out of range");
        }

        // Every step the controller uses must make a valid trajectory
        let steps = [
            ("trajectory.default_step", self.trajectory.default_step),
            ("controller.follow_step", self.controller.follow_step),
            ("idle.sweep_step", self.idle.sweep_step),
        ];
        for (name, step) in steps {
            self.trajectory
                .params_for_step(step)
                .validate()
                .with_context(|| format!("Invalid {}", name))?;
        }
        if self.trajectory.max_iterations == 0 {
            anyhow::bail!("trajectory.max_iterations must be at least 1");
        }

        if self.controller.vertical_aim_divisor == 0 {
            anyhow::bail!("controller.vertical_aim_divisor must be at least 1");
        }
        if self.controller.follow_dead_zone < 0 || self.controller.angle_dead_zone < 0 {
            anyhow::bail!("Dead zones cannot be negative");
        }
        if self.controller.follow_overhead < 0 || self.controller.angle_overhead < 0 {
            anyhow::bail!("Overheads cannot be negative");
        }
        if !(0.0..=1.0).contains(&self.controller.marker_threshold) {
            anyhow::bail!(
                "controller.marker_threshold ({}) must be between 0.0 and 1.0",
                self.controller.marker_threshold
            );
        }

        if self.idle.sweep_min > self.idle.sweep_max {
            anyhow::bail!(
                "idle.sweep_min ({}) cannot be greater than idle.sweep_max ({})",
                self.idle.sweep_min,
                self.idle.sweep_max
            );
        }

        if self.producer.target_label.trim().is_empty() {
            anyhow::bail!("producer.target_label cannot be empty");
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Invalid log level: {}", self.logging.level),
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        if let Some(width) = width {
            self.screen.width = width;
        }
        if let Some(height) = height {
            self.screen.height = height;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::IdlePolicyKind;
    use crate::macro_state::MacroState;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.screen.width, 1920);
        assert_eq!(config.screen.height, 1080);
        assert!(!config.screen.clamp_vertical);
        assert_eq!(config.trajectory.gravity, 12.0);
        assert_eq!(config.controller.follow_step, 20.0);
        assert_eq!(config.controller.angle_anchor_y, 465);
        assert_eq!(config.idle.policy, IdlePolicyKind::None);
        assert_eq!(config.producer.target_label, "vessel");
        assert_eq!(
            config.producer.suppress_targets_in,
            vec![MacroState::Repairing, MacroState::Stashing]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default_config());
    }

    #[test]
    fn test_partial_section() {
        let config: Config = toml::from_str(
            r#"
            [controller]
            follow_dead_zone = 80

            [idle]
            policy = "sweep"
            "#,
        )
        .unwrap();

        assert_eq!(config.controller.follow_dead_zone, 80);
        assert_eq!(config.controller.follow_overhead, 35);
        assert_eq!(config.idle.policy, IdlePolicyKind::Sweep);
        assert_eq!(config.idle.sweep_min, -300);
    }

    #[test]
    fn test_validation_invalid_screen() {
        let config = Config::default_config().with_overrides(Some(0), None);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_step() {
        let mut config = Config::default_config();
        config.controller.follow_step = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default_config();
        config.trajectory.wind = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_sweep_range() {
        let mut config = Config::default_config();
        config.idle.sweep_min = 100;
        config.idle.sweep_max = -100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_log_format() {
        let mut config = Config::default_config();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default_config().with_overrides(Some(2560), Some(1440));
        assert_eq!(config.screen.geometry().width, 2560);
        assert_eq!(config.screen.geometry().height, 1440);
    }
}
