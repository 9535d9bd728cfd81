//! Controller policies
//!
//! Two extension seams of the camera loop:
//!
//! - [`IdlePolicy`]: what to do when no target is visible. Defaults to
//!   nothing; configuration can select a random horizontal sweep instead.
//! - [`StatePolicy`]: one hook per bot [`MacroState`], all no-ops by default,
//!   so per-state camera behavior can be added without touching the loop.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cursor::PointerDriver;
use crate::error::{PilotError, Result};
use crate::geometry::Rectangle;
use crate::macro_state::MacroState;
use crate::state::FrameSnapshot;

/// Behavior when the target set is empty
pub trait IdlePolicy: Send {
    /// Short name for logging
    fn name(&self) -> &'static str;

    /// Called once per cycle with no targets; returns whether the pointer moved
    fn on_idle(&mut self, driver: &PointerDriver) -> Result<bool>;
}

/// Leave the camera alone while idle
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIdle;

impl IdlePolicy for NoopIdle {
    fn name(&self) -> &'static str {
        "none"
    }

    fn on_idle(&mut self, _driver: &PointerDriver) -> Result<bool> {
        Ok(false)
    }
}

/// Swing the camera horizontally by a random amount to scan for targets
#[derive(Debug, Clone, Copy)]
pub struct SweepIdle {
    min: i32,
    max: i32,
    step: f64,
}

impl SweepIdle {
    /// Sweep by a uniform offset in `[min, max]` with the given step
    pub fn new(min: i32, max: i32, step: f64) -> Result<Self> {
        if min > max {
            return Err(PilotError::InvalidState(format!(
                "sweep range is empty: [{}, {}]",
                min, max
            )));
        }
        Ok(Self { min, max, step })
    }
}

impl IdlePolicy for SweepIdle {
    fn name(&self) -> &'static str {
        "sweep"
    }

    fn on_idle(&mut self, driver: &PointerDriver) -> Result<bool> {
        let offset = rand::thread_rng().gen_range(self.min..=self.max);
        debug!("Idle sweep by {}px", offset);
        driver.move_by(offset, 0, self.step, true)?;
        Ok(true)
    }
}

/// Idle policy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdlePolicyKind {
    /// Do nothing
    #[default]
    None,
    /// Random horizontal sweep
    Sweep,
}

impl std::str::FromStr for IdlePolicyKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "noop" | "off" => Ok(Self::None),
            "sweep" | "scan" => Ok(Self::Sweep),
            _ => Err(format!("Unknown idle policy: {}", s)),
        }
    }
}

/// Idle behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdleConfig {
    /// Which idle policy to run
    #[serde(default)]
    pub policy: IdlePolicyKind,

    /// Smallest sweep offset (pixels, may be negative)
    #[serde(default = "default_sweep_min")]
    pub sweep_min: i32,

    /// Largest sweep offset (pixels)
    #[serde(default = "default_sweep_max")]
    pub sweep_max: i32,

    /// Trajectory step for sweeps
    #[serde(default = "default_sweep_step")]
    pub sweep_step: f64,
}

fn default_sweep_min() -> i32 {
    -300
}
fn default_sweep_max() -> i32 {
    250
}
fn default_sweep_step() -> f64 {
    15.0
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            policy: IdlePolicyKind::default(),
            sweep_min: default_sweep_min(),
            sweep_max: default_sweep_max(),
            sweep_step: default_sweep_step(),
        }
    }
}

impl IdleConfig {
    /// Build the configured policy
    pub fn build(&self) -> Result<Box<dyn IdlePolicy>> {
        Ok(match self.policy {
            IdlePolicyKind::None => Box::new(NoopIdle),
            IdlePolicyKind::Sweep => Box::new(SweepIdle::new(
                self.sweep_min,
                self.sweep_max,
                self.sweep_step,
            )?),
        })
    }
}

/// What a per-state hook can see and drive
pub struct StateContext<'a> {
    /// Pointer driver for issuing extra corrections
    pub driver: &'a PointerDriver,
    /// Snapshot the cycle ran against
    pub snapshot: &'a FrameSnapshot,
    /// Player marker found this cycle
    pub player_marker: Option<Rectangle>,
}

/// Per-macro-state camera behavior
///
/// Every hook defaults to doing nothing.
pub trait StatePolicy: Send {
    /// Bot is starting up
    fn on_init(&mut self, _ctx: &StateContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Bot is searching for something to engage
    fn on_searching(&mut self, _ctx: &StateContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Bot is walking toward a destination
    fn on_navigating(&mut self, _ctx: &StateContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Bot is in combat
    fn on_killing(&mut self, _ctx: &StateContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Bot is repairing
    fn on_repairing(&mut self, _ctx: &StateContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Bot is stashing items
    fn on_stashing(&mut self, _ctx: &StateContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// The stock policy: no per-state behavior
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultStatePolicy;

impl StatePolicy for DefaultStatePolicy {}

/// Route a cycle to the hook for `state`
pub fn dispatch_state(
    policy: &mut dyn StatePolicy,
    state: MacroState,
    ctx: &StateContext<'_>,
) -> Result<()> {
    match state {
        MacroState::Init => policy.on_init(ctx),
        MacroState::Searching => policy.on_searching(ctx),
        MacroState::Navigating => policy.on_navigating(ctx),
        MacroState::Killing => policy.on_killing(ctx),
        MacroState::Repairing => policy.on_repairing(ctx),
        MacroState::Stashing => policy.on_stashing(ctx),
    }
}
