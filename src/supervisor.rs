//! Producer loop and worker supervision
//!
//! The supervisor runs on the caller's thread. Every cycle it captures a
//! frame, asks the vision matcher for targets, reads the bot macro-state and
//! publishes all three to [`SharedFrameState`] in one swap.
//!
//! Failures are not retried. If the producer fails or any worker thread
//! exits, the supervisor stops every worker, joins them all and returns the
//! first error.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::capture::ScreenCapture;
use crate::controller::StopSignal;
use crate::error::Result;
use crate::macro_state::{MacroState, MacroStateSource};
use crate::state::SharedFrameState;
use crate::vision::VisionMatcher;

/// A background thread the supervisor owns
pub trait Worker: Send {
    /// Name for logging
    fn name(&self) -> &str;

    /// Request a cooperative stop
    fn stop(&self);

    /// Whether the thread has exited
    fn is_finished(&self) -> bool;

    /// Wait for the thread and return its result
    fn join(self: Box<Self>) -> Result<()>;
}

/// Producer loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProducerConfig {
    /// Pause between producer cycles (milliseconds)
    #[serde(default = "default_loop_delay_ms")]
    pub loop_delay_ms: u64,

    /// UI element label passed to the vision matcher
    #[serde(default = "default_target_label")]
    pub target_label: String,

    /// Macro-states during which no targets are published
    #[serde(default = "default_suppress_targets_in")]
    pub suppress_targets_in: Vec<MacroState>,
}

fn default_loop_delay_ms() -> u64 {
    40
}
fn default_target_label() -> String {
    "vessel".to_string()
}
fn default_suppress_targets_in() -> Vec<MacroState> {
    vec![MacroState::Repairing, MacroState::Stashing]
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            loop_delay_ms: default_loop_delay_ms(),
            target_label: default_target_label(),
            suppress_targets_in: default_suppress_targets_in(),
        }
    }
}

impl ProducerConfig {
    /// Pause between producer cycles
    pub fn loop_delay(&self) -> Duration {
        Duration::from_millis(self.loop_delay_ms)
    }
}

/// Summary of a finished supervisor run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Producer cycles completed
    pub cycles: u64,
}

/// Runs the producer loop and owns every worker
pub struct Supervisor {
    config: ProducerConfig,
    state: Arc<SharedFrameState>,
    capture: Arc<dyn ScreenCapture>,
    vision: Arc<dyn VisionMatcher>,
    macro_source: Arc<dyn MacroStateSource>,
    workers: Vec<Box<dyn Worker>>,
    stop: StopSignal,
}

impl Supervisor {
    /// Create a supervisor with no workers
    pub fn new(
        config: ProducerConfig,
        state: Arc<SharedFrameState>,
        capture: Arc<dyn ScreenCapture>,
        vision: Arc<dyn VisionMatcher>,
        macro_source: Arc<dyn MacroStateSource>,
    ) -> Self {
        Self {
            config,
            state,
            capture,
            vision,
            macro_source,
            workers: Vec::new(),
            stop: StopSignal::new(),
        }
    }

    /// Take ownership of a running worker
    pub fn add_worker(&mut self, worker: Box<dyn Worker>) {
        info!("Supervising worker '{}'", worker.name());
        self.workers.push(worker);
    }

    /// Signal that ends [`run`](Self::run) after the current cycle
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Run one producer cycle; returns the number of targets published
    pub fn produce_once(&self) -> Result<usize> {
        let frame = self.capture.grab()?;
        let macro_state = self.macro_source.current_state();

        let targets = if self.config.suppress_targets_in.contains(&macro_state) {
            Vec::new()
        } else {
            self.vision.find_targets(&frame, &self.config.target_label)?
        };

        let count = targets.len();
        debug!(
            "Producer frame {}: {} targets, state {}, player marker {:?}",
            frame.sequence,
            count,
            macro_state,
            self.state.player_marker()
        );
        self.state.publish(frame, targets, macro_state);
        Ok(count)
    }

    /// Produce until stopped, `max_cycles` is reached or something fails,
    /// then stop and join every worker
    pub fn run(mut self, max_cycles: Option<u64>) -> Result<RunSummary> {
        info!(
            "Producer loop starting (delay {:?}, label '{}')",
            self.config.loop_delay(),
            self.config.target_label
        );

        let produced = self.produce_loop(max_cycles);
        if let Err(ref e) = produced {
            error!("Producer failed: {}", e);
        }

        let joined = self.shutdown();

        let cycles = produced?;
        joined?;
        info!("Supervisor finished after {} cycles", cycles);
        Ok(RunSummary { cycles })
    }

    fn produce_loop(&self, max_cycles: Option<u64>) -> Result<u64> {
        let mut cycles = 0u64;

        while !self.stop.is_stopped() {
            if max_cycles.is_some_and(|max| cycles >= max) {
                info!("Reached cycle limit ({})", cycles);
                break;
            }

            self.produce_once()?;
            cycles += 1;

            if let Some(worker) = self.workers.iter().find(|w| w.is_finished()) {
                warn!("Worker '{}' exited, shutting down", worker.name());
                break;
            }

            if self.stop.sleep(self.config.loop_delay()) {
                break;
            }
        }

        Ok(cycles)
    }

    /// Stop every worker, join them all and return the first failure
    fn shutdown(&mut self) -> Result<()> {
        self.stop.stop();
        for worker in &self.workers {
            worker.stop();
        }

        let mut first_error = None;
        for worker in self.workers.drain(..) {
            let name = worker.name().to_string();
            match worker.join() {
                Ok(()) => debug!("Worker '{}' joined", name),
                Err(e) => {
                    error!("Worker '{}' failed: {}", name, e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
