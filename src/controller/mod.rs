//! Camera controller
//!
//! Background thread that keeps the game camera pointed at the action. Each
//! cycle it reads the latest [`FrameSnapshot`] and:
//!
//! 1. turns horizontally toward the median target, or runs the idle policy
//!    when there is nothing to look at;
//! 2. re-detects the player marker in the freshest frame and pitches the
//!    camera so the marker sits on the anchor row;
//! 3. hands the cycle to the per-macro-state hook.
//!
//! # Lifecycle
//!
//! ```text
//! spawn() ──> warm-up ──> cycle ──> cycle ──> ... ──> stopped
//!                 │                    │
//!                 └──── StopSignal ────┘  (checked at the top of every cycle,
//!                                          wakes warm-up and settle sleeps)
//! ```
//!
//! A trajectory already in flight always completes. Any error ends the thread
//! with that error; [`ControllerHandle::join`] hands it back to the caller.

mod correction;
mod policy;

pub use correction::{
    angle_offset, follow_offset, median_index, select_target, AngleParams, FollowParams,
};
pub use policy::{
    dispatch_state, DefaultStatePolicy, IdleConfig, IdlePolicy, IdlePolicyKind, NoopIdle,
    StateContext, StatePolicy, SweepIdle,
};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, trace};

use crate::cursor::PointerDriver;
use crate::error::{PilotError, Result};
use crate::geometry::Rectangle;
use crate::macro_state::MacroState;
use crate::state::{FrameSnapshot, SharedFrameState};
use crate::supervisor::Worker;
use crate::vision::VisionMatcher;

/// Name of the controller thread
pub const CONTROLLER_THREAD_NAME: &str = "camera-controller";

/// Camera controller tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControllerConfig {
    /// Delay before the first cycle (milliseconds)
    #[serde(default = "default_warmup_ms")]
    pub warmup_ms: u64,

    /// Pause after a follow correction (milliseconds)
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Pause at the end of every cycle (milliseconds, 0 disables)
    #[serde(default = "default_cycle_delay_ms")]
    pub cycle_delay_ms: u64,

    /// Follow dead zone in pixels
    #[serde(default = "default_follow_dead_zone")]
    pub follow_dead_zone: i32,

    /// Follow overhead in pixels
    #[serde(default = "default_follow_overhead")]
    pub follow_overhead: i32,

    /// Trajectory step for follow corrections
    #[serde(default = "default_follow_step")]
    pub follow_step: f64,

    /// Vertical aim point is `screen_height / vertical_aim_divisor`
    #[serde(default = "default_vertical_aim_divisor")]
    pub vertical_aim_divisor: u32,

    /// Minimum confidence for the player marker template
    #[serde(default = "default_marker_threshold")]
    pub marker_threshold: f32,

    /// Screen row the player marker should sit on
    #[serde(default = "default_angle_anchor_y")]
    pub angle_anchor_y: i32,

    /// Angle dead zone in pixels
    #[serde(default = "default_angle_dead_zone")]
    pub angle_dead_zone: i32,

    /// Angle overhead in pixels
    #[serde(default = "default_angle_overhead")]
    pub angle_overhead: i32,
}

fn default_warmup_ms() -> u64 {
    1000
}
fn default_settle_ms() -> u64 {
    300
}
fn default_cycle_delay_ms() -> u64 {
    40
}
fn default_follow_dead_zone() -> i32 {
    50
}
fn default_follow_overhead() -> i32 {
    35
}
fn default_follow_step() -> f64 {
    20.0
}
fn default_vertical_aim_divisor() -> u32 {
    3
}
fn default_marker_threshold() -> f32 {
    0.8
}
fn default_angle_anchor_y() -> i32 {
    465
}
fn default_angle_dead_zone() -> i32 {
    4
}
fn default_angle_overhead() -> i32 {
    70
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            warmup_ms: default_warmup_ms(),
            settle_ms: default_settle_ms(),
            cycle_delay_ms: default_cycle_delay_ms(),
            follow_dead_zone: default_follow_dead_zone(),
            follow_overhead: default_follow_overhead(),
            follow_step: default_follow_step(),
            vertical_aim_divisor: default_vertical_aim_divisor(),
            marker_threshold: default_marker_threshold(),
            angle_anchor_y: default_angle_anchor_y(),
            angle_dead_zone: default_angle_dead_zone(),
            angle_overhead: default_angle_overhead(),
        }
    }
}

impl ControllerConfig {
    /// Follow correction parameters
    pub fn follow_params(&self) -> FollowParams {
        FollowParams {
            dead_zone: self.follow_dead_zone,
            overhead: self.follow_overhead,
            vertical_aim_divisor: self.vertical_aim_divisor,
        }
    }

    /// Angle correction parameters
    pub fn angle_params(&self) -> AngleParams {
        AngleParams {
            anchor_y: self.angle_anchor_y,
            dead_zone: self.angle_dead_zone,
            overhead: self.angle_overhead,
        }
    }

    /// Warm-up delay
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }

    /// Settle delay after a follow correction
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// End-of-cycle delay
    pub fn cycle_delay(&self) -> Duration {
        Duration::from_millis(self.cycle_delay_ms)
    }
}

/// Cooperative stop flag whose sleeps wake as soon as it is raised
#[derive(Debug, Clone)]
pub struct StopSignal {
    inner: Arc<StopInner>,
}

#[derive(Debug)]
struct StopInner {
    stopped: AtomicBool,
    // Dropping the sender disconnects `wake_rx` and wakes every sleeper
    wake_tx: Mutex<Option<Sender<()>>>,
    wake_rx: Receiver<()>,
}

impl StopSignal {
    /// Create a signal in the running state
    pub fn new() -> Self {
        let (wake_tx, wake_rx) = bounded(0);
        Self {
            inner: Arc::new(StopInner {
                stopped: AtomicBool::new(false),
                wake_tx: Mutex::new(Some(wake_tx)),
                wake_rx,
            }),
        }
    }

    /// Raise the flag. Idempotent.
    pub fn stop(&self) {
        if !self.inner.stopped.swap(true, Ordering::SeqCst) {
            self.inner.wake_tx.lock().take();
        }
    }

    /// Whether [`stop`](Self::stop) has been called
    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` or until stopped
    ///
    /// Returns `true` if the signal was raised.
    pub fn sleep(&self, duration: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        if duration.is_zero() {
            return false;
        }
        match self.inner.wake_rx.recv_timeout(duration) {
            Err(RecvTimeoutError::Timeout) => self.is_stopped(),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// What one controller cycle did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Snapshot revision the cycle started from
    pub revision: u64,
    /// Macro-state dispatched to
    pub macro_state: MacroState,
    /// Horizontal follow correction issued
    pub follow: Option<i32>,
    /// Whether the idle policy moved the pointer
    pub idle_moved: bool,
    /// Player marker detected this cycle
    pub marker: Option<Rectangle>,
    /// Vertical angle correction issued
    pub angle: Option<i32>,
    /// Stop was raised mid-cycle and the rest of the cycle skipped
    pub interrupted: bool,
}

/// The camera controller
pub struct CameraController {
    config: ControllerConfig,
    state: Arc<SharedFrameState>,
    vision: Arc<dyn VisionMatcher>,
    driver: PointerDriver,
    idle: Box<dyn IdlePolicy>,
    state_policy: Box<dyn StatePolicy>,
}

impl CameraController {
    /// Create a controller with no idle behavior and no per-state hooks
    pub fn new(
        config: ControllerConfig,
        state: Arc<SharedFrameState>,
        vision: Arc<dyn VisionMatcher>,
        driver: PointerDriver,
    ) -> Self {
        Self {
            config,
            state,
            vision,
            driver,
            idle: Box::new(NoopIdle),
            state_policy: Box::new(DefaultStatePolicy),
        }
    }

    /// Replace the idle policy
    pub fn with_idle_policy(mut self, idle: Box<dyn IdlePolicy>) -> Self {
        self.idle = idle;
        self
    }

    /// Replace the per-state policy
    pub fn with_state_policy(mut self, state_policy: Box<dyn StatePolicy>) -> Self {
        self.state_policy = state_policy;
        self
    }

    /// Controller configuration
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Run a single cycle against the current shared state
    pub fn run_cycle(&mut self, stop: &StopSignal) -> Result<CycleReport> {
        let snapshot = self.state.snapshot();
        let mut report = CycleReport {
            revision: snapshot.revision,
            macro_state: snapshot.macro_state,
            ..Default::default()
        };

        match select_target(&snapshot.targets) {
            Some(target) => {
                let offset =
                    follow_offset(target, self.driver.screen(), self.config.follow_params());
                if let Some(dx) = offset {
                    debug!("Following target {:?}: dx={}", target, dx);
                    self.driver.move_by(dx, 0, self.config.follow_step, true)?;
                    report.follow = Some(dx);

                    if stop.sleep(self.config.settle()) {
                        report.interrupted = true;
                        return Ok(report);
                    }
                } else {
                    trace!("Target {:?} inside dead zone", target);
                }
            }
            None => {
                report.idle_moved = self.idle.on_idle(&self.driver)?;
            }
        }

        // The follow move and settle take time; look at the freshest frame
        let current = self.state.snapshot();
        let marker = self.find_player_marker(&current)?;
        self.state.set_player_marker(marker);
        report.marker = marker;

        if let Some(marker) = marker {
            if let Some(dy) = angle_offset(&marker, self.config.angle_params()) {
                debug!("Adjusting angle from marker {:?}: dy={}", marker, dy);
                self.driver.move_by_default(0, dy)?;
                report.angle = Some(dy);
            }
        }

        let ctx = StateContext {
            driver: &self.driver,
            snapshot: &current,
            player_marker: marker,
        };
        dispatch_state(self.state_policy.as_mut(), current.macro_state, &ctx)?;

        Ok(report)
    }

    fn find_player_marker(&self, snapshot: &FrameSnapshot) -> Result<Option<Rectangle>> {
        if snapshot.frame.is_empty() {
            return Ok(None);
        }
        let found = self
            .vision
            .find_template(&snapshot.frame, self.config.marker_threshold)?;
        Ok(found.first().copied())
    }

    /// Warm up, then cycle until `stop` is raised or a cycle fails
    pub fn run_loop(&mut self, stop: &StopSignal) -> Result<()> {
        info!(
            "Camera controller starting (warm-up {:?}, idle policy '{}')",
            self.config.warmup(),
            self.idle.name()
        );

        if stop.sleep(self.config.warmup()) {
            info!("Camera controller stopped during warm-up");
            return Ok(());
        }

        let mut cycles: u64 = 0;
        while !stop.is_stopped() {
            let report = self.run_cycle(stop)?;
            cycles += 1;
            trace!("Cycle {} complete: {:?}", cycles, report);

            if stop.sleep(self.config.cycle_delay()) {
                break;
            }
        }

        info!("Camera controller stopped after {} cycles", cycles);
        Ok(())
    }

    /// Move the controller onto its own thread
    pub fn spawn(mut self) -> Result<ControllerHandle> {
        let stop = StopSignal::new();
        let thread_stop = stop.clone();
        let (done_tx, done_rx) = bounded::<()>(0);

        let thread = thread::Builder::new()
            .name(CONTROLLER_THREAD_NAME.to_string())
            .spawn(move || {
                let result = self.run_loop(&thread_stop);
                if let Err(ref e) = result {
                    error!("Camera controller failed: {}", e);
                }
                // Release the driver and collaborators before reporting done
                drop(self);
                drop(done_tx);
                result
            })?;

        info!("Camera controller thread started");

        Ok(ControllerHandle {
            stop,
            done_rx,
            thread: Some(thread),
        })
    }
}

/// Owner handle for a running controller thread
///
/// Dropping the handle stops the controller and joins the thread.
pub struct ControllerHandle {
    stop: StopSignal,
    done_rx: Receiver<()>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl ControllerHandle {
    /// Ask the controller to stop after the current trajectory
    pub fn stop(&self) {
        debug!("Stopping camera controller");
        self.stop.stop();
    }

    /// The controller's stop signal
    pub fn stop_signal(&self) -> &StopSignal {
        &self.stop
    }

    /// Whether the thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Block until the control loop exits or `timeout` passes
    ///
    /// Returns `true` once the loop has returned and the controller, with its
    /// driver and collaborators, has been dropped. The thread itself may still
    /// be unwinding; [`join`](Self::join) collects its result.
    pub fn wait_stopped(&self, timeout: Duration) -> bool {
        if self.thread.is_none() {
            return true;
        }
        matches!(
            self.done_rx.recv_timeout(timeout),
            Err(RecvTimeoutError::Disconnected)
        )
    }

    /// Wait for the thread and return its result
    pub fn join(mut self) -> Result<()> {
        self.join_inner()
    }

    fn join_inner(&mut self) -> Result<()> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };
        match thread.join() {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Camera controller thread panicked: {}", message);
                Err(PilotError::WorkerPanicked(CONTROLLER_THREAD_NAME.to_string()))
            }
        }
    }
}

impl Worker for ControllerHandle {
    fn name(&self) -> &str {
        CONTROLLER_THREAD_NAME
    }

    fn stop(&self) {
        ControllerHandle::stop(self);
    }

    fn is_finished(&self) -> bool {
        ControllerHandle::is_finished(self)
    }

    fn join(self: Box<Self>) -> Result<()> {
        ControllerHandle::join(*self)
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.stop.stop();
            let _ = self.join_inner();
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
