//! Stochastic Pointer Trajectory
//!
//! Generates a human-looking sequence of pointer positions between two points.
//! The motion model treats the pointer as a particle pulled toward the
//! destination by a constant "gravity" while being pushed around by a damped
//! random "wind".
//!
//! # Physics Model
//!
//! ```text
//! wind     = wind / √3 + U[-1, 1) * min(W, dist) / √5     (dist >= D)
//! wind     = wind / √3                                    (dist <  D)
//! velocity = velocity + wind + G * (dest - pos) / dist
//! |velocity| > M  =>  |velocity| := U[M/2, M]
//! pos      = pos + velocity
//! ```
//!
//! Far from the destination (`dist >= D`) the wind keeps injecting noise, so
//! the path wanders. Inside `D` the wind only decays and the step cap `M`
//! shrinks every step, so the particle commits to the approach.
//!
//! Internal state is `f64`; only emitted positions are rounded to whole
//! pixels, and sub-pixel movement produces no event.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use tracing::{trace, warn};

use crate::error::{PilotError, Result};
use crate::geometry::Point;

const SQRT_3: f64 = 1.732_050_807_568_877_2;
const SQRT_5: f64 = 2.236_067_977_499_79;

/// Step cap below which the converging regime re-rolls a fresh cap
const MIN_STEP_BEFORE_REROLL: f64 = 3.0;

/// Configuration for trajectory generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrajectoryConfig {
    /// Gravitational pull toward the destination (G)
    #[serde(default = "default_gravity")]
    pub gravity: f64,

    /// Magnitude of wind fluctuations (W)
    #[serde(default = "default_wind")]
    pub wind: f64,

    /// Step used when a caller does not choose one; becomes both M and D
    #[serde(default = "default_step")]
    pub default_step: f64,

    /// Delay between emitted events in microseconds (0 = no pacing)
    #[serde(default = "default_pacing_us")]
    pub pacing_us: u64,

    /// Hard cap on physics steps per trajectory
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

fn default_gravity() -> f64 {
    12.0
}
fn default_wind() -> f64 {
    3.0
}
fn default_step() -> f64 {
    13.0
}
fn default_pacing_us() -> u64 {
    10
}
fn default_max_iterations() -> usize {
    10_000
}

impl Default for TrajectoryConfig {
    fn default() -> Self {
        Self {
            gravity: default_gravity(),
            wind: default_wind(),
            default_step: default_step(),
            pacing_us: default_pacing_us(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl TrajectoryConfig {
    /// Parameters for a move with the given step (used as both M and D)
    pub fn params_for_step(&self, step: f64) -> TrajectoryParams {
        TrajectoryParams {
            gravity: self.gravity,
            wind: self.wind,
            max_step: step,
            damping_distance: step,
        }
    }

    /// Pacing delay between emitted events, if any
    pub fn pacing(&self) -> Option<Duration> {
        (self.pacing_us > 0).then(|| Duration::from_micros(self.pacing_us))
    }
}

/// Tuning constants for a single trajectory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryParams {
    /// Gravitational magnitude (G)
    pub gravity: f64,
    /// Wind magnitude (W)
    pub wind: f64,
    /// Maximum step magnitude (M)
    pub max_step: f64,
    /// Distance at which wandering turns into damped convergence (D)
    pub damping_distance: f64,
}

impl TrajectoryParams {
    /// Check that every constant is finite and strictly positive
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("gravity", self.gravity),
            ("wind", self.wind),
            ("max_step", self.max_step),
            ("damping_distance", self.damping_distance),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(PilotError::InvalidTrajectory { name, value });
            }
        }
        Ok(())
    }
}

impl Default for TrajectoryParams {
    fn default() -> Self {
        TrajectoryConfig::default().params_for_step(default_step())
    }
}

/// Which half of the motion model produced a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime {
    /// Far from the destination: wind keeps injecting noise
    Wander,
    /// Inside the damping distance: wind decays and the step cap shrinks
    Converge,
}

/// Internal state after one physics step
#[derive(Debug, Clone, Copy)]
pub struct StepState {
    /// Distance to destination measured at the start of the step
    pub distance: f64,
    /// Regime used for this step
    pub regime: Regime,
    /// Wind after the update
    pub wind: (f64, f64),
    /// Velocity after clipping
    pub velocity: (f64, f64),
    /// Step cap after the update
    pub max_step: f64,
    /// Unrounded position after integration
    pub position: (f64, f64),
    /// Whole-pixel position emitted by this step, if it moved a pixel
    pub emitted: Option<Point>,
}

impl StepState {
    /// Magnitude of the wind vector
    pub fn wind_magnitude(&self) -> f64 {
        self.wind.0.hypot(self.wind.1)
    }
}

/// Stochastic trajectory generator
///
/// Iterating yields every whole-pixel position the pointer should visit, in
/// order. The last yielded position is always the destination itself unless
/// the destination equals the start, in which case nothing is yielded.
pub struct Trajectory<R: Rng> {
    params: TrajectoryParams,
    rng: R,
    destination: Point,
    target: (f64, f64),
    position: (f64, f64),
    velocity: (f64, f64),
    wind: (f64, f64),
    max_step: f64,
    last_emitted: Point,
    iterations: usize,
    max_iterations: usize,
    capped: bool,
    snapped: bool,
}

impl<R: Rng> Trajectory<R> {
    /// Create a trajectory from `start` to `destination`
    pub fn new(start: Point, destination: Point, params: TrajectoryParams, rng: R) -> Result<Self> {
        params.validate()?;

        Ok(Self {
            max_step: params.max_step,
            params,
            rng,
            destination,
            target: (destination.x as f64, destination.y as f64),
            position: (start.x as f64, start.y as f64),
            velocity: (0.0, 0.0),
            wind: (0.0, 0.0),
            last_emitted: start,
            iterations: 0,
            max_iterations: default_max_iterations(),
            capped: false,
            snapped: false,
        })
    }

    /// Override the physics step cap
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Last emitted whole-pixel position
    pub fn current(&self) -> Point {
        self.last_emitted
    }

    /// Destination of this trajectory
    pub fn destination(&self) -> Point {
        self.destination
    }

    /// Physics steps taken so far
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether the iteration cap ended the walk short of the destination
    pub fn capped(&self) -> bool {
        self.capped
    }

    /// Advance the simulation by one physics step
    ///
    /// Returns `None` once the unrounded position is within one pixel of the
    /// destination or the iteration cap is reached.
    pub fn step(&mut self) -> Option<StepState> {
        let dx = self.target.0 - self.position.0;
        let dy = self.target.1 - self.position.1;
        let distance = dx.hypot(dy);

        if distance < 1.0 {
            return None;
        }
        if self.iterations >= self.max_iterations {
            if !self.capped {
                self.capped = true;
                warn!(
                    "Trajectory hit the {}-step cap {:.0}px from {:?}, snapping to destination",
                    self.max_iterations, distance, self.destination
                );
            }
            return None;
        }
        self.iterations += 1;

        let regime = if distance >= self.params.damping_distance {
            Regime::Wander
        } else {
            Regime::Converge
        };

        match regime {
            Regime::Wander => {
                let gust = self.params.wind.min(distance) / SQRT_5;
                self.wind.0 = self.wind.0 / SQRT_3 + self.rng.gen_range(-1.0..1.0) * gust;
                self.wind.1 = self.wind.1 / SQRT_3 + self.rng.gen_range(-1.0..1.0) * gust;
            }
            Regime::Converge => {
                self.wind.0 /= SQRT_3;
                self.wind.1 /= SQRT_3;
                if self.max_step < MIN_STEP_BEFORE_REROLL {
                    self.max_step = self.rng.gen_range(3.0..6.0);
                } else {
                    self.max_step /= SQRT_5;
                }
            }
        }

        self.velocity.0 += self.wind.0 + self.params.gravity * dx / distance;
        self.velocity.1 += self.wind.1 + self.params.gravity * dy / distance;

        let speed = self.velocity.0.hypot(self.velocity.1);
        if speed > self.max_step {
            let clipped = self.max_step / 2.0 + self.rng.gen::<f64>() * self.max_step / 2.0;
            self.velocity.0 = self.velocity.0 / speed * clipped;
            self.velocity.1 = self.velocity.1 / speed * clipped;
        }

        self.position.0 += self.velocity.0;
        self.position.1 += self.velocity.1;

        let rounded = Point::new(self.position.0.round() as i32, self.position.1.round() as i32);
        let emitted = if rounded != self.last_emitted {
            self.last_emitted = rounded;
            Some(rounded)
        } else {
            None
        };

        trace!(
            "Trajectory step {}: dist={:.2}, regime={:?}, vel=({:.2}, {:.2}), cap={:.2}, emit={:?}",
            self.iterations,
            distance,
            regime,
            self.velocity.0,
            self.velocity.1,
            self.max_step,
            emitted
        );

        Some(StepState {
            distance,
            regime,
            wind: self.wind,
            velocity: self.velocity,
            max_step: self.max_step,
            position: self.position,
            emitted,
        })
    }

    /// Drive the trajectory to completion, handing each position to `emit`
    ///
    /// Sleeps `pacing` after every emitted event. Returns the final position.
    pub fn run<F>(mut self, pacing: Option<Duration>, mut emit: F) -> Result<Point>
    where
        F: FnMut(Point) -> Result<()>,
    {
        while let Some(point) = self.next() {
            emit(point)?;
            if let Some(delay) = pacing {
                thread::sleep(delay);
            }
        }
        Ok(self.last_emitted)
    }

    fn snap_to_destination(&mut self) -> Option<Point> {
        if self.snapped {
            return None;
        }
        self.snapped = true;

        if self.last_emitted != self.destination {
            self.last_emitted = self.destination;
            return Some(self.destination);
        }
        None
    }
}

impl<R: Rng> Iterator for Trajectory<R> {
    type Item = Point;

    fn next(&mut self) -> Option<Point> {
        loop {
            match self.step() {
                Some(state) => {
                    if let Some(point) = state.emitted {
                        return Some(point);
                    }
                }
                None => return self.snap_to_destination(),
            }
        }
    }
}

/// Collect the full path between two points without pacing
pub fn plan<R: Rng>(
    start: Point,
    destination: Point,
    params: TrajectoryParams,
    rng: R,
) -> Result<Vec<Point>> {
    Ok(Trajectory::new(start, destination, params, rng)?.collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn test_default_config() {
        let config = TrajectoryConfig::default();
        assert_eq!(config.gravity, 12.0);
        assert_eq!(config.wind, 3.0);
        assert_eq!(config.default_step, 13.0);
        assert_eq!(config.pacing(), Some(Duration::from_micros(10)));

        let params = config.params_for_step(20.0);
        assert_eq!(params.max_step, 20.0);
        assert_eq!(params.damping_distance, 20.0);
    }

    #[test]
    fn test_zero_pacing_disables_delay() {
        let config = TrajectoryConfig {
            pacing_us: 0,
            ..Default::default()
        };
        assert_eq!(config.pacing(), None);
    }

    #[test]
    fn test_invalid_params_rejected() {
        let mut params = TrajectoryParams::default();
        params.gravity = 0.0;
        assert!(Trajectory::new(Point::new(0, 0), Point::new(10, 10), params, seeded(1)).is_err());

        let mut params = TrajectoryParams::default();
        params.wind = f64::NAN;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_same_start_and_destination_emits_nothing() {
        let path = plan(Point::new(640, 480), Point::new(640, 480), TrajectoryParams::default(), seeded(7))
            .unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_path_ends_at_destination() {
        let dest = Point::new(1400, 300);
        let path = plan(Point::new(200, 900), dest, TrajectoryParams::default(), seeded(42)).unwrap();

        assert!(!path.is_empty());
        assert_eq!(*path.last().unwrap(), dest);
    }

    #[test]
    fn test_consecutive_events_differ() {
        let path = plan(Point::new(0, 0), Point::new(500, 120), TrajectoryParams::default(), seeded(3))
            .unwrap();

        let mut previous = Point::new(0, 0);
        for point in path {
            assert_ne!(point, previous, "sub-pixel motion must not emit");
            previous = point;
        }
    }

    #[test]
    fn test_wind_decays_inside_damping_distance() {
        let params = TrajectoryParams {
            gravity: 12.0,
            wind: 3.0,
            max_step: 40.0,
            damping_distance: 40.0,
        };
        let mut trajectory =
            Trajectory::new(Point::new(0, 0), Point::new(800, 600), params, seeded(11)).unwrap();

        let mut previous: Option<StepState> = None;
        let mut converging_steps = 0;
        while let Some(state) = trajectory.step() {
            if let (Some(prev), Regime::Converge) = (previous, state.regime) {
                assert!(
                    state.wind_magnitude() <= prev.wind_magnitude(),
                    "wind grew from {} to {} while converging",
                    prev.wind_magnitude(),
                    state.wind_magnitude()
                );
                converging_steps += 1;
            }
            if state.regime == Regime::Converge {
                assert!(state.distance < params.damping_distance);
            } else {
                assert!(state.distance >= params.damping_distance);
            }
            previous = Some(state);
        }

        assert!(converging_steps > 0, "trajectory never entered the damped regime");
    }

    #[test]
    fn test_velocity_never_exceeds_step_cap() {
        let mut trajectory = Trajectory::new(
            Point::new(100, 100),
            Point::new(1800, 1000),
            TrajectoryParams::default(),
            seeded(5),
        )
        .unwrap();

        while let Some(state) = trajectory.step() {
            let speed = state.velocity.0.hypot(state.velocity.1);
            assert!(speed <= state.max_step + 1e-9);
        }
    }

    #[test]
    fn test_iteration_cap_still_lands_on_destination() {
        let mut trajectory = Trajectory::new(
            Point::new(0, 0),
            Point::new(5000, 0),
            TrajectoryParams::default(),
            seeded(9),
        )
        .unwrap()
        .with_max_iterations(5);

        let path: Vec<Point> = trajectory.by_ref().collect();
        assert_eq!(*path.last().unwrap(), Point::new(5000, 0));
        assert!(trajectory.capped());
    }

    #[test]
    fn test_uncapped_walk_is_not_flagged() {
        let mut trajectory = Trajectory::new(
            Point::new(0, 0),
            Point::new(400, 300),
            TrajectoryParams::default(),
            seeded(9),
        )
        .unwrap();

        while trajectory.next().is_some() {}
        assert!(!trajectory.capped());
    }

    #[test]
    fn test_wind_keeps_injecting_noise_while_wandering() {
        let params = TrajectoryParams {
            gravity: 12.0,
            wind: 3.0,
            max_step: 5.0,
            damping_distance: 5.0,
        };
        let mut trajectory =
            Trajectory::new(Point::new(0, 0), Point::new(1500, 900), params, seeded(17)).unwrap();

        let mut prev_wind = (0.0, 0.0);
        let mut prev_cap = params.max_step;
        let mut wandering_steps = 0;
        while let Some(state) = trajectory.step() {
            if state.regime == Regime::Wander {
                let decayed = (prev_wind.0 / SQRT_3, prev_wind.1 / SQRT_3);
                assert!(
                    state.wind != decayed,
                    "step {} only decayed the wind",
                    wandering_steps
                );
                assert_eq!(state.max_step, prev_cap);
                wandering_steps += 1;
            }
            prev_wind = state.wind;
            prev_cap = state.max_step;
        }

        assert!(wandering_steps > 100, "only {} wandering steps", wandering_steps);
    }

    #[test]
    fn test_run_forwards_every_event() {
        let trajectory = Trajectory::new(
            Point::new(10, 10),
            Point::new(300, 40),
            TrajectoryParams::default(),
            seeded(21),
        )
        .unwrap();

        let mut seen = Vec::new();
        let last = trajectory
            .run(None, |p| {
                seen.push(p);
                Ok(())
            })
            .unwrap();

        assert_eq!(last, Point::new(300, 40));
        assert_eq!(seen.last().copied(), Some(last));
    }

    #[test]
    fn test_run_propagates_emit_error() {
        let trajectory = Trajectory::new(
            Point::new(0, 0),
            Point::new(100, 0),
            TrajectoryParams::default(),
            seeded(2),
        )
        .unwrap();

        let result = trajectory.run(None, |_| Err(PilotError::InputFailed("unplugged".into())));
        assert!(matches!(result, Err(PilotError::InputFailed(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_trajectory_terminates_near_destination(
            sx in -2000i32..4000, sy in -2000i32..4000,
            ex in -2000i32..4000, ey in -2000i32..4000,
            gravity in 1.0f64..20.0,
            wind in 0.5f64..10.0,
            step in 1.0f64..40.0,
            seed in any::<u64>(),
        ) {
            let params = TrajectoryParams {
                gravity,
                wind,
                max_step: step,
                damping_distance: step,
            };
            let start = Point::new(sx, sy);
            let dest = Point::new(ex, ey);
            let trajectory = Trajectory::new(start, dest, params, seeded(seed)).unwrap();
            let last = trajectory.run(None, |_| Ok(())).unwrap();

            prop_assert!(last.distance_to(dest) < 1.0);
        }
    }
}
