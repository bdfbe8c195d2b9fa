//! Simulation module - Vertical point-mass dynamics driven by the altitude controller

pub mod realtime;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::controller::AltitudePidController;
use crate::error::{Result, SimError};
use crate::trajectory::RecordSink;

pub const STANDARD_GRAVITY: f64 = 9.80665;
pub const DEFAULT_DT: f64 = 0.001;
pub const DEFAULT_CONVERGENCE_EPSILON: f64 = 1e-7;
pub const DEFAULT_MAX_STEPS: u64 = 10_000_000;

// ============================================================================
// SIMULATION PARAMETERS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationParams {
    pub initial_altitude: f64,    // m
    pub target_altitude: f64,     // m
    pub dt: f64,                  // s
    pub gravity: f64,             // m/s²
    pub convergence_epsilon: f64, // m per step
    pub max_steps: u64,
}

impl SimulationParams {
    pub fn new(initial_altitude: f64, target_altitude: f64) -> Self {
        Self {
            initial_altitude,
            target_altitude,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(SimError::InvalidConfiguration(msg)) };
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return invalid(format!("dt must be finite and > 0, got {}", self.dt));
        }
        if !self.gravity.is_finite() {
            return invalid(format!("gravity must be finite, got {}", self.gravity));
        }
        if !self.convergence_epsilon.is_finite() || self.convergence_epsilon <= 0.0 {
            return invalid(format!(
                "convergence_epsilon must be finite and > 0, got {}",
                self.convergence_epsilon
            ));
        }
        if !self.initial_altitude.is_finite() || !self.target_altitude.is_finite() {
            return invalid("initial_altitude and target_altitude must be finite".to_string());
        }
        if self.max_steps == 0 {
            return invalid("max_steps must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            initial_altitude: 55.0,
            target_altitude: 50.0,
            dt: DEFAULT_DT,
            gravity: STANDARD_GRAVITY,
            convergence_epsilon: DEFAULT_CONVERGENCE_EPSILON,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

// ============================================================================
// STATE & RECORDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationState {
    pub time: f64,
    pub altitude: f64,
    pub velocity: f64,
    pub acceleration: f64,
    pub control: f64,
    pub previous_altitude: f64,
}

impl SimulationState {
    pub fn at_rest(altitude: f64) -> Self {
        Self {
            time: 0.0,
            altitude,
            velocity: 0.0,
            acceleration: 0.0,
            control: 0.0,
            previous_altitude: 0.0,
        }
    }
}

/// One emitted row: `time, acceleration, velocity, altitude, control`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateRecord {
    pub time: f64,
    pub acceleration: f64,
    pub velocity: f64,
    pub altitude: f64,
    pub control: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub record: StateRecord,
    pub altitude_change: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Converged,
    Impacted,
    Cancelled,
    Diverged,
    StepLimitReached,
    TimeLimitReached,
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunOutcome::Converged => write!(f, "Converged"),
            RunOutcome::Impacted => write!(f, "Impacted"),
            RunOutcome::Cancelled => write!(f, "Cancelled"),
            RunOutcome::Diverged => write!(f, "Diverged"),
            RunOutcome::StepLimitReached => write!(f, "Step limit reached"),
            RunOutcome::TimeLimitReached => write!(f, "Time limit reached"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    pub steps: u64,
    pub final_state: SimulationState,
}

// ============================================================================
// CANCEL TOKEN - Cooperative stop checked once per iteration
// ============================================================================

#[derive(Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

// ============================================================================
// SIMULATOR
// ============================================================================

pub struct Simulator {
    params: SimulationParams,
    controller: AltitudePidController,
    state: SimulationState,
    steps: u64,
}

impl Simulator {
    pub fn new(params: SimulationParams, controller: AltitudePidController) -> Result<Self> {
        params.validate()?;
        if controller.target() != params.target_altitude {
            return Err(SimError::InvalidConfiguration(format!(
                "controller target {} does not match target_altitude {}",
                controller.target(),
                params.target_altitude
            )));
        }
        debug!(?params, "simulator created");
        Ok(Self {
            state: SimulationState::at_rest(params.initial_altitude),
            params,
            controller,
            steps: 0,
        })
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn controller(&self) -> &AltitudePidController {
        &self.controller
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advances one fixed step of `params.dt`.
    pub fn step(&mut self) -> Step {
        let time = self.state.time;
        let dt = self.params.dt;
        self.advance(time, dt, time + dt)
    }

    /// Advances with an explicit step length, stamping the record with `record_time`
    /// and leaving the state clock at `next_time`.
    pub(crate) fn advance(&mut self, record_time: f64, dt: f64, next_time: f64) -> Step {
        // Phase 1: candidate state from the control computed last step
        let acceleration = self.params.gravity - self.state.control;
        let velocity = self.state.velocity - acceleration * dt;
        let altitude = self.state.altitude + velocity * dt;
        let control = self.controller.update(altitude, velocity, dt);

        // Phase 2: compare against the committed altitude
        let altitude_change = altitude - self.state.altitude;

        // Phase 3: commit
        self.state = SimulationState {
            time: next_time,
            altitude,
            velocity,
            acceleration,
            control,
            previous_altitude: self.state.altitude,
        };
        self.steps += 1;

        Step {
            record: StateRecord {
                time: record_time,
                acceleration,
                velocity,
                altitude,
                control,
            },
            altitude_change,
        }
    }

    pub fn is_converged(&self, step: &Step) -> bool {
        step.altitude_change.abs() < self.params.convergence_epsilon
    }

    /// Steps at the fixed `dt` until the altitude settles, emitting every record
    /// to `sink`. The first step always runs.
    pub fn run<S: RecordSink + ?Sized>(
        &mut self,
        sink: &mut S,
        cancel: Option<&CancelToken>,
    ) -> Result<RunSummary> {
        let outcome = loop {
            if cancel.is_some_and(|c| c.is_cancelled()) {
                break RunOutcome::Cancelled;
            }
            if self.steps >= self.params.max_steps {
                warn!(max_steps = self.params.max_steps, "step limit reached before convergence");
                break RunOutcome::StepLimitReached;
            }

            let step = self.step();
            sink.record(&step.record)?;

            if !step.record.altitude.is_finite() {
                warn!(time = step.record.time, "altitude became non-finite");
                break RunOutcome::Diverged;
            }
            if self.is_converged(&step) {
                break RunOutcome::Converged;
            }
        };

        let summary = self.summary(outcome);
        info!(
            outcome = %summary.outcome,
            steps = summary.steps,
            altitude = summary.final_state.altitude,
            time = summary.final_state.time,
            "fixed-step run finished"
        );
        Ok(summary)
    }

    pub(crate) fn summary(&self, outcome: RunOutcome) -> RunSummary {
        RunSummary {
            outcome,
            steps: self.steps,
            final_state: self.state,
        }
    }
}
