//! Wall-clock paced variant: the step length is whatever time has elapsed since
//! the previous iteration, and the run ends when the vehicle reaches the ground.

use std::thread;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::{CancelToken, RunOutcome, RunSummary, Simulator};
use crate::error::Result;
use crate::metrics::StepMetrics;
use crate::trajectory::RecordSink;

/// Source of elapsed seconds since the start of the run.
pub trait Clock {
    fn elapsed_secs(&mut self) -> f64;
}

pub struct WallClock {
    start: Instant,
}

impl WallClock {
    pub fn start() -> Self {
        Self { start: Instant::now() }
    }
}

impl Clock for WallClock {
    fn elapsed_secs(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

impl<F: FnMut() -> f64> Clock for F {
    fn elapsed_secs(&mut self) -> f64 {
        self()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RealtimeParams {
    pub max_duration_s: Option<f64>,
    /// Sleep between iterations; zero spins.
    pub step_interval: Duration,
}

pub fn run_until_impact<C, S>(
    sim: &mut Simulator,
    clock: &mut C,
    sink: &mut S,
    params: &RealtimeParams,
    metrics: &StepMetrics,
    cancel: Option<&CancelToken>,
) -> Result<RunSummary>
where
    C: Clock + ?Sized,
    S: RecordSink + ?Sized,
{
    let mut last_time = 0.0;

    let outcome = loop {
        if cancel.is_some_and(|c| c.is_cancelled()) {
            break RunOutcome::Cancelled;
        }
        if sim.state().altitude <= 0.0 {
            warn!(
                time = sim.state().time,
                velocity = sim.state().velocity,
                "ground impact"
            );
            break RunOutcome::Impacted;
        }
        if sim.steps() >= sim.params().max_steps {
            break RunOutcome::StepLimitReached;
        }

        let time = clock.elapsed_secs();
        if params.max_duration_s.is_some_and(|max| time >= max) {
            break RunOutcome::TimeLimitReached;
        }

        let dt = time - last_time;
        if dt > 0.0 {
            let compute_start = Instant::now();
            let step = sim.advance(time, dt, time);
            metrics.record_step(dt, compute_start.elapsed());
            sink.record(&step.record)?;

            if !step.record.altitude.is_finite() {
                warn!(time, "altitude became non-finite");
                break RunOutcome::Diverged;
            }
        } else {
            metrics.record_skipped();
        }
        last_time = time;

        if !params.step_interval.is_zero() {
            thread::sleep(params.step_interval);
        }
    };

    let summary = sim.summary(outcome);
    info!(
        outcome = %summary.outcome,
        steps = summary.steps,
        altitude = summary.final_state.altitude,
        time = summary.final_state.time,
        "real-time run finished"
    );
    Ok(summary)
}
