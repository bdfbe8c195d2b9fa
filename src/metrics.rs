//! Metrics module - Step timing statistics for wall-clock paced runs

use hdrhistogram::Histogram;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Result, SimError};

// ============================================================================
// STEP METRICS - Thread-safe step tracking
// ============================================================================

#[derive(Clone)]
pub struct StepMetrics {
    // Wall-clock step length
    dt_hist: Arc<Mutex<Histogram<u64>>>,
    // Time spent inside the integration step
    compute_hist: Arc<Mutex<Histogram<u64>>>,
    skipped_iterations: Arc<AtomicU64>,
}

impl StepMetrics {
    pub fn new() -> Result<Self> {
        let hist = || {
            Histogram::<u64>::new(3)
                .map(|h| Arc::new(Mutex::new(h)))
                .map_err(|e| SimError::Metrics(e.to_string()))
        };
        Ok(Self {
            dt_hist: hist()?,
            compute_hist: hist()?,
            skipped_iterations: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn record_step(&self, dt_secs: f64, compute: Duration) {
        let dt_ns = (dt_secs * 1e9) as u64;
        self.dt_hist.lock().record(dt_ns).ok();
        self.compute_hist.lock().record(compute.as_nanos() as u64).ok();
    }

    /// Counts an iteration whose clock did not advance.
    pub fn record_skipped(&self) {
        self.skipped_iterations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn report(&self) -> MetricsReport {
        let dt = self.dt_hist.lock();
        let compute = self.compute_hist.lock();

        MetricsReport {
            steps: dt.len(),
            skipped_iterations: self.skipped_iterations.load(Ordering::Relaxed),
            dt_p50: Duration::from_nanos(dt.value_at_quantile(0.5)),
            dt_p99: Duration::from_nanos(dt.value_at_quantile(0.99)),
            dt_max: Duration::from_nanos(dt.max()),
            compute_p50: Duration::from_nanos(compute.value_at_quantile(0.5)),
            compute_p99: Duration::from_nanos(compute.value_at_quantile(0.99)),
        }
    }
}

// ============================================================================
// METRICS REPORT - Summary statistics
// ============================================================================

#[derive(Debug)]
pub struct MetricsReport {
    pub steps: u64,
    pub skipped_iterations: u64,
    pub dt_p50: Duration,
    pub dt_p99: Duration,
    pub dt_max: Duration,
    pub compute_p50: Duration,
    pub compute_p99: Duration,
}
