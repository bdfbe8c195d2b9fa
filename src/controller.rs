//! Controller module - Cascaded P-PID altitude-hold control law

use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SimError};

pub const DEFAULT_WINDUP_LIMIT: f64 = 10.0;

// ============================================================================
// CLAMP HELPER - Symmetric saturation
// ============================================================================

/// Saturates `x` to `[-limit, +limit]`. A NaN `x` passes through unchanged.
///
/// `limit` must be non-negative; a negative bound inverts the clamp. The
/// controller rejects such limits at construction.
pub fn clamp_abs(x: f64, limit: f64) -> f64 {
    debug_assert!(limit >= 0.0, "clamp limit must be non-negative");
    if x < -limit {
        -limit
    } else if x > limit {
        limit
    } else {
        x
    }
}

// ============================================================================
// GAINS & MODES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidGains {
    /// Outer loop: altitude error -> velocity target
    pub position: f64,
    /// Inner loop P on velocity error
    pub velocity: f64,
    /// Inner loop I on velocity error
    pub velocity_integral: f64,
    /// Inner loop D on velocity error
    pub velocity_derivative: f64,
}

impl PidGains {
    pub fn new(position: f64, velocity: f64, velocity_integral: f64, velocity_derivative: f64) -> Self {
        Self {
            position,
            velocity,
            velocity_integral,
            velocity_derivative,
        }
    }
}

/// How the velocity error is folded into the integral each update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegralMode {
    /// `integral = clamp(integral + e*dt)`
    #[default]
    Single,
    /// Adds `e*dt` once unclamped and once more inside the clamp, matching
    /// the legacy controller's trajectories.
    Doubled,
}

/// Contribution of each inner-loop term to the last control output.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ControlTerms {
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
}

impl ControlTerms {
    pub fn total(&self) -> f64 {
        self.proportional + self.derivative + self.integral
    }
}

// ============================================================================
// ALTITUDE PID CONTROLLER
// ============================================================================

#[derive(Debug, Clone)]
pub struct AltitudePidController {
    // Constants
    target: f64,
    gains: PidGains,
    windup_limit: f64,
    integral_mode: IntegralMode,

    // State
    integral_error: f64,
    last_error: f64,
    last_terms: ControlTerms,
}

impl AltitudePidController {
    pub fn new(target: f64, gains: PidGains) -> Self {
        Self {
            target,
            gains,
            windup_limit: DEFAULT_WINDUP_LIMIT,
            integral_mode: IntegralMode::default(),
            integral_error: 0.0,
            last_error: 0.0,
            last_terms: ControlTerms::default(),
        }
    }

    pub fn with_windup_limit(target: f64, gains: PidGains, windup_limit: f64) -> Result<Self> {
        if !windup_limit.is_finite() || windup_limit <= 0.0 {
            return Err(SimError::InvalidConfiguration(format!(
                "windup_limit must be finite and > 0, got {}",
                windup_limit
            )));
        }
        debug!(altitude_target = target, windup_limit, ?gains, "altitude controller created");
        Ok(Self {
            windup_limit,
            ..Self::new(target, gains)
        })
    }

    pub fn integral_mode(mut self, mode: IntegralMode) -> Self {
        self.integral_mode = mode;
        self
    }

    /// Computes the control value for the current altitude and vertical
    /// velocity. `dt` is the time since the previous call and may be zero.
    pub fn update(&mut self, altitude: f64, velocity: f64, dt: f64) -> f64 {
        // Outer loop: altitude error becomes a velocity setpoint
        let velocity_target = (self.target - altitude) * self.gains.position;
        let velocity_error = velocity_target - velocity;

        // Integral with anti-windup
        let increment = velocity_error * dt;
        self.integral_error = match self.integral_mode {
            IntegralMode::Single => clamp_abs(self.integral_error + increment, self.windup_limit),
            IntegralMode::Doubled => {
                self.integral_error += increment;
                clamp_abs(self.integral_error + increment, self.windup_limit)
            }
        };

        // No derivative on the first sample after a zero error, nor across a zero step
        let derivative = if self.last_error.abs() > 0.0 && dt > 0.0 {
            (velocity_error - self.last_error) / dt
        } else {
            0.0
        };
        self.last_error = velocity_error;

        self.last_terms = ControlTerms {
            proportional: self.gains.velocity * velocity_error,
            integral: self.gains.velocity_integral * self.integral_error,
            derivative: self.gains.velocity_derivative * derivative,
        };
        self.last_terms.total()
    }

    pub fn reset(&mut self) {
        self.integral_error = 0.0;
        self.last_error = 0.0;
        self.last_terms = ControlTerms::default();
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn gains(&self) -> PidGains {
        self.gains
    }

    pub fn windup_limit(&self) -> f64 {
        self.windup_limit
    }

    pub fn integral_error(&self) -> f64 {
        self.integral_error
    }

    pub fn last_error(&self) -> f64 {
        self.last_error
    }

    pub fn last_terms(&self) -> ControlTerms {
        self.last_terms
    }
}
