// Configuration file loading (TOML)
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::controller::{AltitudePidController, IntegralMode, PidGains, DEFAULT_WINDUP_LIMIT};
use crate::error::{Result, SimError};
use crate::simulation::realtime::RealtimeParams;
use crate::simulation::{SimulationParams, Simulator};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub simulation: SimulationSection,
    pub controller: ControllerSection,
    pub output: OutputSection,
    pub realtime: RealtimeSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationSection {
    pub initial_altitude: f64,
    pub target_altitude: f64,
    pub dt: f64,
    pub gravity: f64,
    pub convergence_epsilon: f64,
    pub max_steps: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        let params = SimulationParams::default();
        Self {
            initial_altitude: params.initial_altitude,
            target_altitude: params.target_altitude,
            dt: params.dt,
            gravity: params.gravity,
            convergence_epsilon: params.convergence_epsilon,
            max_steps: params.max_steps,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControllerSection {
    pub position_gain: f64,
    pub velocity_gain: f64,
    pub velocity_integral_gain: f64,
    pub velocity_derivative_gain: f64,
    pub windup_limit: f64,
    pub integral_mode: IntegralMode,
}

impl Default for ControllerSection {
    fn default() -> Self {
        Self {
            position_gain: 5.0,
            velocity_gain: 1.5,
            velocity_integral_gain: 1.0,
            velocity_derivative_gain: 0.05,
            windup_limit: DEFAULT_WINDUP_LIMIT,
            integral_mode: IntegralMode::Single,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub csv_path: Option<PathBuf>,
    pub write_header: bool,
    pub plot_path: Option<PathBuf>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            csv_path: None,
            write_header: true,
            plot_path: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RealtimeSection {
    pub enabled: bool,
    pub max_duration_s: Option<f64>,
    pub step_interval_ms: u64,
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.simulation_params().validate()?;
        let c = &self.controller;
        let gains = [
            c.position_gain,
            c.velocity_gain,
            c.velocity_integral_gain,
            c.velocity_derivative_gain,
        ];
        if gains.iter().any(|g| !g.is_finite()) {
            return Err(SimError::InvalidConfiguration("controller gains must be finite".to_string()));
        }
        if let Some(max) = self.realtime.max_duration_s {
            if !max.is_finite() || max <= 0.0 {
                return Err(SimError::InvalidConfiguration(format!(
                    "realtime.max_duration_s must be finite and > 0, got {}",
                    max
                )));
            }
        }
        Ok(())
    }

    pub fn gains(&self) -> PidGains {
        PidGains::new(
            self.controller.position_gain,
            self.controller.velocity_gain,
            self.controller.velocity_integral_gain,
            self.controller.velocity_derivative_gain,
        )
    }

    pub fn simulation_params(&self) -> SimulationParams {
        let s = &self.simulation;
        SimulationParams {
            initial_altitude: s.initial_altitude,
            target_altitude: s.target_altitude,
            dt: s.dt,
            gravity: s.gravity,
            convergence_epsilon: s.convergence_epsilon,
            max_steps: s.max_steps,
        }
    }

    pub fn realtime_params(&self) -> RealtimeParams {
        RealtimeParams {
            max_duration_s: self.realtime.max_duration_s,
            step_interval: Duration::from_millis(self.realtime.step_interval_ms),
        }
    }

    /// Controller tracking the configured target altitude.
    pub fn build_controller(&self) -> Result<AltitudePidController> {
        let controller = AltitudePidController::with_windup_limit(
            self.simulation.target_altitude,
            self.gains(),
            self.controller.windup_limit,
        )?;
        Ok(controller.integral_mode(self.controller.integral_mode))
    }

    pub fn build_simulator(&self) -> Result<Simulator> {
        Simulator::new(self.simulation_params(), self.build_controller()?)
    }
}

/// Missing file yields the defaults; an unreadable or malformed file is an error.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(s) => AppConfig::from_toml_str(&s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "config file not found, using defaults");
            Ok(AppConfig::default())
        }
        Err(e) => Err(SimError::Io(e)),
    }
}
