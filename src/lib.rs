pub mod config;
pub mod controller;
pub mod error;
pub mod metrics;
pub mod plot;
pub mod simulation;
pub mod trajectory;

pub use controller::{clamp_abs, AltitudePidController, ControlTerms, IntegralMode, PidGains};
pub use error::SimError;
pub use simulation::realtime::{run_until_impact, Clock, RealtimeParams, WallClock};
pub use simulation::{
    CancelToken, RunOutcome, RunSummary, SimulationParams, SimulationState, Simulator, StateRecord,
};
pub use trajectory::{CsvTrajectoryWriter, RecordSink};
