//! Fixed-step simulation tests - integration, convergence and run guards

use altitude_hold::simulation::STANDARD_GRAVITY;
use altitude_hold::{
    AltitudePidController, CancelToken, IntegralMode, PidGains, RunOutcome, SimError,
    SimulationParams, Simulator, StateRecord,
};

fn reference_gains() -> PidGains {
    PidGains::new(5.0, 1.5, 1.0, 0.05)
}

fn simulator(initial: f64, target: f64, mode: IntegralMode) -> Simulator {
    let params = SimulationParams::new(initial, target);
    let controller = AltitudePidController::new(target, reference_gains()).integral_mode(mode);
    Simulator::new(params, controller).unwrap()
}

// ============================================================================
// INTEGRATION TESTS
// ============================================================================

#[test]
fn test_initial_state_at_rest() {
    let sim = simulator(100.0, 50.0, IntegralMode::Single);
    let state = sim.state();
    assert_eq!(state.altitude, 100.0);
    assert_eq!(state.velocity, 0.0);
    assert_eq!(state.control, 0.0);
    assert_eq!(state.time, 0.0);
}

#[test]
fn test_first_step_sign_convention() {
    let mut sim = simulator(100.0, 50.0, IntegralMode::Single);
    let step = sim.step();

    assert_eq!(step.record.time, 0.0);
    assert_eq!(step.record.acceleration, STANDARD_GRAVITY);
    assert!(
        (step.record.velocity - (-0.00980665)).abs() < 1e-12,
        "velocity after one step was {}",
        step.record.velocity
    );
    assert!((step.record.altitude - (100.0 - 0.00980665 * 0.001)).abs() < 1e-12);
    assert_eq!(sim.state().previous_altitude, 100.0);
}

#[test]
fn test_control_applied_on_next_step() {
    let mut sim = simulator(100.0, 50.0, IntegralMode::Single);
    let first = sim.step();
    let second = sim.step();
    assert!((second.record.acceleration - (STANDARD_GRAVITY - first.record.control)).abs() < 1e-12);
}

// ============================================================================
// CONVERGENCE TESTS
// ============================================================================

#[test]
fn test_converges_near_target() {
    let mut sim = simulator(55.0, 50.0, IntegralMode::Single);
    let mut records: Vec<StateRecord> = Vec::new();
    let summary = sim.run(&mut records, None).unwrap();

    assert_eq!(summary.outcome, RunOutcome::Converged);
    assert_eq!(summary.steps, records.len() as u64);
    assert_eq!(summary.steps, 7003);
    assert!(
        (summary.final_state.altitude - 50.0).abs() < 0.5,
        "Final altitude {} should settle near 50 m",
        summary.final_state.altitude
    );
    assert!((summary.final_state.altitude - 50.123507130091554).abs() < 1e-9);
}

#[test]
fn test_doubled_integral_mode_matches_legacy_trajectory() {
    let mut sim = simulator(55.0, 50.0, IntegralMode::Doubled);
    let mut records: Vec<StateRecord> = Vec::new();
    let summary = sim.run(&mut records, None).unwrap();

    assert_eq!(summary.outcome, RunOutcome::Converged);
    assert_eq!(summary.steps, 5410);
    assert_eq!(records.len(), 5410);
    assert!(
        (summary.final_state.altitude - 49.44859118038441).abs() < 1e-9,
        "Final altitude {} drifted from the legacy run",
        summary.final_state.altitude
    );
}

#[test]
fn test_record_times_step_by_dt() {
    let mut sim = simulator(55.0, 50.0, IntegralMode::Single);
    let mut records: Vec<StateRecord> = Vec::new();
    sim.run(&mut records, None).unwrap();

    assert_eq!(records[0].time, 0.0);
    for pair in records.windows(2) {
        let delta = pair[1].time - pair[0].time;
        assert!(delta > 0.0, "Time must strictly increase");
        assert!((delta - 0.001).abs() < 1e-9, "Time step drifted to {}", delta);
    }
}

#[test]
fn test_last_record_matches_final_state() {
    let mut sim = simulator(55.0, 50.0, IntegralMode::Single);
    let mut records: Vec<StateRecord> = Vec::new();
    let summary = sim.run(&mut records, None).unwrap();

    let last = records.last().unwrap();
    assert_eq!(last.altitude, summary.final_state.altitude);
    assert_eq!(last.control, summary.final_state.control);
    assert!((last.altitude - summary.final_state.previous_altitude).abs() < 1e-7);
}

#[test]
fn test_near_zero_start_does_not_stop_early() {
    // previous_altitude starts at 0, so a start at 0 must still step
    let mut params = SimulationParams::new(0.0, 0.0);
    params.max_steps = 10;
    let controller = AltitudePidController::new(0.0, reference_gains());
    let mut sim = Simulator::new(params, controller).unwrap();

    let mut records: Vec<StateRecord> = Vec::new();
    let summary = sim.run(&mut records, None).unwrap();

    assert_eq!(summary.outcome, RunOutcome::StepLimitReached);
    assert_eq!(records.len(), 10);
}

// ============================================================================
// GUARD TESTS
// ============================================================================

#[test]
fn test_cancelled_before_first_step() {
    let mut sim = simulator(55.0, 50.0, IntegralMode::Single);
    let cancel = CancelToken::new();
    cancel.cancel();

    let mut records: Vec<StateRecord> = Vec::new();
    let summary = sim.run(&mut records, Some(&cancel)).unwrap();

    assert_eq!(summary.outcome, RunOutcome::Cancelled);
    assert!(records.is_empty());
    assert_eq!(summary.steps, 0);
}

#[test]
fn test_step_limit_bounds_run() {
    let mut params = SimulationParams::new(55.0, 50.0);
    params.max_steps = 250;
    let mut sim = Simulator::new(params, AltitudePidController::new(50.0, reference_gains())).unwrap();

    let mut records: Vec<StateRecord> = Vec::new();
    let summary = sim.run(&mut records, None).unwrap();

    assert_eq!(summary.outcome, RunOutcome::StepLimitReached);
    assert_eq!(records.len(), 250);
}

#[test]
fn test_nan_gain_diverges() {
    let gains = PidGains::new(f64::NAN, 1.5, 1.0, 0.05);
    let params = SimulationParams::new(55.0, 50.0);
    let mut sim = Simulator::new(params, AltitudePidController::new(50.0, gains)).unwrap();

    let mut records: Vec<StateRecord> = Vec::new();
    let summary = sim.run(&mut records, None).unwrap();

    assert_eq!(summary.outcome, RunOutcome::Diverged);
    assert!(records.last().unwrap().altitude.is_nan());
}

#[test]
fn test_invalid_params_rejected() {
    let controller = AltitudePidController::new(50.0, reference_gains());

    let mut zero_dt = SimulationParams::new(55.0, 50.0);
    zero_dt.dt = 0.0;
    assert!(matches!(
        Simulator::new(zero_dt, controller.clone()),
        Err(SimError::InvalidConfiguration(_))
    ));

    let mut bad_epsilon = SimulationParams::new(55.0, 50.0);
    bad_epsilon.convergence_epsilon = -1.0;
    assert!(Simulator::new(bad_epsilon, controller.clone()).is_err());

    let mut bad_gravity = SimulationParams::new(55.0, 50.0);
    bad_gravity.gravity = f64::NAN;
    assert!(Simulator::new(bad_gravity, controller).is_err());
}

#[test]
fn test_mismatched_controller_target_rejected() {
    let params = SimulationParams::new(55.0, 50.0);
    let controller = AltitudePidController::new(0.0, reference_gains());
    assert!(matches!(
        Simulator::new(params, controller),
        Err(SimError::InvalidConfiguration(_))
    ));
}

#[test]
fn test_independent_simulators_do_not_interfere() {
    let mut a = simulator(55.0, 50.0, IntegralMode::Single);
    let mut b = simulator(55.0, 50.0, IntegralMode::Single);

    for _ in 0..100 {
        a.step();
    }
    let b_first = b.step();
    assert_eq!(b_first.record.time, 0.0);
    assert_eq!(b_first.record.acceleration, STANDARD_GRAVITY);
}
