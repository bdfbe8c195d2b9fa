use criterion::{criterion_group, criterion_main, Criterion};
use altitude_hold::{AltitudePidController, PidGains, SimulationParams, Simulator, StateRecord};

fn benchmark_controller_update(c: &mut Criterion) {
    let mut pid = AltitudePidController::new(50.0, PidGains::new(5.0, 1.5, 1.0, 0.05));
    c.bench_function("controller_update", |b| b.iter(|| pid.update(48.0, -0.5, 0.001)));
}

fn benchmark_run_to_convergence(c: &mut Criterion) {
    c.bench_function("run_to_convergence", |b| {
        b.iter(|| {
            let controller = AltitudePidController::new(50.0, PidGains::new(5.0, 1.5, 1.0, 0.05));
            let mut sim = Simulator::new(SimulationParams::new(55.0, 50.0), controller).unwrap();
            let mut records: Vec<StateRecord> = Vec::new();
            sim.run(&mut records, None).unwrap()
        })
    });
}

criterion_group!(benches, benchmark_controller_update, benchmark_run_to_convergence);
criterion_main!(benches);
