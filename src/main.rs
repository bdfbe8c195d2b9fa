use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use altitude_hold::config::load_config;
use altitude_hold::metrics::StepMetrics;
use altitude_hold::plot::render_altitude_chart;
use altitude_hold::simulation::realtime::{run_until_impact, WallClock};
use altitude_hold::trajectory::{read_trajectory, trajectory_file_name, CsvTrajectoryWriter};
use altitude_hold::RunOutcome;

const DEFAULT_CONFIG_PATH: &str = "config/altitude_hold.toml";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "altitude_hold=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut force_realtime = false;
    let mut plot = true;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--realtime" => force_realtime = true,
            "--no-plot" => plot = false,
            other => config_path = PathBuf::from(other),
        }
    }

    let config = load_config(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;
    let realtime = force_realtime || config.realtime.enabled;

    println!("===========================================");
    println!("Altitude Hold Simulation");
    println!("===========================================");
    println!(
        "Start: {:.1} m, Target: {:.1} m, Gains: {:?}",
        config.simulation.initial_altitude,
        config.simulation.target_altitude,
        config.gains()
    );

    let csv_path = config.output.csv_path.clone().unwrap_or_else(|| {
        PathBuf::from(trajectory_file_name(
            config.simulation.initial_altitude,
            config.simulation.target_altitude,
            &config.gains(),
        ))
    });

    let mut sim = config.build_simulator().context("building simulator")?;
    let mut writer = CsvTrajectoryWriter::create(&csv_path, config.output.write_header)
        .with_context(|| format!("creating {}", csv_path.display()))?;

    let metrics = StepMetrics::new()?;
    let summary = if realtime {
        let mut clock = WallClock::start();
        run_until_impact(
            &mut sim,
            &mut clock,
            &mut writer,
            &config.realtime_params(),
            &metrics,
            None,
        )?
    } else {
        sim.run(&mut writer, None)?
    };
    let rows = writer.rows();
    writer.finish().context("flushing trajectory")?;

    println!("===========================================");
    println!("RESULTS");
    println!("===========================================");
    println!("Outcome: {}", summary.outcome);
    println!("Steps: {}", summary.steps);
    println!("Final time: {:.3} s", summary.final_state.time);
    println!("Final altitude: {:.3} m", summary.final_state.altitude);
    println!("Final velocity: {:.3} m/s", summary.final_state.velocity);
    println!("Trajectory: {} ({} rows)", csv_path.display(), rows);

    if summary.outcome == RunOutcome::Impacted {
        println!("*******************************************");
        println!("*** I'VE FALLEN, AND I CAN'T GET UP! ***");
        println!("*******************************************");
    }

    if realtime {
        let report = metrics.report();
        println!("\n=== Step Metrics ===");
        println!("Steps: {}, Skipped iterations: {}", report.steps, report.skipped_iterations);
        println!("dt P50: {:?}, P99: {:?}, Max: {:?}", report.dt_p50, report.dt_p99, report.dt_max);
        println!("Compute P50: {:?}, P99: {:?}", report.compute_p50, report.compute_p99);
    }

    if plot {
        let plot_path = config
            .output
            .plot_path
            .clone()
            .unwrap_or_else(|| csv_path.with_extension("png"));
        let records = read_trajectory(&csv_path)?;
        render_altitude_chart(&records, &plot_path)
            .with_context(|| format!("rendering {}", plot_path.display()))?;
        println!("Chart: {}", plot_path.display());
    }

    Ok(())
}
