//! Plot module - Altitude-vs-time chart of a trajectory

use plotters::prelude::*;
use std::path::Path;

use crate::error::{Result, SimError};
use crate::simulation::StateRecord;

pub fn render_altitude_chart<P: AsRef<Path>>(records: &[StateRecord], path: P) -> Result<()> {
    draw_altitude_chart(records, path.as_ref()).map_err(|e| SimError::Plot(e.to_string()))
}

fn draw_altitude_chart(records: &[StateRecord], path: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let t_max = records.last().map_or(1.0, |r| r.time).max(1e-3);
    let (z_min, z_max) = records
        .iter()
        .filter(|r| r.altitude.is_finite())
        .fold((0.0f64, 100.0f64), |(lo, hi), r| (lo.min(r.altitude), hi.max(r.altitude)));

    let mut chart = ChartBuilder::on(&root)
        .caption("Altitude Hold", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..t_max, z_min..z_max)?;

    chart.configure_mesh().x_desc("time (sec)").y_desc("altitude (m)").draw()?;

    chart.draw_series(LineSeries::new(
        records
            .iter()
            .filter(|r| r.altitude.is_finite())
            .map(|r| (r.time, r.altitude)),
        &BLUE,
    ))?;
    root.present()?;
    Ok(())
}
