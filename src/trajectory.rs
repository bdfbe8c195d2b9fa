//! Trajectory module - Flat row stream of simulation records

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::controller::PidGains;
use crate::error::{Result, SimError};
use crate::simulation::StateRecord;

pub const HEADER: [&str; 5] = ["t", "dzdt2", "dzdt", "z", "u"];

// ============================================================================
// RECORD SINK - Consumer of emitted steps
// ============================================================================

pub trait RecordSink {
    fn record(&mut self, record: &StateRecord) -> Result<()>;
}

impl RecordSink for Vec<StateRecord> {
    fn record(&mut self, record: &StateRecord) -> Result<()> {
        self.push(*record);
        Ok(())
    }
}

// ============================================================================
// CSV WRITER - time, acceleration, velocity, altitude, control
// ============================================================================

pub struct CsvTrajectoryWriter<W: Write> {
    writer: csv::Writer<W>,
    rows: u64,
}

impl CsvTrajectoryWriter<File> {
    pub fn create<P: AsRef<Path>>(path: P, write_header: bool) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(file, write_header)
    }
}

impl<W: Write> CsvTrajectoryWriter<W> {
    pub fn new(inner: W, write_header: bool) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        if write_header {
            writer.write_record(HEADER)?;
        }
        Ok(Self { writer, rows: 0 })
    }

    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| SimError::Io(e.into_error()))
    }
}

impl<W: Write> RecordSink for CsvTrajectoryWriter<W> {
    fn record(&mut self, record: &StateRecord) -> Result<()> {
        self.writer.write_record(&[
            format!("{:.3}", record.time),
            format!("{:.3}", record.acceleration),
            format!("{:.3}", record.velocity),
            format!("{:.3}", record.altitude),
            format!("{:.3}", record.control),
        ])?;
        self.rows += 1;
        Ok(())
    }
}

// ============================================================================
// CSV READER - Header row optional
// ============================================================================

pub fn read_trajectory<P: AsRef<Path>>(path: P) -> Result<Vec<StateRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row?;
        let line = row.position().map_or(index as u64 + 1, |p| p.line());
        match parse_row(&row) {
            Ok(record) => records.push(record),
            // Non-numeric first line is the cosmetic header
            Err(_) if index == 0 => continue,
            Err(reason) => return Err(SimError::MalformedRow { line, reason }),
        }
    }
    Ok(records)
}

fn parse_row(row: &csv::StringRecord) -> std::result::Result<StateRecord, String> {
    if row.len() != 5 {
        return Err(format!("expected 5 fields, found {}", row.len()));
    }
    let mut values = [0.0f64; 5];
    for (value, field) in values.iter_mut().zip(row.iter()) {
        *value = field
            .parse()
            .map_err(|_| format!("'{}' is not a number", field))?;
    }
    let [time, acceleration, velocity, altitude, control] = values;
    Ok(StateRecord {
        time,
        acceleration,
        velocity,
        altitude,
        control,
    })
}

// ============================================================================
// FILE NAMING
// ============================================================================

/// `SSSS-TTTT_P-VP-VI-VD.csv`, e.g. `0055-0050_5.000-1.500-1.000-0.050.csv`.
pub fn trajectory_file_name(initial_altitude: f64, target_altitude: f64, gains: &PidGains) -> String {
    format!(
        "{:04.0}-{:04.0}_{:.3}-{:.3}-{:.3}-{:.3}.csv",
        initial_altitude,
        target_altitude,
        gains.position,
        gains.velocity,
        gains.velocity_integral,
        gains.velocity_derivative
    )
}
