//! Error module - Failures surfaced by configuration and the I/O collaborators

use std::fmt;

#[derive(Debug)]
pub enum SimError {
    /// A construction-time parameter is out of its valid range.
    InvalidConfiguration(String),
    Io(std::io::Error),
    Csv(csv::Error),
    ConfigParse(toml::de::Error),
    /// A trajectory row that does not hold five numeric fields.
    MalformedRow { line: u64, reason: String },
    Plot(String),
    Metrics(String),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {}", msg),
            SimError::Io(err) => write!(f, "I/O error: {}", err),
            SimError::Csv(err) => write!(f, "CSV error: {}", err),
            SimError::ConfigParse(err) => write!(f, "config parse error: {}", err),
            SimError::MalformedRow { line, reason } => {
                write!(f, "malformed trajectory row at line {}: {}", line, reason)
            }
            SimError::Plot(msg) => write!(f, "plot error: {}", msg),
            SimError::Metrics(msg) => write!(f, "metrics error: {}", msg),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::Io(err) => Some(err),
            SimError::Csv(err) => Some(err),
            SimError::ConfigParse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SimError {
    fn from(err: std::io::Error) -> Self {
        SimError::Io(err)
    }
}

impl From<csv::Error> for SimError {
    fn from(err: csv::Error) -> Self {
        SimError::Csv(err)
    }
}

impl From<toml::de::Error> for SimError {
    fn from(err: toml::de::Error) -> Self {
        SimError::ConfigParse(err)
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
