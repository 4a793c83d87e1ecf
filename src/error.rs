//! Error types shared by the forecast loaders, configuration layer and binary.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;

/// Input-shape problems found while building a day forecast.
///
/// These are raised before scheduling begins. Physical clamps (negative
/// power, over-capacity charge) never produce one of these.
#[derive(Debug, Error, PartialEq)]
pub enum ForecastError {
    /// A day forecast must hold exactly one entry per hour.
    #[error("expected {expected} hourly entries, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    /// The first entry does not start at midnight.
    #[error("first entry at {0} does not start at midnight")]
    NotMidnight(String),
    /// Consecutive entries are not exactly one hour apart.
    #[error("entry {index} at {timestamp} is not one hour after the previous entry")]
    NotHourly { index: usize, timestamp: String },
    /// A record lacks a field that has no documented default.
    #[error("entry {index} is missing field `{field}`")]
    MissingField { index: usize, field: &'static str },
    /// A numeric field is negative or not finite.
    #[error("entry {index} has invalid `{field}` value {value}")]
    InvalidValue {
        index: usize,
        field: &'static str,
        value: f64,
    },
    /// A timestamp could not be parsed.
    #[error("entry {index} has unparseable timestamp \"{raw}\"")]
    BadTimestamp { index: usize, raw: String },
    /// The series is empty.
    #[error("forecast contains no entries")]
    Empty,
}

/// Top-level error for everything that crosses an I/O boundary.
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid forecast: {0}")]
    Forecast(#[from] ForecastError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
