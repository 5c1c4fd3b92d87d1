//! Error types for the disaggregation pipeline.
//!
//! Every fallible operation returns [`DisaggResult`]. Numeric diagnostics
//! (conservation and value mismatches) are never errors; they are logged.

use thiserror::Error;

use crate::config::ConfigError;

/// Unified error type for input handling, preprocessing and redistribution.
#[derive(Error, Debug)]
pub enum DisaggError {
    /// I/O errors (reading input, writing exports)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Input table lacks required columns
    #[error("missing required input columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Input rows violate the series contract
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Round-trip efficiency outside (0, 1]
    #[error("invalid efficiency {0}: must be in (0, 1]")]
    InvalidEfficiency(f64),

    /// No slot reaches zero state of charge, so the time origin is undefined
    #[error("no slot with zero state of charge (tolerance {tolerance})")]
    UndefinedOrigin { tolerance: f64 },

    /// An event window does not fit the slot table
    #[error("event {nevent} window [{slot_min}, {slot_max}] outside slot range 0..{len}")]
    WindowOutOfRange {
        nevent: usize,
        slot_min: usize,
        slot_max: usize,
        len: usize,
    },

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias for results carrying a [`DisaggError`].
pub type DisaggResult<T> = Result<T, DisaggError>;
