//! Reading and validating the raw charge/discharge input series.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DisaggError, DisaggResult};

/// Columns the input table must provide. Extra columns are ignored.
pub const REQUIRED_COLUMNS: &[&str] = &["slot", "chg", "dch", "mc"];

/// One slot of the raw input series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputRow {
    /// Slot id; ids must be contiguous and ascending.
    pub slot: usize,
    /// Energy charged into the storage (non-negative).
    pub chg: f64,
    /// Energy discharged from the storage (non-negative).
    pub dch: f64,
    /// Price of energy in this slot.
    pub mc: f64,
}

/// Reads the input series from a CSV file.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, required columns are
/// missing, a row fails to parse, or the rows violate the series contract.
pub fn read_input_csv(path: &Path) -> DisaggResult<Vec<InputRow>> {
    let file = File::open(path)?;
    read_input(BufReader::new(file))
}

/// Reads the input series from any CSV source.
///
/// # Errors
///
/// See [`read_input_csv`].
pub fn read_input(reader: impl Read) -> DisaggResult<Vec<InputRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == **col))
        .map(|col| (*col).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DisaggError::MissingColumns(missing));
    }

    let rows = rdr
        .deserialize()
        .collect::<Result<Vec<InputRow>, csv::Error>>()?;
    validate_rows(&rows)?;
    Ok(rows)
}

/// Checks the series contract: non-empty, contiguous ascending slots,
/// finite non-negative energies and finite prices.
///
/// # Errors
///
/// Returns [`DisaggError::InvalidInput`] naming the first offending slot.
pub fn validate_rows(rows: &[InputRow]) -> DisaggResult<()> {
    let Some(first) = rows.first() else {
        return Err(DisaggError::InvalidInput("input series is empty".to_string()));
    };

    for (i, row) in rows.iter().enumerate() {
        if row.slot != first.slot + i {
            return Err(DisaggError::InvalidInput(format!(
                "slot ids must be contiguous and ascending: expected {}, got {}",
                first.slot + i,
                row.slot
            )));
        }
        for (name, value) in [("chg", row.chg), ("dch", row.dch)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DisaggError::InvalidInput(format!(
                    "slot {}: {name} must be finite and >= 0, got {value}",
                    row.slot
                )));
            }
        }
        if !row.mc.is_finite() {
            return Err(DisaggError::InvalidInput(format!(
                "slot {}: mc must be finite, got {}",
                row.slot, row.mc
            )));
        }
    }
    Ok(())
}
