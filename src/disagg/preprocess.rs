//! Conversion of raw energy flows into an origin-aligned internal power series.

use tracing::debug;

use crate::error::{DisaggError, DisaggResult};
use crate::io::input::{InputRow, validate_rows};

use super::types::Slot;

/// Knobs of the preprocessing stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreprocessOptions {
    /// Rebuild charge/discharge from cyclic SOC increments after rotation.
    pub net_flows: bool,
    /// Largest SOC accepted as "zero" when choosing the time origin.
    pub origin_tolerance: f64,
    /// Internal power magnitudes below this are set to zero.
    pub power_floor: f64,
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            net_flows: true,
            origin_tolerance: 0.0,
            power_floor: 1e-9,
        }
    }
}

/// Converts raw energies into internal power: `(chg·√eff, dch/√eff)`.
pub fn internal_power(chg: f64, dch: f64, eff: f64) -> (f64, f64) {
    let root = eff.sqrt();
    (chg * root, dch / root)
}

/// Cumulative state of charge shifted so that its minimum is exactly zero.
pub fn state_of_charge(ichg: &[f64], idch: &[f64]) -> Vec<f64> {
    let mut acc = 0.0;
    let erg: Vec<f64> = ichg
        .iter()
        .zip(idch)
        .map(|(c, d)| {
            acc += c - d;
            acc
        })
        .collect();
    let min = erg.iter().copied().fold(f64::INFINITY, f64::min);
    erg.into_iter().map(|e| e - min).collect()
}

/// Index of the last slot whose SOC is zero within `tolerance`.
pub fn origin_index(erg: &[f64], tolerance: f64) -> Option<usize> {
    erg.iter().rposition(|e| e.abs() <= tolerance)
}

/// Builds the slot table for one run.
///
/// The slot following the last zero-SOC slot becomes slot 0, so the rotated
/// series opens and closes at zero SOC.
///
/// # Errors
///
/// Returns an error if `eff` is outside (0, 1], the rows violate the series
/// contract (see [`validate_rows`]), or no slot reaches zero SOC within the
/// configured tolerance.
pub fn preprocess(rows: &[InputRow], eff: f64, opts: &PreprocessOptions) -> DisaggResult<Vec<Slot>> {
    if !(eff > 0.0 && eff <= 1.0) {
        return Err(DisaggError::InvalidEfficiency(eff));
    }
    validate_rows(rows)?;

    let (ichg, idch): (Vec<f64>, Vec<f64>) = rows
        .iter()
        .map(|r| internal_power(r.chg, r.dch, eff))
        .unzip();
    let erg = state_of_charge(&ichg, &idch);

    let zero = origin_index(&erg, opts.origin_tolerance).ok_or(DisaggError::UndefinedOrigin {
        tolerance: opts.origin_tolerance,
    })?;
    debug!(
        zero_slot = rows[zero].slot,
        "rotating series to zero state of charge"
    );

    let n = rows.len();
    let mut slots: Vec<Slot> = (zero + 1..n)
        .chain(0..=zero)
        .enumerate()
        .map(|(slot, k)| Slot {
            slot,
            slot_orig: rows[k].slot,
            chg: rows[k].chg,
            dch: rows[k].dch,
            ichg: ichg[k],
            idch: idch[k],
            erg: erg[k],
            mc: rows[k].mc,
        })
        .collect();

    if opts.net_flows {
        net_flows(&mut slots);
    }

    for s in &mut slots {
        if s.ichg.abs() < opts.power_floor {
            s.ichg = 0.0;
        }
        if s.idch.abs() < opts.power_floor {
            s.idch = 0.0;
        }
    }

    Ok(slots)
}

/// Replaces charge/discharge by the positive and negative parts of the
/// cyclic SOC increments.
fn net_flows(slots: &mut [Slot]) {
    let n = slots.len();
    let erg: Vec<f64> = slots.iter().map(|s| s.erg).collect();
    for (i, s) in slots.iter_mut().enumerate() {
        let delta = erg[i] - erg[(i + n - 1) % n];
        s.ichg = delta.max(0.0);
        s.idch = (-delta).max(0.0);
    }
}
