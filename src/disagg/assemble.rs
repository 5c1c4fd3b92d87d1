//! Long-format output tables and valuation diagnostics.

use std::fmt;

use tracing::info;

use super::redistribute::Components;
use super::types::{Direction, Event, Slot};

/// One row of the long per-slot table: a slot's components at one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotComponentRow {
    pub kind: String,
    pub slot: usize,
    pub slot_orig: usize,
    pub chg: f64,
    pub dch: f64,
    pub erg: f64,
    pub mc: f64,
    pub iteration: usize,
    /// Event of this layer whose window covers the slot.
    pub nevent: Option<usize>,
    /// Charging energy allocated to this layer.
    pub ichg: f64,
    /// Discharging energy allocated to this layer.
    pub idch: f64,
}

/// One row of the per-event table with its final metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub kind: String,
    pub nevent: usize,
    pub slot_min: usize,
    pub slot_max: usize,
    pub iteration: usize,
    pub ichg: f64,
    pub idch: f64,
    pub comp_ichg: f64,
    pub comp_idch: f64,
    pub res_ichg: f64,
    pub res_idch: f64,
    pub wgt_center_ichg: Option<f64>,
    pub wgt_center_idch: Option<f64>,
    pub val_comp_ichg: f64,
    pub val_comp_idch: f64,
    pub ichg_final: f64,
    pub idch_final: f64,
    /// Discharge center minus charge center, in slots.
    pub time_diff_icd: Option<f64>,
    /// Internal net value, `val_comp_idch − val_comp_ichg`.
    pub ival_comp_net: f64,
    /// Net value at the grid side, `val_comp_idch·√eff − val_comp_ichg/√eff`.
    pub eval_comp_net: f64,
    pub eff: f64,
}

impl EventRecord {
    /// Derives the final metrics of `event` for a run with efficiency `eff`.
    pub fn from_event(event: &Event, eff: f64, kind: &str) -> Self {
        let root = eff.sqrt();
        let (chg, dch) = (&event.charge, &event.discharge);
        let time_diff_icd = match (dch.wgt_center, chg.wgt_center) {
            (Some(d), Some(c)) => Some(d - c),
            _ => None,
        };

        Self {
            kind: kind.to_string(),
            nevent: event.nevent,
            slot_min: event.slot_min,
            slot_max: event.slot_max,
            iteration: event.iteration,
            ichg: event.ichg,
            idch: event.idch,
            comp_ichg: event.comp_ichg,
            comp_idch: event.comp_idch,
            res_ichg: event.res_ichg,
            res_idch: event.res_idch,
            wgt_center_ichg: chg.wgt_center,
            wgt_center_idch: dch.wgt_center,
            val_comp_ichg: chg.value,
            val_comp_idch: dch.value,
            ichg_final: chg.allocated,
            idch_final: dch.allocated,
            time_diff_icd,
            ival_comp_net: dch.value - chg.value,
            eval_comp_net: dch.value * root - chg.value / root,
            eff,
        }
    }
}

/// Reshapes the per-slot components into long format.
///
/// Rows are ordered by iteration, then slot; one row per slot for every
/// layer that was redistributed.
pub fn slot_rows(slots: &[Slot], components: &Components, kind: &str) -> Vec<SlotComponentRow> {
    let mut rows = Vec::new();
    for iteration in components.iterations() {
        let ichg = components.energy(Direction::Charge, iteration);
        let idch = components.energy(Direction::Discharge, iteration);
        let cover = components.covering_events(iteration);
        for (i, s) in slots.iter().enumerate() {
            rows.push(SlotComponentRow {
                kind: kind.to_string(),
                slot: s.slot,
                slot_orig: s.slot_orig,
                chg: s.chg,
                dch: s.dch,
                erg: s.erg,
                mc: s.mc,
                iteration,
                nevent: cover.and_then(|c| c[i]),
                ichg: ichg.map_or(0.0, |v| v[i]),
                idch: idch.map_or(0.0, |v| v[i]),
            });
        }
    }
    rows
}

/// Net value of the run computed two ways, as a consistency check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueDiagnostics {
    /// `Σ eval_comp_net` over all events.
    pub net_value_events: f64,
    /// `Σ idch·√eff·mc − Σ ichg/√eff·mc` over the preprocessed slots.
    pub net_value_slots: f64,
}

impl ValueDiagnostics {
    /// Computes both net values from the event records and the internal
    /// power of the slots before redistribution.
    pub fn compute(records: &[EventRecord], internal: &[Slot], eff: f64) -> Self {
        let root = eff.sqrt();
        let net_value_events = records.iter().map(|r| r.eval_comp_net).sum();
        let net_value_slots = internal
            .iter()
            .map(|s| s.idch * root * s.mc - s.ichg / root * s.mc)
            .sum();
        let diag = Self {
            net_value_events,
            net_value_slots,
        };
        info!(
            net_value_events = diag.net_value_events,
            net_value_slots = diag.net_value_slots,
            difference = diag.difference(),
            "net value check"
        );
        diag
    }

    pub fn difference(&self) -> f64 {
        self.net_value_events - self.net_value_slots
    }
}

impl fmt::Display for ValueDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Net value input:       {:.6}", self.net_value_events)?;
        writeln!(f, "Net value disagg:      {:.6}", self.net_value_slots)?;
        write!(f, "Difference net value:  {:.6}", self.difference())
    }
}
