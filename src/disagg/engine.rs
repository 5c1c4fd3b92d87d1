//! Disaggregation engine: preprocessing, layer aggregation, redistribution.

use std::fmt;

use tracing::info;

use crate::error::DisaggResult;
use crate::io::input::InputRow;

use super::aggregate::{Aggregation, ConservationCheck, LayerSummary, aggregate};
use super::assemble::{EventRecord, SlotComponentRow, ValueDiagnostics, slot_rows};
use super::preprocess::{PreprocessOptions, preprocess};
use super::redistribute::redistribute;
use super::shape::ShapeExtractor;
use super::types::Slot;

/// Complete result of one disaggregation run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub kind: String,
    pub eff: f64,
    /// Long per-slot table, ordered by iteration then slot.
    pub slots: Vec<SlotComponentRow>,
    /// Per-event table, ordered by event id.
    pub events: Vec<EventRecord>,
    pub layers: Vec<LayerSummary>,
    pub conservation: ConservationCheck,
    pub value: ValueDiagnostics,
    /// Slot table after redistribution; `ichg`/`idch` hold what was left unallocated.
    pub residual: Vec<Slot>,
}

impl fmt::Display for RunOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "--- Disaggregation Report (kind = {}, eff = {}) ---",
            self.kind, self.eff
        )?;
        writeln!(f, "Slots:                 {}", self.residual.len())?;
        writeln!(f, "Events:                {}", self.events.len())?;
        for layer in &self.layers {
            writeln!(f, "  {layer}")?;
        }
        writeln!(
            f,
            "Difference idch (events - total): {:.6}",
            self.conservation.discharge_diff
        )?;
        writeln!(
            f,
            "Difference ichg (events - total): {:.6}",
            self.conservation.charge_diff
        )?;
        write!(f, "{}", self.value)
    }
}

/// Disaggregation engine for one labelled run.
///
/// Generic over `S: ShapeExtractor` so the energy-shape heuristic can be
/// injected; the engine itself only owns the run parameters.
pub struct Disaggregator<S: ShapeExtractor> {
    kind: String,
    eff: f64,
    preprocess: PreprocessOptions,
    residual_floor: f64,
    allocation_floor: f64,
    shaper: S,
}

impl<S: ShapeExtractor> Disaggregator<S> {
    /// Creates an engine with the default numeric thresholds.
    ///
    /// # Arguments
    ///
    /// * `kind` - Label attached to every output row
    /// * `eff` - Round-trip efficiency in (0, 1]
    /// * `shaper` - Shape extractor used by the redistributor
    pub fn new(kind: impl Into<String>, eff: f64, shaper: S) -> Self {
        Self {
            kind: kind.into(),
            eff,
            preprocess: PreprocessOptions::default(),
            residual_floor: 1e-3,
            allocation_floor: 1e-10,
            shaper,
        }
    }

    /// Replaces the preprocessing options.
    pub fn with_preprocess(mut self, preprocess: PreprocessOptions) -> Self {
        self.preprocess = preprocess;
        self
    }

    /// Sets the per-event residual floor and the allocation floor.
    pub fn with_floors(mut self, residual_floor: f64, allocation_floor: f64) -> Self {
        self.residual_floor = residual_floor;
        self.allocation_floor = allocation_floor;
        self
    }

    /// Runs the full pipeline on a complete input series.
    ///
    /// # Errors
    ///
    /// Propagates preprocessing errors (efficiency, invalid or empty input,
    /// undefined origin) and event windows that do not fit the slot table.
    pub fn run(&self, rows: &[InputRow]) -> DisaggResult<RunOutput> {
        info!(kind = %self.kind, eff = self.eff, slots = rows.len(), "starting disaggregation");

        let mut slots = preprocess(rows, self.eff, &self.preprocess)?;
        let internal = slots.clone();

        let Aggregation {
            mut events,
            layers,
            conservation,
        } = aggregate(&slots, self.residual_floor);

        let components = redistribute(
            &mut slots,
            &mut events,
            &self.shaper,
            &self.kind,
            self.allocation_floor,
        )?;

        let records: Vec<EventRecord> = events
            .iter()
            .map(|e| EventRecord::from_event(e, self.eff, &self.kind))
            .collect();
        let value = ValueDiagnostics::compute(&records, &internal, self.eff);
        let slot_table = slot_rows(&slots, &components, &self.kind);

        info!(
            kind = %self.kind,
            events = records.len(),
            layers = layers.len(),
            "disaggregation finished"
        );

        Ok(RunOutput {
            kind: self.kind.clone(),
            eff: self.eff,
            slots: slot_table,
            events: records,
            layers,
            conservation,
            value,
            residual: slots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disagg::shape::LevelCut;
    use crate::error::DisaggError;

    fn rows(chg: &[f64], dch: &[f64]) -> Vec<InputRow> {
        chg.iter()
            .zip(dch)
            .enumerate()
            .map(|(slot, (&chg, &dch))| InputRow {
                slot,
                chg,
                dch,
                mc: 1.0 + slot as f64,
            })
            .collect()
    }

    #[test]
    fn reference_series_single_event() {
        let input = rows(&[0.0, 2.0, 0.0, 0.0, 0.0, 0.0], &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
        let out = Disaggregator::new("base", 1.0, LevelCut).run(&input).expect("runs");

        assert_eq!(out.events.len(), 1);
        assert_eq!(out.layers.len(), 1);
        let ev = &out.events[0];
        assert_eq!((ev.slot_min, ev.slot_max), (0, 5));
        assert_eq!((ev.comp_ichg, ev.comp_idch), (2.0, 2.0));
        assert_eq!((ev.res_ichg, ev.res_idch), (0.0, 0.0));

        let chg: f64 = out.slots.iter().map(|r| r.ichg).sum();
        let dch: f64 = out.slots.iter().map(|r| r.idch).sum();
        assert_eq!(chg, 2.0);
        assert_eq!(dch, 2.0);
        assert_eq!(out.slots.len(), 6);
        assert!(out.slots.iter().all(|r| r.kind == "base"));
    }

    #[test]
    fn value_check_closes_for_lossless_run() {
        let input = rows(&[1.0, 0.0, 2.0, 0.0, 0.0], &[0.0, 1.0, 0.0, 1.0, 1.0]);
        let out = Disaggregator::new("k", 1.0, LevelCut).run(&input).expect("runs");
        assert!(out.value.difference().abs() < 1e-9, "{}", out.value);
    }

    #[test]
    fn report_mentions_kind_and_layers() {
        let input = rows(&[2.0, 0.0, 1.0, 0.0], &[0.0, 1.0, 0.0, 2.0]);
        let out = Disaggregator::new("peak", 1.0, LevelCut).run(&input).expect("runs");
        let report = out.to_string();
        assert!(report.contains("kind = peak"));
        assert!(report.contains("layer  1"));
    }

    #[test]
    fn non_finite_or_negative_energy_is_rejected() {
        let nan = rows(&[0.0, f64::NAN, 0.0, 3.0], &[0.0, 0.0, 1.0, 0.0]);
        let err = Disaggregator::new("k", 1.0, LevelCut).run(&nan);
        assert!(matches!(err, Err(DisaggError::InvalidInput(_))), "{err:?}");

        let negative = rows(&[0.0, -2.0, 0.0, 3.0], &[0.0, 0.0, 1.0, 0.0]);
        let err = Disaggregator::new("k", 1.0, LevelCut)
            .with_preprocess(PreprocessOptions {
                net_flows: false,
                ..PreprocessOptions::default()
            })
            .run(&negative);
        assert!(matches!(err, Err(DisaggError::InvalidInput(_))), "{err:?}");
    }

    #[test]
    fn bad_efficiency_is_rejected() {
        let input = rows(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(Disaggregator::new("k", 0.0, LevelCut).run(&input).is_err());
    }
}
