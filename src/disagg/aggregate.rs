//! Recursive event aggregation across time-scale layers.

use std::fmt;

use tracing::{debug, info};

use super::matcher::match_events;
use super::segment::segment;
use super::types::{Event, EventTable, SeriesRow, Slot};

/// Segments `series` and matches the resulting events as layer `iteration`.
///
/// This single operation is applied to the slot series at layer 0 and to
/// the residual series of the previous layer thereafter.
pub fn segment_and_match(
    series: &[SeriesRow],
    offset: usize,
    iteration: usize,
    residual_floor: f64,
) -> EventTable {
    match_events(&segment(series, offset), iteration, residual_floor)
}

/// Outcome of one layer of the recursion.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSummary {
    pub iteration: usize,
    /// Number of events produced by the layer.
    pub events: usize,
    /// `Σcomp_ichg + Σcomp_idch` of the layer.
    pub matched: f64,
    /// Whether the layer's events joined the global collection.
    pub accepted: bool,
}

impl fmt::Display for LayerSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "layer {:>2}: {:>5} events, matched {:.4}{}",
            self.iteration,
            self.events,
            self.matched,
            if self.accepted { "" } else { " (discarded)" }
        )
    }
}

/// Difference between matched and original energy per direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConservationCheck {
    /// `Σcomp_ichg − Σichg`.
    pub charge_diff: f64,
    /// `Σcomp_idch − Σidch`.
    pub discharge_diff: f64,
}

/// Accepted events of all layers plus per-layer bookkeeping.
#[derive(Debug, Clone)]
pub struct Aggregation {
    /// Accepted events, ordered by id across all layers.
    pub events: Vec<Event>,
    pub layers: Vec<LayerSummary>,
    pub conservation: ConservationCheck,
}

/// Runs the layer recursion over the preprocessed slots.
///
/// Layer 0 is always kept. Each further layer re-segments the residuals of
/// the previous one and is kept only if it matches some energy; discarded
/// layers still feed the next layer. The recursion stops once a layer has
/// fewer than two events, which always happens since every layer groups
/// the rows of its input.
pub fn aggregate(slots: &[Slot], residual_floor: f64) -> Aggregation {
    let series: Vec<SeriesRow> = slots.iter().map(SeriesRow::from).collect();
    let mut current = segment_and_match(&series, 0, 0, residual_floor);

    let mut layers = vec![LayerSummary {
        iteration: 0,
        events: current.events.len(),
        matched: current.total_comp(),
        accepted: true,
    }];
    let mut events = current.events.clone();

    let mut iteration = 1;
    while current.events.len() > 1 {
        let series = current.as_series();
        let offset = current.max_id();
        let next = segment_and_match(&series, offset, iteration, residual_floor);
        debug_assert!(next.events.len() < series.len());

        let matched = next.total_comp();
        let accepted = matched > 0.0;
        if accepted {
            events.extend(next.events.iter().cloned());
        }
        debug!(iteration, events = next.events.len(), matched, accepted, "layer aggregated");
        layers.push(LayerSummary {
            iteration,
            events: next.events.len(),
            matched,
            accepted,
        });

        current = next;
        iteration += 1;
    }

    let conservation = conservation_check(slots, &events);
    info!(
        discharge_diff = conservation.discharge_diff,
        charge_diff = conservation.charge_diff,
        "matched energy minus total energy"
    );

    Aggregation {
        events,
        layers,
        conservation,
    }
}

/// Compares matched energy of `events` with the slot totals.
pub fn conservation_check(slots: &[Slot], events: &[Event]) -> ConservationCheck {
    let comp_ichg: f64 = events.iter().map(|e| e.comp_ichg).sum();
    let comp_idch: f64 = events.iter().map(|e| e.comp_idch).sum();
    let ichg: f64 = slots.iter().map(|s| s.ichg).sum();
    let idch: f64 = slots.iter().map(|s| s.idch).sum();
    ConservationCheck {
        charge_diff: comp_ichg - ichg,
        discharge_diff: comp_idch - idch,
    }
}
