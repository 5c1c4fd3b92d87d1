//! Pairing of charge and discharge energy inside each event.

use super::segment::EventTotals;
use super::types::{Event, EventTable, FlowMetrics};

/// Matches one event: `comp = min(ichg, idch)` and the remainder is residual.
///
/// Residuals below `residual_floor` are treated as fully matched and set to 0.
pub fn match_event(totals: &EventTotals, iteration: usize, residual_floor: f64) -> Event {
    let comp = totals.ichg.min(totals.idch);
    let clamp = |res: f64| if res < residual_floor { 0.0 } else { res };

    Event {
        nevent: totals.nevent,
        slot_min: totals.slot_min,
        slot_max: totals.slot_max,
        ichg: totals.ichg,
        idch: totals.idch,
        comp_ichg: comp,
        comp_idch: comp,
        res_ichg: clamp(totals.ichg - comp),
        res_idch: clamp(totals.idch - comp),
        iteration,
        charge: FlowMetrics::default(),
        discharge: FlowMetrics::default(),
    }
}

/// Matches every segmented event of one layer.
pub fn match_events(totals: &[EventTotals], iteration: usize, residual_floor: f64) -> EventTable {
    EventTable {
        events: totals
            .iter()
            .map(|t| match_event(t, iteration, residual_floor))
            .collect(),
    }
}
