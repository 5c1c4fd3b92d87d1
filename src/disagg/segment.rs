//! Onset-based partitioning of an activity series into events.

use super::types::SeriesRow;

/// Raw totals of one segmented event, before matching.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventTotals {
    pub nevent: usize,
    pub ichg: f64,
    pub idch: f64,
    pub slot_min: usize,
    pub slot_max: usize,
}

/// Rising-edge flags of both activity indicators, one entry per row.
///
/// The series is treated as bounded by zero-valued sentinel rows, so a row
/// active at the very start counts as an onset.
pub fn onsets(series: &[SeriesRow]) -> Vec<(bool, bool)> {
    let mut prev = (false, false);
    series
        .iter()
        .map(|row| {
            let active = (row.ichg > 0.0, row.idch > 0.0);
            let onset = (active.0 && !prev.0, active.1 && !prev.1);
            prev = active;
            onset
        })
        .collect()
}

/// Assigns an event id to every row of `series`.
///
/// Onset rows are kept only when both flags differ from those of the
/// preceding onset row, so charge and discharge onsets alternate. Ids count
/// the kept charge onsets, start at 1 and are shifted by `offset`.
pub fn assign_ids(series: &[SeriesRow], offset: usize) -> Vec<usize> {
    let mut last_onset: Option<(bool, bool)> = None;
    let mut count = 0usize;

    onsets(series)
        .into_iter()
        .map(|onset| {
            if onset.0 || onset.1 {
                let keep = last_onset.is_none_or(|prev| prev.0 != onset.0 && prev.1 != onset.1);
                if keep && onset.0 {
                    count += 1;
                }
                last_onset = Some(onset);
            }
            count.max(1) + offset
        })
        .collect()
}

/// Partitions `series` into events and sums their activity and bounds.
///
/// Rows must be ordered; ids are non-decreasing, so each event is one
/// contiguous run of rows. Returns an empty vector for an empty series.
pub fn segment(series: &[SeriesRow], offset: usize) -> Vec<EventTotals> {
    let ids = assign_ids(series, offset);
    let mut events: Vec<EventTotals> = Vec::new();

    for (row, nevent) in series.iter().zip(ids) {
        match events.last_mut() {
            Some(ev) if ev.nevent == nevent => {
                ev.ichg += row.ichg;
                ev.idch += row.idch;
                ev.slot_min = ev.slot_min.min(row.slot_min);
                ev.slot_max = ev.slot_max.max(row.slot_max);
            }
            _ => events.push(EventTotals {
                nevent,
                ichg: row.ichg,
                idch: row.idch,
                slot_min: row.slot_min,
                slot_max: row.slot_max,
            }),
        }
    }

    events
}
