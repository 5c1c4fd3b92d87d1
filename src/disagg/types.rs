//! Core disaggregation types: slots, series rows, events and directions.

use std::fmt;

/// Flow direction of storage activity.
///
/// Column naming follows the internal-power convention: `ichg` for charging
/// into the store, `idch` for discharging out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Direction {
    Charge,
    Discharge,
}

impl Direction {
    /// Order in which the redistributor visits the two directions of an event.
    pub const PROCESSING_ORDER: [Direction; 2] = [Direction::Discharge, Direction::Charge];

    /// Returns the internal-power column name (`"ichg"` / `"idch"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Charge => "ichg",
            Direction::Discharge => "idch",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One time step of the preprocessed series.
///
/// `ichg` and `idch` start as the internal power of the slot and are
/// depleted in place by the redistributor, so after a run they hold the
/// energy no event could claim.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    /// Contiguous id after origin rotation, starting at 0.
    pub slot: usize,
    /// Id of this slot in the input series.
    pub slot_orig: usize,
    /// Raw charged energy as supplied.
    pub chg: f64,
    /// Raw discharged energy as supplied.
    pub dch: f64,
    /// Internal charging power (running residual during redistribution).
    pub ichg: f64,
    /// Internal discharging power (running residual during redistribution).
    pub idch: f64,
    /// State of charge at the end of the slot.
    pub erg: f64,
    /// Price of energy in this slot.
    pub mc: f64,
}

impl Slot {
    /// Returns the residual activity for the given direction.
    pub fn activity(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Charge => self.ichg,
            Direction::Discharge => self.idch,
        }
    }

    /// Mutable access to the residual activity for the given direction.
    pub fn activity_mut(&mut self, direction: Direction) -> &mut f64 {
        match direction {
            Direction::Charge => &mut self.ichg,
            Direction::Discharge => &mut self.idch,
        }
    }
}

/// One row of a series fed to the segmenter.
///
/// At layer 0 `id` is the slot id and the window is the slot itself; at
/// deeper layers `id` is the event id of the previous layer and the window
/// carries that event's original slot bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesRow {
    pub id: usize,
    pub ichg: f64,
    pub idch: f64,
    pub slot_min: usize,
    pub slot_max: usize,
}

impl From<&Slot> for SeriesRow {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.slot,
            ichg: slot.ichg,
            idch: slot.idch,
            slot_min: slot.slot,
            slot_max: slot.slot,
        }
    }
}

/// Per-direction metrics filled in by the redistributor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowMetrics {
    /// Energy-weighted mean slot of the allocation; `None` if nothing was allocated.
    pub wgt_center: Option<f64>,
    /// Price-weighted value of the allocation (`Σ mc·a`).
    pub value: f64,
    /// Total energy actually allocated.
    pub allocated: f64,
}

/// A matched charge/discharge event at one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Globally unique event id.
    pub nevent: usize,
    /// First original slot covered by the event.
    pub slot_min: usize,
    /// Last original slot covered by the event.
    pub slot_max: usize,
    /// Total charging energy in the window.
    pub ichg: f64,
    /// Total discharging energy in the window.
    pub idch: f64,
    pub comp_ichg: f64,
    pub comp_idch: f64,
    pub res_ichg: f64,
    pub res_idch: f64,
    /// Layer index, 0 = finest.
    pub iteration: usize,
    pub charge: FlowMetrics,
    pub discharge: FlowMetrics,
}

impl Event {
    /// Matched energy for the given direction.
    pub fn comp(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Charge => self.comp_ichg,
            Direction::Discharge => self.comp_idch,
        }
    }

    pub fn metrics_mut(&mut self, direction: Direction) -> &mut FlowMetrics {
        match direction {
            Direction::Charge => &mut self.charge,
            Direction::Discharge => &mut self.discharge,
        }
    }

    /// Residual row standing for this event in the next layer's series.
    pub fn as_series_row(&self) -> SeriesRow {
        SeriesRow {
            id: self.nevent,
            ichg: self.res_ichg,
            idch: self.res_idch,
            slot_min: self.slot_min,
            slot_max: self.slot_max,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "event {:>4} (iter {}) slots [{}, {}] | chg={:.4} dch={:.4} \
             comp={:.4} | res chg={:.4} dch={:.4}",
            self.nevent,
            self.iteration,
            self.slot_min,
            self.slot_max,
            self.ichg,
            self.idch,
            self.comp_ichg,
            self.res_ichg,
            self.res_idch,
        )
    }
}

/// Events of a single layer, ordered by id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    pub events: Vec<Event>,
}

impl EventTable {
    /// Largest event id in the table, 0 when empty.
    pub fn max_id(&self) -> usize {
        self.events.iter().map(|e| e.nevent).max().unwrap_or(0)
    }

    /// Total matched energy, `Σcomp_ichg + Σcomp_idch`.
    pub fn total_comp(&self) -> f64 {
        self.events.iter().map(|e| e.comp_ichg + e.comp_idch).sum()
    }

    /// The residual series this table hands to the next layer.
    pub fn as_series(&self) -> Vec<SeriesRow> {
        self.events.iter().map(Event::as_series_row).collect()
    }
}
