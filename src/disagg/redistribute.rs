//! Sequential redistribution of matched event energy onto the slot grid.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{DisaggError, DisaggResult};

use super::shape::ShapeExtractor;
use super::types::{Direction, Event, FlowMetrics, Slot};

/// Relative tolerance on `Σ allocation` before a shortfall is reported.
const ALLOCATION_TOLERANCE: f64 = 1e-6;

/// Per-slot component energy keyed by `(direction, iteration)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Components {
    n_slots: usize,
    energy: BTreeMap<(Direction, usize), Vec<f64>>,
    nevent: BTreeMap<usize, Vec<Option<usize>>>,
}

impl Components {
    /// Creates an empty component store for `n_slots` slots.
    pub fn new(n_slots: usize) -> Self {
        Self {
            n_slots,
            ..Self::default()
        }
    }

    /// Iterations that received at least one event.
    pub fn iterations(&self) -> impl Iterator<Item = usize> + '_ {
        self.nevent.keys().copied()
    }

    /// Allocated energy per slot for one direction and iteration.
    pub fn energy(&self, direction: Direction, iteration: usize) -> Option<&[f64]> {
        self.energy.get(&(direction, iteration)).map(Vec::as_slice)
    }

    /// Id of the event of `iteration` whose window covers each slot.
    pub fn covering_events(&self, iteration: usize) -> Option<&[Option<usize>]> {
        self.nevent.get(&iteration).map(Vec::as_slice)
    }

    /// Total energy allocated in one direction across all iterations.
    pub fn total(&self, direction: Direction) -> f64 {
        self.energy
            .iter()
            .filter(|((d, _), _)| *d == direction)
            .flat_map(|(_, v)| v.iter())
            .sum()
    }

    fn mark_window(&mut self, iteration: usize, event: &Event) {
        let n = self.n_slots;
        let cover = self.nevent.entry(iteration).or_insert_with(|| vec![None; n]);
        for c in &mut cover[event.slot_min..=event.slot_max] {
            *c = Some(event.nevent);
        }
    }

    fn add(&mut self, direction: Direction, iteration: usize, start: usize, allocation: &[f64]) {
        let n = self.n_slots;
        let column = self
            .energy
            .entry((direction, iteration))
            .or_insert_with(|| vec![0.0; n]);
        for (c, a) in column[start..].iter_mut().zip(allocation) {
            *c += a;
        }
    }
}

/// Clips a residual window to a valid shape profile.
///
/// Negative values become zero, as do values whose magnitude is below
/// `floor`.
pub fn clip_profile(residual: &[f64], floor: f64) -> Vec<f64> {
    residual
        .iter()
        .map(|&v| if v < 0.0 || v.abs() < floor { 0.0 } else { v })
        .collect()
}

/// Redistributes the matched energy of every event onto the slots.
///
/// Events are visited in id order across all layers, discharge before
/// charge. Each allocation is subtracted from the slot residuals before the
/// next one is computed, so the result depends on that order. Event metrics
/// (weighted center, value, allocated total) are written into `events`.
///
/// # Errors
///
/// Returns [`DisaggError::WindowOutOfRange`] if an event window does not fit
/// the slot table.
pub fn redistribute<S: ShapeExtractor + ?Sized>(
    slots: &mut [Slot],
    events: &mut [Event],
    shaper: &S,
    kind: &str,
    allocation_floor: f64,
) -> DisaggResult<Components> {
    let mut components = Components::new(slots.len());
    events.sort_by_key(|e| e.nevent);
    let last_id = events.last().map_or(0, |e| e.nevent);

    for event in events.iter_mut() {
        if event.slot_min > event.slot_max || event.slot_max >= slots.len() {
            return Err(DisaggError::WindowOutOfRange {
                nevent: event.nevent,
                slot_min: event.slot_min,
                slot_max: event.slot_max,
                len: slots.len(),
            });
        }
        debug!(
            kind,
            nevent = event.nevent,
            last = last_id,
            slot_min = event.slot_min,
            slot_max = event.slot_max,
            "redistributing event"
        );

        components.mark_window(event.iteration, event);
        let window = &mut slots[event.slot_min..=event.slot_max];

        for direction in Direction::PROCESSING_ORDER {
            let residual: Vec<f64> = window.iter().map(|s| s.activity(direction)).collect();
            let profile = clip_profile(&residual, allocation_floor);
            let target = event.comp(direction);

            let allocation: Vec<f64> = shaper
                .allocate(&profile, target, kind, direction)
                .into_iter()
                .zip(&profile)
                .map(|(a, &p)| a.clamp(0.0, p))
                .collect();

            let allocated: f64 = allocation.iter().sum();
            if (allocated - target).abs() > ALLOCATION_TOLERANCE * target.max(1.0) {
                warn!(
                    kind,
                    nevent = event.nevent,
                    direction = direction.as_str(),
                    target,
                    allocated,
                    "allocation falls short of matched energy"
                );
            }

            let mut weighted_slots = 0.0;
            let mut value = 0.0;
            for (slot, a) in window.iter_mut().zip(&allocation) {
                *slot.activity_mut(direction) -= a;
                weighted_slots += slot.slot as f64 * a;
                value += slot.mc * a;
            }

            components.add(direction, event.iteration, event.slot_min, &allocation);
            *event.metrics_mut(direction) = FlowMetrics {
                wgt_center: (allocated > 0.0).then(|| weighted_slots / allocated),
                value,
                allocated,
            };
        }
    }

    Ok(components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disagg::shape::{LevelCut, Proportional};

    fn slots(ichg: &[f64], idch: &[f64], mc: &[f64]) -> Vec<Slot> {
        ichg.iter()
            .zip(idch)
            .zip(mc)
            .enumerate()
            .map(|(slot, ((&ichg, &idch), &mc))| Slot {
                slot,
                slot_orig: slot,
                chg: ichg,
                dch: idch,
                ichg,
                idch,
                erg: 0.0,
                mc,
            })
            .collect()
    }

    fn event(nevent: usize, iteration: usize, window: (usize, usize), comp: f64) -> Event {
        Event {
            nevent,
            slot_min: window.0,
            slot_max: window.1,
            ichg: comp,
            idch: comp,
            comp_ichg: comp,
            comp_idch: comp,
            res_ichg: 0.0,
            res_idch: 0.0,
            iteration,
            charge: FlowMetrics::default(),
            discharge: FlowMetrics::default(),
        }
    }

    #[test]
    fn clip_zeroes_negative_and_tiny_values() {
        assert_eq!(clip_profile(&[-1.0, 1e-12, 0.5], 1e-10), vec![0.0, 0.0, 0.5]);
    }

    #[test]
    fn single_event_consumes_whole_profile() {
        let mut s = slots(
            &[0.0, 2.0, 0.0, 0.0, 0.0, 0.0],
            &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0],
            &[1.0, 1.0, 1.0, 5.0, 5.0, 1.0],
        );
        let mut events = vec![event(1, 0, (0, 5), 2.0)];
        let comps = redistribute(&mut s, &mut events, &LevelCut, "base", 1e-10).expect("fits");

        assert!((comps.total(Direction::Charge) - 2.0).abs() < 1e-12);
        assert!((comps.total(Direction::Discharge) - 2.0).abs() < 1e-12);
        assert!(s.iter().all(|x| x.ichg.abs() < 1e-12 && x.idch.abs() < 1e-12));

        let ev = &events[0];
        assert_eq!(ev.charge.wgt_center, Some(1.0));
        assert_eq!(ev.discharge.wgt_center, Some(3.5));
        assert!((ev.discharge.value - 10.0).abs() < 1e-12);
        assert!((ev.charge.value - 2.0).abs() < 1e-12);
        assert_eq!(comps.covering_events(0), Some(&[Some(1); 6][..]));
    }

    #[test]
    fn later_events_see_depleted_residual() {
        let mut s = slots(&[2.0, 0.0], &[0.0, 2.0], &[1.0, 1.0]);
        let mut events = vec![event(1, 0, (0, 1), 1.5), event(2, 1, (0, 1), 1.0)];
        let comps = redistribute(&mut s, &mut events, &Proportional, "base", 1e-10).expect("fits");
        // only 0.5 left for the second event
        assert!((events[1].charge.allocated - 0.5).abs() < 1e-12);
        assert!((comps.total(Direction::Charge) - 2.0).abs() < 1e-12);
        assert_eq!(comps.iterations().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn events_are_processed_in_id_order() {
        let mut s = slots(&[2.0, 0.0], &[0.0, 2.0], &[1.0, 1.0]);
        let mut events = vec![event(5, 1, (0, 1), 1.0), event(2, 0, (0, 1), 2.0)];
        redistribute(&mut s, &mut events, &Proportional, "base", 1e-10).expect("fits");
        assert_eq!(events[0].nevent, 2);
        assert!((events[0].charge.allocated - 2.0).abs() < 1e-12);
        assert_eq!(events[1].charge.allocated, 0.0);
        assert_eq!(events[1].charge.wgt_center, None);
    }

    #[test]
    fn discharge_is_shaped_before_charge() {
        let seen = std::cell::RefCell::new(Vec::new());
        let recorder = |profile: &[f64], target: f64, _: &str, direction: Direction| {
            seen.borrow_mut().push(direction);
            Proportional.allocate(profile, target, "", direction)
        };
        let mut s = slots(&[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]);
        let mut events = vec![event(1, 0, (0, 1), 1.0)];
        redistribute(&mut s, &mut events, &recorder, "base", 1e-10).expect("fits");
        assert_eq!(*seen.borrow(), vec![Direction::Discharge, Direction::Charge]);
    }

    #[test]
    fn misbehaving_shaper_is_clamped_to_profile() {
        let greedy = |profile: &[f64], _: f64, _: &str, _: Direction| vec![10.0; profile.len()];
        let mut s = slots(&[1.0, 0.0], &[0.0, 1.0], &[1.0, 1.0]);
        let mut events = vec![event(1, 0, (0, 1), 1.0)];
        redistribute(&mut s, &mut events, &greedy, "base", 1e-10).expect("fits");
        assert!(s.iter().all(|x| x.ichg >= 0.0 && x.idch >= 0.0));
        assert_eq!(events[0].charge.allocated, 1.0);
    }

    #[test]
    fn window_outside_slots_is_an_error() {
        let mut s = slots(&[1.0], &[1.0], &[1.0]);
        let mut events = vec![event(1, 0, (0, 3), 1.0)];
        let err = redistribute(&mut s, &mut events, &LevelCut, "base", 1e-10);
        assert!(matches!(err, Err(DisaggError::WindowOutOfRange { nevent: 1, .. })));
    }
}
