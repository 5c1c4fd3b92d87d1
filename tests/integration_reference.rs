//! Integration tests for the six-slot reference series.

mod common;

use storage_disagg::Disaggregator;
use storage_disagg::config::DisaggConfig;
use storage_disagg::disagg::shape::{LevelCut, Proportional};
use storage_disagg::io::input::read_input_csv;
use storage_disagg::runner::run_batch;

#[test]
fn reference_series_is_one_full_cycle() {
    let out = Disaggregator::new("base", 1.0, LevelCut)
        .run(&common::reference_series())
        .expect("reference series runs");

    assert_eq!(out.events.len(), 1);
    let ev = &out.events[0];
    assert_eq!(ev.iteration, 0);
    assert_eq!((ev.slot_min, ev.slot_max), (0, 5));
    assert_eq!((ev.comp_ichg, ev.comp_idch), (2.0, 2.0));
    assert_eq!((ev.res_ichg, ev.res_idch), (0.0, 0.0));
    assert_eq!((ev.ichg_final, ev.idch_final), (2.0, 2.0));

    // no deeper layer joined the events
    assert!(out.layers.iter().skip(1).all(|l| !l.accepted));

    let ichg: Vec<f64> = out.slots.iter().map(|r| r.ichg).collect();
    let idch: Vec<f64> = out.slots.iter().map(|r| r.idch).collect();
    assert_eq!(ichg, vec![0.0, 2.0, 0.0, 0.0, 0.0, 0.0]);
    assert_eq!(idch, vec![0.0, 0.0, 0.0, 1.0, 1.0, 0.0]);
}

#[test]
fn reference_metrics() {
    let out = Disaggregator::new("base", 1.0, Proportional)
        .run(&common::reference_series())
        .expect("reference series runs");
    let ev = &out.events[0];

    assert_eq!(ev.wgt_center_ichg, Some(1.0));
    assert_eq!(ev.wgt_center_idch, Some(3.5));
    assert_eq!(ev.time_diff_icd, Some(2.5));
    // mc = 10 + slot
    assert!((ev.val_comp_ichg - 22.0).abs() < 1e-12);
    assert!((ev.val_comp_idch - 27.0).abs() < 1e-12);
    assert!((ev.eval_comp_net - 5.0).abs() < 1e-12);
    assert!(out.value.difference().abs() < 1e-12);
}

#[test]
fn reference_fixture_matches_in_memory_series() {
    let rows = read_input_csv(&common::fixture("reference.csv")).expect("fixture parses");
    assert_eq!(rows, common::reference_series());

    let batch = run_batch(&rows, &DisaggConfig::default()).expect("batch runs");
    assert_eq!(batch.runs.len(), 1);
    assert_eq!(batch.runs[0].kind, "default");
    assert_eq!(batch.event_records().len(), 1);
}

#[test]
fn lossy_run_scales_internal_power() {
    let eff = 0.81;
    let out = Disaggregator::new("lossy", eff, LevelCut)
        .run(&common::reference_series())
        .expect("lossy run");
    // chg·√eff = 1.8 in, dch/√eff ≈ 2.222 out; netting keeps the SOC path
    let ichg: f64 = out.slots.iter().map(|r| r.ichg).sum();
    let idch: f64 = out.slots.iter().map(|r| r.idch).sum();
    assert!((ichg - idch).abs() < 1e-9);
    assert!(out.events.iter().all(|e| e.eff == eff));
}
