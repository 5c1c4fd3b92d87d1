//! Integration tests for batches of independently labelled runs.

mod common;

use storage_disagg::config::DisaggConfig;
use storage_disagg::io::input::read_input_csv;
use storage_disagg::runner::run_batch;

#[test]
fn kinds_never_share_rows() {
    let rows = read_input_csv(&common::fixture("two_days.csv")).expect("fixture parses");
    let cfg = DisaggConfig::from_toml_file(std::path::Path::new("scenarios/efficiency_sweep.toml"))
        .expect("scenario parses");
    let batch = run_batch(&rows, &cfg).expect("batch runs");

    assert_eq!(batch.runs.len(), 3);
    for run in &batch.runs {
        assert!(run.slots.iter().all(|r| r.kind == run.kind));
        assert!(run.events.iter().all(|e| e.kind == run.kind && e.eff == run.eff));

        let mut ids: Vec<usize> = run.events.iter().map(|e| e.nevent).collect();
        ids.dedup();
        assert_eq!(ids.len(), run.events.len(), "duplicate ids within {}", run.kind);
    }

    let all = batch.event_records();
    assert_eq!(all.len(), batch.runs.iter().map(|r| r.events.len()).sum::<usize>());
}

#[test]
fn each_run_matches_its_standalone_result() {
    let rows = common::random_series(5, 48);
    let mut cfg = DisaggConfig::default();
    cfg.runs = vec![
        storage_disagg::config::RunConfig {
            kind: "a".into(),
            eff: 0.9,
        },
        storage_disagg::config::RunConfig {
            kind: "b".into(),
            eff: 0.7,
        },
    ];
    let batch = run_batch(&rows, &cfg).unwrap();

    let mut single = cfg.clone();
    single.runs.truncate(1);
    let alone = run_batch(&rows, &single).unwrap();

    assert_eq!(batch.run("a").unwrap().events, alone.runs[0].events);
    assert_eq!(batch.run("a").unwrap().slots, alone.runs[0].slots);
}

#[test]
fn bundled_scenarios_are_valid() {
    for path in ["scenarios/default.toml", "scenarios/efficiency_sweep.toml"] {
        let cfg = DisaggConfig::from_toml_file(std::path::Path::new(path))
            .unwrap_or_else(|e| panic!("{path}: {e}"));
        assert!(cfg.validate().is_empty(), "{path} invalid");
    }
}
