//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use rand::{Rng, SeedableRng, rngs::StdRng};

use storage_disagg::io::input::InputRow;

/// Builds an input series with prices `mc = 10 + slot`.
pub fn series(chg: &[f64], dch: &[f64]) -> Vec<InputRow> {
    chg.iter()
        .zip(dch)
        .enumerate()
        .map(|(slot, (&chg, &dch))| InputRow {
            slot,
            chg,
            dch,
            mc: 10.0 + slot as f64,
        })
        .collect()
}

/// The six-slot reference series: charge 2 at slot 1, discharge 1 at slots 3 and 4.
pub fn reference_series() -> Vec<InputRow> {
    series(
        &[0.0, 2.0, 0.0, 0.0, 0.0, 0.0],
        &[0.0, 0.0, 0.0, 1.0, 1.0, 0.0],
    )
}

/// Random storage operation of `n` slots.
///
/// Each slot is idle, charging or discharging, never both; prices follow a
/// noisy daily shape. Deterministic for a given seed.
pub fn random_series(seed: u64, n: usize) -> Vec<InputRow> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|slot| {
            let (chg, dch) = match rng.random_range(0..3) {
                0 => (0.0, 0.0),
                1 => (rng.random_range(0.1..5.0), 0.0),
                _ => (0.0, rng.random_range(0.1..5.0)),
            };
            let hour = (slot % 24) as f64;
            let mc = 40.0 + 20.0 * (hour / 24.0 * std::f64::consts::TAU).sin()
                + rng.random_range(-5.0..5.0);
            InputRow { slot, chg, dch, mc }
        })
        .collect()
}

/// Path of a file under `tests/fixtures`.
pub fn fixture(name: &str) -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
