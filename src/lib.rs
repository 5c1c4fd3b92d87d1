//! Disaggregation of aggregate storage operation into nested charge/discharge cycles.

pub mod cli;
pub mod config;
/// Preprocessing, event segmentation, layer aggregation and redistribution.
pub mod disagg;
pub mod error;
pub mod io;
pub mod runner;

pub use disagg::engine::{Disaggregator, RunOutput};
pub use error::{DisaggError, DisaggResult};
