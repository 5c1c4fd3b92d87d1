//! storage-disagg entry point: CLI wiring and config-driven batch runs.

use std::io;
use std::process;

use tracing_subscriber::EnvFilter;

use storage_disagg::cli::{self, CliOptions};
use storage_disagg::config::{DisaggConfig, RunConfig};
use storage_disagg::io::export::{export_events_csv, export_slots_csv};
use storage_disagg::io::input::read_input_csv;
use storage_disagg::runner::run_batch;

/// Loads the configuration: --config takes priority, then --preset, then the default preset.
fn load_config(cli: &CliOptions) -> DisaggConfig {
    let loaded = if let Some(ref path) = cli.config {
        DisaggConfig::from_toml_file(path)
    } else if let Some(ref name) = cli.preset {
        DisaggConfig::from_preset(name)
    } else {
        Ok(DisaggConfig::default())
    };

    let mut config = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(ref kind) = cli.kind {
        let eff = config.runs.first().map_or(1.0, |r| r.eff);
        config.runs = vec![RunConfig {
            kind: kind.clone(),
            eff,
        }];
    }
    if let Some(eff) = cli.eff {
        for run in &mut config.runs {
            run.eff = eff;
        }
    }
    config
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = cli::parse_args().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        cli::print_usage();
        process::exit(1);
    });
    if cli.help {
        cli::print_usage();
        return;
    }

    let config = load_config(&cli);

    // Validate
    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let rows = read_input_csv(&cli.input).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    let batch = run_batch(&rows, &config).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    for run in &batch.runs {
        println!("\n{run}");
    }

    if let Some(ref path) = cli.slots_out {
        if let Err(e) = export_slots_csv(&batch.slot_rows(), path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Slot components written to {}", path.display());
    }
    if let Some(ref path) = cli.events_out {
        if let Err(e) = export_events_csv(&batch.event_records(), path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Events written to {}", path.display());
    }
}
