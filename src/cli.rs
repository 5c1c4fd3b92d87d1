//! Command-line argument parsing for the `storage-disagg` binary.

use std::env;
use std::path::PathBuf;

/// Parsed CLI arguments.
#[derive(Debug, Default)]
pub struct CliOptions {
    pub input: PathBuf,
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    /// Replaces the configured runs with a single run of this kind.
    pub kind: Option<String>,
    /// Replaces the efficiency of every configured run.
    pub eff: Option<f64>,
    pub slots_out: Option<PathBuf>,
    pub events_out: Option<PathBuf>,
    pub help: bool,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

/// Parses arguments without the program name.
pub fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();
    let mut input = None;

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                opts.help = true;
                return Ok(opts);
            }
            "--input" => {
                i += 1;
                let path = args.next_or_err(i, "missing value for --input (expected a CSV path)")?;
                if input.replace(PathBuf::from(path)).is_some() {
                    return Err("--input provided more than once".to_string());
                }
            }
            "--config" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --config (expected a TOML path)")?;
                if opts.config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name =
                    args.next_or_err(i, "missing value for --preset (expected a preset name)")?;
                if opts.preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--kind" => {
                i += 1;
                let kind = args.next_or_err(i, "missing value for --kind (expected a label)")?;
                opts.kind = Some(kind.to_string());
            }
            "--eff" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --eff (expected a number)")?;
                let eff = raw
                    .parse::<f64>()
                    .map_err(|_| format!("--eff value \"{raw}\" is not a valid number"))?;
                opts.eff = Some(eff);
            }
            "--slots-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --slots-out (expected a file path)")?;
                opts.slots_out = Some(PathBuf::from(path));
            }
            "--events-out" => {
                i += 1;
                let path =
                    args.next_or_err(i, "missing value for --events-out (expected a file path)")?;
                opts.events_out = Some(PathBuf::from(path));
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.config.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    opts.input = input.ok_or_else(|| "missing required argument --input".to_string())?;
    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("storage-disagg: storage operation disaggregation into charge/discharge cycles");
    eprintln!();
    eprintln!("Usage: storage-disagg --input <csv> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --input <path>        Input CSV with columns slot,chg,dch,mc");
    eprintln!("  --config <path>       Load runs and thresholds from a TOML file");
    eprintln!("  --preset <name>       Use a built-in preset (default, proportional)");
    eprintln!("  --kind <label>        Run a single labelled run instead of the configured ones");
    eprintln!("  --eff <f64>           Override the round-trip efficiency");
    eprintln!("  --slots-out <path>    Export the per-slot component table to CSV");
    eprintln!("  --events-out <path>   Export the per-event table to CSV");
    eprintln!("  --help                Show this help message");
    eprintln!();
    eprintln!("Logging honours RUST_LOG (default: info).");
}
