//! Command-line argument parsing.

use std::env;
use std::path::PathBuf;

/// Parsed CLI arguments.
#[derive(Debug, Default, PartialEq)]
pub struct CliOptions {
    pub scenario: Option<PathBuf>,
    pub preset: Option<String>,
    pub days: Option<usize>,
    pub seed: Option<u64>,
    pub forecast: Option<PathBuf>,
    pub telemetry_out: Option<PathBuf>,
    pub compare_actuals: Option<PathBuf>,
    pub comparison_out: Option<PathBuf>,
    pub help: bool,
}

/// Parses the process arguments.
///
/// # Errors
///
/// Returns a message describing the first invalid argument.
pub fn parse_args() -> Result<CliOptions, String> {
    parse_args_from(env::args().skip(1))
}

/// Parses an explicit argument list (without the program name).
///
/// # Errors
///
/// Returns a message describing the first invalid argument.
pub fn parse_args_from(args: impl IntoIterator<Item = String>) -> Result<CliOptions, String> {
    let args: Vec<String> = args.into_iter().collect();
    let mut opts = CliOptions::default();
    let mut i = 0usize;

    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => opts.help = true,
            "--scenario" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --scenario (expected a TOML file path)",
                )?;
                if opts.scenario.replace(PathBuf::from(path)).is_some() {
                    return Err("--scenario provided more than once".to_string());
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
            "--days" => {
                i += 1;
                let raw =
                    args.next_or_err(i, "missing value for --days (expected a positive integer)")?;
                match raw.parse::<usize>() {
                    Ok(n) if n > 0 => opts.days = Some(n),
                    _ => return Err(format!("--days value \"{raw}\" is not a positive integer")),
                }
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let seed = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                opts.seed = Some(seed);
            }
            "--forecast" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --forecast (expected a .json or .csv path)",
                )?;
                opts.forecast = Some(PathBuf::from(path));
            }
            "--telemetry-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --telemetry-out (expected a file path)",
                )?;
                opts.telemetry_out = Some(PathBuf::from(path));
            }
            "--compare-actuals" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --compare-actuals (expected a CSV path)",
                )?;
                opts.compare_actuals = Some(PathBuf::from(path));
            }
            "--comparison-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --comparison-out (expected a file path)",
                )?;
                opts.comparison_out = Some(PathBuf::from(path));
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.scenario.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--scenario` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    if opts.comparison_out.is_some() && opts.compare_actuals.is_none() {
        return Err("`--comparison-out` requires `--compare-actuals`".to_string());
    }

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

/// Prints usage to stderr.
pub fn print_usage() {
    eprintln!("home-pv-sim: household PV, battery and appliance dispatch simulator");
    eprintln!();
    eprintln!("Usage: home-pv-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --scenario <path>          Load scenario from TOML config file");
    eprintln!("  --preset <name>            Use a built-in preset (household, demo_profile)");
    eprintln!("  --days <n>                 Override number of simulated days");
    eprintln!("  --seed <u64>               Override synthetic forecast seed");
    eprintln!("  --forecast <path>          Load forecast from a .json or .csv file");
    eprintln!("  --telemetry-out <path>     Export the hourly log to CSV");
    eprintln!("  --compare-actuals <path>   Compare generation with measured daily CSV");
    eprintln!("  --comparison-out <path>    Export the per-day comparison to CSV");
    eprintln!("  --help                     Show this help message");
    eprintln!();
    eprintln!("If no --scenario or --preset is given, the household preset is used.");
    eprintln!("Log verbosity follows RUST_LOG (default: info).");
}
