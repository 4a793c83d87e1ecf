//! Household PV simulator entry point: CLI wiring and config-driven runs.

use std::process;

use tracing_subscriber::EnvFilter;

use home_pv_sim::cli::{self, CliOptions};
use home_pv_sim::config::ScenarioConfig;
use home_pv_sim::error::SimError;
use home_pv_sim::io::actuals::{export_comparison_csv, load_actuals};
use home_pv_sim::io::export::export_csv;
use home_pv_sim::runner::run_scenario;
use home_pv_sim::validation::ValidationReport;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the scenario named on the command line and applies overrides.
fn load_scenario(cli: &CliOptions) -> Result<ScenarioConfig, SimError> {
    // --scenario takes priority, then --preset, then the household default
    let mut scenario = if let Some(ref path) = cli.scenario {
        ScenarioConfig::from_toml_file(path)?
    } else if let Some(ref name) = cli.preset {
        ScenarioConfig::from_preset(name)?
    } else {
        ScenarioConfig::household()
    };

    if let Some(days) = cli.days {
        scenario.simulation.days = days;
    }
    if let Some(seed) = cli.seed {
        scenario.simulation.seed = seed;
    }
    Ok(scenario)
}

fn run(cli: &CliOptions) -> Result<(), SimError> {
    let scenario = load_scenario(cli)?;

    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }

    let result = run_scenario(&scenario, cli.forecast.as_deref())?;

    for r in &result.records {
        println!("{r}");
    }
    println!("\n{}", result.kpis);

    if let Some(ref path) = cli.telemetry_out {
        export_csv(&result.records, path)?;
        tracing::info!(path = %path.display(), "hourly log written");
    }

    if let Some(ref path) = cli.compare_actuals {
        let actuals = load_actuals(path)?;
        let report = ValidationReport::new(&result.records, &actuals);
        println!("\n{report}");

        if let Some(ref out) = cli.comparison_out {
            export_comparison_csv(&report.days, out)?;
            tracing::info!(path = %out.display(), "comparison written");
        }
    }

    Ok(())
}

fn main() {
    let cli = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };
    if cli.help {
        cli::print_usage();
        return;
    }

    init_tracing();

    if let Err(e) = run(&cli) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
