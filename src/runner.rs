//! Scenario execution: resolves the forecast, builds the engine and runs it.

use std::path::{Path, PathBuf};

use crate::config::{ConfigError, ScenarioConfig};
use crate::error::SimError;
use crate::forecast::{DayForecast, NaiveForecast};
use crate::io::forecast::load_forecast;
use crate::sim::kpi::KpiReport;
use crate::sim::types::LogRecord;

/// Output of one scenario run.
pub struct SimulationResult {
    pub records: Vec<LogRecord>,
    pub kpis: KpiReport,
}

/// Resolves the forecast days for a scenario.
///
/// An explicit `forecast_path` wins over the configured source. File
/// sources shorter than `simulation.days` are extended by repeating the
/// loaded days on the following dates; longer ones are truncated.
///
/// # Errors
///
/// Returns a `SimError` if the forecast cannot be generated or loaded.
pub fn resolve_forecast(
    config: &ScenarioConfig,
    forecast_path: Option<&Path>,
) -> Result<Vec<DayForecast>, SimError> {
    let wanted = config.simulation.days;
    let configured_path = config.forecast.path.as_ref().map(PathBuf::from);

    let loaded = match forecast_path {
        Some(path) => load_forecast(path)?,
        None => match config.generated_forecast()? {
            Some(days) => return Ok(days),
            None => {
                let path = configured_path.ok_or_else(|| {
                    ConfigError::new("forecast.path", "required for file-backed sources")
                })?;
                load_forecast(&path)?
            }
        },
    };

    if loaded.len() < wanted {
        tracing::info!(
            loaded = loaded.len(),
            wanted,
            "forecast shorter than simulation, repeating loaded days"
        );
        Ok(NaiveForecast.forecast(&loaded, wanted))
    } else {
        Ok(loaded.into_iter().take(wanted).collect())
    }
}

/// Runs a validated scenario end to end.
///
/// # Errors
///
/// Returns the first validation failure as `SimError::Config`, or any
/// forecast loading error.
pub fn run_scenario(
    config: &ScenarioConfig,
    forecast_path: Option<&Path>,
) -> Result<SimulationResult, SimError> {
    if let Some(first) = config.validate().into_iter().next() {
        return Err(first.into());
    }

    let days = resolve_forecast(config, forecast_path)?;
    let mut engine = config.build_engine()?;
    engine.run(&days);

    let capacity_wh = engine.battery().capacity_wh();
    let nameplate_w = engine.array().spec().nameplate_w();
    let records = engine.into_log();
    let kpis = KpiReport::from_records(&records, capacity_wh, nameplate_w);

    Ok(SimulationResult { records, kpis })
}
