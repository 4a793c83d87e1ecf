//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::devices::{
    Appliance, ArraySpec, BatteryStore, HourlyShade, PvArray, RunRule, ShadingProfile,
};
use crate::error::SimError;
use crate::forecast::{DayForecast, HOURS_PER_DAY, SyntheticForecast};
use crate::sim::dispatch::DispatchEngine;
use crate::sim::engine::Engine;
use crate::sim::scheduler::{DayAheadScheduler, SchedulePolicy};

/// Date format used by `simulation.start_date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Top-level scenario configuration parsed from TOML.
///
/// Every section is optional. Missing sections and fields fall back to the
/// `household` preset. Load from TOML with [`ScenarioConfig::from_toml_file`]
/// or use [`ScenarioConfig::household`] for the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation span and global switches.
    pub simulation: SimulationConfig,
    /// PV array description.
    pub array: ArrayConfig,
    /// Shading model selection.
    pub shading: ShadingConfig,
    /// Battery storage parameters.
    pub battery: BatteryConfig,
    /// Appliance set, names must be unique.
    pub appliances: Vec<ApplianceConfig>,
    /// Where the irradiance forecast comes from.
    pub forecast: ForecastConfig,
    /// Day-ahead scheduling policy.
    pub scheduler: SchedulerConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::household()
    }
}

/// Simulation span and global switches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Number of days to simulate (must be > 0).
    pub days: usize,
    /// First simulated date, `YYYY-MM-DD`.
    pub start_date: String,
    /// Seed for the synthetic forecast generator.
    pub seed: u64,
    /// Cap battery charge/discharge at its rated power.
    pub enforce_rated_power: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            days: 1,
            start_date: "2024-06-01".to_string(),
            seed: 42,
            enforce_rated_power: false,
        }
    }
}

/// PV array description.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArrayConfig {
    /// Panel efficiency at reference temperature (0.0–1.0).
    pub efficiency: f64,
    /// Rated power of one panel (W).
    pub panel_rated_w: f64,
    /// Number of panels.
    pub panel_count: u32,
    /// Panel width (m).
    pub panel_width_m: f64,
    /// Panel length (m).
    pub panel_length_m: f64,
    /// System loss fraction (0.0–1.0).
    pub system_loss: f64,
    /// Tilt from horizontal (degrees).
    pub tilt_deg: f64,
    /// Array azimuth, 180 = south (degrees).
    pub azimuth_deg: f64,
    /// Pmax temperature coefficient (%/°C).
    pub temp_coeff_pmax_pct: f64,
    /// Output loss per year in service (fraction).
    pub annual_degradation: f64,
    /// Years the array has been in service.
    pub years_in_service: u32,
}

impl Default for ArrayConfig {
    fn default() -> Self {
        Self {
            efficiency: 0.1955,
            panel_rated_w: 320.0,
            panel_count: 18,
            panel_width_m: 0.992,
            panel_length_m: 1.640,
            system_loss: 0.10,
            tilt_deg: 26.0,
            azimuth_deg: 180.0,
            temp_coeff_pmax_pct: -0.45,
            annual_degradation: 0.005,
            years_in_service: 0,
        }
    }
}

impl ArrayConfig {
    /// Converts into the device-level array description.
    pub fn to_spec(&self) -> ArraySpec {
        ArraySpec {
            efficiency: self.efficiency,
            panel_rated_w: self.panel_rated_w,
            panel_count: self.panel_count,
            panel_width_m: self.panel_width_m,
            panel_length_m: self.panel_length_m,
            system_loss: self.system_loss,
            tilt_deg: self.tilt_deg,
            azimuth_deg: self.azimuth_deg,
            temp_coeff_pmax_pct: self.temp_coeff_pmax_pct,
            annual_degradation: self.annual_degradation,
            years_in_service: self.years_in_service,
        }
    }
}

/// Shading model selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShadingConfig {
    /// `"threshold"`, `"hourly"` or `"none"`.
    pub mode: String,
    /// Rows for the hourly table. Empty means the reference horizon.
    pub table: Vec<HourlyShadeConfig>,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            mode: "threshold".to_string(),
            table: Vec::new(),
        }
    }
}

/// One `[[shading.table]]` row.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HourlyShadeConfig {
    /// Row applies to hours ending up to and including this decimal hour.
    pub until_hour: f64,
    /// Output multiplier (0.0–1.0).
    pub factor: f64,
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Total energy capacity (Wh).
    pub capacity_wh: f64,
    /// Rated charge/discharge power (W).
    pub rated_power_w: f64,
    /// Initial fill as a fraction of capacity (0.0–1.0).
    pub initial_soc: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            capacity_wh: 10_000.0,
            rated_power_w: 5_000.0,
            initial_soc: 0.0,
        }
    }
}

/// One `[[appliances]]` entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApplianceConfig {
    /// Unique name.
    pub name: String,
    /// Optional model designation.
    #[serde(default)]
    pub model: Option<String>,
    /// Rated power (W).
    pub rated_power_w: f64,
    /// Energy per cycle (Wh).
    pub cycle_energy_wh: f64,
    /// Cycle duration (minutes).
    #[serde(default)]
    pub cycle_minutes: u32,
    /// Standby draw (W).
    #[serde(default)]
    pub standby_power_w: f64,
    /// `"daily"`, `"even_days"` or `"odd_days"`.
    #[serde(default)]
    pub run_rule: RunRule,
}

impl ApplianceConfig {
    fn new(
        name: &str,
        rated_power_w: f64,
        cycle_energy_wh: f64,
        cycle_minutes: u32,
        standby_power_w: f64,
        run_rule: RunRule,
    ) -> Self {
        Self {
            name: name.to_string(),
            model: None,
            rated_power_w,
            cycle_energy_wh,
            cycle_minutes,
            standby_power_w,
            run_rule,
        }
    }

    /// Converts into the device-level descriptor.
    pub fn to_appliance(&self) -> Appliance {
        let mut appliance = Appliance::new(
            self.name.clone(),
            self.rated_power_w,
            self.cycle_energy_wh,
            self.cycle_minutes,
            self.standby_power_w,
        )
        .with_run_rule(self.run_rule);
        appliance.model = self.model.clone();
        appliance
    }
}

/// Where the irradiance forecast comes from.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForecastConfig {
    /// `"synthetic"`, `"profile"`, `"json"` or `"csv"`.
    pub source: String,
    /// Input file for the `json` and `csv` sources.
    pub path: Option<String>,
    /// Synthetic sunrise hour (inclusive).
    pub sunrise_hour: usize,
    /// Synthetic sunset hour (exclusive).
    pub sunset_hour: usize,
    /// Synthetic clear-sky peak GHI (kW/m²).
    pub peak_ghi_kw_m2: f64,
    /// Synthetic cloud noise standard deviation (fraction of clear sky).
    pub cloud_noise_std: f64,
    /// Synthetic nightly minimum temperature (°C).
    pub temp_min_c: f64,
    /// Synthetic afternoon maximum temperature (°C).
    pub temp_max_c: f64,
    /// Fixed profile GHI values, 24 entries (kW/m²).
    pub ghi_profile: Vec<f64>,
    /// Fixed profile temperatures, 24 entries (°C).
    pub temp_profile: Vec<f64>,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            source: "synthetic".to_string(),
            path: None,
            sunrise_hour: 5,
            sunset_hour: 21,
            peak_ghi_kw_m2: 0.85,
            cloud_noise_std: 0.15,
            temp_min_c: 12.0,
            temp_max_c: 26.0,
            ghi_profile: Vec::new(),
            temp_profile: Vec::new(),
        }
    }
}

/// Day-ahead scheduling policy.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// `"greedy_surplus"` or `"best_hour"`.
    pub policy: String,
    /// Appliance names in rank order for `best_hour`.
    pub ranking: Vec<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: "greedy_surplus".to_string(),
            ranking: Vec::new(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.days"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    /// Creates an error for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the reference household: 18-panel south-facing array, 10 kWh
    /// battery and four appliances, driven by a synthetic summer forecast.
    pub fn household() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            array: ArrayConfig::default(),
            shading: ShadingConfig::default(),
            battery: BatteryConfig::default(),
            appliances: vec![
                ApplianceConfig::new("fridge", 120.0, 0.0, 0, 46.0, RunRule::Daily),
                ApplianceConfig::new("washer", 2000.0, 1200.0, 120, 0.5, RunRule::Daily),
                ApplianceConfig::new("dishwasher", 1800.0, 1000.0, 150, 1.0, RunRule::EvenDays),
                ApplianceConfig::new("dryer", 2500.0, 1500.0, 90, 1.0, RunRule::OddDays),
            ],
            forecast: ForecastConfig::default(),
            scheduler: SchedulerConfig::default(),
        }
    }

    /// Returns the fixed-profile preset: a morning-peaked GHI series at a
    /// constant 15 °C, hourly horizon shading and best-hour scheduling.
    pub fn demo_profile() -> Self {
        let mut ghi = vec![
            0.5, 0.6, 0.7, 0.8, 1.0, 1.1, 1.2, 1.3, 1.1, 1.0, 0.8, 0.6, 0.4, 0.2,
        ];
        ghi.resize(HOURS_PER_DAY, 0.0);
        let household = Self::household();
        Self {
            shading: ShadingConfig {
                mode: "hourly".to_string(),
                table: Vec::new(),
            },
            battery: BatteryConfig {
                initial_soc: 0.2,
                ..BatteryConfig::default()
            },
            forecast: ForecastConfig {
                source: "profile".to_string(),
                ghi_profile: ghi,
                temp_profile: vec![15.0; HOURS_PER_DAY],
                ..ForecastConfig::default()
            },
            scheduler: SchedulerConfig {
                policy: "best_hour".to_string(),
                ranking: vec![
                    "washer".to_string(),
                    "dishwasher".to_string(),
                    "dryer".to_string(),
                ],
            },
            ..household
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["household", "demo_profile"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "household" => Ok(Self::household()),
            "demo_profile" => Ok(Self::demo_profile()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.simulation;

        if s.days == 0 {
            errors.push(ConfigError::new("simulation.days", "must be > 0"));
        }
        if let Err(e) = self.start_date() {
            errors.push(e);
        }

        if let Err(e) = self.array.to_spec().validate() {
            errors.push(e);
        }

        let sh = &self.shading;
        match sh.mode.as_str() {
            "threshold" | "none" => {}
            "hourly" => {
                if sh.table.iter().any(|r| !(0.0..=1.0).contains(&r.factor)) {
                    errors.push(ConfigError::new(
                        "shading.table",
                        "every factor must be in [0.0, 1.0]",
                    ));
                }
                if sh.table.windows(2).any(|w| w[0].until_hour >= w[1].until_hour) {
                    errors.push(ConfigError::new(
                        "shading.table",
                        "rows must be sorted by strictly increasing until_hour",
                    ));
                }
            }
            other => errors.push(ConfigError::new(
                "shading.mode",
                format!("must be \"threshold\", \"hourly\" or \"none\", got \"{other}\""),
            )),
        }

        let bat = &self.battery;
        if !(bat.capacity_wh.is_finite() && bat.capacity_wh > 0.0) {
            errors.push(ConfigError::new("battery.capacity_wh", "must be > 0"));
        }
        if !(bat.rated_power_w.is_finite() && bat.rated_power_w >= 0.0) {
            errors.push(ConfigError::new("battery.rated_power_w", "must be >= 0"));
        }
        if !(0.0..=1.0).contains(&bat.initial_soc) {
            errors.push(ConfigError::new("battery.initial_soc", "must be in [0.0, 1.0]"));
        }

        for (i, a) in self.appliances.iter().enumerate() {
            if a.name.is_empty() {
                errors.push(ConfigError::new(format!("appliances[{i}].name"), "must not be empty"));
            }
            if self.appliances[..i].iter().any(|b| b.name == a.name) {
                errors.push(ConfigError::new(
                    format!("appliances[{i}].name"),
                    format!("duplicate appliance name \"{}\"", a.name),
                ));
            }
            for (field, value) in [
                ("rated_power_w", a.rated_power_w),
                ("cycle_energy_wh", a.cycle_energy_wh),
                ("standby_power_w", a.standby_power_w),
            ] {
                if !(value.is_finite() && value >= 0.0) {
                    errors.push(ConfigError::new(
                        format!("appliances[{i}].{field}"),
                        "must be >= 0",
                    ));
                }
            }
        }

        let f = &self.forecast;
        match f.source.as_str() {
            "synthetic" => {
                if f.sunrise_hour >= f.sunset_hour {
                    errors.push(ConfigError::new(
                        "forecast.sunrise_hour",
                        "must be < forecast.sunset_hour",
                    ));
                }
                if f.sunset_hour > HOURS_PER_DAY {
                    errors.push(ConfigError::new("forecast.sunset_hour", "must be <= 24"));
                }
                if f.peak_ghi_kw_m2 < 0.0 {
                    errors.push(ConfigError::new("forecast.peak_ghi_kw_m2", "must be >= 0"));
                }
                if f.temp_min_c > f.temp_max_c {
                    errors.push(ConfigError::new(
                        "forecast.temp_min_c",
                        "must be <= forecast.temp_max_c",
                    ));
                }
            }
            "profile" => {
                if f.ghi_profile.len() != HOURS_PER_DAY {
                    errors.push(ConfigError::new(
                        "forecast.ghi_profile",
                        format!("must have 24 values, got {}", f.ghi_profile.len()),
                    ));
                }
                if f.temp_profile.len() != HOURS_PER_DAY {
                    errors.push(ConfigError::new(
                        "forecast.temp_profile",
                        format!("must have 24 values, got {}", f.temp_profile.len()),
                    ));
                }
            }
            "json" | "csv" => {
                if f.path.is_none() {
                    errors.push(ConfigError::new(
                        "forecast.path",
                        format!("required for source \"{}\"", f.source),
                    ));
                }
            }
            other => errors.push(ConfigError::new(
                "forecast.source",
                format!("must be \"synthetic\", \"profile\", \"json\" or \"csv\", got \"{other}\""),
            )),
        }

        let sc = &self.scheduler;
        match sc.policy.as_str() {
            "greedy_surplus" => {}
            "best_hour" => {
                for name in &sc.ranking {
                    if !self.appliances.iter().any(|a| &a.name == name) {
                        errors.push(ConfigError::new(
                            "scheduler.ranking",
                            format!("unknown appliance \"{name}\""),
                        ));
                    }
                }
            }
            other => errors.push(ConfigError::new(
                "scheduler.policy",
                format!("must be \"greedy_surplus\" or \"best_hour\", got \"{other}\""),
            )),
        }

        errors
    }

    /// Parses `simulation.start_date`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the date is not `YYYY-MM-DD`.
    pub fn start_date(&self) -> Result<NaiveDate, ConfigError> {
        NaiveDate::parse_from_str(&self.simulation.start_date, DATE_FORMAT).map_err(|e| {
            ConfigError::new(
                "simulation.start_date",
                format!("\"{}\" is not YYYY-MM-DD: {e}", self.simulation.start_date),
            )
        })
    }

    /// Builds the shading profile selected by `shading.mode`.
    pub fn shading_profile(&self) -> ShadingProfile {
        match self.shading.mode.as_str() {
            "none" => ShadingProfile::None,
            "hourly" if self.shading.table.is_empty() => ShadingProfile::reference_horizon(),
            "hourly" => ShadingProfile::Hourly(
                self.shading
                    .table
                    .iter()
                    .map(|r| HourlyShade {
                        until_hour: r.until_hour,
                        factor: r.factor,
                    })
                    .collect(),
            ),
            _ => ShadingProfile::SunAzimuthThreshold,
        }
    }

    /// Builds the battery in its initial state.
    ///
    /// # Panics
    ///
    /// Panics on values rejected by [`ScenarioConfig::validate`].
    pub fn battery_store(&self) -> BatteryStore {
        let b = &self.battery;
        BatteryStore::with_initial_soc(b.capacity_wh, b.rated_power_w, b.initial_soc)
    }

    /// Builds the appliance descriptors.
    pub fn appliance_set(&self) -> Vec<Appliance> {
        self.appliances.iter().map(ApplianceConfig::to_appliance).collect()
    }

    /// Builds the day-ahead scheduler.
    pub fn scheduler(&self) -> DayAheadScheduler {
        let policy = match self.scheduler.policy.as_str() {
            "best_hour" => SchedulePolicy::BestHour {
                ranking: self.scheduler.ranking.clone(),
            },
            _ => SchedulePolicy::GreedySurplus,
        };
        DayAheadScheduler::new(policy)
    }

    /// Builds a simulation engine from this configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the array description is invalid.
    pub fn build_engine(&self) -> Result<Engine, ConfigError> {
        let array = PvArray::new(self.array.to_spec())?;
        Ok(Engine::new(
            array,
            self.shading_profile(),
            self.battery_store(),
            self.appliance_set(),
            self.scheduler(),
            DispatchEngine::new(self.simulation.enforce_rated_power),
        ))
    }

    /// Builds the in-memory forecast days (`synthetic` and `profile` sources).
    ///
    /// Returns `Ok(None)` for file-backed sources, which are loaded by the
    /// caller.
    ///
    /// # Errors
    ///
    /// Returns a `SimError` if the start date is invalid or the generated
    /// days are malformed.
    pub fn generated_forecast(&self) -> Result<Option<Vec<DayForecast>>, SimError> {
        let start = self.start_date()?;
        let f = &self.forecast;
        let days = self.simulation.days;
        match f.source.as_str() {
            "synthetic" => {
                let mut generator = SyntheticForecast::new(
                    f.sunrise_hour,
                    f.sunset_hour,
                    f.peak_ghi_kw_m2,
                    f.cloud_noise_std,
                    f.temp_min_c,
                    f.temp_max_c,
                    self.simulation.seed,
                );
                let generated = start
                    .iter_days()
                    .take(days)
                    .map(|date| generator.next_day(date))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(generated))
            }
            "profile" => {
                let template = DayForecast::from_profile(start, &f.ghi_profile, &f.temp_profile)?;
                Ok(Some(
                    start
                        .iter_days()
                        .take(days)
                        .map(|date| template.shifted_to(date))
                        .collect(),
                ))
            }
            _ => Ok(None),
        }
    }
}
