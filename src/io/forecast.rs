//! File-backed forecast sources.
//!
//! Two layouts are understood:
//!
//! * JSON in the rooftop forecast-service shape, a `forecasts` or
//!   `estimated_actuals` array of `{period_end, ghi, air_temp, azimuth?}`
//!   records with GHI in W/m² and `period_end` in RFC 3339.
//! * CSV with header `timestamp,ghi_kw_m2,air_temp_c[,sun_azimuth_deg]`.
//!
//! Both are normalized to [`ForecastEntry`] values (kW/m², period start)
//! and split into validated calendar days.

use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use serde::Deserialize;

use crate::config::ConfigError;
use crate::error::{ForecastError, SimError};
use crate::forecast::{DEFAULT_SUN_AZIMUTH_DEG, DayForecast, ForecastEntry, split_days};

/// W/m² per kW/m².
const W_PER_KW: f64 = 1000.0;

#[derive(Debug, Deserialize)]
struct ForecastDocument {
    #[serde(default)]
    forecasts: Option<Vec<PeriodRecord>>,
    #[serde(default)]
    estimated_actuals: Option<Vec<PeriodRecord>>,
}

#[derive(Debug, Deserialize)]
struct PeriodRecord {
    period_end: Option<String>,
    ghi: Option<f64>,
    air_temp: Option<f64>,
    azimuth: Option<f64>,
}

impl PeriodRecord {
    fn into_entry(self, index: usize) -> Result<ForecastEntry, ForecastError> {
        let raw = self.period_end.ok_or(ForecastError::MissingField {
            index,
            field: "period_end",
        })?;
        let ghi = self.ghi.ok_or(ForecastError::MissingField { index, field: "ghi" })?;
        let air_temp = self.air_temp.ok_or(ForecastError::MissingField {
            index,
            field: "air_temp",
        })?;
        let period_end = DateTime::parse_from_rfc3339(&raw)
            .map_err(|_| ForecastError::BadTimestamp { index, raw })?
            .naive_utc();

        Ok(ForecastEntry {
            timestamp: period_end - TimeDelta::hours(1),
            ghi_kw_m2: ghi / W_PER_KW,
            air_temp_c: air_temp,
            sun_azimuth_deg: self.azimuth.unwrap_or(DEFAULT_SUN_AZIMUTH_DEG),
        })
    }
}

/// Parses a forecast-service JSON document into hourly entries.
///
/// `forecasts` is used when present, otherwise `estimated_actuals`.
///
/// # Errors
///
/// Returns `SimError::Json` on malformed JSON and `SimError::Forecast` if
/// neither array is present or a record lacks a required field.
pub fn parse_forecast_json(s: &str) -> Result<Vec<ForecastEntry>, SimError> {
    let doc: ForecastDocument = serde_json::from_str(s)?;
    let records = doc
        .forecasts
        .or(doc.estimated_actuals)
        .ok_or(ForecastError::Empty)?;
    let entries = records
        .into_iter()
        .enumerate()
        .map(|(i, r)| r.into_entry(i))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    timestamp: String,
    ghi_kw_m2: f64,
    air_temp_c: f64,
    #[serde(default)]
    sun_azimuth_deg: Option<f64>,
}

fn parse_timestamp(index: usize, raw: &str) -> Result<NaiveDateTime, ForecastError> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
        .ok_or_else(|| ForecastError::BadTimestamp {
            index,
            raw: raw.to_string(),
        })
}

/// Reads hourly entries from CSV.
///
/// # Errors
///
/// Returns `SimError::Csv` if a row is missing a required column or holds
/// a non-numeric value, and `SimError::Forecast` on a bad timestamp.
pub fn read_forecast_csv(reader: impl Read) -> Result<Vec<ForecastEntry>, SimError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut entries = Vec::new();
    for (i, row) in rdr.deserialize::<CsvRow>().enumerate() {
        let row = row?;
        entries.push(ForecastEntry {
            timestamp: parse_timestamp(i, &row.timestamp)?,
            ghi_kw_m2: row.ghi_kw_m2,
            air_temp_c: row.air_temp_c,
            sun_azimuth_deg: row.sun_azimuth_deg.unwrap_or(DEFAULT_SUN_AZIMUTH_DEG),
        });
    }
    Ok(entries)
}

/// Loads and splits a forecast file, choosing the layout by extension
/// (`.json` or `.csv`).
///
/// # Errors
///
/// Returns a `SimError` if the file cannot be read, has an unknown
/// extension, or does not hold complete hourly days.
pub fn load_forecast(path: &Path) -> Result<Vec<DayForecast>, SimError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let entries = match extension.as_deref() {
        Some("json") => parse_forecast_json(&fs::read_to_string(path)?)?,
        Some("csv") => read_forecast_csv(File::open(path)?)?,
        _ => {
            return Err(ConfigError::new(
                "forecast.path",
                format!("\"{}\" must end in .json or .csv", path.display()),
            )
            .into());
        }
    };
    let days = split_days(entries)?;
    tracing::debug!(path = %path.display(), days = days.len(), "forecast loaded");
    Ok(days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn service_json(key: &str, hours: usize, with_azimuth: bool) -> String {
        let records: Vec<String> = (1..=hours)
            .map(|h| {
                let day = 1 + h / 24;
                let hour = h % 24;
                let azimuth = if with_azimuth { ", \"azimuth\": 120" } else { "" };
                format!(
                    "{{\"period_end\": \"2024-06-{day:02}T{hour:02}:00:00.0000000Z\", \
                     \"ghi\": {}, \"air_temp\": 18{azimuth}}}",
                    h * 10
                )
            })
            .collect();
        format!("{{\"{key}\": [{}]}}", records.join(","))
    }

    #[test]
    fn json_is_normalized_to_period_start_in_kw() {
        let entries =
            parse_forecast_json(&service_json("forecasts", 24, false)).expect("valid json");
        assert_eq!(entries.len(), 24);
        assert_eq!(entries[0].timestamp.hour(), 0);
        assert!((entries[0].ghi_kw_m2 - 0.01).abs() < 1e-12);
        assert_eq!(entries[0].air_temp_c, 18.0);
        assert_eq!(entries[0].sun_azimuth_deg, DEFAULT_SUN_AZIMUTH_DEG);
    }

    #[test]
    fn horizon_table_follows_service_period_end() {
        use crate::devices::ShadingProfile;

        let doc = r#"{"forecasts": [
            {"period_end": "2024-06-01T10:00:00Z", "ghi": 500, "air_temp": 18},
            {"period_end": "2024-06-01T13:00:00Z", "ghi": 700, "air_temp": 20}
        ]}"#;
        let entries = parse_forecast_json(doc).expect("valid json");
        let horizon = ShadingProfile::reference_horizon();
        let factors: Vec<f64> = entries
            .iter()
            .map(|e| horizon.shade_at(e.timestamp).resolve(e.sun_azimuth_deg))
            .collect();
        assert_eq!(factors, vec![0.6, 1.0]);
    }

    #[test]
    fn json_accepts_estimated_actuals_and_azimuth() {
        let entries =
            parse_forecast_json(&service_json("estimated_actuals", 24, true)).expect("valid json");
        assert_eq!(entries[5].sun_azimuth_deg, 120.0);
        assert_eq!(split_days(entries).map(|d| d.len()), Ok(1));
    }

    #[test]
    fn json_missing_temperature_fails_fast() {
        let doc = r#"{"forecasts": [{"period_end": "2024-06-01T01:00:00Z", "ghi": 100}]}"#;
        let err = parse_forecast_json(doc).expect_err("missing air_temp");
        assert!(matches!(
            err,
            SimError::Forecast(ForecastError::MissingField {
                index: 0,
                field: "air_temp"
            })
        ));
    }

    #[test]
    fn json_bad_timestamp_is_reported() {
        let doc = r#"{"forecasts": [{"period_end": "yesterday", "ghi": 1, "air_temp": 5}]}"#;
        assert!(matches!(
            parse_forecast_json(doc),
            Err(SimError::Forecast(ForecastError::BadTimestamp { index: 0, .. }))
        ));
    }

    #[test]
    fn json_without_series_is_empty() {
        assert!(matches!(
            parse_forecast_json("{}"),
            Err(SimError::Forecast(ForecastError::Empty))
        ));
    }

    #[test]
    fn csv_rows_become_entries() {
        let mut data = String::from("timestamp,ghi_kw_m2,air_temp_c\n");
        for h in 0..24 {
            data.push_str(&format!("2024-06-01T{h:02}:00:00,0.{h:02},20\n"));
        }
        let entries = read_forecast_csv(data.as_bytes()).expect("valid csv");
        assert_eq!(entries.len(), 24);
        assert!((entries[12].ghi_kw_m2 - 0.12).abs() < 1e-12);
        assert_eq!(entries[12].sun_azimuth_deg, DEFAULT_SUN_AZIMUTH_DEG);
        let days = split_days(entries).expect("one full day");
        assert_eq!(days.len(), 1);
    }

    #[test]
    fn csv_optional_azimuth_column() {
        let data =
            "timestamp,ghi_kw_m2,air_temp_c,sun_azimuth_deg\n2024-06-01 07:00:00,0.3,14,95\n";
        let entries = read_forecast_csv(data.as_bytes()).expect("valid csv");
        assert_eq!(entries[0].sun_azimuth_deg, 95.0);
    }

    #[test]
    fn csv_missing_column_fails() {
        let data = "timestamp,ghi_kw_m2\n2024-06-01T00:00:00,0.3\n";
        assert!(matches!(
            read_forecast_csv(data.as_bytes()),
            Err(SimError::Csv(_))
        ));
    }

    #[test]
    fn unknown_extension_is_config_error() {
        assert!(matches!(
            load_forecast(Path::new("forecast.xml")),
            Err(SimError::Config(_))
        ));
    }
}
