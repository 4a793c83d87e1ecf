//! Hourly weather forecast snapshots consumed by the scheduler and dispatch loop.

/// Seeded clear-sky forecast generator.
pub mod synthetic;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};

use crate::error::ForecastError;

pub use synthetic::SyntheticForecast;

/// Hours in one forecast day.
pub const HOURS_PER_DAY: usize = 24;
/// Sun azimuth assumed when a source does not provide one (degrees).
pub const DEFAULT_SUN_AZIMUTH_DEG: f64 = 180.0;

/// Weather for one hourly slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    /// Start of the hour.
    pub timestamp: NaiveDateTime,
    /// Global horizontal irradiance (kW/m²).
    pub ghi_kw_m2: f64,
    /// Ambient temperature (°C).
    pub air_temp_c: f64,
    /// Sun azimuth (degrees).
    pub sun_azimuth_deg: f64,
}

impl ForecastEntry {
    /// Creates an entry with the default sun azimuth.
    pub fn new(timestamp: NaiveDateTime, ghi_kw_m2: f64, air_temp_c: f64) -> Self {
        Self {
            timestamp,
            ghi_kw_m2,
            air_temp_c,
            sun_azimuth_deg: DEFAULT_SUN_AZIMUTH_DEG,
        }
    }
}

/// A validated 24-hour forecast for one calendar day.
///
/// Entries are chronological, one hour apart, starting at midnight. The
/// snapshot is immutable for the duration of the simulated day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayForecast {
    entries: Vec<ForecastEntry>,
}

impl DayForecast {
    /// Validates and wraps one day of entries.
    ///
    /// # Errors
    ///
    /// Returns a `ForecastError` if the entries are not exactly 24 hourly
    /// slots starting at midnight, or if any value is invalid.
    pub fn new(entries: Vec<ForecastEntry>) -> Result<Self, ForecastError> {
        if entries.len() != HOURS_PER_DAY {
            return Err(ForecastError::WrongLength {
                expected: HOURS_PER_DAY,
                actual: entries.len(),
            });
        }

        let first = entries[0].timestamp;
        if first.hour() != 0 || first.minute() != 0 || first.second() != 0 {
            return Err(ForecastError::NotMidnight(first.to_string()));
        }

        for (index, entry) in entries.iter().enumerate() {
            if index > 0 && entry.timestamp - entries[index - 1].timestamp != TimeDelta::hours(1) {
                return Err(ForecastError::NotHourly {
                    index,
                    timestamp: entry.timestamp.to_string(),
                });
            }
            check_value(index, "ghi", entry.ghi_kw_m2, true)?;
            check_value(index, "air_temp", entry.air_temp_c, false)?;
            check_value(index, "azimuth", entry.sun_azimuth_deg, false)?;
        }

        Ok(Self { entries })
    }

    /// Builds a day from fixed hourly irradiance and temperature profiles.
    ///
    /// # Errors
    ///
    /// Returns a `ForecastError` if either profile is not 24 values long or
    /// contains invalid values.
    pub fn from_profile(
        date: NaiveDate,
        ghi_kw_m2: &[f64],
        air_temp_c: &[f64],
    ) -> Result<Self, ForecastError> {
        if air_temp_c.len() != ghi_kw_m2.len() {
            return Err(ForecastError::WrongLength {
                expected: ghi_kw_m2.len(),
                actual: air_temp_c.len(),
            });
        }
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        let entries = ghi_kw_m2
            .iter()
            .zip(air_temp_c)
            .enumerate()
            .map(|(h, (&ghi, &temp))| {
                ForecastEntry::new(midnight + TimeDelta::hours(h as i64), ghi, temp)
            })
            .collect();
        Self::new(entries)
    }

    /// Calendar day covered by this forecast.
    pub fn date(&self) -> NaiveDate {
        self.entries[0].timestamp.date()
    }

    /// Midnight at the start of the day.
    pub fn start(&self) -> NaiveDateTime {
        self.entries[0].timestamp
    }

    /// Hourly entries in chronological order.
    pub fn entries(&self) -> &[ForecastEntry] {
        &self.entries
    }

    /// Returns the same weather moved to `date`.
    pub fn shifted_to(&self, date: NaiveDate) -> Self {
        let offset = date - self.date();
        let entries = self
            .entries
            .iter()
            .map(|e| ForecastEntry {
                timestamp: e.timestamp + offset,
                ..e.clone()
            })
            .collect();
        Self { entries }
    }
}

fn check_value(
    index: usize,
    field: &'static str,
    value: f64,
    non_negative: bool,
) -> Result<(), ForecastError> {
    if !value.is_finite() || (non_negative && value < 0.0) {
        return Err(ForecastError::InvalidValue {
            index,
            field,
            value,
        });
    }
    Ok(())
}

/// Splits a multi-day series into validated calendar days.
///
/// # Errors
///
/// Returns a `ForecastError` if the series is empty or any day is not a
/// complete, gap-free set of 24 hourly entries.
pub fn split_days(mut entries: Vec<ForecastEntry>) -> Result<Vec<DayForecast>, ForecastError> {
    if entries.is_empty() {
        return Err(ForecastError::Empty);
    }
    entries.sort_by_key(|e| e.timestamp);

    let mut days = Vec::new();
    let mut current: Vec<ForecastEntry> = Vec::with_capacity(HOURS_PER_DAY);
    for entry in entries {
        if current
            .last()
            .is_some_and(|last| last.timestamp.date() != entry.timestamp.date())
        {
            days.push(DayForecast::new(std::mem::take(&mut current))?);
        }
        current.push(entry);
    }
    days.push(DayForecast::new(current)?);
    Ok(days)
}

/// Naive "tomorrow is today" forecaster.
///
/// Repeats the available days, shifted onto consecutive dates, until the
/// requested horizon is covered.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveForecast;

impl NaiveForecast {
    /// Produce `horizon` consecutive days starting at the first template day.
    pub fn forecast(&self, templates: &[DayForecast], horizon: usize) -> Vec<DayForecast> {
        let Some(first) = templates.first() else {
            return Vec::new();
        };
        let start = first.date();
        (0..horizon)
            .map(|d| {
                let template = &templates[d % templates.len()];
                template.shifted_to(start + TimeDelta::days(d as i64))
            })
            .collect()
    }
}
