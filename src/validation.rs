//! Comparison of simulated generation against measured daily totals.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use chrono::{Datelike, NaiveDate};

use crate::sim::types::LogRecord;

/// Months included in the default deviation window (May to December).
pub const DEFAULT_MONTHS: RangeInclusive<u32> = 5..=12;

/// Simulated and measured generation for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyComparison {
    pub date: NaiveDate,
    /// Modeled generation (kWh).
    pub simulated_kwh: f64,
    /// Measured generation (kWh), if the day was recorded.
    pub actual_kwh: Option<f64>,
}

impl DailyComparison {
    /// `actual - simulated` (kWh), `None` when no measurement exists.
    pub fn difference_kwh(&self) -> Option<f64> {
        self.actual_kwh.map(|a| a - self.simulated_kwh)
    }
}

/// Sums hourly generation per calendar day (kWh), in date order.
pub fn daily_generation_kwh(records: &[LogRecord]) -> BTreeMap<NaiveDate, f64> {
    let mut days = BTreeMap::new();
    for r in records {
        *days.entry(r.timestamp.date()).or_insert(0.0) += r.generation_wh / 1000.0;
    }
    days
}

/// Pairs every simulated day with its measurement, if any.
pub fn compare(
    records: &[LogRecord],
    actuals: &BTreeMap<NaiveDate, f64>,
) -> Vec<DailyComparison> {
    daily_generation_kwh(records)
        .into_iter()
        .map(|(date, simulated_kwh)| DailyComparison {
            date,
            simulated_kwh,
            actual_kwh: actuals.get(&date).copied(),
        })
        .collect()
}

/// Mean absolute difference over measured days whose month is in `months`.
///
/// Returns `None` when no day qualifies.
pub fn mean_absolute_deviation(
    comparisons: &[DailyComparison],
    months: RangeInclusive<u32>,
) -> Option<f64> {
    let deviations: Vec<f64> = comparisons
        .iter()
        .filter(|c| months.contains(&c.date.month()))
        .filter_map(DailyComparison::difference_kwh)
        .map(f64::abs)
        .collect();
    if deviations.is_empty() {
        None
    } else {
        Some(deviations.iter().sum::<f64>() / deviations.len() as f64)
    }
}

/// Per-day comparison plus the summary deviation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub days: Vec<DailyComparison>,
    pub months: RangeInclusive<u32>,
    pub mean_absolute_deviation_kwh: Option<f64>,
}

impl ValidationReport {
    /// Builds the report over the default May-December window.
    pub fn new(records: &[LogRecord], actuals: &BTreeMap<NaiveDate, f64>) -> Self {
        let days = compare(records, actuals);
        let mean_absolute_deviation_kwh = mean_absolute_deviation(&days, DEFAULT_MONTHS);
        Self {
            days,
            months: DEFAULT_MONTHS,
            mean_absolute_deviation_kwh,
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Generation vs. measured ---")?;
        for d in &self.days {
            match (d.actual_kwh, d.difference_kwh()) {
                (Some(actual), Some(diff)) => writeln!(
                    f,
                    "{}  sim={:>7.2} kWh  actual={:>7.2} kWh  diff={:>+7.2} kWh",
                    d.date, d.simulated_kwh, actual, diff
                )?,
                _ => writeln!(f, "{}  sim={:>7.2} kWh  actual=n/a", d.date, d.simulated_kwh)?,
            }
        }
        match self.mean_absolute_deviation_kwh {
            Some(mad) => write!(
                f,
                "Mean absolute deviation (months {}-{}): {mad:.2} kWh",
                self.months.start(),
                self.months.end()
            ),
            None => write!(
                f,
                "Mean absolute deviation (months {}-{}): n/a",
                self.months.start(),
                self.months.end()
            ),
        }
    }
}
