//! Measured daily generation: CSV input and comparison output.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{ForecastError, SimError};
use crate::validation::DailyComparison;

/// Date layouts accepted in the `date` column: ISO and the inverter
/// portal's long form (`Monday, June 03, 2024`).
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%A, %B %d, %Y"];

#[derive(Debug, Deserialize)]
struct ActualRow {
    date: String,
    generation_kwh: f64,
}

/// Reads measured daily generation from CSV (`date,generation_kwh`).
///
/// Later rows for the same date replace earlier ones.
///
/// # Errors
///
/// Returns `SimError::Csv` on malformed rows and `SimError::Forecast` on an
/// unparseable date or a negative total.
pub fn read_actuals_csv(reader: impl Read) -> Result<BTreeMap<NaiveDate, f64>, SimError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut actuals = BTreeMap::new();
    for (index, row) in rdr.deserialize::<ActualRow>().enumerate() {
        let row = row?;
        let date = DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(&row.date, fmt).ok())
            .ok_or_else(|| ForecastError::BadTimestamp {
                index,
                raw: row.date.clone(),
            })?;
        if !(row.generation_kwh.is_finite() && row.generation_kwh >= 0.0) {
            return Err(ForecastError::InvalidValue {
                index,
                field: "generation_kwh",
                value: row.generation_kwh,
            }
            .into());
        }
        actuals.insert(date, row.generation_kwh);
    }
    Ok(actuals)
}

/// Loads measured daily generation from a CSV file.
///
/// # Errors
///
/// See [`read_actuals_csv`]; also fails if the file cannot be opened.
pub fn load_actuals(path: &Path) -> Result<BTreeMap<NaiveDate, f64>, SimError> {
    read_actuals_csv(File::open(path)?)
}

/// Exports the per-day comparison to a CSV file.
///
/// # Errors
///
/// Returns an `io::Error` if the file cannot be created or written.
pub fn export_comparison_csv(days: &[DailyComparison], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_comparison_csv(days, io::BufWriter::new(file))
}

/// Writes the per-day comparison as CSV.
///
/// Days without a measurement get empty `actual_kwh` and `difference_kwh`
/// cells.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_comparison_csv(days: &[DailyComparison], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["date", "simulated_kwh", "actual_kwh", "difference_kwh"])?;
    let cell = |v: Option<f64>| v.map(|x| format!("{x:.3}")).unwrap_or_default();
    for d in days {
        wtr.write_record(&[
            d.date.to_string(),
            format!("{:.3}", d.simulated_kwh),
            cell(d.actual_kwh),
            cell(d.difference_kwh()),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).expect("valid date")
    }

    #[test]
    fn reads_iso_and_long_dates() {
        let data = "date,generation_kwh\n2024-06-01,21.5\n\"Sunday, June 02, 2024\",18.25\n";
        let actuals = read_actuals_csv(data.as_bytes()).expect("valid csv");
        assert_eq!(actuals.get(&ymd(6, 1)), Some(&21.5));
        assert_eq!(actuals.get(&ymd(6, 2)), Some(&18.25));
    }

    #[test]
    fn bad_date_is_reported_with_row() {
        let data = "date,generation_kwh\n2024-06-01,1\nsoon,2\n";
        assert!(matches!(
            read_actuals_csv(data.as_bytes()),
            Err(SimError::Forecast(ForecastError::BadTimestamp { index: 1, .. }))
        ));
    }

    #[test]
    fn negative_total_is_rejected() {
        let data = "date,generation_kwh\n2024-06-01,-3\n";
        assert!(matches!(
            read_actuals_csv(data.as_bytes()),
            Err(SimError::Forecast(ForecastError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn comparison_csv_leaves_missing_cells_empty() {
        let days = vec![
            DailyComparison {
                date: ymd(6, 1),
                simulated_kwh: 20.0,
                actual_kwh: Some(21.5),
            },
            DailyComparison {
                date: ymd(6, 2),
                simulated_kwh: 19.0,
                actual_kwh: None,
            },
        ];
        let mut buf = Vec::new();
        write_comparison_csv(&days, &mut buf).expect("write should succeed");
        let output = String::from_utf8(buf).expect("valid utf-8");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "date,simulated_kwh,actual_kwh,difference_kwh");
        assert_eq!(lines[1], "2024-06-01,20.000,21.500,1.500");
        assert_eq!(lines[2], "2024-06-02,19.000,,");
    }
}
