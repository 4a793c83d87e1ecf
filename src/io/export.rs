//! CSV export for the hourly simulation log.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::LogRecord;

/// Column header for CSV log export.
const HEADER: &str = "timestamp,generation_wh,load_wh,battery_wh,soc_pct,decision,\
                      charged_wh,discharged_wh,grid_import_wh,\
                      cumulative_grid_import_wh,exported_wh";

/// Timestamp layout used in the `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Exports the simulation log to a CSV file at the given path.
///
/// Writes a header row followed by one data row per hour. Produces
/// deterministic output for identical inputs.
///
/// # Arguments
///
/// * `records` - Complete simulation log
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[LogRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes the simulation log as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[LogRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in records {
        wtr.write_record(&[
            r.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            format!("{:.3}", r.generation_wh),
            format!("{:.3}", r.load_wh),
            format!("{:.3}", r.battery_wh),
            format!("{:.2}", r.soc_percent),
            r.decision_label(),
            format!("{:.3}", r.charged_wh),
            format!("{:.3}", r.discharged_wh),
            format!("{:.3}", r.grid_import_wh),
            format!("{:.3}", r.cumulative_grid_import_wh),
            format!("{:.3}", r.exported_wh),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::dispatch::Decision;
    use chrono::{NaiveDate, TimeDelta};

    fn make_record(hour: i64) -> LogRecord {
        let midnight = NaiveDate::from_ymd_opt(2024, 6, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid time");
        LogRecord {
            timestamp: midnight + TimeDelta::hours(hour),
            generation_wh: 1500.0,
            load_wh: 1002.0,
            battery_wh: 498.0,
            soc_percent: 4.98,
            decision: Decision::Charge,
            charged_wh: 498.0,
            discharged_wh: 0.0,
            grid_import_wh: 0.0,
            cumulative_grid_import_wh: 12.5,
            exported_wh: 0.0,
            scheduled: vec!["washer".to_string()],
        }
    }

    #[test]
    fn header_matches_log_layout() {
        let mut buf = Vec::new();
        write_csv(&[make_record(0)], &mut buf).expect("write should succeed");
        let output = String::from_utf8(buf).expect("valid utf-8");
        let first_line = output.lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "timestamp,generation_wh,load_wh,battery_wh,soc_pct,decision,\
             charged_wh,discharged_wh,grid_import_wh,cumulative_grid_import_wh,exported_wh"
        );
    }

    #[test]
    fn row_count_matches_hour_count() {
        let records: Vec<LogRecord> = (0..24).map(make_record).collect();
        let mut buf = Vec::new();
        write_csv(&records, &mut buf).expect("write should succeed");
        let output = String::from_utf8(buf).expect("valid utf-8");
        let lines: Vec<&str> = output.lines().collect();
        // 1 header + 24 data rows
        assert_eq!(lines.len(), 25);
    }

    #[test]
    fn deterministic_output() {
        let records: Vec<LogRecord> = (0..5).map(make_record).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_csv(&records, &mut buf1).expect("write should succeed");
        write_csv(&records, &mut buf2).expect("write should succeed");
        assert_eq!(buf1, buf2);
    }

    #[test]
    fn rows_are_parseable() {
        let mut records: Vec<LogRecord> = (0..3).map(make_record).collect();
        records[2].decision = Decision::Discharge;
        records[2].grid_import_wh = 100.0;
        let mut buf = Vec::new();
        write_csv(&records, &mut buf).expect("write should succeed");

        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        let headers = rdr.headers().cloned().ok();
        assert_eq!(headers.as_ref().map(csv::StringRecord::len), Some(11));

        let rows: Vec<csv::StringRecord> = rdr.records().filter_map(Result::ok).collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[1][0], "2024-06-01T01:00:00");
        assert_eq!(&rows[0][5], "charge");
        assert_eq!(&rows[2][5], "discharge+grid_import");
        for row in &rows {
            for i in [1, 2, 3, 4, 6, 7, 8, 9, 10] {
                assert!(row[i].parse::<f64>().is_ok(), "column {i} should parse as f64");
            }
        }
    }
}
