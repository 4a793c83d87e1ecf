//! Per-hour log records produced by the simulation driver.

use std::fmt;

use chrono::NaiveDateTime;

use super::dispatch::{Decision, DispatchOutcome};

/// Complete, immutable record of one simulated hour.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Start of the hour.
    pub timestamp: NaiveDateTime,
    /// PV energy produced (Wh).
    pub generation_wh: f64,
    /// Total appliance consumption (Wh).
    pub load_wh: f64,
    /// Battery energy after dispatch (Wh).
    pub battery_wh: f64,
    /// Battery state of charge after dispatch (%).
    pub soc_percent: f64,
    /// Primary dispatch decision.
    pub decision: Decision,
    /// Energy absorbed by the battery (Wh).
    pub charged_wh: f64,
    /// Energy supplied by the battery (Wh).
    pub discharged_wh: f64,
    /// Grid import during this hour (Wh).
    pub grid_import_wh: f64,
    /// Grid import since the start of the run (Wh).
    pub cumulative_grid_import_wh: f64,
    /// Grid export during this hour (Wh).
    pub exported_wh: f64,
    /// Appliances running a cycle this hour.
    pub scheduled: Vec<String>,
}

impl LogRecord {
    /// Decision label including the grid-import flag.
    pub fn decision_label(&self) -> String {
        self.outcome().label()
    }

    /// Reassembles the dispatch outcome recorded for this hour.
    pub fn outcome(&self) -> DispatchOutcome {
        DispatchOutcome {
            decision: self.decision,
            charged_wh: self.charged_wh,
            discharged_wh: self.discharged_wh,
            imported_wh: self.grid_import_wh,
            exported_wh: self.exported_wh,
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | pv={:>7.1} Wh  load={:>7.1} Wh | bat={:>8.1} Wh (SoC={:>5.1}%) | \
             grid(in={:.1}, out={:.1}, total_in={:.1}) | {}",
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.generation_wh,
            self.load_wh,
            self.battery_wh,
            self.soc_percent,
            self.grid_import_wh,
            self.exported_wh,
            self.cumulative_grid_import_wh,
            self.decision_label(),
        )?;
        if !self.scheduled.is_empty() {
            write!(f, " [{}]", self.scheduled.join(", "))?;
        }
        Ok(())
    }
}
