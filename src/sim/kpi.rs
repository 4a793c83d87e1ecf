//! Post-hoc KPI computation from simulation logs.

use std::fmt;

use super::types::LogRecord;

/// Aggregate key performance indicators derived from a complete simulation run.
///
/// Computed post-hoc from the log to ensure consistency between the
/// per-hour records and reported metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiReport {
    /// Total PV generation (Wh).
    pub generation_wh: f64,
    /// Total appliance consumption (Wh).
    pub load_wh: f64,
    /// Total grid import (Wh).
    pub grid_import_wh: f64,
    /// Total grid export (Wh).
    pub exported_wh: f64,
    /// Total energy into the battery (Wh).
    pub charged_wh: f64,
    /// Total energy out of the battery (Wh).
    pub discharged_wh: f64,
    /// Share of generation used on site, 0.0 to 1.0.
    pub self_consumption: f64,
    /// Share of load met without the grid, 0.0 to 1.0.
    pub self_sufficiency: f64,
    /// Largest single-hour grid import (Wh).
    pub peak_import_wh: f64,
    /// Battery equivalent full cycles (throughput / 2*capacity).
    pub battery_equivalent_full_cycles: f64,
    /// Generation per installed watt-peak (Wh/Wp).
    pub specific_yield_wh_per_wp: f64,
}

impl KpiReport {
    /// Computes all KPIs from the complete log.
    ///
    /// # Arguments
    ///
    /// * `records` - Complete simulation log
    /// * `battery_capacity_wh` - Battery capacity for cycle calculation
    /// * `nameplate_w` - Array nameplate power for specific yield
    pub fn from_records(records: &[LogRecord], battery_capacity_wh: f64, nameplate_w: f64) -> Self {
        let mut generation = 0.0_f64;
        let mut load = 0.0_f64;
        let mut import = 0.0_f64;
        let mut export = 0.0_f64;
        let mut charged = 0.0_f64;
        let mut discharged = 0.0_f64;
        let mut peak_import = 0.0_f64;

        for r in records {
            generation += r.generation_wh;
            load += r.load_wh;
            import += r.grid_import_wh;
            export += r.exported_wh;
            charged += r.charged_wh;
            discharged += r.discharged_wh;
            peak_import = peak_import.max(r.grid_import_wh);
        }

        let self_consumption = if generation > 0.0 {
            (generation - export) / generation
        } else {
            0.0
        };
        let self_sufficiency = if load > 0.0 {
            (load - import) / load
        } else {
            0.0
        };
        let cycles = if battery_capacity_wh > 0.0 {
            (charged + discharged) / (2.0 * battery_capacity_wh)
        } else {
            0.0
        };
        let specific_yield = if nameplate_w > 0.0 {
            generation / nameplate_w
        } else {
            0.0
        };

        Self {
            generation_wh: generation,
            load_wh: load,
            grid_import_wh: import,
            exported_wh: export,
            charged_wh: charged,
            discharged_wh: discharged,
            self_consumption,
            self_sufficiency,
            peak_import_wh: peak_import,
            battery_equivalent_full_cycles: cycles,
            specific_yield_wh_per_wp: specific_yield,
        }
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "PV generation:         {:.2} kWh", self.generation_wh / 1000.0)?;
        writeln!(f, "Appliance load:        {:.2} kWh", self.load_wh / 1000.0)?;
        writeln!(f, "Grid import:           {:.2} kWh", self.grid_import_wh / 1000.0)?;
        writeln!(f, "Grid export:           {:.2} kWh", self.exported_wh / 1000.0)?;
        writeln!(f, "Self-consumption:      {:.1}%", self.self_consumption * 100.0)?;
        writeln!(f, "Self-sufficiency:      {:.1}%", self.self_sufficiency * 100.0)?;
        writeln!(f, "Peak hourly import:    {:.0} Wh", self.peak_import_wh)?;
        writeln!(
            f,
            "Battery throughput:    {:.2} kWh ({:.2} equiv. cycles)",
            (self.charged_wh + self.discharged_wh) / 1000.0,
            self.battery_equivalent_full_cycles
        )?;
        write!(f, "Specific yield:        {:.2} Wh/Wp", self.specific_yield_wh_per_wp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::dispatch::Decision;
    use chrono::NaiveDate;

    fn make_record(generation: f64, load: f64, import: f64, export: f64) -> LogRecord {
        LogRecord {
            timestamp: NaiveDate::from_ymd_opt(2024, 6, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("valid time"),
            generation_wh: generation,
            load_wh: load,
            battery_wh: 0.0,
            soc_percent: 0.0,
            decision: Decision::Idle,
            charged_wh: 0.0,
            discharged_wh: 0.0,
            grid_import_wh: import,
            cumulative_grid_import_wh: 0.0,
            exported_wh: export,
            scheduled: Vec::new(),
        }
    }

    #[test]
    fn self_consumption_and_sufficiency() {
        let records = vec![
            make_record(1000.0, 400.0, 0.0, 600.0),
            make_record(0.0, 600.0, 600.0, 0.0),
        ];
        let kpi = KpiReport::from_records(&records, 5000.0, 1000.0);
        assert!((kpi.self_consumption - 0.4).abs() < 1e-12);
        assert!((kpi.self_sufficiency - 0.4).abs() < 1e-12);
        assert_eq!(kpi.peak_import_wh, 600.0);
        assert_eq!(kpi.specific_yield_wh_per_wp, 1.0);
    }

    #[test]
    fn battery_cycles() {
        let mut charging = make_record(3000.0, 0.0, 0.0, 0.0);
        charging.charged_wh = 3000.0;
        let mut discharging = make_record(0.0, 2000.0, 0.0, 0.0);
        discharging.discharged_wh = 2000.0;
        let kpi = KpiReport::from_records(&[charging, discharging], 5000.0, 1000.0);
        assert!((kpi.battery_equivalent_full_cycles - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_records() {
        let kpi = KpiReport::from_records(&[], 5000.0, 1000.0);
        assert_eq!(kpi.generation_wh, 0.0);
        assert_eq!(kpi.self_consumption, 0.0);
        assert_eq!(kpi.self_sufficiency, 0.0);
    }

    #[test]
    fn display_does_not_panic() {
        let kpi = KpiReport::from_records(&[make_record(1.0, 1.0, 0.0, 0.0)], 0.0, 0.0);
        assert!(format!("{kpi}").contains("KPI Report"));
    }
}
