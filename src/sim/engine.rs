//! Simulation driver tying the forecast, scheduler, devices and dispatch together.

use crate::devices::{Appliance, BatteryStore, Mode, PvArray, ShadingProfile};
use crate::forecast::{DayForecast, HOURS_PER_DAY};

use super::clock::Clock;
use super::dispatch::DispatchEngine;
use super::scheduler::{DayAheadScheduler, ScheduleMap};
use super::types::LogRecord;

/// Simulation engine owning the household model and the hourly log.
///
/// One engine is one simulation run: the battery carries its state from
/// hour to hour and day to day, the schedule is rebuilt every day, and the
/// log only ever grows.
pub struct Engine {
    array: PvArray,
    shading: ShadingProfile,
    battery: BatteryStore,
    appliances: Vec<Appliance>,
    scheduler: DayAheadScheduler,
    dispatch: DispatchEngine,
    cumulative_import_wh: f64,
    log: Vec<LogRecord>,
}

impl Engine {
    /// Creates a new simulation engine.
    ///
    /// # Arguments
    ///
    /// * `array` - PV generation model
    /// * `shading` - How shade factors are derived per hour
    /// * `battery` - Battery in its initial state
    /// * `appliances` - Appliance set, names must be unique
    /// * `scheduler` - Day-ahead scheduler
    /// * `dispatch` - Hourly dispatch policy
    pub fn new(
        array: PvArray,
        shading: ShadingProfile,
        battery: BatteryStore,
        appliances: Vec<Appliance>,
        scheduler: DayAheadScheduler,
        dispatch: DispatchEngine,
    ) -> Self {
        Self {
            array,
            shading,
            battery,
            appliances,
            scheduler,
            dispatch,
            cumulative_import_wh: 0.0,
            log: Vec::new(),
        }
    }

    /// Modeled PV output for each hour of `forecast` (Wh).
    pub fn generation_profile(&self, forecast: &DayForecast) -> Vec<f64> {
        forecast
            .entries()
            .iter()
            .map(|e| {
                self.array.power_w(
                    e.ghi_kw_m2,
                    e.air_temp_c,
                    e.sun_azimuth_deg,
                    self.shading.shade_at(e.timestamp),
                )
            })
            .collect()
    }

    /// Appliance consumption at `hour` under `schedule` (Wh).
    pub fn load_wh(&self, schedule: &ScheduleMap, hour: usize) -> f64 {
        self.appliances
            .iter()
            .map(|a| {
                let mode = if schedule.is_scheduled(&a.name, hour) {
                    Mode::Active(1)
                } else {
                    Mode::Standby
                };
                a.energy_wh(mode)
            })
            .sum()
    }

    /// Schedules and dispatches one day, appending 24 records to the log.
    ///
    /// # Returns
    ///
    /// The records produced for this day.
    pub fn run_day(&mut self, forecast: &DayForecast) -> &[LogRecord] {
        let first = self.log.len();
        let generation = self.generation_profile(forecast);
        let schedule = self
            .scheduler
            .schedule(forecast, &generation, &self.appliances);

        let mut clock = Clock::new(forecast.start(), HOURS_PER_DAY);
        while let Some((hour, timestamp)) = clock.tick() {
            let generation_wh = generation[hour];
            let load_wh = self.load_wh(&schedule, hour);
            let outcome = self
                .dispatch
                .dispatch(generation_wh, load_wh, &mut self.battery);
            self.cumulative_import_wh += outcome.imported_wh;

            tracing::trace!(
                %timestamp,
                generation_wh,
                load_wh,
                decision = %outcome.label(),
                "hour dispatched"
            );

            self.log.push(LogRecord {
                timestamp,
                generation_wh,
                load_wh,
                battery_wh: self.battery.stored_wh(),
                soc_percent: self.battery.state_of_charge_percent(),
                decision: outcome.decision,
                charged_wh: outcome.charged_wh,
                discharged_wh: outcome.discharged_wh,
                grid_import_wh: outcome.imported_wh,
                cumulative_grid_import_wh: self.cumulative_import_wh,
                exported_wh: outcome.exported_wh,
                scheduled: schedule
                    .running_at(hour)
                    .into_iter()
                    .map(str::to_string)
                    .collect(),
            });
        }

        let day = &self.log[first..];
        tracing::info!(
            date = %forecast.date(),
            generation_wh = day.iter().map(|r| r.generation_wh).sum::<f64>(),
            load_wh = day.iter().map(|r| r.load_wh).sum::<f64>(),
            grid_import_wh = day.iter().map(|r| r.grid_import_wh).sum::<f64>(),
            soc_percent = self.battery.state_of_charge_percent(),
            "day simulated"
        );
        day
    }

    /// Runs consecutive days and returns the complete log.
    pub fn run(&mut self, days: &[DayForecast]) -> &[LogRecord] {
        for day in days {
            self.run_day(day);
        }
        &self.log
    }

    /// All records produced so far.
    pub fn log(&self) -> &[LogRecord] {
        &self.log
    }

    /// Consumes the engine and hands over the log.
    pub fn into_log(self) -> Vec<LogRecord> {
        self.log
    }

    /// Returns a reference to the battery.
    pub fn battery(&self) -> &BatteryStore {
        &self.battery
    }

    /// Returns a reference to the PV model.
    pub fn array(&self) -> &PvArray {
        &self.array
    }

    /// Returns the appliance set.
    pub fn appliances(&self) -> &[Appliance] {
        &self.appliances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::ArraySpec;
    use crate::sim::dispatch::Decision;
    use chrono::NaiveDate;

    fn engine(initial_soc: f64) -> Engine {
        let spec = ArraySpec {
            efficiency: 0.2,
            panel_rated_w: 400.0,
            panel_count: 10,
            panel_width_m: 1.0,
            panel_length_m: 1.6,
            system_loss: 0.1,
            tilt_deg: 0.0,
            azimuth_deg: 180.0,
            temp_coeff_pmax_pct: 0.0,
            annual_degradation: 0.0,
            years_in_service: 0,
        };
        Engine::new(
            PvArray::new(spec).expect("valid spec"),
            ShadingProfile::None,
            BatteryStore::with_initial_soc(5_000.0, 3_000.0, initial_soc),
            vec![
                Appliance::new("washer", 2000.0, 1000.0, 120, 0.0),
                Appliance::new("fridge", 120.0, 0.0, 0, 48.0),
            ],
            DayAheadScheduler::default(),
            DispatchEngine::default(),
        )
    }

    fn day(ghi_at_noon: f64) -> DayForecast {
        let mut ghi = [0.0; 24];
        for (h, g) in ghi.iter_mut().enumerate().take(17).skip(8) {
            *g = ghi_at_noon * (1.0 - (h as f64 - 12.0).abs() / 5.0);
        }
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        DayForecast::from_profile(date, &ghi, &[25.0; 24]).expect("valid day")
    }

    #[test]
    fn generation_profile_follows_irradiance() {
        let e = engine(0.0);
        let profile = e.generation_profile(&day(1.0));
        // 16 m² * 1 kW/m² * 0.2 * 0.9 = 2880 W at noon.
        assert!((profile[12] - 2880.0).abs() < 1e-6);
        assert_eq!(profile[0], 0.0);
    }

    #[test]
    fn one_day_produces_24_stamped_records() {
        let mut e = engine(0.0);
        let records = e.run_day(&day(1.0)).to_vec();
        assert_eq!(records.len(), 24);
        assert_eq!(records[0].timestamp, day(1.0).start());
        assert_eq!(records[23].timestamp.format("%H").to_string(), "23");
    }

    #[test]
    fn standby_only_night_imports_from_grid() {
        let mut e = engine(0.0);
        let records = e.run_day(&day(1.0)).to_vec();
        assert_eq!(records[0].decision, Decision::GridImport);
        assert!((records[0].grid_import_wh - 2.0).abs() < 1e-9);
        assert_eq!(records[0].battery_wh, 0.0);
    }

    #[test]
    fn washer_runs_in_surplus_window() {
        let mut e = engine(0.0);
        let records = e.run_day(&day(1.0)).to_vec();
        let running: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.scheduled.iter().any(|n| n == "washer"))
            .map(|(h, _)| h)
            .collect();
        assert!(!running.is_empty());
        for h in &running {
            assert!(records[*h].generation_wh >= 1000.0);
            assert!((records[*h].load_wh - 1002.0).abs() < 1e-9);
        }
    }

    #[test]
    fn every_hour_conserves_energy() {
        let mut e = engine(0.5);
        let next = NaiveDate::from_ymd_opt(2024, 6, 2).expect("valid date");
        let days = [day(1.0), day(0.4).shifted_to(next)];
        for r in e.run(&days) {
            let residual = r.outcome().balance_residual_wh(r.generation_wh, r.load_wh);
            assert!(residual.abs() < 1e-6, "{r}");
        }
        assert_eq!(e.log().len(), 48);
    }

    #[test]
    fn cumulative_import_is_running_sum() {
        let mut e = engine(0.0);
        e.run_day(&day(0.2));
        let mut sum = 0.0;
        for r in e.log() {
            sum += r.grid_import_wh;
            assert!((r.cumulative_grid_import_wh - sum).abs() < 1e-9);
        }
        assert!(sum > 0.0);
    }

    #[test]
    fn battery_state_carries_across_days() {
        let mut e = engine(0.0);
        e.run_day(&day(1.0));
        let end_of_day_one = e.battery().stored_wh();
        let next = day(0.0).shifted_to(NaiveDate::from_ymd_opt(2024, 6, 2).expect("valid date"));
        let records = e.run_day(&next).to_vec();
        assert!(end_of_day_one > 0.0);
        assert!(records[0].battery_wh < end_of_day_one);
    }
}
