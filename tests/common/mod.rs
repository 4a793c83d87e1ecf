//! Shared test fixtures for integration tests.

use chrono::NaiveDate;
use home_pv_sim::devices::{Appliance, ArraySpec, BatteryStore, PvArray, RunRule, ShadingProfile};
use home_pv_sim::forecast::DayForecast;
use home_pv_sim::sim::dispatch::DispatchEngine;
use home_pv_sim::sim::engine::Engine;
use home_pv_sim::sim::scheduler::DayAheadScheduler;

/// Float comparison tolerance for energy sums (Wh).
pub const TOLERANCE_WH: f64 = 1e-6;

/// First simulated date used by the fixtures.
pub fn start_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

/// Reference array: 18 panels of 0.992 m x 1.640 m, tilt 26°, due south.
pub fn reference_array_spec() -> ArraySpec {
    ArraySpec {
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

/// Fridge (standby only), washer (daily) and dishwasher (even days).
pub fn household_appliances() -> Vec<Appliance> {
    vec![
        Appliance::new("fridge", 120.0, 0.0, 0, 46.0),
        Appliance::new("washer", 2000.0, 1200.0, 120, 0.5),
        Appliance::new("dishwasher", 1800.0, 1000.0, 150, 1.0).with_run_rule(RunRule::EvenDays),
    ]
}

/// A day whose GHI follows a bell between 06:00 and 18:00 peaking at
/// `peak_kw_m2`, at a constant 20 °C.
pub fn bell_day(date: NaiveDate, peak_kw_m2: f64) -> DayForecast {
    let mut ghi = [0.0; 24];
    for (h, g) in ghi.iter_mut().enumerate().take(18).skip(6) {
        let x = (h as f64 - 12.0) / 6.0;
        *g = peak_kw_m2 * (1.0 - x * x).max(0.0);
    }
    DayForecast::from_profile(date, &ghi, &[20.0; 24]).expect("valid day")
}

/// Consecutive bell days with the given peaks.
pub fn bell_days(peaks: &[f64]) -> Vec<DayForecast> {
    start_date()
        .iter_days()
        .zip(peaks)
        .map(|(date, peak)| bell_day(date, *peak))
        .collect()
}

/// Engine over the reference array and household appliances.
pub fn household_engine(initial_soc: f64, scheduler: DayAheadScheduler) -> Engine {
    Engine::new(
        PvArray::new(reference_array_spec()).expect("valid spec"),
        ShadingProfile::SunAzimuthThreshold,
        BatteryStore::with_initial_soc(10_000.0, 5_000.0, initial_soc),
        household_appliances(),
        scheduler,
        DispatchEngine::default(),
    )
}
