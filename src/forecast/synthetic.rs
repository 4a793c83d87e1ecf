use chrono::{NaiveDate, NaiveTime, TimeDelta};
use rand::{Rng, SeedableRng, rngs::StdRng};

use super::{DEFAULT_SUN_AZIMUTH_DEG, DayForecast, ForecastEntry, HOURS_PER_DAY};
use crate::error::ForecastError;

/// Hour of the daily temperature maximum.
const WARMEST_HOUR: f64 = 15.0;

/// Clear-sky day generator with seeded cloud noise.
///
/// GHI follows a half-sine between sunrise and sunset, peaking at
/// `peak_ghi_kw_m2`, multiplied by `1 + N(0, cloud_noise_std)` and floored
/// at zero. Temperature follows a sinusoid peaking mid-afternoon. The sun
/// azimuth sweeps linearly from 90° at sunrise to 270° at sunset.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use home_pv_sim::forecast::SyntheticForecast;
///
/// let mut generator = SyntheticForecast::new(6, 20, 0.9, 0.0, 12.0, 24.0, 42);
/// let day = generator.next_day(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()).unwrap();
/// assert_eq!(day.entries().len(), 24);
/// assert_eq!(day.entries()[0].ghi_kw_m2, 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct SyntheticForecast {
    /// Hour of sunrise (inclusive).
    pub sunrise_hour: usize,
    /// Hour of sunset (exclusive).
    pub sunset_hour: usize,
    /// Irradiance at solar noon on a clear day (kW/m²).
    pub peak_ghi_kw_m2: f64,
    /// Standard deviation of the multiplicative cloud noise.
    pub cloud_noise_std: f64,
    /// Daily minimum temperature (°C).
    pub temp_min_c: f64,
    /// Daily maximum temperature (°C).
    pub temp_max_c: f64,
    rng: StdRng,
}

impl SyntheticForecast {
    /// Creates a generator.
    ///
    /// # Panics
    ///
    /// Panics if `sunrise_hour >= sunset_hour` or `sunset_hour > 24`.
    pub fn new(
        sunrise_hour: usize,
        sunset_hour: usize,
        peak_ghi_kw_m2: f64,
        cloud_noise_std: f64,
        temp_min_c: f64,
        temp_max_c: f64,
        seed: u64,
    ) -> Self {
        assert!(sunrise_hour < sunset_hour && sunset_hour <= HOURS_PER_DAY);
        Self {
            sunrise_hour,
            sunset_hour,
            peak_ghi_kw_m2: peak_ghi_kw_m2.max(0.0),
            cloud_noise_std: cloud_noise_std.max(0.0),
            temp_min_c,
            temp_max_c,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Fraction of daylight progress at the middle of hour `h`, in (0, 1),
    /// or `None` outside daylight.
    fn daylight_progress(&self, h: usize) -> Option<f64> {
        if h < self.sunrise_hour || h >= self.sunset_hour {
            return None;
        }
        let span = (self.sunset_hour - self.sunrise_hour) as f64;
        Some((h - self.sunrise_hour) as f64 / span + 0.5 / span)
    }

    fn air_temp_c(&self, h: usize) -> f64 {
        let mid = (self.temp_min_c + self.temp_max_c) / 2.0;
        let amp = (self.temp_max_c - self.temp_min_c) / 2.0;
        let angle = 2.0 * std::f64::consts::PI * (h as f64 - WARMEST_HOUR + 6.0) / 24.0;
        mid + amp * angle.sin()
    }

    /// Generates the next day in the sequence.
    ///
    /// # Errors
    ///
    /// Returns a `ForecastError` only if the generated values are invalid,
    /// e.g. non-finite temperature bounds.
    pub fn next_day(&mut self, date: NaiveDate) -> Result<DayForecast, ForecastError> {
        let midnight = date.and_time(NaiveTime::MIN);
        let mut entries = Vec::with_capacity(HOURS_PER_DAY);
        for h in 0..HOURS_PER_DAY {
            let timestamp = midnight + TimeDelta::hours(h as i64);
            let mut entry = ForecastEntry::new(timestamp, 0.0, self.air_temp_c(h));
            if let Some(progress) = self.daylight_progress(h) {
                let clear_sky = self.peak_ghi_kw_m2 * (std::f64::consts::PI * progress).sin();
                let cloud = 1.0 + gaussian_noise(&mut self.rng, self.cloud_noise_std);
                entry.ghi_kw_m2 = (clear_sky * cloud).max(0.0);
                entry.sun_azimuth_deg = 90.0 + 180.0 * progress;
            } else {
                entry.sun_azimuth_deg = DEFAULT_SUN_AZIMUTH_DEG;
            }
            entries.push(entry);
        }
        DayForecast::new(entries)
    }
}

/// Gaussian noise with mean 0 via the Box-Muller transform.
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}
