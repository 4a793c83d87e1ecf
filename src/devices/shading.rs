//! Shade factors applied to array output.

use chrono::{NaiveDateTime, Timelike};

/// Sun azimuth below which the fixed obstruction shades the array (degrees).
pub const SHADE_CUTOFF_AZIMUTH_DEG: f64 = 160.0;
/// Multiplier applied while the obstruction shades the array.
pub const SHADE_CUTOFF_FACTOR: f64 = 0.6;

/// Shade factor for one evaluation of the generation model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shade {
    factor: f64,
    apply_threshold: bool,
}

impl Shade {
    /// A base factor that is further reduced by the coarse azimuth threshold.
    pub fn threshold(factor: f64) -> Self {
        Self {
            factor,
            apply_threshold: true,
        }
    }

    /// A precomputed factor used as-is.
    pub fn exact(factor: f64) -> Self {
        Self {
            factor,
            apply_threshold: false,
        }
    }

    /// Returns the factor to multiply output by for the given sun azimuth.
    pub fn resolve(self, sun_azimuth_deg: f64) -> f64 {
        if self.apply_threshold && sun_azimuth_deg < SHADE_CUTOFF_AZIMUTH_DEG {
            self.factor * SHADE_CUTOFF_FACTOR
        } else {
            self.factor
        }
    }
}

/// One row of an hourly shading table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlyShade {
    /// Row applies to hours ending up to and including this decimal hour of day.
    pub until_hour: f64,
    /// Output multiplier (0.0 to 1.0).
    pub factor: f64,
}

/// How shade factors are derived for each forecast hour.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ShadingProfile {
    /// No obstruction at all.
    None,
    /// Coarse rule keyed on sun azimuth.
    #[default]
    SunAzimuthThreshold,
    /// Horizon table keyed on time of day, sorted by `until_hour`.
    ///
    /// Rows are matched against the end of the hour starting at the entry
    /// timestamp, the time forecast services label a period with.
    Hourly(Vec<HourlyShade>),
}

impl ShadingProfile {
    /// Horizon table measured for the reference installation.
    pub fn reference_horizon() -> Self {
        Self::Hourly(vec![
            HourlyShade {
                until_hour: 9.0,
                factor: 0.5,
            },
            HourlyShade {
                until_hour: 11.0,
                factor: 0.6,
            },
            HourlyShade {
                until_hour: 12.0,
                factor: 0.4,
            },
        ])
    }

    /// Shade to apply to the hour starting at `timestamp`.
    pub fn shade_at(&self, timestamp: NaiveDateTime) -> Shade {
        match self {
            Self::None => Shade::exact(1.0),
            Self::SunAzimuthThreshold => Shade::threshold(1.0),
            Self::Hourly(rows) => {
                // 23:00 ends at 24.0, not at 0.0 of the next day
                let hour =
                    f64::from(timestamp.hour()) + f64::from(timestamp.minute()) / 60.0 + 1.0;
                let factor = rows
                    .iter()
                    .find(|row| hour <= row.until_hour)
                    .map_or(1.0, |row| row.factor);
                Shade::exact(factor)
            }
        }
    }
}
