use crate::config::ConfigError;
use crate::devices::shading::Shade;

/// Reference cell temperature for the Pmax temperature coefficient (STC).
pub const REFERENCE_TEMP_C: f64 = 25.0;

/// Immutable description of a photovoltaic array.
///
/// Built once from configuration and never mutated. The installed area is
/// derived from the panel dimensions and panel count.
#[derive(Debug, Clone, PartialEq)]
pub struct ArraySpec {
    /// Module efficiency as a fraction (0.0 to 1.0).
    pub efficiency: f64,
    /// Rated power of a single panel (W).
    pub panel_rated_w: f64,
    /// Number of panels in the array.
    pub panel_count: u32,
    /// Panel width (m).
    pub panel_width_m: f64,
    /// Panel length (m).
    pub panel_length_m: f64,
    /// System losses as a fraction (0.0 to 1.0).
    pub system_loss: f64,
    /// Tilt from horizontal (degrees).
    pub tilt_deg: f64,
    /// Array azimuth, 180 = due south (degrees).
    pub azimuth_deg: f64,
    /// Pmax temperature coefficient (%/°C, typically negative).
    pub temp_coeff_pmax_pct: f64,
    /// Power loss per year of service as a fraction.
    pub annual_degradation: f64,
    /// Whole years since installation.
    pub years_in_service: u32,
}

impl ArraySpec {
    /// Checks the fraction and area invariants.
    ///
    /// Tilt and azimuth are intentionally left unchecked; out-of-range
    /// angles still produce a (clamped) result.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant as a `ConfigError`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("array.efficiency", self.efficiency)?;
        check_fraction("array.system_loss", self.system_loss)?;
        check_fraction("array.annual_degradation", self.annual_degradation)?;
        let area = self.installed_area_m2();
        if !(area.is_finite() && area > 0.0) {
            return Err(ConfigError::new(
                "array.panel_count",
                format!("derived installed area must be > 0, got {area}"),
            ));
        }
        Ok(())
    }

    /// Total panel surface (m²).
    pub fn installed_area_m2(&self) -> f64 {
        self.panel_width_m * self.panel_length_m * f64::from(self.panel_count)
    }

    /// Sum of panel ratings (W).
    pub fn nameplate_w(&self) -> f64 {
        self.panel_rated_w * f64::from(self.panel_count)
    }

    /// Simplified incidence-angle proxy.
    ///
    /// Depends only on the array geometry, not on the sun position.
    pub fn orientation_factor(&self) -> f64 {
        self.tilt_deg.to_radians().cos() * (self.azimuth_deg - 180.0).to_radians().cos()
    }
}

fn check_fraction(field: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::new(field, format!("must be in [0.0, 1.0], got {value}")))
    }
}

/// Generation model for a photovoltaic array.
///
/// Converts irradiance, ambient temperature and shading into instantaneous
/// array output. Because the simulation steps one hour at a time, the
/// returned watts double as watt-hours for that step.
#[derive(Debug, Clone)]
pub struct PvArray {
    spec: ArraySpec,
}

impl PvArray {
    /// Wraps a validated array description.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the array description violates its invariants.
    pub fn new(spec: ArraySpec) -> Result<Self, ConfigError> {
        spec.validate()?;
        Ok(Self { spec })
    }

    /// Returns the underlying description.
    pub fn spec(&self) -> &ArraySpec {
        &self.spec
    }

    /// Efficiency after the temperature correction against 25 °C.
    pub fn corrected_efficiency(&self, ambient_temp_c: f64) -> f64 {
        self.spec.efficiency
            * (1.0 + self.spec.temp_coeff_pmax_pct / 100.0 * (ambient_temp_c - REFERENCE_TEMP_C))
    }

    fn degradation_factor(&self) -> f64 {
        let years = i32::try_from(self.spec.years_in_service).unwrap_or(i32::MAX);
        (1.0 - self.spec.annual_degradation).powi(years)
    }

    /// Computes array output power in watts.
    ///
    /// # Arguments
    ///
    /// * `ghi_kw_m2` - Global horizontal irradiance (kW/m²)
    /// * `ambient_temp_c` - Ambient temperature (°C)
    /// * `sun_azimuth_deg` - Sun azimuth (degrees); only used by the coarse shading rule
    /// * `shade` - Shade factor and whether the coarse threshold applies to it
    ///
    /// # Returns
    ///
    /// Output power in watts, never negative.
    pub fn power_w(
        &self,
        ghi_kw_m2: f64,
        ambient_temp_c: f64,
        sun_azimuth_deg: f64,
        shade: Shade,
    ) -> f64 {
        if ghi_kw_m2 <= 0.0 {
            return 0.0;
        }

        let shade_factor = shade.resolve(sun_azimuth_deg);
        let effective_irradiance_w =
            ghi_kw_m2 * 1000.0 * self.spec.installed_area_m2() * self.spec.orientation_factor();

        let watts = effective_irradiance_w
            * self.corrected_efficiency(ambient_temp_c)
            * (1.0 - self.spec.system_loss)
            * shade_factor
            * self.degradation_factor();

        if watts < 0.0 {
            tracing::debug!(watts, "negative array output clamped to zero");
        }
        watts.max(0.0)
    }
}
