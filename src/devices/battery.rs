/// A stationary battery holding a clamped amount of stored energy.
///
/// `BatteryStore` tracks stored energy in watt-hours. `charge` and
/// `discharge` are the only mutators and both clamp instead of rejecting,
/// so `0 <= stored_wh <= capacity_wh` holds after every call.
///
/// Rated power is recorded but not applied here; the dispatch layer
/// decides whether to cap per-hour flows with it.
#[derive(Debug, Clone)]
pub struct BatteryStore {
    /// Usable capacity in watt-hours.
    capacity_wh: f64,

    /// Rated charge/discharge power in watts.
    rated_power_w: f64,

    /// Energy currently stored in watt-hours.
    stored_wh: f64,
}

impl BatteryStore {
    /// Creates an empty battery.
    ///
    /// # Arguments
    ///
    /// * `capacity_wh` - Usable capacity in Wh (must be > 0)
    /// * `rated_power_w` - Rated power in W (must be >= 0)
    ///
    /// # Panics
    ///
    /// Panics if capacity is not positive or rated power is negative.
    pub fn new(capacity_wh: f64, rated_power_w: f64) -> Self {
        assert!(capacity_wh > 0.0, "capacity_wh must be > 0");
        assert!(rated_power_w >= 0.0, "rated_power_w must be >= 0");
        Self {
            capacity_wh,
            rated_power_w,
            stored_wh: 0.0,
        }
    }

    /// Creates a battery pre-filled to `soc` (fraction, clamped to 0.0..=1.0).
    pub fn with_initial_soc(capacity_wh: f64, rated_power_w: f64, soc: f64) -> Self {
        let mut battery = Self::new(capacity_wh, rated_power_w);
        battery.stored_wh = capacity_wh * soc.clamp(0.0, 1.0);
        battery
    }

    /// Usable capacity (Wh).
    pub fn capacity_wh(&self) -> f64 {
        self.capacity_wh
    }

    /// Rated power (W).
    pub fn rated_power_w(&self) -> f64 {
        self.rated_power_w
    }

    /// Stored energy (Wh).
    pub fn stored_wh(&self) -> f64 {
        self.stored_wh
    }

    /// Free space left before the battery is full (Wh).
    pub fn headroom_wh(&self) -> f64 {
        self.capacity_wh - self.stored_wh
    }

    /// Adds energy and returns the new stored amount.
    ///
    /// Anything beyond capacity is discarded; callers that need to account
    /// for it compare the stored amount before and after. Negative input is
    /// treated as zero.
    pub fn charge(&mut self, energy_wh: f64) -> f64 {
        let offered = energy_wh.max(0.0);
        let target = self.stored_wh + offered;
        if target > self.capacity_wh {
            tracing::debug!(
                offered_wh = offered,
                discarded_wh = target - self.capacity_wh,
                "charge clamped at capacity"
            );
        }
        self.stored_wh = target.min(self.capacity_wh);
        self.stored_wh
    }

    /// Supplies up to `requested_wh` and returns what was actually supplied.
    pub fn discharge(&mut self, requested_wh: f64) -> f64 {
        let supplied = requested_wh.max(0.0).min(self.stored_wh);
        self.stored_wh = (self.stored_wh - supplied).max(0.0);
        supplied
    }

    /// State of charge as a percentage of capacity.
    pub fn state_of_charge_percent(&self) -> f64 {
        self.stored_wh / self.capacity_wh * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_battery_is_empty() {
        let battery = BatteryStore::new(10_000.0, 5_000.0);
        assert_eq!(battery.capacity_wh(), 10_000.0);
        assert_eq!(battery.rated_power_w(), 5_000.0);
        assert_eq!(battery.stored_wh(), 0.0);
        assert_eq!(battery.state_of_charge_percent(), 0.0);
    }

    #[test]
    #[should_panic]
    fn test_invalid_capacity() {
        BatteryStore::new(0.0, 5_000.0);
    }

    #[test]
    fn test_initial_soc_is_clamped() {
        let battery = BatteryStore::with_initial_soc(10_000.0, 5_000.0, 1.5);
        assert_eq!(battery.stored_wh(), 10_000.0);
        let battery = BatteryStore::with_initial_soc(10_000.0, 5_000.0, 0.25);
        assert_eq!(battery.stored_wh(), 2_500.0);
    }

    #[test]
    fn test_charge_discharge_scenario() {
        let mut battery = BatteryStore::new(10_000.0, 5_000.0);
        assert_eq!(battery.charge(12_000.0), 10_000.0);
        assert_eq!(battery.stored_wh(), 10_000.0);

        assert_eq!(battery.discharge(10_000.0), 10_000.0);
        assert_eq!(battery.stored_wh(), 0.0);

        assert_eq!(battery.discharge(500.0), 0.0);
        assert_eq!(battery.stored_wh(), 0.0);
    }

    #[test]
    fn test_discharge_never_exceeds_request_or_stored() {
        let mut battery = BatteryStore::with_initial_soc(1_000.0, 0.0, 0.5);
        assert_eq!(battery.discharge(200.0), 200.0);
        assert_eq!(battery.discharge(1_000.0), 300.0);
        assert_eq!(battery.stored_wh(), 0.0);
    }

    #[test]
    fn test_negative_amounts_are_noops() {
        let mut battery = BatteryStore::with_initial_soc(1_000.0, 0.0, 0.5);
        assert_eq!(battery.charge(-100.0), 500.0);
        assert_eq!(battery.discharge(-100.0), 0.0);
        assert_eq!(battery.stored_wh(), 500.0);
    }

    #[test]
    fn test_charge_on_full_battery_is_noop() {
        let mut battery = BatteryStore::with_initial_soc(1_000.0, 0.0, 1.0);
        assert_eq!(battery.charge(50.0), 1_000.0);
        assert_eq!(battery.headroom_wh(), 0.0);
    }

    #[test]
    fn test_soc_query_is_idempotent() {
        let mut battery = BatteryStore::new(4_000.0, 0.0);
        battery.charge(1_000.0);
        assert_eq!(
            battery.state_of_charge_percent(),
            battery.state_of_charge_percent()
        );
        assert_eq!(battery.state_of_charge_percent(), 25.0);
    }

    #[test]
    fn test_bounds_hold_over_random_walk() {
        let mut battery = BatteryStore::new(3_000.0, 0.0);
        let amounts = [500.0, 2_900.0, -10.0, 7_000.0, 1.0, 0.0, 3_500.0];
        for (i, amount) in amounts.iter().enumerate() {
            if i % 2 == 0 {
                battery.charge(*amount);
            } else {
                let before = battery.stored_wh();
                let supplied = battery.discharge(*amount);
                assert!(supplied <= amount.max(0.0));
                assert!(supplied <= before);
            }
            assert!(battery.stored_wh() >= 0.0);
            assert!(battery.stored_wh() <= battery.capacity_wh());
        }
    }
}
