use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

/// Minutes credited per standby hour out of a 1440-minute day.
const STANDBY_MINUTES: f64 = 60.0;
const MINUTES_PER_DAY: f64 = 1440.0;

/// Days on which an appliance is allowed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunRule {
    #[default]
    Daily,
    /// Even day of the month.
    EvenDays,
    /// Odd day of the month.
    OddDays,
}

impl RunRule {
    /// Returns `true` when the appliance may run on `date`.
    pub fn allows(self, date: NaiveDate) -> bool {
        match self {
            Self::Daily => true,
            Self::EvenDays => date.day() % 2 == 0,
            Self::OddDays => date.day() % 2 == 1,
        }
    }
}

/// Operating mode of an appliance for one hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Idle, drawing standby power.
    Standby,
    /// Running this many full cycles in the hour.
    Active(u32),
}

/// Immutable appliance descriptor. Identity is the name.
#[derive(Debug, Clone, PartialEq)]
pub struct Appliance {
    /// Unique name, used as the scheduling key.
    pub name: String,
    /// Optional model designation.
    pub model: Option<String>,
    /// Rated power (W).
    pub rated_power_w: f64,
    /// Energy drawn by one full cycle (Wh).
    pub cycle_energy_wh: f64,
    /// Cycle duration (minutes).
    pub cycle_minutes: u32,
    /// Standby power draw (W).
    pub standby_power_w: f64,
    /// Days on which the appliance may be scheduled.
    pub run_rule: RunRule,
}

impl Appliance {
    /// Creates a daily appliance with no model designation.
    pub fn new(
        name: impl Into<String>,
        rated_power_w: f64,
        cycle_energy_wh: f64,
        cycle_minutes: u32,
        standby_power_w: f64,
    ) -> Self {
        Self {
            name: name.into(),
            model: None,
            rated_power_w,
            cycle_energy_wh,
            cycle_minutes,
            standby_power_w,
            run_rule: RunRule::Daily,
        }
    }

    /// Returns a copy restricted to `rule`.
    #[must_use]
    pub fn with_run_rule(mut self, rule: RunRule) -> Self {
        self.run_rule = rule;
        self
    }

    /// Energy drawn in one hour (Wh).
    ///
    /// Standby is the standby draw spread over a fixed 60/1440 share of the
    /// rated hour, independent of when cycles actually run. Active hours
    /// consume whole cycles only; a cycle is never split across hours.
    pub fn energy_wh(&self, mode: Mode) -> f64 {
        match mode {
            Mode::Standby => {
                let kwh = self.standby_power_w / 1000.0 * (STANDBY_MINUTES / MINUTES_PER_DAY);
                kwh * 1000.0
            }
            Mode::Active(cycles) => f64::from(cycles) * self.cycle_energy_wh,
        }
    }
}
