//! Day-ahead appliance scheduling.

use std::collections::{BTreeMap, BTreeSet};

use crate::devices::Appliance;
use crate::forecast::DayForecast;

/// Hours (0-23) at which each appliance runs one cycle, keyed by name.
///
/// Built fresh for each simulated day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleMap {
    hours: BTreeMap<String, BTreeSet<usize>>,
}

impl ScheduleMap {
    /// Marks `name` to run a cycle at `hour`.
    pub fn mark(&mut self, name: &str, hour: usize) {
        self.hours.entry(name.to_string()).or_default().insert(hour);
    }

    /// Returns `true` if `name` runs at `hour`.
    pub fn is_scheduled(&self, name: &str, hour: usize) -> bool {
        self.hours.get(name).is_some_and(|h| h.contains(&hour))
    }

    /// Hours assigned to `name`, ascending.
    pub fn hours_for(&self, name: &str) -> Vec<usize> {
        self.hours
            .get(name)
            .map(|h| h.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Names of appliances running at `hour`, sorted.
    pub fn running_at(&self, hour: usize) -> Vec<&str> {
        self.hours
            .iter()
            .filter(|(_, h)| h.contains(&hour))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Total number of scheduled cycles.
    pub fn total_runs(&self) -> usize {
        self.hours.values().map(BTreeSet::len).sum()
    }

    /// Returns `true` if nothing is scheduled.
    pub fn is_empty(&self) -> bool {
        self.total_runs() == 0
    }
}

/// Scheduling strategy, selected at configuration time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchedulePolicy {
    /// Run every eligible appliance in each hour of the first contiguous
    /// window where modeled generation covers their combined cycle energy.
    ///
    /// Leading hours that do not cover the load (night, dawn) are skipped;
    /// the scan stops at the first failing hour after the window opens.
    #[default]
    GreedySurplus,
    /// Give the n-th sunniest hour to the n-th named appliance.
    BestHour {
        /// Appliance names in rank order.
        ranking: Vec<String>,
    },
}

/// Assigns appliance cycles to the hours most likely to have PV surplus.
///
/// Neither policy is capacity-aware: appliances sharing an hour are not
/// rebalanced if their combined draw exceeds generation.
#[derive(Debug, Clone, Default)]
pub struct DayAheadScheduler {
    policy: SchedulePolicy,
}

impl DayAheadScheduler {
    /// Creates a scheduler with the given policy.
    pub fn new(policy: SchedulePolicy) -> Self {
        Self { policy }
    }

    /// Returns the configured policy.
    pub fn policy(&self) -> &SchedulePolicy {
        &self.policy
    }

    /// Builds the schedule for one day.
    ///
    /// # Arguments
    ///
    /// * `forecast` - The day's forecast snapshot
    /// * `generation_wh` - Modeled PV output per hour of the day
    /// * `appliances` - Appliance set; run rules are evaluated on the forecast date
    ///
    /// # Returns
    ///
    /// A `ScheduleMap`, possibly empty when no hour qualifies.
    pub fn schedule(
        &self,
        forecast: &DayForecast,
        generation_wh: &[f64],
        appliances: &[Appliance],
    ) -> ScheduleMap {
        let date = forecast.date();
        let eligible: Vec<&Appliance> = appliances
            .iter()
            .filter(|a| a.run_rule.allows(date))
            .collect();

        let schedule = match &self.policy {
            SchedulePolicy::GreedySurplus => greedy_surplus(generation_wh, &eligible),
            SchedulePolicy::BestHour { ranking } => best_hour(forecast, ranking, &eligible),
        };

        if schedule.is_empty() {
            tracing::warn!(%date, "no qualifying hour, appliances stay in standby");
        } else {
            tracing::debug!(%date, runs = schedule.total_runs(), ?schedule, "day-ahead schedule");
        }
        schedule
    }
}

/// Scans hours chronologically from the first hour whose generation covers
/// the combined cycle energy and stops at the first hour that does not.
///
/// Appliances without cycle energy are always-on standby loads and are not
/// scheduled.
fn greedy_surplus(generation_wh: &[f64], eligible: &[&Appliance]) -> ScheduleMap {
    let mut schedule = ScheduleMap::default();
    let cycling: Vec<&Appliance> = eligible
        .iter()
        .copied()
        .filter(|a| a.cycle_energy_wh > 0.0)
        .collect();
    if cycling.is_empty() {
        return schedule;
    }

    let combined_wh: f64 = cycling.iter().map(|a| a.cycle_energy_wh).sum();
    let covers = |g: &f64| *g >= combined_wh;

    let Some(start) = generation_wh.iter().position(covers) else {
        return schedule;
    };
    for (hour, _) in generation_wh
        .iter()
        .enumerate()
        .skip(start)
        .take_while(|(_, g)| covers(g))
    {
        for appliance in &cycling {
            schedule.mark(&appliance.name, hour);
        }
    }
    schedule
}

/// Sorts the day by irradiance (ties keep chronological order) and maps
/// each ranked slot back to its hour by timestamp.
fn best_hour(forecast: &DayForecast, ranking: &[String], eligible: &[&Appliance]) -> ScheduleMap {
    let mut schedule = ScheduleMap::default();
    let entries = forecast.entries();

    let mut sorted: Vec<_> = entries.iter().collect();
    sorted.sort_by(|a, b| b.ghi_kw_m2.total_cmp(&a.ghi_kw_m2));

    for (rank, name) in ranking.iter().enumerate() {
        if !eligible.iter().any(|a| &a.name == name) {
            continue;
        }
        let Some(slot) = sorted.get(rank) else {
            continue;
        };
        if let Some(hour) = entries.iter().position(|e| e.timestamp == slot.timestamp) {
            schedule.mark(name, hour);
        }
    }
    schedule
}
