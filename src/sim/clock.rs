use chrono::{NaiveDateTime, TimeDelta};

/// An hourly simulation clock over a fixed span starting at `start`.
///
/// The clock yields the hour index together with the wall-clock timestamp
/// of that hour, so log records are stamped `start + hour`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use home_pv_sim::sim::clock::Clock;
///
/// let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let mut clock = Clock::new(start, 3);
/// let mut hours = Vec::new();
///
/// clock.run(|hour, _| hours.push(hour));
/// assert_eq!(hours, vec![0, 1, 2]);
/// ```
pub struct Clock {
    /// Timestamp of hour 0
    start: NaiveDateTime,
    /// Current hour of the simulation
    current: usize,
    /// Total hours to run
    total: usize,
}

impl Clock {
    /// Creates a new clock.
    ///
    /// # Arguments
    ///
    /// * `start` - Timestamp of the first hour
    /// * `total` - The total number of hours the clock will run
    pub fn new(start: NaiveDateTime, total: usize) -> Self {
        Self {
            start,
            current: 0,
            total,
        }
    }

    /// Advances the clock by one hour.
    ///
    /// # Returns
    ///
    /// * `Some((hour, timestamp))` - The current hour (starting from 0) before advancing
    /// * `None` - If the clock has reached its total hours
    pub fn tick(&mut self) -> Option<(usize, NaiveDateTime)> {
        if self.current < self.total {
            let hour = self.current;
            self.current += 1;
            Some((hour, self.start + TimeDelta::hours(hour as i64)))
        } else {
            None
        }
    }

    /// Runs a function for each remaining hour.
    ///
    /// # Arguments
    ///
    /// * `f` - Called with the hour index and its timestamp
    pub fn run(&mut self, mut f: impl FnMut(usize, NaiveDateTime)) {
        while let Some((hour, timestamp)) = self.tick() {
            f(hour, timestamp);
        }
    }
}
