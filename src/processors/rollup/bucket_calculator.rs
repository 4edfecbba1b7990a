use chrono::{DateTime, Duration, Utc};
use strum::IntoEnumIterator;

use crate::{
    db::common::models::SwapPeriod,
    processors::events::constants::{SECONDS_PER_DAY, SECONDS_PER_HOUR},
};

fn floor_to(timestamp: DateTime<Utc>, unit_seconds: i64) -> DateTime<Utc> {
    let excess = timestamp.timestamp().rem_euclid(unit_seconds);
    timestamp
        - Duration::seconds(excess)
        - Duration::nanoseconds(timestamp.timestamp_subsec_nanos() as i64)
}

pub fn floor_to_hour(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    floor_to(timestamp, SECONDS_PER_HOUR)
}

pub fn floor_to_day(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    floor_to(timestamp, SECONDS_PER_DAY)
}

/// The three leaderboard windows, all ending on the same hour boundary.
///
/// DAY is a rolling 24 hours. WEEK and MONTH start at midnight UTC so their
/// totals only move once per day at the far end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollupWindows {
    pub end: DateTime<Utc>,
    pub day_start: DateTime<Utc>,
    pub week_start: DateTime<Utc>,
    pub month_start: DateTime<Utc>,
}

impl RollupWindows {
    /// Windows for a rollup triggered at `trigger`. Swaps in the current,
    /// partial hour are left for the next run.
    pub fn ending_at(trigger: DateTime<Utc>) -> Self {
        let end = floor_to_hour(trigger);
        Self {
            end,
            day_start: end - SwapPeriod::Day.duration(),
            week_start: floor_to_day(end - SwapPeriod::Week.duration()),
            month_start: floor_to_day(end - SwapPeriod::Month.duration()),
        }
    }

    pub fn start(&self, period: SwapPeriod) -> DateTime<Utc> {
        match period {
            SwapPeriod::Day => self.day_start,
            SwapPeriod::Week => self.week_start,
            SwapPeriod::Month => self.month_start,
        }
    }

    /// Start of the widest window.
    pub fn earliest(&self) -> DateTime<Utc> {
        SwapPeriod::iter()
            .map(|period| self.start(period))
            .min()
            .unwrap_or(self.end)
    }

    /// Bounds are inclusive on both ends.
    pub fn contains(&self, period: SwapPeriod, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start(period) && timestamp <= self.end
    }
}
