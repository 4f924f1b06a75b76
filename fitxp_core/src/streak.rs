//! Consecutive-day and consecutive-week training streaks.
//!
//! Both streaks count backwards from the reference date's day (or week) and
//! stop at the first gap, so a streak is zero unless the current day (or
//! week) already has a workout.

use crate::calendar::{local_date, week_start_date};
use crate::config::CalendarConfig;
use crate::WorkoutLogEntry;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Daily streak length → bonus
pub const DAILY_STREAK_TIERS: &[(u32, f64)] = &[
    (7, 50.0),
    (14, 100.0),
    (30, 200.0),
    (60, 500.0),
    (90, 1000.0),
];

/// Weekly streak length → bonus
pub const WEEKLY_STREAK_TIERS: &[(u32, f64)] = &[(4, 100.0), (8, 250.0), (12, 500.0)];

/// Bonus of the highest tier not exceeding `streak`, or 0 below the first tier
pub fn streak_bonus(streak: u32, tiers: &[(u32, f64)]) -> f64 {
    tiers
        .iter()
        .rev()
        .find(|(threshold, _)| *threshold <= streak)
        .map_or(0.0, |(_, bonus)| *bonus)
}

fn count_back(days: &HashSet<NaiveDate>, start: NaiveDate, step: Duration) -> u32 {
    let mut count = 0;
    let mut cursor = start;
    while days.contains(&cursor) {
        count += 1;
        match cursor.checked_sub_signed(step) {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    count
}

/// Consecutive local days, ending on the reference day, with a workout
pub fn current_daily_streak(
    timestamps: impl IntoIterator<Item = DateTime<Utc>>,
    reference: DateTime<Utc>,
    calendar: &CalendarConfig,
) -> u32 {
    let days: HashSet<NaiveDate> = timestamps
        .into_iter()
        .map(|ts| local_date(ts, calendar))
        .collect();
    count_back(&days, local_date(reference, calendar), Duration::days(1))
}

/// Consecutive calendar weeks, ending on the reference week, with a workout
pub fn current_weekly_streak(
    timestamps: impl IntoIterator<Item = DateTime<Utc>>,
    reference: DateTime<Utc>,
    calendar: &CalendarConfig,
) -> u32 {
    let weeks: HashSet<NaiveDate> = timestamps
        .into_iter()
        .map(|ts| week_start_date(local_date(ts, calendar), calendar.week_start))
        .collect();
    let current = week_start_date(local_date(reference, calendar), calendar.week_start);
    count_back(&weeks, current, Duration::weeks(1))
}

/// Both streaks with their bonuses
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StreakSummary {
    pub daily: u32,
    pub weekly: u32,
    pub daily_bonus: f64,
    pub weekly_bonus: f64,
}

/// Scan the workout history for both current streaks
pub fn streak_summary(
    history: &[WorkoutLogEntry],
    reference: DateTime<Utc>,
    calendar: &CalendarConfig,
) -> StreakSummary {
    let daily = current_daily_streak(history.iter().map(|e| e.timestamp), reference, calendar);
    let weekly = current_weekly_streak(history.iter().map(|e| e.timestamp), reference, calendar);

    let summary = StreakSummary {
        daily,
        weekly,
        daily_bonus: streak_bonus(daily, DAILY_STREAK_TIERS),
        weekly_bonus: streak_bonus(weekly, WEEKLY_STREAK_TIERS),
    };
    tracing::debug!("Streaks: {:?}", summary);
    summary
}
