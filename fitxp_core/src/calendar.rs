//! Local calendar helpers.
//!
//! Timestamps are stored in UTC; day and week boundaries are taken in the
//! user's local offset from [`CalendarConfig`].

use crate::config::{CalendarConfig, WeekStart};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

/// Local calendar date of a UTC timestamp
pub fn local_date(ts: DateTime<Utc>, calendar: &CalendarConfig) -> NaiveDate {
    ts.with_timezone(&calendar.offset()).date_naive()
}

/// First day of the week containing `date`
pub fn week_start_date(date: NaiveDate, week_start: WeekStart) -> NaiveDate {
    let offset = match week_start {
        WeekStart::Monday => date.weekday().num_days_from_monday(),
        WeekStart::Sunday => date.weekday().num_days_from_sunday(),
    };
    date - Duration::days(i64::from(offset))
}

/// Whole local days from `earlier` to `reference`; negative if `earlier` is later
pub fn days_between(earlier: DateTime<Utc>, reference: DateTime<Utc>, calendar: &CalendarConfig) -> i64 {
    (local_date(reference, calendar) - local_date(earlier, calendar)).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_week_start_monday_and_sunday() {
        // 2024-01-07 is a Sunday
        let sunday = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        assert_eq!(
            week_start_date(sunday, WeekStart::Monday),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(week_start_date(sunday, WeekStart::Sunday), sunday);
    }

    #[test]
    fn test_local_date_respects_offset() {
        let calendar = CalendarConfig {
            utc_offset_minutes: -300,
            week_start: WeekStart::Monday,
        };
        // 03:00 UTC is still the previous evening at UTC-5
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap();
        assert_eq!(
            local_date(ts, &calendar),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_days_between_uses_calendar_days() {
        let calendar = CalendarConfig::default();
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 0).unwrap();
        let early = Utc.with_ymd_and_hms(2024, 1, 2, 0, 1, 0).unwrap();
        assert_eq!(days_between(late, early, &calendar), 1);
        assert_eq!(days_between(early, late, &calendar), -1);
    }
}
