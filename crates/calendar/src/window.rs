//! Visible-window computation and the single UTC↔local-day conversion point.
//!
//! Storage holds UTC instants; every day-level decision (bucketing, window
//! membership, recurrence matching) happens in one configured viewer
//! timezone. [`local_day`] and [`window_bounds_utc`] are the only places that
//! cross between the two.

use {
    chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday},
    chrono_tz::Tz,
    serde::{Deserialize, Serialize},
};

use crate::types::ViewMode;

/// Inclusive range of local calendar days visible in the grid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DayWindow {
    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    /// Extend the window by `days` on each side.
    #[must_use]
    pub fn widen(&self, days: i64) -> Self {
        Self {
            start: self.start - Duration::days(days),
            end: self.end + Duration::days(days),
        }
    }
}

/// Sunday on or before the given day.
fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_sunday()))
}

/// Saturday on or after the given day.
fn week_end(day: NaiveDate) -> NaiveDate {
    day + Duration::days(i64::from(Weekday::Sat.num_days_from_sunday())
        - i64::from(day.weekday().num_days_from_sunday()))
}

/// Compute the visible window for a reference day and view mode.
///
/// Month: the full Sunday-aligned weeks covering the reference day's month.
/// Week: the Sunday–Saturday week containing the reference day.
#[must_use]
pub fn compute_window(reference: NaiveDate, mode: ViewMode) -> DayWindow {
    match mode {
        ViewMode::Month => {
            let first = reference.with_day(1).unwrap_or(reference);
            let last = last_of_month(first);
            DayWindow {
                start: week_start(first),
                end: week_end(last),
            }
        },
        ViewMode::Week => DayWindow {
            start: week_start(reference),
            end: week_end(reference),
        },
    }
}

fn last_of_month(first: NaiveDate) -> NaiveDate {
    let next_month = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next_month.map_or(first, |d| d - Duration::days(1))
}

/// The local calendar day an instant falls on, in the viewer timezone.
#[must_use]
pub fn local_day(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// UTC instants bounding a day window: local midnight at the start of
/// `window.start` through the last second of `window.end`.
///
/// When a local midnight does not exist (DST gap), the earliest valid instant
/// of that day is used.
#[must_use]
pub fn window_bounds_utc(window: &DayWindow, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = day_start_utc(window.start, tz);
    let end = day_start_utc(window.end + Duration::days(1), tz) - Duration::seconds(1);
    (start, end)
}

fn day_start_utc(day: NaiveDate, tz: Tz) -> DateTime<Utc> {
    let mut naive = day.and_hms_opt(0, 0, 0).unwrap_or_default();
    // Walk forward out of a DST gap if midnight was skipped.
    for _ in 0..4 {
        if let Some(local) = tz.from_local_datetime(&naive).earliest() {
            return local.with_timezone(&Utc);
        }
        naive += Duration::hours(1);
    }
    Utc.from_utc_datetime(&naive)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::parse::parse_instant};

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn month_window_covers_full_weeks() {
        // September 2025: the 1st is a Monday, the 30th a Tuesday.
        let w = compute_window(day("2025-09-15"), ViewMode::Month);
        assert_eq!(w.start, day("2025-08-31")); // Sunday before Sep 1
        assert_eq!(w.end, day("2025-10-04")); // Saturday after Sep 30
    }

    #[test]
    fn month_window_when_month_starts_on_sunday() {
        // June 2025 starts on a Sunday.
        let w = compute_window(day("2025-06-10"), ViewMode::Month);
        assert_eq!(w.start, day("2025-06-01"));
        assert_eq!(w.end, day("2025-07-05"));
    }

    #[test]
    fn month_window_december_wraps_year() {
        let w = compute_window(day("2025-12-25"), ViewMode::Month);
        assert_eq!(w.start, day("2025-11-30"));
        assert_eq!(w.end, day("2026-01-03"));
    }

    #[test]
    fn week_window_is_sunday_to_saturday() {
        // 2025-09-15 is a Monday.
        let w = compute_window(day("2025-09-15"), ViewMode::Week);
        assert_eq!(w.start, day("2025-09-14"));
        assert_eq!(w.end, day("2025-09-20"));
    }

    #[test]
    fn week_window_on_sunday_starts_same_day() {
        let w = compute_window(day("2025-09-14"), ViewMode::Week);
        assert_eq!(w.start, day("2025-09-14"));
        assert_eq!(w.end, day("2025-09-20"));
    }

    #[test]
    fn widen_extends_both_sides() {
        let w = DayWindow {
            start: day("2025-09-01"),
            end: day("2025-09-07"),
        };
        let wide = w.widen(7);
        assert_eq!(wide.start, day("2025-08-25"));
        assert_eq!(wide.end, day("2025-09-14"));
    }

    #[test]
    fn contains_is_inclusive() {
        let w = DayWindow {
            start: day("2025-09-01"),
            end: day("2025-09-07"),
        };
        assert!(w.contains(day("2025-09-01")));
        assert!(w.contains(day("2025-09-07")));
        assert!(!w.contains(day("2025-09-08")));
    }

    #[test]
    fn local_day_respects_timezone() {
        // 23:30 UTC on the 10th is already the 11th in Auckland.
        let instant = parse_instant("2025-09-10T23:30:00Z").unwrap();
        assert_eq!(local_day(instant, chrono_tz::UTC), day("2025-09-10"));
        assert_eq!(
            local_day(instant, chrono_tz::Pacific::Auckland),
            day("2025-09-11")
        );
    }

    #[test]
    fn window_bounds_utc_cover_whole_days() {
        let w = DayWindow {
            start: day("2025-09-01"),
            end: day("2025-09-07"),
        };
        let (start, end) = window_bounds_utc(&w, chrono_tz::UTC);
        assert_eq!(
            crate::parse::format_instant(start),
            "2025-09-01T00:00:00Z"
        );
        assert_eq!(crate::parse::format_instant(end), "2025-09-07T23:59:59Z");
    }

    #[test]
    fn window_bounds_utc_offset_zone() {
        let w = DayWindow {
            start: day("2025-09-01"),
            end: day("2025-09-01"),
        };
        // Paris is UTC+2 in September: local midnight is 22:00 UTC the day
        // before.
        let (start, _) = window_bounds_utc(&w, chrono_tz::Europe::Paris);
        assert_eq!(
            crate::parse::format_instant(start),
            "2025-08-31T22:00:00Z"
        );
    }
}
