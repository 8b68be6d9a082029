//! Occurrence expansion: project one task onto the concrete calendar days it
//! lands on inside a window.

use {
    chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday},
    chrono_tz::Tz,
};

use crate::{
    types::{Occurrence, RecurrenceKind, Task},
    window::{DayWindow, local_day},
};

/// Cap on how far a recurring task is scanned past its scan start. Keeps
/// expansion bounded for tasks with no due date.
pub const DEFAULT_MAX_SCAN_DAYS: i64 = 365;

/// Expand a task into its occurrences within `window`.
///
/// Pure and deterministic: identical inputs yield identical output. `now`
/// drives the overdue flag and the day-of-month fallback for monthly
/// recurrence; `tz` is the viewer timezone used for all day boundaries.
///
/// The overdue flag is computed once from the task's due date, not per
/// occurrence day: every occurrence of an overdue recurring task is flagged,
/// future-dated ones included. Known quirk, kept intentionally; see the
/// pinning test below before changing it.
#[must_use]
pub fn expand(
    task: &Task,
    window: DayWindow,
    now: DateTime<Utc>,
    tz: Tz,
    max_scan_days: i64,
) -> Vec<Occurrence> {
    let overdue = task.due_date.is_some_and(|due| due < now) && !task.is_completed();
    let start_day = task.start_date.map(|i| local_day(i, tz));
    let due_day = task.due_date.map(|i| local_day(i, tz));

    let mut out = Vec::new();
    match task.recurrence {
        RecurrenceKind::None => {
            let Some(span_start) = start_day.or(due_day) else {
                return out;
            };
            // An inverted span collapses to a single day at the start.
            let span_end = due_day.unwrap_or(span_start).max(span_start);

            let mut day = span_start.max(window.start);
            let last = span_end.min(window.end);
            while day <= last {
                out.push(occurrence(task, day, overdue));
                let Some(next) = day.succ_opt() else { break };
                day = next;
            }
        },
        kind => {
            let scan_from = start_day.map_or(window.start, |s| s.max(window.start));
            let scan_cap = scan_from + Duration::days(max_scan_days);
            let today_dom = local_day(now, tz).day();

            let mut day = scan_from;
            while day <= window.end && day < scan_cap {
                let included = day_matches(kind, day, start_day, task, today_dom);
                // Occurrences are clamped to start..=due only when the task
                // has a real range; a same-day start/due pair recurs through
                // the window.
                let in_bounds = match (start_day, due_day) {
                    (Some(s), Some(e)) if e > s => s <= day && day <= e,
                    _ => true,
                };
                if included && in_bounds {
                    out.push(occurrence(task, day, overdue));
                }
                let Some(next) = day.succ_opt() else { break };
                day = next;
            }
        },
    }
    out
}

fn day_matches(
    kind: RecurrenceKind,
    day: NaiveDate,
    start_day: Option<NaiveDate>,
    task: &Task,
    today_dom: u32,
) -> bool {
    match kind {
        RecurrenceKind::None => false,
        RecurrenceKind::Daily => true,
        RecurrenceKind::Weekly => match &task.recurrence_days {
            Some(days) if !days.is_empty() => days.contains(&day.weekday()),
            _ => start_day.is_none_or(|s| day.weekday() == s.weekday()),
        },
        RecurrenceKind::Monthly => day.day() == start_day.map_or(today_dom, |s| s.day()),
        RecurrenceKind::Weekdays => !is_weekend(day.weekday()),
        RecurrenceKind::Weekends => is_weekend(day.weekday()),
    }
}

fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

fn occurrence(task: &Task, date: NaiveDate, overdue: bool) -> Occurrence {
    Occurrence {
        task: task.clone(),
        date,
        overdue,
    }
}
