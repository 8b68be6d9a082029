//! Tolerant date parsing for store records.
//!
//! Backends hand back a mix of RFC 3339 instants, bare datetimes, and plain
//! dates. Parsing fails closed: an unparseable string is treated as an absent
//! field, never an error, so one bad record cannot take down a window fetch.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Parse a date string into a UTC instant.
///
/// Accepted shapes, tried in order:
/// - RFC 3339 with offset (`2025-09-10T09:00:00Z`, `...+02:00`)
/// - bare datetime, assumed UTC (`2025-09-10T09:00:00`, `2025-09-10T09:00`)
/// - plain date, midnight UTC (`2025-09-10`)
///
/// Returns `None` for anything else.
#[must_use]
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(ndt.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

/// Format an instant for the store (RFC 3339, second precision, `Z` suffix).
#[must_use]
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rfc3339_utc() {
        let dt = parse_instant("2025-09-10T09:00:00Z").unwrap();
        assert_eq!(format_instant(dt), "2025-09-10T09:00:00Z");
    }

    #[test]
    fn parse_rfc3339_offset_normalizes_to_utc() {
        let dt = parse_instant("2025-09-10T11:00:00+02:00").unwrap();
        assert_eq!(format_instant(dt), "2025-09-10T09:00:00Z");
    }

    #[test]
    fn parse_bare_datetime_assumed_utc() {
        let dt = parse_instant("2025-09-10T09:00:00").unwrap();
        assert_eq!(format_instant(dt), "2025-09-10T09:00:00Z");
    }

    #[test]
    fn parse_datetime_without_seconds() {
        let dt = parse_instant("2025-09-10T09:00").unwrap();
        assert_eq!(format_instant(dt), "2025-09-10T09:00:00Z");
    }

    #[test]
    fn parse_plain_date_is_midnight_utc() {
        let dt = parse_instant("2025-09-10").unwrap();
        assert_eq!(format_instant(dt), "2025-09-10T00:00:00Z");
    }

    #[test]
    fn parse_with_surrounding_whitespace() {
        assert!(parse_instant("  2025-09-10  ").is_some());
    }

    #[test]
    fn parse_garbage_is_none() {
        assert!(parse_instant("not-a-date").is_none());
        assert!(parse_instant("").is_none());
        assert!(parse_instant("2025-13-45").is_none());
    }
}
