//! Best-effort ISO-8601 timestamp parsing for session events.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::borrow::Cow;

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an event timestamp.
///
/// A trailing `Z` is normalized to `+00:00` first. Offset-less values are
/// taken as UTC and a bare date means midnight. Anything else yields `None`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let normalized = match raw.strip_suffix('Z') {
        Some(head) => Cow::Owned(format!("{}+00:00", head)),
        None => Cow::Borrowed(raw),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_zulu_suffix() {
        let ts = parse_timestamp("2025-01-10T08:15:30.123Z").unwrap();
        assert_eq!(
            ts,
            Utc.with_ymd_and_hms(2025, 1, 10, 8, 15, 30).unwrap()
                + chrono::Duration::milliseconds(123)
        );
    }

    #[test]
    fn test_explicit_offset_is_normalized_to_utc() {
        let ts = parse_timestamp("2025-01-10T10:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_naive_and_date_only() {
        assert_eq!(
            parse_timestamp("2025-01-10T10:00:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2025-01-10 10:00:00").unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_timestamp("2025-01-10").unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_malformed_values() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2025-13-45T99:00:00Z").is_none());
        assert!(parse_timestamp("Z").is_none());
    }
}
