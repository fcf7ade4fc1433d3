//! Formatting helpers shared by the history listings.

use chrono::{DateTime, Utc};

/// Format a timestamp as relative time (e.g., "2m ago").
pub fn format_relative_time(ts: DateTime<Utc>) -> String {
    format_relative_time_at(ts, Utc::now())
}

/// Same as [`format_relative_time`], measured against an explicit `now`.
pub fn format_relative_time_at(ts: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(ts);

    if duration.num_seconds() < 0 {
        "just now".to_string()
    } else if duration.num_seconds() < 60 {
        format!("{}s ago", duration.num_seconds())
    } else if duration.num_minutes() < 60 {
        format!("{}m ago", duration.num_minutes())
    } else if duration.num_hours() < 24 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_days() < 7 {
        format!("{}d ago", duration.num_days())
    } else {
        ts.format("%b %d").to_string()
    }
}

/// Format an optional timestamp as `YYYY-MM-DD HH:MM`, or "Unknown" if missing.
pub fn format_display_date(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d %H:%M").to_string(),
        None => "Unknown".to_string(),
    }
}

/// Truncate to at most `max_chars` characters, ending in "..." when cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_relative_time_buckets() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(
            format_relative_time_at(now - Duration::seconds(5), now),
            "5s ago"
        );
        assert_eq!(
            format_relative_time_at(now - Duration::minutes(3), now),
            "3m ago"
        );
        assert_eq!(
            format_relative_time_at(now - Duration::hours(2), now),
            "2h ago"
        );
        assert_eq!(
            format_relative_time_at(now - Duration::days(3), now),
            "3d ago"
        );
        assert_eq!(
            format_relative_time_at(now - Duration::days(30), now),
            "May 02"
        );
        assert_eq!(
            format_relative_time_at(now + Duration::seconds(10), now),
            "just now"
        );
    }

    #[test]
    fn test_display_date() {
        let ts = Utc.with_ymd_and_hms(2025, 1, 15, 9, 5, 0).unwrap();
        assert_eq!(format_display_date(Some(ts)), "2025-01-15 09:05");
        assert_eq!(format_display_date(None), "Unknown");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 50), "short");
        let long = "x".repeat(60);
        let cut = truncate_chars(&long, 50);
        assert_eq!(cut.chars().count(), 50);
        assert!(cut.ends_with("..."));
        // multi-byte characters are never split
        let wide = "é".repeat(60);
        assert_eq!(truncate_chars(&wide, 10), format!("{}...", "é".repeat(7)));
    }
}
