//! Date and time utilities.
//!
//! All timestamps are handled in UTC. Relative due phrases are resolved
//! against a caller-supplied "now" so the result is fixed at add time.

use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

// "... in 3 days", "... in 90 minutes", "... in 1 hr"
static RELATIVE_DUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+in\s+(\d{1,4})\s+(minutes?|mins?|hours?|hrs?|days?|weeks?)\s*$")
        .unwrap_or_else(|e| panic!("Invalid relative due regex: {e}"))
});

static TOMORROW_DUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s+tomorrow\s*$").unwrap_or_else(|e| panic!("Invalid tomorrow regex: {e}"))
});

/// Split a trailing due phrase off a task description.
///
/// Supports:
/// - `in N minutes` / `in N hours` / `in N days` / `in N weeks`
/// - `tomorrow` (same time, one day later)
///
/// Returns the remaining text and the resolved absolute timestamp. When no
/// phrase is present, or stripping it would leave nothing, the input is
/// returned unchanged with no due time.
#[must_use]
pub fn split_due(input: &str, now: DateTime<Utc>) -> (String, Option<DateTime<Utc>>) {
    let input = input.trim();

    if let Some(caps) = RELATIVE_DUE.captures(input) {
        let amount: i64 = caps[1].parse().unwrap_or(0);
        let unit = caps[2].to_lowercase();

        let offset = match unit.trim_end_matches('s') {
            "minute" | "min" => Duration::minutes(amount),
            "hour" | "hr" => Duration::hours(amount),
            "day" => Duration::days(amount),
            "week" => Duration::weeks(amount),
            _ => return (input.to_string(), None),
        };

        let title = input[..caps.get(0).map_or(input.len(), |m| m.start())].trim();
        if amount > 0 && !title.is_empty() {
            return (title.to_string(), Some(now + offset));
        }
    }

    if let Some(m) = TOMORROW_DUE.find(input) {
        let title = input[..m.start()].trim();
        if !title.is_empty() {
            return (title.to_string(), Some(now + Duration::days(1)));
        }
    }

    (input.to_string(), None)
}

/// Format a timestamp for display in chat replies.
#[must_use]
pub fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_no_due_phrase() {
        let (title, due) = split_due("write report", now());
        assert_eq!(title, "write report");
        assert!(due.is_none());
    }

    #[test]
    fn test_relative_hours() {
        let (title, due) = split_due("write report in 2 hours", now());
        assert_eq!(title, "write report");
        assert_eq!(due, Some(now() + Duration::hours(2)));
    }

    #[test]
    fn test_relative_singular_and_abbrev() {
        let (_, due) = split_due("call bank in 1 day", now());
        assert_eq!(due, Some(now() + Duration::days(1)));

        let (_, due) = split_due("stretch in 15 mins", now());
        assert_eq!(due, Some(now() + Duration::minutes(15)));

        let (_, due) = split_due("plan sprint in 2 Weeks", now());
        assert_eq!(due, Some(now() + Duration::weeks(2)));
    }

    #[test]
    fn test_tomorrow() {
        let (title, due) = split_due("pay rent tomorrow", now());
        assert_eq!(title, "pay rent");
        assert_eq!(due, Some(now() + Duration::days(1)));
    }

    #[test]
    fn test_phrase_alone_is_title() {
        let (title, due) = split_due("in 2 hours", now());
        assert_eq!(title, "in 2 hours");
        assert!(due.is_none());
    }

    #[test]
    fn test_phrase_not_at_end_is_ignored() {
        let (title, due) = split_due("read in 2 hours chunks", now());
        assert_eq!(title, "read in 2 hours chunks");
        assert!(due.is_none());
    }

    #[test]
    fn test_zero_amount_is_ignored() {
        let (title, due) = split_due("nap in 0 minutes", now());
        assert_eq!(title, "nap in 0 minutes");
        assert!(due.is_none());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(now()), "2024-03-10 12:00 UTC");
    }
}
