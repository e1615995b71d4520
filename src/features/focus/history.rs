//! Session history log.
//!
//! Append-only record of completed work intervals per user. Counts are
//! recomputed from the records on every query.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{PerUser, UserId};

/// One completed work interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// When the work interval finished (UTC).
    pub completed_at: DateTime<Utc>,
    /// Text of the task the session was bound to.
    pub task_text: String,
}

/// Per-user completed-session history.
#[derive(Debug, Default)]
pub struct HistoryLog {
    records: PerUser<Vec<SessionRecord>>,
}

impl HistoryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log from previously persisted records.
    #[must_use]
    pub fn from_map(records: HashMap<UserId, Vec<SessionRecord>>) -> Self {
        Self {
            records: PerUser::from_map(records),
        }
    }

    /// Append a completion for `user` at `at`.
    ///
    /// Returns the user's total number of records after the append.
    pub fn record(&self, user: &UserId, task_text: &str, at: DateTime<Utc>) -> usize {
        self.records.with(user, |records| {
            records.push(SessionRecord {
                completed_at: at,
                task_text: task_text.to_string(),
            });
            records.len()
        })
    }

    /// Count records completed at or after `cutoff`.
    #[must_use]
    pub fn count_since(&self, user: &UserId, cutoff: DateTime<Utc>) -> usize {
        self.records
            .peek(user, |records| {
                records.iter().filter(|r| r.completed_at >= cutoff).count()
            })
            .unwrap_or(0)
    }

    /// Count records in the last `days` days relative to `now`.
    #[must_use]
    pub fn count_last_days(&self, user: &UserId, days: i64, now: DateTime<Utc>) -> usize {
        self.count_since(user, now - Duration::days(days))
    }

    /// Total number of records for `user`.
    #[must_use]
    pub fn total(&self, user: &UserId) -> usize {
        self.count_since(user, DateTime::<Utc>::MIN_UTC)
    }

    /// A user's records in completion order.
    #[must_use]
    pub fn records(&self, user: &UserId) -> Vec<SessionRecord> {
        self.records.peek(user, Clone::clone).unwrap_or_default()
    }

    /// Copy out every user's records for persistence.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<UserId, Vec<SessionRecord>> {
        self.records.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user() -> UserId {
        UserId::new("u1")
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_record_appends_in_order() {
        let log = HistoryLog::new();
        assert_eq!(log.record(&user(), "a", at(1, 9)), 1);
        assert_eq!(log.record(&user(), "b", at(1, 10)), 2);

        let records = log.records(&user());
        assert_eq!(records[0].task_text, "a");
        assert_eq!(records[1].task_text, "b");
    }

    #[test]
    fn test_count_since_is_inclusive() {
        let log = HistoryLog::new();
        log.record(&user(), "a", at(1, 9));
        log.record(&user(), "b", at(2, 9));

        assert_eq!(log.count_since(&user(), at(2, 9)), 1);
        assert_eq!(log.count_since(&user(), at(1, 9)), 2);
        assert_eq!(log.count_since(&user(), at(3, 0)), 0);
    }

    #[test]
    fn test_count_since_non_increasing_as_cutoff_advances() {
        let log = HistoryLog::new();
        for (day, hour) in [(1, 8), (1, 12), (3, 9), (5, 18), (9, 7), (9, 7)] {
            log.record(&user(), "work", at(day, hour));
        }

        let mut previous = usize::MAX;
        for day in 1..=10 {
            for hour in [0, 7, 8, 12, 23] {
                let count = log.count_since(&user(), at(day, hour));
                assert!(count <= previous, "count rose at day {day} hour {hour}");
                previous = count;
            }
        }
    }

    #[test]
    fn test_count_last_days() {
        let log = HistoryLog::new();
        let now = at(10, 12);
        log.record(&user(), "old", now - Duration::days(20));
        log.record(&user(), "week", now - Duration::days(3));
        log.record(&user(), "today", now - Duration::hours(2));

        assert_eq!(log.count_last_days(&user(), 1, now), 1);
        assert_eq!(log.count_last_days(&user(), 7, now), 2);
        assert_eq!(log.count_last_days(&user(), 30, now), 3);
        assert_eq!(log.total(&user()), 3);
    }

    #[test]
    fn test_unknown_user_counts_zero() {
        let log = HistoryLog::new();
        assert_eq!(log.total(&UserId::new("nobody")), 0);
        assert!(log.records(&UserId::new("nobody")).is_empty());
    }
}
