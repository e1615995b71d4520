//! Focus statistics reports.
//!
//! Windowed session counts from the history log plus task completion ratio.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::history::HistoryLog;
use crate::core::UserId;
use crate::features::tasks::Task;

/// Report time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    /// Last 24 hours
    Today,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
}

impl ReportPeriod {
    /// Window length in days.
    #[must_use]
    pub const fn days(&self) -> i64 {
        match self {
            Self::Today => 1,
            Self::Week => 7,
            Self::Month => 30,
        }
    }
}

/// Statistics shown to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusReport {
    /// Sessions completed in the last day
    pub today: usize,
    /// Sessions completed in the last 7 days
    pub week: usize,
    /// Sessions completed in the last 30 days
    pub month: usize,
    /// Tasks marked done
    pub tasks_done: usize,
    /// All tasks
    pub tasks_total: usize,
}

impl FocusReport {
    /// Build a report for `user` as of `now`.
    #[must_use]
    pub fn generate(history: &HistoryLog, tasks: &[Task], user: &UserId, now: DateTime<Utc>) -> Self {
        let count = |period: ReportPeriod| history.count_last_days(user, period.days(), now);

        Self {
            today: count(ReportPeriod::Today),
            week: count(ReportPeriod::Week),
            month: count(ReportPeriod::Month),
            tasks_done: tasks.iter().filter(|t| t.done).count(),
            tasks_total: tasks.len(),
        }
    }

    /// Whole-number percentage of tasks done; 0 with no tasks.
    #[must_use]
    pub const fn percent_done(&self) -> usize {
        if self.tasks_total == 0 {
            0
        } else {
            self.tasks_done * 100 / self.tasks_total
        }
    }

    /// Render as chat text.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "📈 Stats:\nToday: {} sessions\nWeek: {}\nMonth: {}\n\n📋 Tasks done: {}/{} ({}%)",
            self.today,
            self.week,
            self.month,
            self.tasks_done,
            self.tasks_total,
            self.percent_done()
        )
    }
}
