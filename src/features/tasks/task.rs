//! Task model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::format_timestamp;

/// A single entry in a user's task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task description.
    pub text: String,
    /// Whether the task has been marked done.
    #[serde(default)]
    pub done: bool,
    /// Absolute due time, resolved when the task was added.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
}

impl Task {
    /// Create an open task.
    pub fn new(text: impl Into<String>, due: Option<DateTime<Utc>>) -> Self {
        Self {
            text: text.into(),
            done: false,
            due,
        }
    }

    /// Render one line of a task listing.
    ///
    /// `index` is the 0-based position; the rendered number is 1-based.
    #[must_use]
    pub fn format_line(&self, index: usize) -> String {
        let marker = if self.done { "✅" } else { "•" };
        let due = self
            .due
            .map_or_else(String::new, |d| format!(" (due {})", format_timestamp(d)));
        format!("{}. {marker} {}{due}", index + 1, self.text)
    }
}

/// Render a whole task list, one numbered line per task.
#[must_use]
pub fn format_list(tasks: &[Task]) -> String {
    tasks
        .iter()
        .enumerate()
        .map(|(i, t)| t.format_line(i))
        .collect::<Vec<_>>()
        .join("\n")
}
