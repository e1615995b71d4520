//! Task store.
//!
//! Owns every user's ordered task list. Indices passed in are 0-based and
//! are validated against the list length at the moment of the call.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::task::Task;
use crate::core::{PerUser, UserId};
use crate::error::FocusError;

/// Per-user task lists.
#[derive(Debug, Default)]
pub struct TaskStore {
    lists: PerUser<Vec<Task>>,
}

impl TaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from previously persisted lists.
    #[must_use]
    pub fn from_map(lists: HashMap<UserId, Vec<Task>>) -> Self {
        Self {
            lists: PerUser::from_map(lists),
        }
    }

    /// List a user's tasks in insertion order.
    #[must_use]
    pub fn list(&self, user: &UserId) -> Vec<Task> {
        self.lists.peek(user, Clone::clone).unwrap_or_default()
    }

    /// Number of tasks the user currently has.
    #[must_use]
    pub fn len(&self, user: &UserId) -> usize {
        self.lists.peek(user, Vec::len).unwrap_or(0)
    }

    /// Whether the user has no tasks.
    #[must_use]
    pub fn is_empty(&self, user: &UserId) -> bool {
        self.len(user) == 0
    }

    /// Append a task.
    pub fn add(&self, user: &UserId, text: &str, due: Option<DateTime<Utc>>) -> Task {
        let task = Task::new(text, due);
        self.lists.with(user, |list| list.push(task.clone()));
        debug!(%user, text, "task added");
        task
    }

    /// Replace the text of the task at `index`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` if `index` is out of range.
    pub fn edit(&self, user: &UserId, index: usize, new_text: &str) -> Result<(), FocusError> {
        self.lists.with(user, |list| {
            let task = list.get_mut(index).ok_or(FocusError::InvalidIndex)?;
            task.text = new_text.to_string();
            Ok(())
        })
    }

    /// Remove and return the task at `index`, shifting later tasks down.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` if `index` is out of range.
    pub fn delete(&self, user: &UserId, index: usize) -> Result<Task, FocusError> {
        self.lists.with(user, |list| {
            if index < list.len() {
                Ok(list.remove(index))
            } else {
                Err(FocusError::InvalidIndex)
            }
        })
    }

    /// Mark the task at `index` as done.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIndex` if `index` is out of range.
    pub fn mark_done(&self, user: &UserId, index: usize) -> Result<Task, FocusError> {
        self.lists.with(user, |list| {
            let task = list.get_mut(index).ok_or(FocusError::InvalidIndex)?;
            task.done = true;
            Ok(task.clone())
        })
    }

    /// Copy out every user's list for persistence.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<UserId, Vec<Task>> {
        self.lists.snapshot()
    }
}
