//! Per-user session and break durations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::FocusConfig;
use crate::core::{PerUser, UserId};
use crate::error::FocusError;

/// Durations, in minutes, for one user's focus sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Work interval.
    pub work_minutes: u32,
    /// Break after an ordinary session.
    pub short_break_minutes: u32,
    /// Break after every Nth session.
    pub long_break_minutes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from(&FocusConfig::default())
    }
}

impl From<&FocusConfig> for Settings {
    fn from(config: &FocusConfig) -> Self {
        Self {
            work_minutes: config.work_minutes,
            short_break_minutes: config.short_break_minutes,
            long_break_minutes: config.long_break_minutes,
        }
    }
}

impl Settings {
    /// Parse a `work/short/long` triple such as `25/5/15`.
    ///
    /// Only the shape is checked here; range validation happens on `set`.
    ///
    /// # Errors
    ///
    /// Returns `Parse` if the input is not three slash-separated integers.
    pub fn parse_triple(input: &str) -> Result<(i64, i64, i64), FocusError> {
        let parts: Vec<&str> = input.trim().split('/').map(str::trim).collect();

        let [work, short, long] = parts.as_slice() else {
            return Err(FocusError::Parse(format!("expected work/short/long, got {input:?}")));
        };

        let number = |s: &str| {
            s.parse::<i64>()
                .map_err(|_| FocusError::Parse(format!("{s:?} is not a whole number")))
        };

        Ok((number(*work)?, number(*short)?, number(*long)?))
    }
}

/// Per-user duration settings.
#[derive(Debug)]
pub struct SettingsStore {
    values: PerUser<Option<Settings>>,
    defaults: Settings,
    max_work_minutes: u32,
}

impl SettingsStore {
    /// Create a store whose defaults and limits come from configuration.
    #[must_use]
    pub fn new(config: &FocusConfig) -> Self {
        Self {
            values: PerUser::new(),
            defaults: Settings::from(config),
            max_work_minutes: config.max_work_minutes,
        }
    }

    /// Create a store seeded with previously persisted settings.
    #[must_use]
    pub fn from_map(config: &FocusConfig, values: HashMap<UserId, Settings>) -> Self {
        Self {
            values: PerUser::from_map(values.into_iter().map(|(u, s)| (u, Some(s))).collect()),
            ..Self::new(config)
        }
    }

    /// Get a user's settings, or the defaults if none were saved.
    #[must_use]
    pub fn get(&self, user: &UserId) -> Settings {
        self.values
            .peek(user, |s| *s)
            .flatten()
            .unwrap_or(self.defaults)
    }

    /// Replace a user's settings wholesale.
    ///
    /// All three values must be positive and the work interval may not
    /// exceed the configured maximum. On failure nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `InvalidSettings` describing the first violated rule.
    pub fn set(
        &self,
        user: &UserId,
        work: i64,
        short_break: i64,
        long_break: i64,
    ) -> Result<Settings, FocusError> {
        let settings = self.validate(work, short_break, long_break)?;
        self.values.with(user, |slot| *slot = Some(settings));
        debug!(%user, ?settings, "settings updated");
        Ok(settings)
    }

    fn validate(&self, work: i64, short_break: i64, long_break: i64) -> Result<Settings, FocusError> {
        let positive = |name: &str, value: i64| {
            u32::try_from(value)
                .ok()
                .filter(|v| *v > 0)
                .ok_or_else(|| FocusError::InvalidSettings(format!("{name} must be a positive number of minutes")))
        };

        let work_minutes = positive("work interval", work)?;
        let short_break_minutes = positive("short break", short_break)?;
        let long_break_minutes = positive("long break", long_break)?;

        if work_minutes > self.max_work_minutes {
            return Err(FocusError::InvalidSettings(format!(
                "work interval may not exceed {} minutes",
                self.max_work_minutes
            )));
        }

        Ok(Settings {
            work_minutes,
            short_break_minutes,
            long_break_minutes,
        })
    }

    /// Copy out every explicitly saved setting for persistence.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<UserId, Settings> {
        self.values
            .snapshot()
            .into_iter()
            .filter_map(|(user, s)| s.map(|s| (user, s)))
            .collect()
    }
}
