//! Configuration settings for pomobot.
//!
//! Settings are loaded from `~/.pomobot/config.yaml`. Every section is
//! optional; missing fields fall back to their defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::Paths;
use crate::error::FocusError;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Focus session defaults and limits.
    pub focus: FocusConfig,
    /// Durable storage settings.
    pub storage: StorageConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// AI assistant settings.
    pub assistant: AssistantConfig,
}

/// Focus session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Default work interval in minutes.
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    /// Default short break in minutes.
    #[serde(default = "default_short_break")]
    pub short_break_minutes: u32,
    /// Default long break in minutes.
    #[serde(default = "default_long_break")]
    pub long_break_minutes: u32,
    /// Every Nth completed session is followed by a long break.
    #[serde(default = "default_sessions_until_long_break")]
    pub sessions_until_long_break: u32,
    /// Upper bound a user may set for the work interval.
    #[serde(default = "default_max_work_minutes")]
    pub max_work_minutes: u32,
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Override for the database file location.
    pub database: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// AI assistant settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Whether the advice menu talks to a remote assistant.
    pub enabled: bool,
    /// OpenAI-compatible chat completions endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model name sent with each request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

// Default value functions for serde
const fn default_work_minutes() -> u32 {
    25
}

const fn default_short_break() -> u32 {
    5
}

const fn default_long_break() -> u32 {
    15
}

const fn default_sessions_until_long_break() -> u32 {
    4
}

const fn default_max_work_minutes() -> u32 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break(),
            long_break_minutes: default_long_break(),
            sessions_until_long_break: default_sessions_until_long_break(),
            max_work_minutes: default_max_work_minutes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a specific path.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, FocusError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            FocusError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            FocusError::Config(format!(
                "Failed to parse config file {}: {e}",
                path.display()
            ))
        })
    }

    /// Resolve the database path, honoring the storage override.
    #[must_use]
    pub fn database_path(&self, paths: &Paths) -> PathBuf {
        self.storage
            .database
            .clone()
            .unwrap_or_else(|| paths.database.clone())
    }
}
