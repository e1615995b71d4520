//! Configuration management for pomobot.
//!
//! This module handles loading configuration from `~/.pomobot/`.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{AssistantConfig, Config, FocusConfig, LoggingConfig, StorageConfig};
