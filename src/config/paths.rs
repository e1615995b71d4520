//! Path resolution for pomobot configuration and data files.
//!
//! All pomobot data is stored in `~/.pomobot/`:
//! - `config.yaml` - Main configuration file
//! - `pomobot.db` - SQLite database holding the task/settings and history blobs

use std::path::PathBuf;

use crate::error::FocusError;

/// Paths to pomobot configuration and data files.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Root directory: `~/.pomobot/`
    pub root: PathBuf,
    /// Config file: `~/.pomobot/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.pomobot/pomobot.db`
    pub database: PathBuf,
}

impl Paths {
    /// Create paths based on the user's home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self, FocusError> {
        let home = std::env::var("HOME")
            .map_err(|_| FocusError::Config("Could not determine home directory".to_string()))?;

        Ok(Self::with_root(PathBuf::from(home).join(".pomobot")))
    }

    /// Create paths with a custom root directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("pomobot.db"),
            root,
        }
    }

    /// Ensure the root directory exists.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation fails.
    pub fn ensure_dirs(&self) -> Result<(), FocusError> {
        if !self.root.exists() {
            std::fs::create_dir_all(&self.root).map_err(|e| {
                FocusError::Config(format!(
                    "Failed to create directory {}: {e}",
                    self.root.display()
                ))
            })?;
        }

        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_root(PathBuf::from(".pomobot")))
    }
}
