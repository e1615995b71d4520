//! `SQLite` database connection and blob operations.
//!
//! The database is stored at `~/.pomobot/pomobot.db` and holds named JSON
//! blobs; what goes inside each blob is the business of the persistence
//! layer.

use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::core::keyed::lock;
use crate::error::FocusError;

use super::migrations;

/// A durable surface of named text blobs.
pub trait SnapshotStore: Send + Sync {
    /// Read a blob, or `None` if it was never written.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn load(&self, name: &str) -> Result<Option<String>, FocusError>;

    /// Write a blob, replacing any previous content.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn save(&self, name: &str, body: &str) -> Result<(), FocusError>;
}

/// Database connection wrapper.
///
/// The connection sits behind a mutex so one database can serve every user.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at a specific path.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &std::path::Path) -> Result<Self, FocusError> {
        let conn = Connection::open(path).map_err(|e| {
            FocusError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;

        Self::init(conn)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, FocusError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FocusError::Database(format!("Failed to open in-memory database: {e}")))?;

        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, FocusError> {
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, FocusError> {
        migrations::get_version(&lock(&self.conn))
    }
}

impl SnapshotStore for Database {
    fn load(&self, name: &str) -> Result<Option<String>, FocusError> {
        lock(&self.conn)
            .query_row("SELECT body FROM blobs WHERE name = ?1", [name], |row| {
                row.get(0)
            })
            .optional()
            .map_err(|e| FocusError::Database(format!("Failed to read blob {name}: {e}")))
    }

    fn save(&self, name: &str, body: &str) -> Result<(), FocusError> {
        lock(&self.conn)
            .execute(
                r"INSERT INTO blobs (name, body, updated_at) VALUES (?1, ?2, ?3)
                  ON CONFLICT(name) DO UPDATE SET body = excluded.body, updated_at = excluded.updated_at",
                params![name, body, Utc::now().to_rfc3339()],
            )
            .map(|_| ())
            .map_err(|e| FocusError::Database(format!("Failed to write blob {name}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.schema_version().unwrap() > 0);
    }

    #[test]
    fn test_missing_blob_is_none() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.load("profile").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_blob() {
        let db = Database::open_in_memory().unwrap();
        db.save("history", "{\"a\":1}").unwrap();
        db.save("history", "{\"a\":2}").unwrap();

        assert_eq!(db.load("history").unwrap().as_deref(), Some("{\"a\":2}"));
    }

    #[test]
    fn test_reopen_database() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        {
            let db = Database::open_at(&db_path).unwrap();
            db.save("profile", "{}").unwrap();
        }

        let db = Database::open_at(&db_path).unwrap();
        assert_eq!(db.load("profile").unwrap().as_deref(), Some("{}"));
    }
}
