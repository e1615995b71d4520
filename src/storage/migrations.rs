//! Database migrations for pomobot.
//!
//! Each migration is a function that upgrades the schema by one version.
//! Migrations are run automatically when the database is opened.

use rusqlite::Connection;

use crate::error::FocusError;

/// Current schema version.
const CURRENT_VERSION: i32 = 1;

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
pub fn get_version(conn: &Connection) -> Result<i32, FocusError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| FocusError::Database(format!("Failed to get schema version: {e}")))
}

/// Set the schema version in the database.
fn set_version(conn: &Connection, version: i32) -> Result<(), FocusError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| FocusError::Database(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), FocusError> {
    let current = get_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=CURRENT_VERSION {
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

/// Run a specific migration.
fn run_migration(conn: &Connection, version: i32) -> Result<(), FocusError> {
    match version {
        1 => migrate_v1(conn),
        _ => Err(FocusError::Database(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: named JSON blobs.
fn migrate_v1(conn: &Connection) -> Result<(), FocusError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS blobs (
            name TEXT PRIMARY KEY,
            body TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| FocusError::Database(format!("Migration v1 failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_create_blobs_table() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();

        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);

        conn.execute(
            "INSERT INTO blobs (name, body, updated_at) VALUES ('profile', '{}', '2024-01-01T10:00:00Z')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_migration_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn).unwrap();
        run(&conn).unwrap();

        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_get_version_new_database() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_version(&conn).unwrap(), 0);
    }
}
