//! Storage layer for pomobot.
//!
//! This module provides SQLite-backed persistence for:
//! - Task lists and duration settings (`profile` blob)
//! - Completed focus session history (`history` blob)

mod database;
mod migrations;
pub mod sync;

pub use database::{Database, SnapshotStore};
pub use sync::{load, LoadedState, PersistenceSync};
