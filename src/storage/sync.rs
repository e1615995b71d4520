//! Persistence sync.
//!
//! Serializes the task and settings stores into the `profile` blob and the
//! history log into the `history` blob. Loading and saving are best effort:
//! a missing or corrupt blob yields empty state, and a failed save is logged
//! without touching the in-memory stores.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::database::SnapshotStore;
use crate::config::FocusConfig;
use crate::core::keyed::lock;
use crate::core::UserId;
use crate::error::FocusError;
use crate::features::focus::{HistoryLog, SessionRecord, Settings, SettingsStore};
use crate::features::tasks::{Task, TaskStore};

/// Blob holding tasks and settings.
pub const PROFILE_BLOB: &str = "profile";
/// Blob holding completed-session history.
pub const HISTORY_BLOB: &str = "history";

#[derive(Debug, Default, Serialize, Deserialize)]
struct ProfileBlob {
    #[serde(default)]
    tasks: HashMap<UserId, Vec<Task>>,
    #[serde(default)]
    settings: HashMap<UserId, Settings>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct HistoryBlob {
    #[serde(default)]
    history: HashMap<UserId, Vec<SessionRecord>>,
}

/// Stores rebuilt from durable state.
pub struct LoadedState {
    /// Task lists.
    pub tasks: Arc<TaskStore>,
    /// Duration settings.
    pub settings: Arc<SettingsStore>,
    /// Session history.
    pub history: Arc<HistoryLog>,
}

/// Load every store from `store`, falling back to empty state per blob.
#[must_use]
pub fn load(store: &dyn SnapshotStore, focus: &FocusConfig) -> LoadedState {
    let profile: ProfileBlob = load_blob(store, PROFILE_BLOB);
    let history: HistoryBlob = load_blob(store, HISTORY_BLOB);

    info!(
        task_users = profile.tasks.len(),
        settings_users = profile.settings.len(),
        history_users = history.history.len(),
        "state loaded"
    );

    LoadedState {
        tasks: Arc::new(TaskStore::from_map(profile.tasks)),
        settings: Arc::new(SettingsStore::from_map(focus, profile.settings)),
        history: Arc::new(HistoryLog::from_map(history.history)),
    }
}

fn load_blob<T: DeserializeOwned + Default>(store: &dyn SnapshotStore, name: &str) -> T {
    match store.load(name) {
        Ok(None) => {
            info!(blob = name, "no saved state, starting empty");
            T::default()
        },
        Ok(Some(body)) => serde_json::from_str(&body).unwrap_or_else(|e| {
            warn!(blob = name, error = %e, "saved state is unparsable, starting empty");
            T::default()
        }),
        Err(e) => {
            warn!(blob = name, error = %e, "saved state could not be read, starting empty");
            T::default()
        },
    }
}

/// Writes store snapshots after each mutation.
///
/// Each blob has its own lock held from snapshot to write, so a later
/// snapshot is never overwritten by an earlier one.
pub struct PersistenceSync {
    store: Arc<dyn SnapshotStore>,
    tasks: Arc<TaskStore>,
    settings: Arc<SettingsStore>,
    history: Arc<HistoryLog>,
    profile_lock: Mutex<()>,
    history_lock: Mutex<()>,
}

impl PersistenceSync {
    /// Create a sync over the given stores.
    pub fn new(store: Arc<dyn SnapshotStore>, state: &LoadedState) -> Self {
        Self {
            store,
            tasks: Arc::clone(&state.tasks),
            settings: Arc::clone(&state.settings),
            history: Arc::clone(&state.history),
            profile_lock: Mutex::new(()),
            history_lock: Mutex::new(()),
        }
    }

    /// Flush tasks and settings. Failures are logged, not returned.
    pub fn save_profile(&self) {
        let _guard = lock(&self.profile_lock);
        let blob = ProfileBlob {
            tasks: self.tasks.snapshot(),
            settings: self.settings.snapshot(),
        };
        self.save_blob(PROFILE_BLOB, &blob);
    }

    /// Flush session history. Failures are logged, not returned.
    pub fn save_history(&self) {
        let _guard = lock(&self.history_lock);
        let blob = HistoryBlob {
            history: self.history.snapshot(),
        };
        self.save_blob(HISTORY_BLOB, &blob);
    }

    fn save_blob<T: Serialize>(&self, name: &str, blob: &T) {
        let result = serde_json::to_string(blob)
            .map_err(|e| FocusError::Persistence(format!("Failed to serialize {name}: {e}")))
            .and_then(|body| self.store.save(name, &body));

        match result {
            Ok(()) => debug!(blob = name, "state saved"),
            Err(e) => warn!(blob = name, error = %e, "failed to save state"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use super::*;
    use crate::storage::Database;
    use chrono::Utc;

    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        fn load(&self, _name: &str) -> Result<Option<String>, FocusError> {
            Err(FocusError::Database("disk on fire".into()))
        }

        fn save(&self, _name: &str, _body: &str) -> Result<(), FocusError> {
            Err(FocusError::Database("disk on fire".into()))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        blobs: Mutex<HashMap<String, String>>,
    }

    impl SnapshotStore for MemoryStore {
        fn load(&self, name: &str) -> Result<Option<String>, FocusError> {
            Ok(lock(&self.blobs).get(name).cloned())
        }

        fn save(&self, name: &str, body: &str) -> Result<(), FocusError> {
            lock(&self.blobs).insert(name.to_string(), body.to_string());
            Ok(())
        }
    }

    fn user() -> UserId {
        UserId::new("1001")
    }

    #[test]
    fn test_empty_store_loads_empty_state() {
        let db = Database::open_in_memory().unwrap();
        let state = load(&db, &FocusConfig::default());

        assert!(state.tasks.list(&user()).is_empty());
        assert_eq!(state.settings.get(&user()).work_minutes, 25);
        assert_eq!(state.history.total(&user()), 0);
    }

    #[test]
    fn test_saved_state_survives_reload() {
        let db: Arc<dyn SnapshotStore> = Arc::new(Database::open_in_memory().unwrap());
        let state = load(db.as_ref(), &FocusConfig::default());
        let sync = PersistenceSync::new(Arc::clone(&db), &state);

        state.tasks.add(&user(), "write report", None);
        state.settings.set(&user(), 50, 10, 30).unwrap();
        state.history.record(&user(), "write report", Utc::now());
        sync.save_profile();
        sync.save_history();

        let reloaded = load(db.as_ref(), &FocusConfig::default());
        assert_eq!(reloaded.tasks.list(&user())[0].text, "write report");
        assert_eq!(reloaded.settings.get(&user()).work_minutes, 50);
        assert_eq!(reloaded.history.records(&user())[0].task_text, "write report");
    }

    #[test]
    fn test_corrupt_blob_yields_empty_state() {
        let store = MemoryStore::default();
        store.save(PROFILE_BLOB, "{not json").unwrap();
        store
            .save(
                HISTORY_BLOB,
                r#"{"history":{"1001":[{"completed_at":"2024-01-01T00:00:00Z","task_text":"kept"}]}}"#,
            )
            .unwrap();

        let state = load(&store, &FocusConfig::default());

        assert!(state.tasks.list(&user()).is_empty());
        assert_eq!(state.history.total(&user()), 1);
    }

    #[test]
    fn test_unreadable_store_yields_empty_state() {
        let state = load(&BrokenStore, &FocusConfig::default());
        assert!(state.tasks.list(&user()).is_empty());
    }

    #[test]
    fn test_failed_save_keeps_memory_state() {
        let state = load(&MemoryStore::default(), &FocusConfig::default());
        let sync = PersistenceSync::new(Arc::new(BrokenStore), &state);

        state.tasks.add(&user(), "survives", None);
        sync.save_profile();

        assert_eq!(state.tasks.list(&user())[0].text, "survives");
    }

    /// Store whose first save parks until released.
    struct GatedStore {
        inner: MemoryStore,
        gated: Mutex<bool>,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl SnapshotStore for GatedStore {
        fn load(&self, name: &str) -> Result<Option<String>, FocusError> {
            self.inner.load(name)
        }

        fn save(&self, name: &str, body: &str) -> Result<(), FocusError> {
            let first = std::mem::replace(&mut *lock(&self.gated), false);
            if first {
                lock(&self.entered).send(()).unwrap();
                lock(&self.release).recv().unwrap();
            }
            self.inner.save(name, body)
        }
    }

    #[test]
    fn test_slow_save_does_not_lose_later_snapshot() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = Arc::new(GatedStore {
            inner: MemoryStore::default(),
            gated: Mutex::new(true),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        });
        let state = load(store.as_ref(), &FocusConfig::default());
        let sync = PersistenceSync::new(store.clone(), &state);
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");

        thread::scope(|s| {
            let first = s.spawn(|| {
                state.tasks.add(&alice, "alice task", None);
                sync.save_profile();
            });
            entered_rx.recv().unwrap();

            let second = s.spawn(|| {
                state.tasks.add(&bob, "bob task", None);
                sync.save_profile();
            });
            thread::sleep(Duration::from_millis(50));
            release_tx.send(()).unwrap();

            first.join().unwrap();
            second.join().unwrap();
        });

        let reloaded = load(store.as_ref(), &FocusConfig::default());
        assert_eq!(reloaded.tasks.list(&alice)[0].text, "alice task");
        assert_eq!(reloaded.tasks.list(&bob)[0].text, "bob task");
    }
}
