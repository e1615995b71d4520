//! Per-user keyed state.
//!
//! Each user gets an independent slot behind its own mutex. The outer map
//! lock is only held long enough to find or create a slot, so mutations for
//! different users never contend with each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use super::user::UserId;

/// Map from user to an independently locked value.
#[derive(Debug)]
pub struct PerUser<T> {
    slots: RwLock<HashMap<UserId, Arc<Mutex<T>>>>,
}

impl<T> Default for PerUser<T> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

/// Lock a slot, recovering the value if a previous holder panicked.
pub fn lock<T>(slot: &Mutex<T>) -> MutexGuard<'_, T> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Default> PerUser<T> {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from already-loaded values.
    #[must_use]
    pub fn from_map(values: HashMap<UserId, T>) -> Self {
        let slots = values
            .into_iter()
            .map(|(user, value)| (user, Arc::new(Mutex::new(value))))
            .collect();
        Self {
            slots: RwLock::new(slots),
        }
    }

    /// Get the slot for a user, creating an empty one on first use.
    pub fn slot(&self, user: &UserId) -> Arc<Mutex<T>> {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user)
        {
            return Arc::clone(slot);
        }

        let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(slots.entry(user.clone()).or_default())
    }

    /// Run a closure against the user's value while holding its lock.
    pub fn with<R>(&self, user: &UserId, f: impl FnOnce(&mut T) -> R) -> R {
        let slot = self.slot(user);
        let mut guard = lock(&slot);
        f(&mut guard)
    }

    /// Run a closure against the user's value without creating a slot.
    pub fn peek<R>(&self, user: &UserId, f: impl FnOnce(&T) -> R) -> Option<R> {
        let slot = {
            let slots = self.slots.read().unwrap_or_else(PoisonError::into_inner);
            slots.get(user).map(Arc::clone)
        }?;
        let guard = lock(&slot);
        Some(f(&guard))
    }
}

impl<T: Clone> PerUser<T> {
    /// Copy every user's value out, locking one slot at a time.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<UserId, T> {
        let slots: Vec<(UserId, Arc<Mutex<T>>)> = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(user, slot)| (user.clone(), Arc::clone(slot)))
            .collect();

        slots
            .into_iter()
            .map(|(user, slot)| {
                let value = lock(&slot).clone();
                (user, value)
            })
            .collect()
    }
}
