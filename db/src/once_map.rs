//! A create-or-join map for process-lifetime caches.
//!
//! Each key owns a slot in a sharded [`DashMap`]. Reading an initialized
//! slot takes only a shard read lock. A miss takes the slot's init lock, so
//! concurrent misses for the same key run the initializer once and every
//! caller gets the same `Arc`. The initializer runs outside the shard lock.
//! A failed initializer leaves the slot empty; the next caller retries.
//! Entries are never evicted.

use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use dashmap::DashMap;

struct Slot<V> {
    value: OnceLock<Arc<V>>,
    init: Mutex<()>,
}

impl<V> Default for Slot<V> {
    fn default() -> Self {
        Self {
            value: OnceLock::new(),
            init: Mutex::new(()),
        }
    }
}

pub(crate) struct OnceMap<K, V> {
    slots: DashMap<K, Arc<Slot<V>>>,
}

impl<K: Eq + Hash, V> Default for OnceMap<K, V> {
    fn default() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> OnceMap<K, V> {
    /// Returns the initialized value for `key`, if any.
    pub(crate) fn get(&self, key: &K) -> Option<Arc<V>> {
        self.slots
            .get(key)
            .and_then(|slot| slot.value.get().cloned())
    }

    /// Returns the value for `key`, running `init` if no caller has
    /// initialized it yet.
    pub(crate) fn get_or_try_init<E>(
        &self,
        key: K,
        init: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        // Clone the slot out so the shard guard is released before `init`.
        let slot = Arc::clone(self.slots.entry(key).or_default().value());
        if let Some(value) = slot.value.get() {
            return Ok(Arc::clone(value));
        }

        let _guard = slot.init.lock().unwrap_or_else(PoisonError::into_inner);
        // Another caller may have finished while we waited for the lock.
        if let Some(value) = slot.value.get() {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(init()?);
        Ok(Arc::clone(slot.value.get_or_init(|| value)))
    }

    /// Number of initialized entries.
    pub(crate) fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|entry| entry.value().value.get().is_some())
            .count()
    }
}

impl<K: Eq + Hash, V> fmt::Debug for OnceMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnceMap")
            .field("slots", &self.slots.len())
            .finish()
    }
}
