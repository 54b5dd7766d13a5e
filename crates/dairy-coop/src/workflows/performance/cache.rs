use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::clock::Clock;

struct CachedValue<V> {
    value: V,
    stored_at: DateTime<Utc>,
}

/// Keyed cache whose entries expire a fixed time after they were stored.
///
/// Expiry is measured with the injected [`Clock`]; an entry stored at `t` is served
/// while `now - t <= ttl`.
pub struct TtlCache<K, V> {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<K, CachedValue<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the live entry for `key` or run `fetch` and store its result.
    ///
    /// Errors from `fetch` are returned unchanged and nothing is cached.
    pub fn get_or_try_insert_with<E, F>(&self, key: &K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.get(key) {
            debug!(?key, "cache hit");
            return Ok(value);
        }

        debug!(?key, "cache miss");
        let value = fetch()?;
        self.insert(key.clone(), value.clone());
        Ok(value)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let expired = match entries.get(key) {
            Some(entry) if self.is_fresh(entry, now) => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: K, value: V) {
        let stored_at = self.clock.now();
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .insert(key, CachedValue { value, stored_at });
    }

    pub fn invalidate(&self, key: &K) -> bool {
        self.entries
            .lock()
            .expect("cache mutex poisoned")
            .remove(key)
            .is_some()
    }

    fn is_fresh(&self, entry: &CachedValue<V>, now: DateTime<Utc>) -> bool {
        let age = now - entry.stored_at;
        match age.to_std() {
            Ok(age) => age <= self.ttl,
            // Stored "in the future" after a clock rewind; treat as fresh.
            Err(_) => true,
        }
    }
}
