//! In-memory cache with a single time-to-live applied at write time
//!
//! Entries are never swept in the background. An expired entry stays in the
//! map until the next `get` or `has` for its key notices the expiry and
//! removes it.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Default time-to-live for cache entries (one minute)
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// A stored value together with the instant it stops being valid
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expiry: Instant,
}

/// Key-value store whose entries expire a fixed duration after being written
///
/// Not synchronized; it is meant to be owned by a single controller on the UI
/// thread.
#[derive(Debug, Clone)]
pub struct SimpleCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    ttl: Duration,
}

impl<K, V> Default for SimpleCache<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl<K, V> SimpleCache<K, V>
where
    K: Eq + Hash,
{
    /// Creates an empty cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Returns the time-to-live applied to new entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Stores `value` under `key`, replacing any previous entry and resetting its expiry
    pub fn set(&mut self, key: K, value: V) {
        let entry = CacheEntry {
            value,
            expiry: Instant::now() + self.ttl,
        };
        self.entries.insert(key, entry);
    }

    /// Returns the value for `key` if it has not expired
    ///
    /// An expired entry is removed. Missing and expired keys both yield `None`.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let expired = Instant::now() > self.entries.get(key)?.expiry;
        if expired {
            self.entries.remove(key);
            return None;
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Returns true if `get` would return a value
    ///
    /// Like `get`, this removes the entry when it has expired.
    pub fn has(&mut self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Removes every entry regardless of expiry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries currently stored, including expired ones not yet accessed
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
