//! Mutex-guarded cache variant.

use std::hash::Hash;

use parking_lot::Mutex;

use crate::lru::{EvictionCallback, LruCache};

/// Thread-safe wrapper around [`LruCache`].
///
/// Every operation holds the internal lock for its full duration. A
/// successful lookup refreshes recency, so readers contend like writers.
pub struct SharedLruCache<K, V> {
    inner: Mutex<LruCache<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> SharedLruCache<K, V> {
    /// Creates a cache bounded by `max_size` plus `elasticity` slack.
    pub fn new(max_size: usize, elasticity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCache::new(max_size, elasticity)),
        }
    }

    /// Creates a cache that reports evicted entries to `callback`.
    pub fn with_eviction_callback(
        max_size: usize,
        elasticity: usize,
        callback: EvictionCallback<K, V>,
    ) -> Self {
        Self {
            inner: Mutex::new(LruCache::with_eviction_callback(
                max_size, elasticity, callback,
            )),
        }
    }

    /// Inserts or overwrites `key`, making it the most recently used.
    pub fn insert(&self, key: K, value: V) {
        self.inner.lock().insert(key, value)
    }

    /// Returns a copy of the value for `key`, refreshing its recency.
    pub fn try_get(&self, key: &K) -> Option<V> {
        self.inner.lock().try_get(key)
    }

    /// Removes `key`, reporting whether it was present.
    pub fn remove(&self, key: &K) -> bool {
        self.inner.lock().remove(key)
    }

    /// Returns true if `key` is present. Does not refresh recency.
    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Drops every entry, reporting them all as evicted.
    pub fn clear(&self) {
        self.inner.lock().clear()
    }
}
