//! Recency-tracked bounded map.

use std::collections::HashMap;
use std::hash::Hash;

/// Callback invoked with the batch of entries dropped by a prune.
pub type EvictionCallback<K, V> = Box<dyn Fn(&[(K, V)]) + Send + Sync>;

struct Slot<V> {
    value: V,
    touched: u64,
}

/// A bounded map with least-recently-used eviction.
///
/// Recency is a monotonic stamp refreshed on [`insert`](Self::insert)
/// and successful [`try_get`](Self::try_get); eviction drops the
/// lowest-stamped entries. `max_size == 0` disables pruning entirely.
///
/// This variant is unsynchronized. Wrap it in
/// [`SharedLruCache`](crate::SharedLruCache) for cross-thread use.
pub struct LruCache<K, V> {
    max_size: usize,
    elasticity: usize,
    slots: HashMap<K, Slot<V>>,
    clock: u64,
    on_evict: Option<EvictionCallback<K, V>>,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    /// Creates a cache bounded by `max_size` plus `elasticity` slack.
    pub fn new(max_size: usize, elasticity: usize) -> Self {
        Self {
            max_size,
            elasticity,
            slots: HashMap::new(),
            clock: 0,
            on_evict: None,
        }
    }

    /// Creates a cache that reports evicted entries to `callback`.
    pub fn with_eviction_callback(
        max_size: usize,
        elasticity: usize,
        callback: EvictionCallback<K, V>,
    ) -> Self {
        Self {
            on_evict: Some(callback),
            ..Self::new(max_size, elasticity)
        }
    }

    /// Inserts or overwrites `key`, making it the most recently used.
    ///
    /// An insert that pushes the size past `max_size + elasticity`
    /// prunes back to `max_size`.
    pub fn insert(&mut self, key: K, value: V) {
        let stamp = self.tick();
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.value = value;
            slot.touched = stamp;
            return;
        }

        self.slots.insert(key, Slot { value, touched: stamp });

        if self.max_size != 0 && self.slots.len() > self.max_allowed_size() {
            self.prune(self.max_size);
        }
    }

    /// Returns a copy of the value for `key`, refreshing its recency.
    pub fn try_get(&mut self, key: &K) -> Option<V> {
        let stamp = self.tick();
        let slot = self.slots.get_mut(key)?;
        slot.touched = stamp;
        Some(slot.value.clone())
    }

    /// Removes `key`, reporting whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        self.slots.remove(key).is_some()
    }

    /// Returns true if `key` is present. Does not refresh recency.
    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drops every entry, reporting them all as evicted.
    pub fn clear(&mut self) {
        self.prune(0);
    }

    /// The soft size limit.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The slack above the soft limit.
    pub fn elasticity(&self) -> usize {
        self.elasticity
    }

    /// The hard size limit.
    pub fn max_allowed_size(&self) -> usize {
        self.max_size + self.elasticity
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn prune(&mut self, keep: usize) {
        if self.slots.len() <= keep {
            return;
        }

        let mut order: Vec<(K, u64)> = self
            .slots
            .iter()
            .map(|(key, slot)| (key.clone(), slot.touched))
            .collect();
        order.sort_by_key(|&(_, touched)| touched);

        let surplus = self.slots.len() - keep;
        let mut dropped = Vec::with_capacity(surplus);
        for (key, _) in order.into_iter().take(surplus) {
            if let Some(slot) = self.slots.remove(&key) {
                dropped.push((key, slot.value));
            }
        }

        if let Some(callback) = &self.on_evict {
            callback(&dropped);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut cache = LruCache::new(8, 2);
        cache.insert("k", 1);
        assert_eq!(cache.try_get(&"k"), Some(1));
        assert_eq!(cache.try_get(&"missing"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_overwrite_keeps_one_entry() {
        let mut cache = LruCache::new(8, 2);
        cache.insert("k", 1);
        cache.insert("k", 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.try_get(&"k"), Some(2));
    }

    #[test]
    fn test_size_bound() {
        let mut cache = LruCache::new(4, 2);
        for i in 0..100 {
            cache.insert(i, i);
            assert!(cache.len() <= cache.max_allowed_size());
        }
        // The last insert crossed the hard limit and pruned back.
        assert!(cache.len() <= cache.max_size() + cache.elasticity());
    }

    #[test]
    fn test_prune_back_to_max_size() {
        let mut cache = LruCache::new(4, 2);
        for i in 0..7 {
            cache.insert(i, i);
        }
        // The 7th insert exceeded max_size + elasticity.
        assert_eq!(cache.len(), 4);
    }

    #[test]
    fn test_eviction_drops_least_recent() {
        let mut cache = LruCache::new(2, 1);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        // Touch "a" so "b" is now the oldest.
        assert!(cache.try_get(&"a").is_some());
        cache.insert("d", 4);

        assert!(cache.contains(&"a"));
        assert!(!cache.contains(&"b"));
        assert!(!cache.contains(&"c"));
        assert!(cache.contains(&"d"));
    }

    #[test]
    fn test_contains_does_not_refresh() {
        let mut cache = LruCache::new(2, 0);
        cache.insert("a", 1);
        cache.insert("b", 2);
        assert!(cache.contains(&"a"));
        cache.insert("c", 3);
        // "a" stayed oldest despite the contains call.
        assert!(!cache.contains(&"a"));
    }

    #[test]
    fn test_remove() {
        let mut cache = LruCache::new(4, 0);
        cache.insert("a", 1);
        assert!(cache.remove(&"a"));
        assert!(!cache.remove(&"a"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unbounded_mode() {
        let mut cache = LruCache::new(0, 0);
        for i in 0..1000 {
            cache.insert(i, i);
        }
        assert_eq!(cache.len(), 1000);
    }

    #[test]
    fn test_eviction_callback_receives_batch() {
        let evicted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evicted);
        let mut cache = LruCache::with_eviction_callback(
            2,
            1,
            Box::new(move |batch: &[(i32, i32)]| {
                counter.fetch_add(batch.len(), Ordering::SeqCst);
            }),
        );

        for i in 0..4 {
            cache.insert(i, i);
        }
        // Crossing 3 entries pruned down to 2.
        assert_eq!(evicted.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_reports_evictions() {
        let evicted = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evicted);
        let mut cache = LruCache::with_eviction_callback(
            8,
            2,
            Box::new(move |batch: &[(i32, i32)]| {
                counter.fetch_add(batch.len(), Ordering::SeqCst);
            }),
        );

        cache.insert(1, 1);
        cache.insert(2, 2);
        cache.clear();

        assert!(cache.is_empty());
        assert_eq!(evicted.load(Ordering::SeqCst), 2);
    }
}
