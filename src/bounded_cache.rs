//! [BoundedCache] puts a [BoundedLru] behind a single mutex so that it can be shared with read-ahead threads.
//!
//! Every operation takes the lock once, so entry count and byte total are always observed together.
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::*;

pub struct BoundedCache<K: Hash + Eq, V> {
    inner: Mutex<BoundedLru<K, V>>,
}

impl<K: Hash + Eq + Debug, V> BoundedCache<K, V> {
    pub fn new(max_entries: usize, max_bytes: u64) -> BoundedCache<K, V> {
        BoundedCache {
            inner: Mutex::new(BoundedLru::new(max_entries, max_bytes)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BoundedLru<K, V>> {
        self.inner.lock().unwrap()
    }

    /// Return a handle to the cached value, making it the most recently used entry.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let found = self.lock().get(key);
        log::trace!(
            "cache {} for {:?}",
            if found.is_some() { "hit" } else { "miss" },
            key
        );
        found
    }

    /// Insert or replace `key`, evicting least recently used entries until both limits hold again.
    ///
    /// Returns a handle to the value as stored.
    pub fn put(&self, key: K, value: V, size_bytes: u64) -> Arc<V> {
        let value = Arc::new(value);
        let mut guard = self.lock();
        log::trace!("cache insert {:?} ({} bytes)", key, size_bytes);
        guard.insert_arc(key, value.clone(), size_bytes);
        value
    }

    pub fn remove(&self, key: &K) -> Option<Arc<V>> {
        self.lock().remove(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.lock().contains_key(key)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<K: Hash + Eq + Debug + Clone, V> BoundedCache<K, V> {
    /// Snapshot of the keys in most-recently-used order.
    pub fn keys(&self) -> Vec<K> {
        self.lock().iter().map(|(k, _)| k.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn two_entry_cache_keeps_newest_pair() {
        let cache = BoundedCache::<&str, u32>::new(2, 200 * MB);
        cache.put("a", 1, MB);
        cache.put("b", 2, MB);
        cache.put("c", 3, MB);

        let mut keys = cache.keys();
        keys.sort_unstable();
        assert_eq!(keys, vec!["b", "c"]);
        assert_eq!(cache.stats().bytes_used, 2 * MB);
    }

    #[test]
    fn touching_first_key_saves_it() {
        let cache = BoundedCache::<u32, u32>::new(3, u64::MAX);
        for i in 0..3 {
            cache.put(i, i, 1);
        }
        assert_eq!(cache.get(&0).as_deref(), Some(&0));
        cache.put(3, 3, 1);

        assert!(cache.contains_key(&0));
        assert!(!cache.contains_key(&1));
    }

    #[test]
    fn oversized_value_evicts_everything_else() {
        let cache = BoundedCache::<u32, Vec<u8>>::new(10, 100);
        cache.put(1, vec![0; 50], 50);
        cache.put(2, vec![0; 40], 40);
        let big = cache.put(3, vec![0; 150], 150);

        assert_eq!(big.len(), 150);
        assert_eq!(cache.keys(), vec![3]);
        assert_eq!(
            cache.stats(),
            CacheStats {
                count: 1,
                max_entries: 10,
                bytes_used: 150,
                max_bytes: 100,
            }
        );
    }

    #[test]
    fn miss_has_no_side_effects() {
        let cache = BoundedCache::<u32, u32>::new(2, 10);
        cache.put(1, 1, 5);
        assert!(cache.get(&2).is_none());
        assert_eq!(cache.keys(), vec![1]);
        assert_eq!(cache.stats().bytes_used, 5);
    }

    #[test]
    fn clear_then_reuse() {
        let cache = BoundedCache::<u32, u32>::new(4, 100);
        cache.put(1, 1, 20);
        cache.put(2, 2, 20);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().bytes_used, 0);

        cache.put(3, 3, 20);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_puts_respect_limits() {
        let cache = BoundedCache::<u64, u64>::new(8, 1000);

        std::thread::scope(|s| {
            for t in 0..4u64 {
                let cache = &cache;
                s.spawn(move || {
                    for i in 0..500u64 {
                        let key = (t * 1000 + i) % 37;
                        cache.put(key, i, (i % 7) * 40);
                        let _ = cache.get(&((i + t) % 37));
                        let stats = cache.stats();
                        assert!(stats.count <= stats.max_entries);
                        assert!(stats.bytes_used <= stats.max_bytes);
                    }
                });
            }
        });

        let stats = cache.stats();
        assert!(stats.count <= 8);
        assert!(stats.bytes_used <= 1000);
    }

    proptest! {
        #[test]
        fn stats_never_exceed_limits(
            max_entries in 1..16usize,
            max_bytes in 1..1000u64,
            puts in prop::collection::vec((0..32u32, 0..400u64), 1..200)
        ) {
            let cache = BoundedCache::<u32, ()>::new(max_entries, max_bytes);
            for (key, size) in puts {
                cache.put(key, (), size);
                let stats = cache.stats();
                prop_assert!(stats.count <= max_entries);
                prop_assert!(stats.bytes_used <= max_bytes || cache.keys() == vec![key]);
            }
        }
    }
}
