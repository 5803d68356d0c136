//! The [DecodedImageCache] keeps decoded images keyed by path, going to an [ImageStore] on a miss.
//!
//! Concurrent misses for the same path are coalesced: the first caller decodes while the others wait on a per-path
//! guard and then find the result in the cache.  A failed decode is never cached.
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::*;

type GuardMap = HashMap<PathBuf, Arc<Mutex<()>>, ahash::RandomState>;

pub struct DecodedImageCache<S: ImageStore> {
    store: S,
    cache: BoundedCache<PathBuf, DecodedImage>,
    /// Mutexes that stop multiple threads decoding the same file.
    decoding_guards: Mutex<GuardMap>,
}

impl<S: ImageStore> DecodedImageCache<S> {
    pub fn new(store: S, max_entries: usize, max_bytes: u64) -> DecodedImageCache<S> {
        DecodedImageCache {
            store,
            cache: BoundedCache::new(max_entries, max_bytes),
            decoding_guards: Default::default(),
        }
    }

    pub fn from_config(store: S, config: &ViewerConfig) -> DecodedImageCache<S> {
        Self::new(store, config.max_decoded_entries, config.max_decoded_bytes)
    }

    /// Return the decoded image for `path`, decoding and caching it on a miss.
    pub fn load(&self, path: &Path) -> Result<Arc<DecodedImage>, DecodeError> {
        let key = path.to_path_buf();
        if let Some(x) = self.cache.get(&key) {
            log::debug!("decoded cache hit: {}", path.display());
            return Ok(x);
        }

        let mutex = {
            let mut guards = self.decoding_guards.lock().unwrap();
            guards
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let result = {
            let _guard: std::sync::MutexGuard<()> = mutex.lock().unwrap();
            self.load_postchecked(key.clone())
        };
        self.decoding_guards.lock().unwrap().remove(&key);
        result
    }

    /// Decode while holding the path's guard, checking once more in case another thread just finished.
    fn load_postchecked(&self, key: PathBuf) -> Result<Arc<DecodedImage>, DecodeError> {
        if let Some(x) = self.cache.get(&key) {
            return Ok(x);
        }

        log::debug!("decoded cache miss: {}", key.display());
        let decoded = self.store.decode(&key).map_err(|e| {
            log::warn!("{}", e);
            e
        })?;
        let size = decoded.estimated_bytes();
        Ok(self.cache.put(key, decoded, size))
    }

    /// Look up without decoding.
    pub fn get(&self, path: &Path) -> Option<Arc<DecodedImage>> {
        self.cache.get(&path.to_path_buf())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.cache.contains_key(&path.to_path_buf())
    }

    pub fn clear(&self) {
        self.cache.clear();
        log::debug!("decoded cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}
