//! Process-wide name normalization backed by a bounded LRU cache.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

const DEFAULT_NAME_CACHE_SIZE: usize = 500;

pub type SharedNameCache = Arc<NameCache>;

/// Bounded cache mapping raw tag/attribute names to their canonical
/// lower-cased form. Safe to share across concurrent template executions.
pub struct NameCache {
    names: Mutex<LruCache<String, String>>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_NAME_CACHE_SIZE)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).expect("name cache capacity must be > 0");
        Self {
            names: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Normalize a raw name to its canonical lower-cased form.
    ///
    /// Same input always yields the same output; the cache only short-cuts
    /// the lower-casing work for names seen recently.
    pub fn normalize(&self, name: &str) -> String {
        let mut names = self.names.lock().unwrap();
        if let Some(normalized) = names.get(name) {
            return normalized.clone();
        }
        let normalized = name.to_lowercase();
        names.put(name.to_string(), normalized.clone());
        normalized
    }

    pub fn len(&self) -> usize {
        self.names.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NameCache {
    fn default() -> Self {
        Self::new()
    }
}
