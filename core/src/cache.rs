//! Explicit cache for expensive, read-only resources.
//!
//! Values are loaded at most once per key and handed out as `Arc`s.
//! Nothing mutates a cached value; a new configuration means a new key,
//! and `invalidate`/`clear` force a reload.

use std::{
    collections::HashMap,
    hash::Hash,
    sync::{Arc, Mutex},
};

use crate::error::PanelResult;

pub struct ResourceCache<K, V> {
    entries: Mutex<HashMap<K, Arc<V>>>,
}

impl<K, V> Default for ResourceCache<K, V> {
    fn default() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }
}

impl<K: Eq + Hash + Clone, V> ResourceCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<K, Arc<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached value for `key`, running `load` on a miss.
    /// A failed load caches nothing.
    pub fn get_or_load<F>(&self, key: &K, load: F) -> PanelResult<Arc<V>>
    where
        F: FnOnce() -> PanelResult<V>,
    {
        if let Some(v) = self.lock().get(key) {
            return Ok(Arc::clone(v));
        }
        let value = Arc::new(load()?);
        let mut entries = self.lock();
        let cached = entries.entry(key.clone()).or_insert(value);
        Ok(Arc::clone(cached))
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&self, key: &K) -> bool {
        self.lock().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
