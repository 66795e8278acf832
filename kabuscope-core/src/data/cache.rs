//! In-memory memo for remote assemblies.
//!
//! Keyed on the ordered ticker list and the fetch window. Owned by the session
//! that injects it; nothing is written to disk and entries live until
//! invalidated or the cache is dropped.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::remote::{FetchKey, PartialDataset};

/// Hit/miss counters since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub struct FetchCache {
    entries: HashMap<FetchKey, Arc<PartialDataset>>,
    stats: CacheStats,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a stored assembly, counting the hit or miss.
    pub fn get(&mut self, key: &FetchKey) -> Option<Arc<PartialDataset>> {
        match self.entries.get(key) {
            Some(found) => {
                self.stats.hits += 1;
                debug!(key = %key.digest(), "fetch cache hit");
                Some(Arc::clone(found))
            }
            None => {
                self.stats.misses += 1;
                debug!(key = %key.digest(), "fetch cache miss");
                None
            }
        }
    }

    /// Store an assembly, replacing any previous entry for the key.
    pub fn insert(&mut self, key: FetchKey, partial: PartialDataset) -> Arc<PartialDataset> {
        let stored = Arc::new(partial);
        self.entries.insert(key, Arc::clone(&stored));
        stored
    }

    /// Return the stored assembly or build, store, and return a new one.
    ///
    /// Nothing is stored when `build` fails.
    pub fn get_or_try_insert_with<E>(
        &mut self,
        key: &FetchKey,
        build: impl FnOnce() -> Result<PartialDataset, E>,
    ) -> Result<Arc<PartialDataset>, E> {
        if let Some(found) = self.get(key) {
            return Ok(found);
        }
        let partial = build()?;
        Ok(self.insert(key.clone(), partial))
    }

    pub fn contains(&self, key: &FetchKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Drop one entry. Returns whether it was present.
    pub fn invalidate(&mut self, key: &FetchKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
