//! Cache of parsed select specs (§4.E, §4.H).
//!
//! Equivalence classing (§4.H) means many jobs in a cycle share the exact
//! same `select` string; re-parsing it per job is wasted work once the
//! class is known. `SelectSpecCache` is shared (via `Arc`) across the
//! per-job placement calls a cycle makes, including ones issued from
//! parallel worker threads, hence the `parking_lot::Mutex` around the LRU.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

use crate::placement::select::{SelectError, SelectSpec};

const DEFAULT_CAPACITY: usize = 256;

pub struct SelectSpecCache {
    inner: Mutex<LruCache<String, SelectSpec>>,
}

impl SelectSpecCache {
    pub fn new() -> SelectSpecCache {
        SelectSpecCache::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> SelectSpecCache {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        SelectSpecCache { inner: Mutex::new(LruCache::new(cap)) }
    }

    /// Returns the cached parse of `select` if present, else parses,
    /// caches, and returns it. A malformed spec is never cached.
    pub fn get_or_parse(&self, select: &str) -> Result<SelectSpec, SelectError> {
        if let Some(hit) = self.inner.lock().get(select) {
            return Ok(hit.clone());
        }
        let parsed = SelectSpec::parse(select)?;
        self.inner.lock().put(select.to_string(), parsed.clone());
        Ok(parsed)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SelectSpecCache {
    fn default() -> Self {
        SelectSpecCache::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lookup_is_served_from_cache_without_reparsing() {
        let cache = SelectSpecCache::new();
        let a = cache.get_or_parse("2:ncpus=4").unwrap();
        let b = cache.get_or_parse("2:ncpus=4").unwrap();
        assert_eq!(a.chunks[0].count, b.chunks[0].count);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn malformed_spec_is_not_cached() {
        let cache = SelectSpecCache::new();
        assert!(cache.get_or_parse("").is_err());
        assert!(cache.is_empty());
    }
}
