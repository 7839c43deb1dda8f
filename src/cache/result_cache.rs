use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::graphdb::{QueryOptions, SparqlJsonResult};

/// Identity of a cached execution. The timeout does not change the answer,
/// so it is not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    repository: String,
    infer: bool,
    query: String,
}

impl CacheKey {
    fn new(query: &str, options: &QueryOptions) -> Self {
        Self {
            repository: options.repository.clone(),
            infer: options.infer,
            query: query.to_string(),
        }
    }
}

/// Thread-safe LRU cache of successful query results
///
/// Only successful executions are stored; failures always reach the caller
/// and the next identical request goes back to the endpoint.
pub struct ResultCache {
    cache: Mutex<LruCache<CacheKey, SparqlJsonResult>>,
}

impl ResultCache {
    /// Create a cache holding at most `capacity` results (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);

        Self {
            cache: Mutex::new(LruCache::new(cap)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<CacheKey, SparqlJsonResult>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached result for `query` under `options`, refreshing its recency.
    pub fn get(&self, query: &str, options: &QueryOptions) -> Option<SparqlJsonResult> {
        self.lock().get(&CacheKey::new(query, options)).cloned()
    }

    pub fn put(&self, query: &str, options: &QueryOptions, result: SparqlJsonResult) {
        self.lock().put(CacheKey::new(query, options), result);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphdb::{BindingRow, RdfTerm};

    fn result_with(value: &str) -> SparqlJsonResult {
        let row: BindingRow = [("x", RdfTerm::literal(value))].into_iter().collect();
        SparqlJsonResult::from_rows(&["x"], vec![row])
    }

    #[test]
    fn test_cache_put_and_get() {
        let cache = ResultCache::new(10);
        let options = QueryOptions::new("chemkg");

        cache.put("SELECT 1", &options, result_with("a"));

        let hit = cache.get("SELECT 1", &options).unwrap();
        assert_eq!(hit.rows()[0].value("x"), Some("a"));
    }

    #[test]
    fn test_cache_key_includes_repository_and_infer() {
        let cache = ResultCache::new(10);
        let options = QueryOptions::new("chemkg");
        cache.put("SELECT 1", &options, result_with("a"));

        assert!(cache.get("SELECT 1", &QueryOptions::new("other")).is_none());
        assert!(cache.get("SELECT 1", &options.clone().with_infer(false)).is_none());
        // timeout is not part of the key
        assert!(cache.get("SELECT 1", &options.clone().with_timeout_ms(1)).is_some());
    }

    #[test]
    fn test_cache_eviction_order() {
        let cache = ResultCache::new(2);
        let options = QueryOptions::new("chemkg");

        cache.put("q1", &options, result_with("1"));
        cache.put("q2", &options, result_with("2"));
        // touch q1 so q2 becomes least recently used
        let _ = cache.get("q1", &options);
        cache.put("q3", &options, result_with("3"));

        assert!(cache.get("q1", &options).is_some());
        assert!(cache.get("q2", &options).is_none());
        assert!(cache.get("q3", &options).is_some());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_zero_capacity_still_holds_one() {
        let cache = ResultCache::new(0);
        let options = QueryOptions::new("chemkg");
        assert!(cache.is_empty());

        cache.put("q1", &options, result_with("1"));
        cache.put("q2", &options, result_with("2"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("q2", &options).is_some());
    }
}
