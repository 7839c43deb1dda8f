//! Query execution against the knowledge graph endpoint.
//!
//! [`SparqlExecutor`] is the seam to the external engine. [`Repository`] binds
//! an executor to one repository's options and an optional result cache, and is
//! what the services take.

pub mod client;
pub mod types;

pub use client::{GraphDbClient, QueryOptions, SparqlExecutor};
pub use types::{BindingRow, RdfTerm, ResultBindings, ResultHead, SparqlJsonResult};

use std::sync::Arc;

use crate::cache::ResultCache;
use crate::config::Config;
use crate::error::Result;

/// Handle to one repository on the endpoint.
#[derive(Clone)]
pub struct Repository {
    executor: Arc<dyn SparqlExecutor>,
    options: QueryOptions,
    cache: Option<Arc<ResultCache>>,
}

impl Repository {
    pub fn new(executor: Arc<dyn SparqlExecutor>, options: QueryOptions) -> Self {
        Self {
            executor,
            options,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// GraphDB client, options and cache as configured.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = GraphDbClient::new(&config.graphdb.base_url)?;
        let repository = Self::new(Arc::new(client), config.query_options());

        if config.cache.capacity > 0 {
            Ok(repository.with_cache(Arc::new(ResultCache::new(config.cache.capacity))))
        } else {
            Ok(repository)
        }
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    /// Run a SELECT, answering from the cache when an identical query succeeded before.
    pub async fn select(&self, query: &str) -> Result<SparqlJsonResult> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(query, &self.options) {
                log::debug!("Result cache hit ({} rows)", hit.rows().len());
                return Ok(hit);
            }
        }

        let result = self.executor.execute(query, &self.options).await?;

        if let Some(cache) = &self.cache {
            cache.put(query, &self.options, result.clone());
            log::debug!("Result cache holds {} entries", cache.len());
        }

        Ok(result)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::error::ChemkgError;

    #[tokio::test]
    async fn test_select_without_cache_always_executes() {
        let mock = MockExecutor::with_results(vec![rows(vec![row(&[("x", "1")])])]);
        let repo = repository(mock.clone());

        repo.select("SELECT 1").await.unwrap();
        repo.select("SELECT 1").await.unwrap();
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_select_uses_cache_for_identical_query() {
        let mock = MockExecutor::with_results(vec![rows(vec![row(&[("x", "1")])])]);
        let repo = repository(mock.clone()).with_cache(Arc::new(ResultCache::new(4)));

        let first = repo.select("SELECT 1").await.unwrap();
        let second = repo.select("SELECT 1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(mock.call_count(), 1);

        repo.select("SELECT 2").await.unwrap();
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let mock = MockExecutor::failing("GraphDB error 503: busy");
        let cache = Arc::new(ResultCache::new(4));
        let repo = repository(mock.clone()).with_cache(cache.clone());

        let err = repo.select("SELECT 1").await.unwrap_err();
        assert!(matches!(err, ChemkgError::EngineQueryFailed(ref m) if m.contains("503")));
        assert!(repo.select("SELECT 1").await.is_err());
        assert_eq!(mock.call_count(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_from_config_respects_cache_capacity() {
        let config = Config::from_toml(
            "[graphdb]\nbase_url = \"http://localhost:7200\"\n[cache]\ncapacity = 0\n",
        )
        .unwrap();
        let repo = Repository::from_config(&config).unwrap();
        assert!(repo.cache.is_none());
        assert_eq!(repo.options().repository, "chemkg");
        assert_eq!(repo.options().timeout_ms, 60_000);
    }
}
