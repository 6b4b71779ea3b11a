use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{
    config::Config,
    db::{CacheKey, QueryCache},
    error::{AppError, AppResult},
    models::ResultSet,
    services::{executor::WorkerPool, normalizer::Normalizer, providers::UpstreamResolver},
};

/// Tunables for the search pipeline
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub resolve_timeout: Duration,
    pub cache_timeout: Duration,
    pub result_ttl: Duration,
    pub empty_result_ttl: Duration,
    pub max_results: usize,
    pub worker_pool_size: usize,
    pub exclude_shorts_and_live: bool,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SearchSettings {
    fn from(config: &Config) -> Self {
        Self {
            resolve_timeout: config.resolve_timeout(),
            cache_timeout: config.cache_timeout(),
            result_ttl: config.result_ttl(),
            empty_result_ttl: config.empty_result_ttl(),
            max_results: config.max_results,
            worker_pool_size: config.worker_pool_size,
            exclude_shorts_and_live: config.exclude_shorts_and_live(),
        }
    }
}

impl SearchSettings {
    /// Empty results expire sooner so a transient "no results" clears quickly
    fn ttl_for(&self, results: &ResultSet) -> Duration {
        if results.is_empty() {
            self.empty_result_ttl
        } else {
            self.result_ttl
        }
    }
}

/// Search pipeline: cache lookup, bounded resolve, normalize, cache store
///
/// Two concurrent requests for the same uncached query both reach the
/// resolver; there is no in-flight deduplication.
pub struct SearchService {
    cache: Arc<dyn QueryCache>,
    pool: WorkerPool,
    normalizer: Normalizer,
    settings: SearchSettings,
}

impl SearchService {
    pub fn new(
        resolver: Arc<dyn UpstreamResolver>,
        cache: Arc<dyn QueryCache>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            cache,
            pool: WorkerPool::new(resolver, settings.worker_pool_size),
            normalizer: Normalizer::new(settings.exclude_shorts_and_live),
            settings,
        }
    }

    pub async fn search(&self, query: &str) -> AppResult<ResultSet> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidInput("Missing 'query' parameter.".to_string()));
        }

        let key = CacheKey::from_query(query);

        match tokio::time::timeout(self.settings.cache_timeout, self.cache.get(&key)).await {
            Ok(Ok(Some(results))) => {
                tracing::info!(query = %query, results = results.len(), "Returning cached results");
                return Ok(results);
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    cache = self.cache.name(),
                    "Cache lookup failed, fetching fresh results"
                );
            }
            Err(_) => {
                tracing::warn!(
                    cache = self.cache.name(),
                    timeout_ms = self.settings.cache_timeout.as_millis() as u64,
                    "Cache lookup timed out, fetching fresh results"
                );
            }
        }

        let started = Instant::now();
        let candidates = self.pool.fetch(query, self.settings.resolve_timeout).await?;
        let candidate_count = candidates.len();

        let results = self
            .normalizer
            .normalize_all(candidates, self.settings.max_results);

        tracing::info!(
            query = %query,
            candidates = candidate_count,
            results = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search completed"
        );

        let ttl = self.settings.ttl_for(&results);
        match tokio::time::timeout(self.settings.cache_timeout, self.cache.put(&key, &results, ttl)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    error = %e,
                    cache = self.cache.name(),
                    "Failed to cache search results"
                );
            }
            Err(_) => {
                tracing::warn!(cache = self.cache.name(), "Caching search results timed out");
            }
        }

        Ok(results)
    }
}
