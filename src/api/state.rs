use std::sync::Arc;

use crate::{
    config::{CacheBackend, Config},
    db::{create_redis_client, CacheWriterHandle, MemoryCache, QueryCache, RedisCache},
    services::{create_resolver, SearchService, SearchSettings},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub search: Arc<SearchService>,
}

impl AppState {
    pub fn new(search: SearchService) -> Self {
        Self {
            search: Arc::new(search),
        }
    }

    /// Wires the resolver, cache and worker pool from configuration
    ///
    /// Returns the Redis writer handle when the redis backend is selected so
    /// the caller can flush pending writes on shutdown.
    pub fn from_config(config: &Config) -> anyhow::Result<(Self, Option<CacheWriterHandle>)> {
        let resolver = create_resolver(config)?;

        let mut writer = None;
        let cache: Arc<dyn QueryCache> = match config.cache_backend {
            CacheBackend::Memory => Arc::new(MemoryCache::new(config.max_cache_entries)),
            CacheBackend::Redis => {
                let client = create_redis_client(&config.redis_url)?;
                let (cache, handle) = RedisCache::new(client);
                writer = Some(handle);
                Arc::new(cache)
            }
        };

        tracing::info!(
            cache = cache.name(),
            workers = config.worker_pool_size,
            timeout_secs = config.resolve_timeout_secs,
            max_results = config.max_results,
            "Search service configured"
        );

        let search = SearchService::new(resolver, cache, SearchSettings::from(config));
        Ok((Self::new(search), writer))
    }
}
