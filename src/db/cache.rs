use std::fmt::Display;
use std::time::{Duration, Instant};

use crate::error::AppResult;
use crate::models::ResultSet;

/// Cache key derived from a user query
///
/// Queries are trimmed and lowercased so that "Lofi Beats " and "lofi beats"
/// share one entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn from_query(query: &str) -> Self {
        Self(query.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "search:{}", self.0)
    }
}

/// Storage for normalized search results
///
/// Errors returned from either method are non-fatal for the caller: the
/// search service logs them and carries on as if the cache missed.
#[async_trait::async_trait]
pub trait QueryCache: Send + Sync {
    /// Returns the cached result set, or `None` on a miss or expired entry
    async fn get(&self, key: &CacheKey) -> AppResult<Option<ResultSet>>;

    /// Stores a result set that expires after `ttl`
    async fn put(&self, key: &CacheKey, value: &ResultSet, ttl: Duration) -> AppResult<()>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Time source for cache expiry
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Clock backed by `Instant::now`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
