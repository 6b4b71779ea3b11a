use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::cache::{CacheKey, Clock, QueryCache, SystemClock};
use crate::config::MAX_TTL_SECS;
use crate::error::AppResult;
use crate::models::ResultSet;

struct CacheEntry {
    value: ResultSet,
    expires_at: Instant,
}

#[derive(Default)]
struct Entries {
    map: HashMap<String, CacheEntry>,
    /// Keys in insertion order, oldest at the front
    order: VecDeque<String>,
}

impl Entries {
    fn remove(&mut self, key: &str) {
        if self.map.remove(key).is_some() {
            self.order.retain(|k| k != key);
        }
    }
}

/// In-process query cache with lazy expiry and insertion-order eviction
///
/// When a new key would push the cache past `capacity`, the oldest-inserted
/// entry is evicted regardless of how recently it was read.
pub struct MemoryCache {
    entries: Mutex<Entries>,
    capacity: usize,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            capacity: capacity.max(1),
            clock,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // Entries stay consistent even if a holder panicked mid-read.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lookup(&self, key: &CacheKey) -> Option<ResultSet> {
        let now = self.clock.now();
        let mut entries = self.lock();

        let fresh = entries
            .map
            .get(key.as_str())
            .map(|entry| (now < entry.expires_at).then(|| entry.value.clone()));

        match fresh {
            None => None,
            Some(Some(value)) => Some(value),
            Some(None) => {
                entries.remove(key.as_str());
                tracing::debug!(key = %key, "Evicted expired cache entry");
                None
            }
        }
    }

    /// Stores `value` under `key`; TTLs longer than a year are capped
    pub fn insert(&self, key: &CacheKey, value: ResultSet, ttl: Duration) {
        let expires_at = self.clock.now() + ttl.min(Duration::from_secs(MAX_TTL_SECS));
        let mut entries = self.lock();

        // Re-inserting a key moves it to the back of the eviction queue.
        entries.remove(key.as_str());

        while entries.map.len() >= self.capacity {
            match entries.order.pop_front() {
                Some(oldest) => {
                    entries.map.remove(&oldest);
                    tracing::debug!(evicted = %oldest, "Cache full, evicted oldest entry");
                }
                None => break,
            }
        }

        entries.map.insert(key.as_str().to_string(), CacheEntry { value, expires_at });
        entries.order.push_back(key.as_str().to_string());
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl QueryCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<ResultSet>> {
        Ok(self.lookup(key))
    }

    async fn put(&self, key: &CacheKey, value: &ResultSet, ttl: Duration) -> AppResult<()> {
        self.insert(key, value.clone(), ttl);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Manually advanced clock for expiry tests
#[cfg(test)]
pub(crate) struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        *self.offset.lock().unwrap() += by;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap()
    }
}
