use serde::Deserialize;
use std::time::Duration;

/// Longest TTL accepted for cached result sets (one year)
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Which upstream resolver backs the search pipeline
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    /// Shells out to the `yt-dlp` binary in flat-playlist mode
    Ytdlp,
    /// Scrapes the rendered search results page
    Scrape,
}

/// Where search results are cached
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Redis,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_resolver")]
    pub resolver: ResolverKind,

    /// Path to the yt-dlp executable
    #[serde(default = "default_yt_dlp_path")]
    pub yt_dlp_path: String,

    /// User-Agent sent to the video platform
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Number of workers allowed to call the upstream resolver at once
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,

    #[serde(default = "default_resolve_timeout_secs")]
    pub resolve_timeout_secs: u64,

    /// Deadline a resolver applies to its own subprocess or HTTP call
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Deadline for a single cache read or write
    #[serde(default = "default_cache_timeout_ms")]
    pub cache_timeout_ms: u64,

    /// TTL for non-empty result sets
    #[serde(default = "default_result_ttl_secs")]
    pub result_ttl_secs: u64,

    /// TTL for empty result sets
    #[serde(default = "default_empty_result_ttl_secs")]
    pub empty_result_ttl_secs: u64,

    #[serde(default = "default_max_cache_entries")]
    pub max_cache_entries: usize,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Unset means on for the scrape resolver and off for yt-dlp
    #[serde(default)]
    pub exclude_shorts_and_live: Option<bool>,

    #[serde(default = "default_cache_backend")]
    pub cache_backend: CacheBackend,

    /// Redis connection URL, only used by the redis cache backend
    #[serde(default = "default_redis_url")]
    pub redis_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_resolver() -> ResolverKind {
    ResolverKind::Ytdlp
}

fn default_yt_dlp_path() -> String {
    "yt-dlp".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_worker_pool_size() -> usize {
    2
}

fn default_resolve_timeout_secs() -> u64 {
    20
}

fn default_upstream_timeout_secs() -> u64 {
    15
}

fn default_cache_timeout_ms() -> u64 {
    500
}

fn default_result_ttl_secs() -> u64 {
    3600 // 1 hour
}

fn default_empty_result_ttl_secs() -> u64 {
    600 // 10 minutes
}

fn default_max_cache_entries() -> usize {
    100
}

fn default_max_results() -> usize {
    15
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Memory
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            resolver: default_resolver(),
            yt_dlp_path: default_yt_dlp_path(),
            user_agent: default_user_agent(),
            worker_pool_size: default_worker_pool_size(),
            resolve_timeout_secs: default_resolve_timeout_secs(),
            upstream_timeout_secs: default_upstream_timeout_secs(),
            cache_timeout_ms: default_cache_timeout_ms(),
            result_ttl_secs: default_result_ttl_secs(),
            empty_result_ttl_secs: default_empty_result_ttl_secs(),
            max_cache_entries: default_max_cache_entries(),
            max_results: default_max_results(),
            exclude_shorts_and_live: None,
            cache_backend: default_cache_backend(),
            redis_url: default_redis_url(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects tunables that would make the pipeline unusable
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.worker_pool_size == 0 {
            anyhow::bail!("WORKER_POOL_SIZE must be at least 1");
        }
        if self.max_results == 0 {
            anyhow::bail!("MAX_RESULTS must be at least 1");
        }
        if self.max_cache_entries == 0 {
            anyhow::bail!("MAX_CACHE_ENTRIES must be at least 1");
        }
        if self.resolve_timeout_secs == 0 {
            anyhow::bail!("RESOLVE_TIMEOUT_SECS must be at least 1");
        }
        if self.upstream_timeout_secs == 0 {
            anyhow::bail!("UPSTREAM_TIMEOUT_SECS must be at least 1");
        }
        if self.cache_timeout_ms == 0 {
            anyhow::bail!("CACHE_TIMEOUT_MS must be at least 1");
        }
        if self.result_ttl_secs > MAX_TTL_SECS || self.empty_result_ttl_secs > MAX_TTL_SECS {
            anyhow::bail!("Result TTLs must not exceed {} seconds", MAX_TTL_SECS);
        }
        Ok(())
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    /// Whether the shorts/live markers drop candidates
    ///
    /// Defaults on for the scrape resolver only.
    pub fn exclude_shorts_and_live(&self) -> bool {
        self.exclude_shorts_and_live
            .unwrap_or(self.resolver == ResolverKind::Scrape)
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }

    pub fn empty_result_ttl(&self) -> Duration {
        Duration::from_secs(self.empty_result_ttl_secs)
    }
}
