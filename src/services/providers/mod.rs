//! Upstream video search providers
//!
//! Each provider turns a free-text query into raw candidate records. The
//! search pipeline only depends on the `UpstreamResolver` trait, so one
//! extraction backend can be swapped for another without touching caching,
//! normalization or concurrency limits.
use crate::{
    config::{Config, ResolverKind},
    models::RawCandidate,
};
use std::sync::Arc;

pub mod scrape;
pub mod ytdlp;

pub use scrape::ScrapeResolver;
pub use ytdlp::YtDlpResolver;

/// Trait for upstream search backends
///
/// Implementations may be slow and may fail for transient reasons (rate
/// limiting, network errors, markup changes). Errors carry the backend's
/// message for diagnostics; the caller decides what reaches the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UpstreamResolver: Send + Sync {
    /// Search the platform and return raw candidates in upstream order
    async fn resolve(&self, query: &str) -> anyhow::Result<Vec<RawCandidate>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Builds the resolver selected by configuration
pub fn create_resolver(config: &Config) -> anyhow::Result<Arc<dyn UpstreamResolver>> {
    let resolver: Arc<dyn UpstreamResolver> = match config.resolver {
        ResolverKind::Ytdlp => Arc::new(YtDlpResolver::new(
            config.yt_dlp_path.clone(),
            config.user_agent.clone(),
            config.max_results,
            config.upstream_timeout(),
        )),
        ResolverKind::Scrape => Arc::new(ScrapeResolver::new(
            &config.user_agent,
            config.upstream_timeout(),
        )?),
    };

    tracing::info!(provider = resolver.name(), "Upstream resolver configured");
    Ok(resolver)
}
