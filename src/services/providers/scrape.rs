//! Search-results page scraper
//!
//! Fetches the rendered results page and pulls `videoRenderer` records out of
//! the embedded `ytInitialData` blob. This breaks whenever the page markup
//! changes, which is why it lives behind `UpstreamResolver`.
use crate::{models::RawCandidate, services::providers::UpstreamResolver};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client as HttpClient;
use std::time::Duration;

const RESULTS_URL: &str = "https://www.youtube.com/results";
const INITIAL_DATA_MARKER: &str = "var ytInitialData =";

static VIDEO_RENDERER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"\{"videoRenderer":\{"videoId":"([^"]+)","thumbnail":\{"thumbnails":\[\{"url":"([^"]+)".*?"title":\{"runs":\[\{"text":"((?:[^"\\]|\\.)*)""#,
    )
    .expect("Failed to compile videoRenderer regex")
});

#[derive(Clone)]
pub struct ScrapeResolver {
    http_client: HttpClient,
    results_url: String,
}

impl ScrapeResolver {
    pub fn new(user_agent: &str, timeout: Duration) -> anyhow::Result<Self> {
        Self::with_results_url(user_agent, RESULTS_URL, timeout)
    }

    pub fn with_results_url(
        user_agent: &str,
        results_url: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http_client = HttpClient::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http_client,
            results_url: results_url.to_string(),
        })
    }
}

/// Decodes the body of a JSON string literal captured from the page
fn unescape(text: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", text)).unwrap_or_else(|_| text.to_string())
}

/// Extracts candidates from a results page, in page order
///
/// A page without `ytInitialData` (consent wall, bot check, markup change)
/// is an error rather than an empty result.
fn parse_results_page(html: &str) -> anyhow::Result<Vec<RawCandidate>> {
    let Some(start) = html.find(INITIAL_DATA_MARKER) else {
        anyhow::bail!("Search page has no ytInitialData");
    };
    let data = &html[start + INITIAL_DATA_MARKER.len()..];
    let data = match data.find(";</script>") {
        Some(end) => &data[..end],
        None => data,
    };

    Ok(VIDEO_RENDERER_REGEX
        .captures_iter(data)
        .map(|caps| RawCandidate {
            id: caps.get(1).map(|m| m.as_str().to_string()),
            thumbnail: caps.get(2).map(|m| unescape(m.as_str())),
            title: caps.get(3).map(|m| unescape(m.as_str())),
            extractor_key: None,
        })
        .collect())
}

#[async_trait::async_trait]
impl UpstreamResolver for ScrapeResolver {
    async fn resolve(&self, query: &str) -> anyhow::Result<Vec<RawCandidate>> {
        let response = self
            .http_client
            .get(&self.results_url)
            .query(&[("search_query", query)])
            .send()
            .await
            .context("Search page request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Search page returned status {}", status);
        }

        let html = response.text().await.context("Failed to read search page")?;
        let candidates = parse_results_page(&html).inspect_err(|_| {
            tracing::warn!(query = %query, "Search page had no ytInitialData, markup may have changed");
        })?;

        tracing::debug!(
            query = %query,
            candidates = candidates.len(),
            provider = "scrape",
            "Search page scraped"
        );

        Ok(candidates)
    }

    fn name(&self) -> &'static str {
        "scrape"
    }
}
