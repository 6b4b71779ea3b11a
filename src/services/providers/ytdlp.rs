//! yt-dlp provider
//!
//! Runs `yt-dlp --flat-playlist -J ytsearchN:<query>` and reads the flat
//! playlist entries. Flat mode only returns metadata, nothing is downloaded.
use crate::{models::RawCandidate, services::providers::UpstreamResolver};
use anyhow::Context;
use serde::Deserialize;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct FlatPlaylist {
    #[serde(default)]
    entries: Option<Vec<FlatEntry>>,
}

#[derive(Debug, Deserialize)]
struct FlatEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    thumbnails: Vec<Thumbnail>,
    #[serde(default)]
    extractor_key: Option<String>,
    #[serde(default)]
    ie_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl From<FlatEntry> for RawCandidate {
    fn from(entry: FlatEntry) -> Self {
        // Flat entries usually list thumbnails smallest first.
        let thumbnail = entry
            .thumbnail
            .or_else(|| entry.thumbnails.into_iter().last().map(|t| t.url));

        RawCandidate {
            id: entry.id,
            title: entry.title,
            thumbnail,
            extractor_key: entry.extractor_key.or(entry.ie_key),
        }
    }
}

#[derive(Debug, Clone)]
pub struct YtDlpResolver {
    binary: String,
    user_agent: String,
    max_entries: usize,
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(binary: String, user_agent: String, max_entries: usize, timeout: Duration) -> Self {
        Self {
            binary,
            user_agent,
            max_entries,
            timeout,
        }
    }

    fn search_term(&self, query: &str) -> String {
        format!("ytsearch{}:{}", self.max_entries, query)
    }
}

/// Parses yt-dlp's `-J` output into raw candidates
fn parse_flat_playlist(stdout: &[u8]) -> anyhow::Result<Vec<RawCandidate>> {
    let playlist: FlatPlaylist =
        serde_json::from_slice(stdout).context("Failed to parse yt-dlp output")?;

    Ok(playlist
        .entries
        .unwrap_or_default()
        .into_iter()
        .map(RawCandidate::from)
        .collect())
}

#[async_trait::async_trait]
impl UpstreamResolver for YtDlpResolver {
    async fn resolve(&self, query: &str) -> anyhow::Result<Vec<RawCandidate>> {
        let mut command = Command::new(&self.binary);
        command
            .args(["--flat-playlist", "-J", "--no-warnings", "--user-agent"])
            .arg(&self.user_agent)
            .arg(self.search_term(query))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // The child is killed when the output future is dropped on expiry.
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| anyhow::anyhow!("yt-dlp timed out after {:?}", self.timeout))?
            .with_context(|| format!("Failed to run {}", self.binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp exited with {}: {}", output.status, stderr.trim());
        }

        let candidates = parse_flat_playlist(&output.stdout)?;

        tracing::debug!(
            query = %query,
            candidates = candidates.len(),
            provider = "ytdlp",
            "yt-dlp search completed"
        );

        Ok(candidates)
    }

    fn name(&self) -> &'static str {
        "ytdlp"
    }
}
