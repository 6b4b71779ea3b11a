use crate::models::{RawCandidate, ResultItem};

pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Extractor tag of the only platform whose entries are kept
pub const PRIMARY_EXTRACTOR: &str = "Youtube";

const SHORTS_MARKER: &str = "shorts";
const LIVE_MARKER: &str = "live";

pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

pub fn fallback_thumbnail(id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/mqdefault.jpg", id)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Maps raw upstream candidates onto the `{title, url, thumbnail}` shape
///
/// The shorts/live filter is off unless requested.
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    exclude_shorts_and_live: bool,
}

impl Normalizer {
    pub fn new(exclude_shorts_and_live: bool) -> Self {
        Self {
            exclude_shorts_and_live,
        }
    }

    /// Normalizes a single candidate, or returns `None` if it must be dropped
    ///
    /// Candidates are dropped when they have no identifier, when the extractor
    /// tagged them as belonging to another platform (channels, playlists), or,
    /// if enabled, when they look like a short or a live stream. The URL is
    /// always rebuilt from the identifier and never copied from upstream.
    pub fn normalize(&self, raw: RawCandidate) -> Option<ResultItem> {
        let id = non_empty(raw.id)?;

        if let Some(extractor) = raw.extractor_key.as_deref() {
            if extractor != PRIMARY_EXTRACTOR {
                return None;
            }
        }

        let title = non_empty(raw.title);
        let thumbnail = non_empty(raw.thumbnail);

        if self.exclude_shorts_and_live && Self::is_short_or_live(title.as_deref(), thumbnail.as_deref()) {
            return None;
        }

        Some(ResultItem {
            title: title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            url: watch_url(&id),
            thumbnail: thumbnail.unwrap_or_else(|| fallback_thumbnail(&id)),
        })
    }

    /// Normalizes candidates in upstream order, keeping at most `max` items
    pub fn normalize_all(&self, candidates: Vec<RawCandidate>, max: usize) -> Vec<ResultItem> {
        candidates
            .into_iter()
            .filter_map(|raw| self.normalize(raw))
            .take(max)
            .collect()
    }

    fn is_short_or_live(title: Option<&str>, thumbnail: Option<&str>) -> bool {
        let short = thumbnail.is_some_and(|t| t.to_lowercase().contains(SHORTS_MARKER));
        let live = title.is_some_and(|t| t.to_lowercase().contains(LIVE_MARKER));
        short || live
    }
}
