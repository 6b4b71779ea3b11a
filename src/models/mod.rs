use serde::{Deserialize, Serialize};

/// Raw record produced by an upstream resolver
///
/// Every field is optional: upstream data is scraped or extracted from a
/// third-party tool and routinely comes back partial.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCandidate {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Source/platform tag reported by the extractor (e.g. "Youtube")
    #[serde(default)]
    pub extractor_key: Option<String>,
}

impl RawCandidate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    pub fn with_extractor_key(mut self, key: impl Into<String>) -> Self {
        self.extractor_key = Some(key.into());
        self
    }
}

/// Canonical search result returned to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultItem {
    pub title: String,
    pub url: String,
    pub thumbnail: String,
}

/// Ordered, capped list of results for one query
pub type ResultSet = Vec<ResultItem>;

/// Response body for `GET /search`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: ResultSet,
}
