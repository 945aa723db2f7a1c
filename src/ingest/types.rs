// src/ingest/types.rs
use serde::{Deserialize, Serialize};

/// One entry as handed over by a feed source. Every field except the link may be
/// missing upstream, and even the link can arrive empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawItem {
    pub link: String,
    pub title: Option<String>,
    pub summary: Option<String>,
    /// Raw feed date string (RFC 2822 in RSS, RFC 3339 in Atom).
    pub published: Option<String>,
    pub updated: Option<String>,
}

impl RawItem {
    pub fn new(link: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn published(mut self, ts: impl Into<String>) -> Self {
        self.published = Some(ts.into());
        self
    }

    pub fn updated(mut self, ts: impl Into<String>) -> Self {
        self.updated = Some(ts.into());
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("http request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },
    #[error("parsing feed {feed}: {reason}")]
    Parse { feed: String, reason: String },
    #[error("feed source {0} unavailable")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Items in the order the feed lists them.
    async fn fetch_latest(&self) -> Result<Vec<RawItem>, FetchError>;
    /// Identifier stored as the article's `source_feed`.
    fn name(&self) -> &str;
}
