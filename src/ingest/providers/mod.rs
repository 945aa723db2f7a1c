// src/ingest/providers/mod.rs
pub mod rss;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::ingest::types::FeedSource;

pub use rss::RssFeed;

/// One HTTP feed source per configured feed, sharing a single client.
pub fn sources_from_config(cfg: &AppConfig) -> Result<Vec<Arc<dyn FeedSource>>, reqwest::Error> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("ticker-feed/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .timeout(Duration::from_secs(cfg.request_timeout_secs))
        .build()?;

    Ok(cfg
        .feeds
        .iter()
        .map(|f| {
            Arc::new(RssFeed::from_url(f.display_name(), f.url.as_str(), client.clone()))
                as Arc<dyn FeedSource>
        })
        .collect())
}
