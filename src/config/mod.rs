// src/config/mod.rs
//! Application configuration: feeds, thresholds, topic aliases, paths.
//!
//! Lookup order for `load_default`:
//! 1) $TICKER_FEED_CONFIG (must exist)
//! 2) config/ticker_feed.toml
//! 3) built-in defaults (CNN feeds + the topic list in config/topics.toml)

pub mod classifier;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::analyze::bucket::Topic;
use crate::config::classifier::ClassifierConfig;
use crate::ingest::scheduler::PollSchedulerCfg;

pub const ENV_CONFIG_PATH: &str = "TICKER_FEED_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/ticker_feed.toml";
/// Upper bound for `max_age_hours` and `lookback_hours` (100 years).
pub const MAX_WINDOW_HOURS: u64 = 24 * 365 * 100;

const DEFAULT_FEEDS: &[&str] = &[
    "http://rss.cnn.com/rss/cnn_topstories.rss",
    "http://rss.cnn.com/rss/cnn_world.rss",
    "http://rss.cnn.com/rss/cnn_us.rss",
    "http://rss.cnn.com/rss/cnn_allpolitics.rss",
    "http://rss.cnn.com/rss/cnn_tech.rss",
    "http://rss.cnn.com/rss/cnn_health.rss",
    "http://rss.cnn.com/rss/cnn_showbiz.rss",
];

#[derive(Deserialize)]
struct TopicsFile {
    topics: Vec<Topic>,
}

static DEFAULT_TOPICS: Lazy<Vec<Topic>> = Lazy::new(|| {
    let raw = include_str!("../../config/topics.toml");
    toml::from_str::<TopicsFile>(raw)
        .expect("valid built-in topics")
        .topics
});

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("TICKER_FEED_CONFIG points to non-existent path {0}")]
    MissingPath(PathBuf),
    #[error("missing {0} env var")]
    MissingEnv(&'static str),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Stored as `source_feed`; defaults to the URL.
    #[serde(default)]
    pub name: String,
    pub url: String,
}

impl FeedConfig {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.url
        } else {
            &self.name
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/articles.db")
}
fn default_snapshot_dir() -> PathBuf {
    PathBuf::from("predictions")
}
fn default_poll_interval_secs() -> u64 {
    60
}
fn default_max_age_hours() -> u64 {
    24
}
fn default_lookback_hours() -> u64 {
    24
}
fn default_max_articles_per_topic() -> usize {
    8
}
fn default_request_timeout_secs() -> u64 {
    20
}
fn default_feeds() -> Vec<FeedConfig> {
    DEFAULT_FEEDS
        .iter()
        .map(|url| FeedConfig {
            name: String::new(),
            url: url.to_string(),
        })
        .collect()
}
fn default_topics() -> Vec<Topic> {
    DEFAULT_TOPICS.clone()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default = "default_snapshot_dir")]
    pub snapshot_dir: PathBuf,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Freshness window for ingestion.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
    /// How far back the classification pass reads.
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u64,
    #[serde(default = "default_max_articles_per_topic")]
    pub max_articles_per_topic: usize,
    /// Per-request timeout for feed fetches.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_feeds")]
    pub feeds: Vec<FeedConfig>,
    #[serde(default = "default_topics")]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            snapshot_dir: default_snapshot_dir(),
            poll_interval_secs: default_poll_interval_secs(),
            max_age_hours: default_max_age_hours(),
            lookback_hours: default_lookback_hours(),
            max_articles_per_topic: default_max_articles_per_topic(),
            request_timeout_secs: default_request_timeout_secs(),
            feeds: default_feeds(),
            topics: default_topics(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str, origin: &Path) -> Result<Self, ConfigError> {
        let mut cfg: AppConfig = toml::from_str(s).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        cfg.classifier.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(ConfigError::MissingPath(pb));
            }
            return Self::load_from(&pb);
        }
        let local = PathBuf::from(DEFAULT_CONFIG_PATH);
        if local.exists() {
            return Self::load_from(&local);
        }
        Ok(Self::default())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(f) = self.feeds.iter().find(|f| f.url.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "feed {:?} has an empty url",
                f.name
            )));
        }
        for (key, hours) in [
            ("max_age_hours", self.max_age_hours),
            ("lookback_hours", self.lookback_hours),
        ] {
            if hours > MAX_WINDOW_HOURS {
                return Err(ConfigError::Invalid(format!(
                    "{key} = {hours} exceeds {MAX_WINDOW_HOURS}"
                )));
            }
        }
        if self.topics.iter().any(|t| t.symbol.trim().is_empty()) {
            return Err(ConfigError::Invalid("topic with empty symbol".into()));
        }
        Ok(())
    }

    pub fn scheduler_cfg(&self) -> PollSchedulerCfg {
        PollSchedulerCfg {
            cycle_interval: Duration::from_secs(self.poll_interval_secs),
            max_age: window(self.max_age_hours),
        }
    }

    pub fn lookback(&self) -> chrono::Duration {
        window(self.lookback_hours)
    }
}

// saturates instead of panicking for configs built without `validate`
fn window(hours: u64) -> chrono::Duration {
    i64::try_from(hours)
        .ok()
        .and_then(chrono::Duration::try_hours)
        .unwrap_or(chrono::Duration::MAX)
}
