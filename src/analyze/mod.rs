// src/analyze/mod.rs
//! Classification pass: windowed store read, topic bucketing, one classifier
//! call, per-topic verdicts, dated snapshot.

pub mod bucket;
pub mod classifier;
pub mod prompt;
pub mod snapshot;
pub mod verdict;

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::store::{ArticleStore, StorageError};

// Re-export convenient types.
pub use crate::analyze::bucket::{bucketize, Topic, TopicBucket};
pub use crate::analyze::classifier::{Classifier, DynClassifier};
pub use crate::analyze::verdict::{Direction, TopicVerdict, Verdict};

/// Outcome of one classification run.
#[derive(Debug, Clone)]
pub struct ClassificationRun {
    pub started_at: DateTime<Utc>,
    pub articles_read: usize,
    pub topics_with_articles: usize,
    /// Parsed reply mapping; `None` when the classifier failed or answered garbage.
    pub reply: Option<Value>,
    pub verdicts: Vec<(String, TopicVerdict)>,
    pub snapshot: Option<PathBuf>,
}

/// Run the pass against articles published in `[now - lookback, ..)`.
///
/// Only the store read can fail the run. Classifier failures become
/// `Unavailable` verdicts, and a snapshot is written only for a usable reply.
pub async fn run_classification(
    store: &ArticleStore,
    cfg: &AppConfig,
    classifier: &dyn Classifier,
    now: DateTime<Utc>,
) -> Result<ClassificationRun, StorageError> {
    let since = now
        .checked_sub_signed(cfg.lookback())
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    let articles = store.query_since(since)?;
    let buckets = bucketize(&articles, &cfg.topics, cfg.max_articles_per_topic);
    let topics_with_articles = buckets.iter().filter(|b| !b.is_empty()).count();

    let user_msg = prompt::build_user_message(&buckets);
    let reply = match classifier.classify(prompt::SYSTEM_PROMPT, &user_msg).await {
        Ok(body) => {
            let parsed = verdict::parse_reply(&body);
            if parsed.is_none() {
                warn!(target: "classify", provider = classifier.provider_name(), "reply is not a JSON object");
            }
            parsed
        }
        Err(e) => {
            warn!(target: "classify", provider = classifier.provider_name(), error = %e, "classifier call failed");
            None
        }
    };

    let verdicts = verdict::verdicts_for(reply.as_ref(), &cfg.topics);

    let snapshot = match &reply {
        Some(v) => match snapshot::write_snapshot(&cfg.snapshot_dir, now, v) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(target: "classify", error = %e, dir = %cfg.snapshot_dir.display(), "writing snapshot failed");
                None
            }
        },
        None => None,
    };

    info!(
        target: "classify",
        articles = articles.len(),
        topics = cfg.topics.len(),
        topics_with_articles,
        available = verdicts.iter().filter(|(_, v)| v.is_available()).count(),
        snapshot = ?snapshot,
        "classification run finished"
    );

    Ok(ClassificationRun {
        started_at: now,
        articles_read: articles.len(),
        topics_with_articles,
        reply,
        verdicts,
        snapshot,
    })
}
