// src/ingest/mod.rs
pub mod fingerprint;
pub mod freshness;
pub mod providers;
pub mod scheduler;
pub mod types;

use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

use crate::ingest::fingerprint::fingerprint;
use crate::ingest::freshness::{is_fresh, resolve_timestamp_at};
use crate::ingest::types::{FeedSource, RawItem};
use crate::store::{Article, ArticleStore, StorageError};

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("ingest_new_total", "Articles written to the store.");
        describe_counter!(
            "ingest_duplicate_total",
            "Items skipped because their fingerprint was already stored."
        );
        describe_counter!(
            "ingest_stale_total",
            "Items rejected for being older than the freshness window."
        );
        describe_counter!(
            "ingest_storage_errors_total",
            "Items that failed to persist."
        );
        describe_counter!(
            "ingest_provider_errors_total",
            "Feed source fetch/parse errors."
        );
        describe_counter!("ingest_cycles_total", "Completed poll cycles.");
        describe_histogram!("ingest_parse_ms", "Feed parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when the last poll cycle finished."
        );
    });
}

/// What happened to a single raw item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    New,
    Duplicate,
    Stale,
    /// Item carried no usable link, so it has no identity.
    MissingLink,
}

/// Fingerprint, dedup, freshness, then idempotent write.
///
/// `now` is both the fallback timestamp and the reference for the window.
/// It is truncated to whole seconds first, like every resolved timestamp.
pub fn ingest_item(
    store: &ArticleStore,
    source_feed: &str,
    item: &RawItem,
    now: DateTime<Utc>,
    max_age: Duration,
) -> Result<ItemOutcome, StorageError> {
    let now = now.trunc_subsecs(0);
    let link = item.link.trim();
    if link.is_empty() {
        return Ok(ItemOutcome::MissingLink);
    }

    let id = fingerprint(link);
    if store.exists(&id)? {
        return Ok(ItemOutcome::Duplicate);
    }

    let published_at = resolve_timestamp_at(item, now);
    if !is_fresh(published_at, now, max_age) {
        return Ok(ItemOutcome::Stale);
    }

    let mut article = Article::from_raw(item, published_at, source_feed);
    article.link = link.to_string();
    article.fingerprint = id;

    // another source may have stored the same link since `exists`
    if store.insert_if_absent(&article)? {
        Ok(ItemOutcome::New)
    } else {
        Ok(ItemOutcome::Duplicate)
    }
}

/// Per-source tally for one cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceReport {
    pub source: String,
    pub new: usize,
    pub duplicates: usize,
    pub stale: usize,
    pub missing_link: usize,
    pub storage_errors: usize,
    pub fetch_failed: bool,
}

impl SourceReport {
    fn record(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::New => self.new += 1,
            ItemOutcome::Duplicate => self.duplicates += 1,
            ItemOutcome::Stale => self.stale += 1,
            ItemOutcome::MissingLink => self.missing_link += 1,
        }
    }
}

/// Fetch one source and ingest its items in feed order.
/// A fetch error or a failing item is logged and counted, never propagated.
pub async fn ingest_source(
    source: &dyn FeedSource,
    store: &Arc<ArticleStore>,
    max_age: Duration,
) -> SourceReport {
    ensure_metrics_described();

    let mut report = SourceReport {
        source: source.name().to_string(),
        ..SourceReport::default()
    };

    let items = match source.fetch_latest().await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(target: "ingest", error = %e, source = source.name(), "feed fetch failed");
            counter!("ingest_provider_errors_total").increment(1);
            report.fetch_failed = true;
            return report;
        }
    };

    // sqlite calls block (busy_timeout), keep them off the async workers
    let item_count = items.len();
    let store = Arc::clone(store);
    let batch = tokio::task::spawn_blocking(move || {
        ingest_batch(&store, report, &items, max_age)
    })
    .await;

    let report = match batch {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(target: "ingest", error = %e, source = source.name(), "ingest task aborted");
            SourceReport {
                source: source.name().to_string(),
                storage_errors: item_count,
                ..SourceReport::default()
            }
        }
    };

    counter!("ingest_new_total").increment(report.new as u64);
    counter!("ingest_duplicate_total").increment(report.duplicates as u64);
    counter!("ingest_stale_total").increment(report.stale as u64);
    counter!("ingest_storage_errors_total").increment(report.storage_errors as u64);

    report
}

fn ingest_batch(
    store: &ArticleStore,
    mut report: SourceReport,
    items: &[RawItem],
    max_age: Duration,
) -> SourceReport {
    for item in items {
        match ingest_item(store, &report.source, item, Utc::now(), max_age) {
            Ok(outcome) => {
                if outcome != ItemOutcome::New {
                    tracing::debug!(target: "ingest", ?outcome, link = %item.link, "item not stored");
                }
                report.record(outcome);
            }
            Err(e) => {
                tracing::warn!(
                    target: "ingest",
                    error = %e,
                    source = %report.source,
                    link = %item.link,
                    "storing item failed"
                );
                report.storage_errors += 1;
            }
        }
    }
    report
}
