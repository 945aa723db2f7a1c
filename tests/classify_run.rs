// tests/classify_run.rs
use std::path::Path;

use chrono::{Duration, TimeZone, Utc};
use serde_json::json;
use ticker_feed::analyze::bucket::Topic;
use ticker_feed::analyze::classifier::{DisabledClassifier, MockClassifier};
use ticker_feed::analyze::{Direction, TopicVerdict};
use ticker_feed::{run_classification, AppConfig, Article, ArticleStore, RawItem};

fn config(snapshot_dir: &Path) -> AppConfig {
    AppConfig {
        snapshot_dir: snapshot_dir.to_path_buf(),
        topics: vec![
            Topic::new("NVDA", &["NVIDIA", "Nvidia"]),
            Topic::new("TSLA", &["Tesla"]),
        ],
        ..AppConfig::default()
    }
}

fn seeded_store(now: chrono::DateTime<Utc>) -> ArticleStore {
    let store = ArticleStore::open_in_memory().unwrap();
    let rows = [
        ("https://x/nv", "Nvidia ships Blackwell", 2),
        ("https://x/old", "Nvidia last year", 48),
    ];
    for (link, title, age_h) in rows {
        let a = Article::from_raw(
            &RawItem::new(link).title(title).summary("<b>chips</b>"),
            now - Duration::hours(age_h),
            "cnn",
        );
        store.insert_if_absent(&a).unwrap();
    }
    store
}

#[tokio::test]
async fn verdicts_and_snapshot_from_a_valid_reply() {
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let store = seeded_store(now);

    let reply = json!({
        "NVDA": {"direction": "up", "confidence": 0.72, "reason": "new product cycle"},
        "TSLA": {"direction": "neutral", "confidence": 0.1, "reason": "no news"}
    });
    let mock = MockClassifier::new(reply.to_string());

    let run = run_classification(&store, &cfg, &mock, now).await.unwrap();
    assert_eq!(run.articles_read, 1);
    assert_eq!(run.topics_with_articles, 1);

    match &run.verdicts[0] {
        (sym, TopicVerdict::Available(v)) => {
            assert_eq!(sym, "NVDA");
            assert_eq!(v.direction, Direction::Up);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(run.verdicts[1].1.is_available());

    // one call, both topics present, the empty one flagged explicitly
    let seen = mock.seen_messages();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].contains("Ticker: NVDA\n\nNews:\n[2025-01-02 10:00] Nvidia ships Blackwell - chips"));
    assert!(seen[0].contains("Ticker: TSLA\n\nNews:\n(no relevant articles)"));
    assert!(!seen[0].contains("last year"));

    let path = run.snapshot.expect("snapshot written");
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "pred_20250102_120000.json"
    );
    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(on_disk, reply);
}

#[tokio::test]
async fn malformed_reply_means_no_verdicts_and_no_snapshot() {
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(&dir.path().join("preds"));
    let store = seeded_store(now);

    let mock = MockClassifier::new("Sorry, I can't help with that.");
    let run = run_classification(&store, &cfg, &mock, now).await.unwrap();

    assert!(run.reply.is_none());
    assert!(run.snapshot.is_none());
    assert_eq!(run.verdicts.len(), 2);
    assert!(run.verdicts.iter().all(|(_, v)| *v == TopicVerdict::Unavailable));
    assert!(!dir.path().join("preds").exists());
}

#[tokio::test]
async fn classifier_failure_is_swallowed() {
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let store = seeded_store(now);

    let run = run_classification(&store, &cfg, &DisabledClassifier, now)
        .await
        .expect("classifier errors never fail the run");
    assert!(run.verdicts.iter().all(|(_, v)| !v.is_available()));
}

#[tokio::test]
async fn partial_reply_keeps_good_entries() {
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(dir.path());
    let store = seeded_store(now);

    let mock = MockClassifier::new(r#"{"NVDA": {"direction": "down", "confidence": 0.4, "reason": "export curbs"}}"#);
    let run = run_classification(&store, &cfg, &mock, now).await.unwrap();
    assert!(run.verdicts[0].1.is_available());
    assert_eq!(run.verdicts[1].1, TopicVerdict::Unavailable);
    assert!(run.snapshot.is_some());
}

#[tokio::test]
async fn oversized_lookback_reads_the_whole_store() {
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 12, 0, 0).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let cfg = AppConfig {
        lookback_hours: u64::MAX,
        ..config(dir.path())
    };
    let store = seeded_store(now);

    let mock = MockClassifier::new("{}");
    let run = run_classification(&store, &cfg, &mock, now).await.unwrap();
    assert_eq!(run.articles_read, 2);
}
