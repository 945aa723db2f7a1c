// tests/bucket.rs
use chrono::{Duration, TimeZone, Utc};
use ticker_feed::analyze::bucket::{bucketize, Topic};
use ticker_feed::{Article, ArticleStore, RawItem};

fn stored(store: &ArticleStore, link: &str, title: &str) {
    let ts = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
    let a = Article::from_raw(&RawItem::new(link).title(title), ts, "test");
    assert!(store.insert_if_absent(&a).unwrap());
}

#[test]
fn title_containment_selects_bucket() {
    let store = ArticleStore::open_in_memory().unwrap();
    stored(&store, "https://x/1", "Acme reports earnings");
    stored(&store, "https://x/2", "No relation");

    let articles = store
        .query_since(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        .unwrap();
    let topics = vec![Topic::new("ABC", &["Acme"])];
    let buckets = bucketize(&articles, &topics, 8);

    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].symbol, "ABC");
    let titles: Vec<_> = buckets[0].articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Acme reports earnings"]);
}

#[test]
fn truncation_keeps_store_read_order() {
    let store = ArticleStore::open_in_memory().unwrap();
    for i in 0..5 {
        stored(&store, &format!("https://x/{i}"), &format!("Acme update {i}"));
    }
    let articles = store
        .query_since(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        .unwrap();
    let topics = vec![Topic::new("ABC", &["acme"])];
    let buckets = bucketize(&articles, &topics, 2);

    let titles: Vec<_> = buckets[0].articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Acme update 0", "Acme update 1"]);
}

#[test]
fn topics_without_matches_are_still_present() {
    let articles: Vec<Article> = Vec::new();
    let topics = vec![Topic::new("ABC", &["Acme"]), Topic::new("XYZ", &["Xyzzy"])];
    let buckets = bucketize(&articles, &topics, 8);
    assert_eq!(buckets.len(), 2);
    assert!(buckets.iter().all(|b| b.is_empty()));
    assert_eq!(buckets[1].symbol, "XYZ");
}

#[test]
fn lookback_window_limits_the_corpus() {
    let store = ArticleStore::open_in_memory().unwrap();
    let now = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
    for (link, age_h) in [("https://x/recent", 3), ("https://x/ancient", 30)] {
        let a = Article::from_raw(
            &RawItem::new(link).title("Acme news"),
            now - Duration::hours(age_h),
            "test",
        );
        store.insert_if_absent(&a).unwrap();
    }
    let articles = store.query_since(now - Duration::hours(24)).unwrap();
    let topics = [Topic::new("ABC", &["Acme"])];
    let buckets = bucketize(&articles, &topics, 8);
    assert_eq!(buckets[0].articles.len(), 1);
    assert_eq!(buckets[0].articles[0].link, "https://x/recent");
}
