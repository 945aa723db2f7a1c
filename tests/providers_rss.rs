// tests/providers_rss.rs
use chrono::{TimeZone, Utc};
use ticker_feed::ingest::freshness::resolve_timestamp_at;
use ticker_feed::ingest::providers::rss::{parse_feed, RssFeed};
use ticker_feed::ingest::types::FeedSource;

#[tokio::test]
async fn rss_fixture_yields_items_in_feed_order() {
    let xml = include_str!("fixtures/cnn_rss.xml");
    let feed = RssFeed::from_fixture("cnn_tech", xml);
    assert_eq!(feed.name(), "cnn_tech");

    let items = feed.fetch_latest().await.expect("rss parse ok");
    assert_eq!(items.len(), 3);

    let first = &items[0];
    assert_eq!(
        first.link,
        "https://www.cnn.com/2025/01/02/tech/nvidia-chips/index.html"
    );
    assert_eq!(
        first.title.as_deref(),
        Some("Nvidia unveils next-generation AI chips")
    );
    assert_eq!(
        first.summary.as_deref(),
        Some("The chipmaker said the new parts ship later this year.")
    );
    assert_eq!(
        first.published.as_deref(),
        Some("Thu, 02 Jan 2025 14:30:00 GMT")
    );
    assert!(first.updated.is_none());

    // no pubDate, no description
    assert!(items[1].published.is_none());
    assert!(items[1].summary.is_none());

    // missing <link> surfaces as an empty link, left for the pipeline to reject
    assert!(items[2].link.is_empty());
}

#[test]
fn atom_fixture_maps_links_dates_and_text() {
    let xml = std::fs::read_to_string("tests/fixtures/atom_feed.xml").expect("fixture");
    let items = parse_feed("wire", &xml).expect("atom parse ok");
    assert_eq!(items.len(), 2);

    let a = &items[0];
    assert_eq!(a.link, "https://markets.example.test/rheinmetall");
    assert_eq!(a.title.as_deref(), Some("Rheinmetall wins artillery contract"));
    assert_eq!(a.summary.as_deref(), Some("<p>Order worth EUR 1bn</p>"));
    assert_eq!(a.published.as_deref(), Some("2025-01-02T08:00:00+01:00"));
    assert_eq!(a.updated.as_deref(), Some("2025-01-02T09:00:00+01:00"));

    let b = &items[1];
    assert_eq!(b.link, "https://markets.example.test/airbus");
    assert_eq!(b.summary.as_deref(), Some("Deliveries beat guidance."));
    assert!(b.published.is_none());

    let now = Utc.with_ymd_and_hms(2025, 1, 3, 0, 0, 0).unwrap();
    assert_eq!(
        resolve_timestamp_at(a, now),
        Utc.with_ymd_and_hms(2025, 1, 2, 7, 0, 0).unwrap()
    );
    assert_eq!(
        resolve_timestamp_at(b, now),
        Utc.with_ymd_and_hms(2025, 1, 1, 18, 30, 0).unwrap()
    );
}

#[tokio::test]
async fn garbage_body_is_a_fetch_error() {
    let feed = RssFeed::from_fixture("broken", "<rss><channel><item><title>x</channel>");
    assert!(feed.fetch_latest().await.is_err());
}
