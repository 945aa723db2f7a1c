// src/ingest/freshness.rs
//! Timestamp resolution and the freshness window.
//!
//! Resolution order for an item: `published`, then `updated`, then the current
//! instant. A missing or garbled date therefore never drops an item; it is
//! treated as "just now". Future-dated items pass the window unchanged.

use chrono::{DateTime, Duration, NaiveDateTime, SubsecRound, TimeZone, Utc};
use time::{format_description::well_known::Rfc2822, OffsetDateTime};

use crate::ingest::types::RawItem;

/// Parse a feed date string into UTC, truncated to whole seconds.
/// Accepts RFC 2822 (RSS `pubDate`), RFC 3339 (Atom) and naive `YYYY-MM-DD HH:MM:SS` as UTC.
pub fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(ts) = OffsetDateTime::parse(s, &Rfc2822)
        .ok()
        .map(|dt| dt.unix_timestamp())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    {
        return Some(ts);
    }
    // chrono is more lenient with obsolete zone names ("EST", "PDT", ...)
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc).trunc_subsecs(0));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).trunc_subsecs(0));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Best-available timestamp for `item`, falling back to `now`.
pub fn resolve_timestamp_at(item: &RawItem, now: DateTime<Utc>) -> DateTime<Utc> {
    item.published
        .as_deref()
        .and_then(parse_feed_date)
        .or_else(|| item.updated.as_deref().and_then(parse_feed_date))
        .unwrap_or_else(|| now.trunc_subsecs(0))
}

pub fn resolve_timestamp(item: &RawItem) -> DateTime<Utc> {
    resolve_timestamp_at(item, Utc::now())
}

/// Inclusive lower bound only: `instant >= now - max_age`.
/// A window reaching past the representable range has no lower bound.
pub fn is_fresh(instant: DateTime<Utc>, now: DateTime<Utc>, max_age: Duration) -> bool {
    match now.checked_sub_signed(max_age) {
        Some(cutoff) => instant >= cutoff,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rss_pubdate() {
        let dt = parse_feed_date("Thu, 02 Jan 2025 10:30:00 GMT").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 2, 10, 30, 0).unwrap());
    }

    #[test]
    fn parses_offset_and_normalizes_to_utc() {
        let dt = parse_feed_date("Thu, 02 Jan 2025 10:30:00 +0200").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 2, 8, 30, 0).unwrap());

        let atom = parse_feed_date("2025-01-02T10:30:00.750-05:00").unwrap();
        assert_eq!(atom, Utc.with_ymd_and_hms(2025, 1, 2, 15, 30, 0).unwrap());
    }

    #[test]
    fn naive_dates_are_utc() {
        let dt = parse_feed_date("2025-01-02 03:04:05").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap());
    }

    #[test]
    fn oversized_window_accepts_everything() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        let ancient = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert!(is_fresh(ancient, now, Duration::MAX));
    }

    #[test]
    fn garbage_is_none() {
        assert!(parse_feed_date("").is_none());
        assert!(parse_feed_date("yesterday-ish").is_none());
    }

    #[test]
    fn unparseable_published_falls_through_to_updated() {
        let now = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        let item = RawItem::new("https://x/a")
            .published("not a date")
            .updated("2025-01-01T12:00:00Z");
        assert_eq!(
            resolve_timestamp_at(&item, now),
            Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap()
        );
    }
}
