//! Topic bucketing: non-exclusive keyword containment over title + summary.
//!
//! Matching is a case-insensitive substring test, not a word match, so an
//! alias like "Arm" also hits "Army". Known false positives are accepted.

use serde::{Deserialize, Serialize};

use crate::store::Article;

/// A topic (ticker symbol) and the aliases that mark an article as relevant to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub symbol: String,
    pub aliases: Vec<String>,
}

impl Topic {
    pub fn new<S: Into<String>>(symbol: S, aliases: &[&str]) -> Self {
        Self {
            symbol: symbol.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Articles matched to one topic, in store read order. May be empty.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicBucket<'a> {
    pub symbol: &'a str,
    pub articles: Vec<&'a Article>,
}

impl TopicBucket<'_> {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// One bucket per topic, in topic order; each capped at `max_per_topic`.
pub fn bucketize<'a>(
    articles: &'a [Article],
    topics: &'a [Topic],
    max_per_topic: usize,
) -> Vec<TopicBucket<'a>> {
    let mut buckets: Vec<TopicBucket<'a>> = topics
        .iter()
        .map(|t| TopicBucket {
            symbol: t.symbol.as_str(),
            articles: Vec::new(),
        })
        .collect();

    let lowered_aliases: Vec<Vec<String>> = topics
        .iter()
        .map(|t| {
            t.aliases
                .iter()
                .map(|a| a.to_lowercase())
                .filter(|a| !a.is_empty())
                .collect()
        })
        .collect();

    for article in articles {
        let haystack = format!("{} {}", article.title, article.summary).to_lowercase();
        for (bucket, aliases) in buckets.iter_mut().zip(&lowered_aliases) {
            if bucket.articles.len() >= max_per_topic {
                continue;
            }
            if aliases.iter().any(|a| haystack.contains(a.as_str())) {
                bucket.articles.push(article);
            }
        }
    }

    buckets
}
