// src/ingest/providers/rss.rs
//! RSS 2.0 / Atom feed source. Dates stay raw strings here; resolution
//! happens in `ingest::freshness`.

use async_trait::async_trait;
use metrics::histogram;
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::ingest::types::{FeedSource, FetchError, RawItem};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    link: Vec<AtomLink>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
    published: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

// Atom text constructs carry a `type` attribute, so they can't be plain strings.
#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

impl AtomEntry {
    fn alternate_link(&self) -> Option<String> {
        self.link
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.link.first())
            .and_then(|l| l.href.clone())
    }
}

fn root_element(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Some(String::from_utf8_lossy(e.local_name().as_ref()).to_string())
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

/// Parse an RSS 2.0 or Atom document into raw items, preserving feed order.
pub fn parse_feed(feed: &str, xml: &str) -> Result<Vec<RawItem>, FetchError> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);
    let parse_err = |e: quick_xml::DeError| FetchError::Parse {
        feed: feed.to_string(),
        reason: e.to_string(),
    };

    let items = match root_element(&xml_clean).as_deref() {
        Some("rss") => {
            let rss: Rss = from_str(&xml_clean).map_err(parse_err)?;
            rss.channel
                .item
                .into_iter()
                .map(|it| RawItem {
                    link: it.link.unwrap_or_default().trim().to_string(),
                    title: it.title,
                    summary: it.description,
                    published: it.pub_date,
                    updated: None,
                })
                .collect()
        }
        Some("feed") => {
            let atom: AtomFeed = from_str(&xml_clean).map_err(parse_err)?;
            atom.entry
                .into_iter()
                .map(|e| RawItem {
                    link: e.alternate_link().unwrap_or_default().trim().to_string(),
                    title: e.title.map(|t| t.value),
                    summary: e.summary.or(e.content).map(|t| t.value),
                    published: e.published,
                    updated: e.updated,
                })
                .collect()
        }
        other => {
            return Err(FetchError::Parse {
                feed: feed.to_string(),
                reason: format!("unsupported root element {other:?}"),
            })
        }
    };

    histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
    Ok(items)
}

pub struct RssFeed {
    name: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl RssFeed {
    /// Live feed; `name` doubles as the stored `source_feed`.
    pub fn from_url(name: impl Into<String>, url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    /// Canned XML, for tests and offline runs.
    pub fn from_fixture(name: impl Into<String>, xml: &str) -> Self {
        Self {
            name: name.into(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }
}

#[async_trait]
impl FeedSource for RssFeed {
    async fn fetch_latest(&self) -> Result<Vec<RawItem>, FetchError> {
        match &self.mode {
            Mode::Fixture(xml) => parse_feed(&self.name, xml),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url.as_str())
                    .send()
                    .await
                    .map_err(|source| FetchError::Http {
                        url: url.clone(),
                        source,
                    })?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }
                let body = resp.text().await.map_err(|source| FetchError::Http {
                    url: url.clone(),
                    source,
                })?;
                parse_feed(&self.name, &body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
