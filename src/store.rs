//! Article store
//!
//! Durable SQLite table of accepted articles keyed by fingerprint. The only
//! mutation is `insert_if_absent`, a single `INSERT OR IGNORE`, so concurrent
//! ingestion of the same link can never produce two rows and a row is either
//! fully written or absent.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::ingest::fingerprint::fingerprint;
use crate::ingest::types::RawItem;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("creating store directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("store connection lock poisoned")]
    Poisoned,
}

/// One persisted feed entry. Identity is `fingerprint`; rows are never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub fingerprint: String,
    pub title: String,
    pub link: String,
    pub published_at: DateTime<Utc>,
    pub summary: String,
    pub source_feed: String,
}

impl Article {
    pub fn from_raw(item: &RawItem, published_at: DateTime<Utc>, source_feed: &str) -> Self {
        Self {
            fingerprint: fingerprint(&item.link),
            title: item.title.clone().unwrap_or_default(),
            link: item.link.clone(),
            published_at,
            summary: item.summary.clone().unwrap_or_default(),
            source_feed: source_feed.to_string(),
        }
    }
}

/// Fixed-width UTC form, so text order in SQL equals chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub struct ArticleStore {
    conn: Mutex<Connection>,
}

impl ArticleStore {
    /// Open (or create) the database file and make sure the schema exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        // the classification binary may read while the poller writes
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn, &path.display().to_string())
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?, ":memory:")
    }

    fn with_connection(conn: Connection, location: &str) -> Result<Self, StorageError> {
        init_schema(&conn)?;
        info!(store = %location, "article store ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    pub fn exists(&self, fingerprint: &str) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let hit = conn
            .query_row(
                "SELECT 1 FROM articles WHERE fingerprint = ?1",
                params![fingerprint],
                |_| Ok(()),
            )
            .optional()?;
        Ok(hit.is_some())
    }

    /// Returns `true` when a new row was written, `false` when the fingerprint was already stored.
    pub fn insert_if_absent(&self, article: &Article) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "INSERT OR IGNORE INTO articles
             (fingerprint, title, link, published_at, summary, source_feed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                article.fingerprint,
                article.title,
                article.link,
                format_timestamp(article.published_at),
                article.summary,
                article.source_feed,
            ],
        )?;
        Ok(changed == 1)
    }

    /// All articles with `published_at >= since`, in insertion order.
    pub fn query_since(&self, since: DateTime<Utc>) -> Result<Vec<Article>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT fingerprint, title, link, published_at, summary, source_feed
             FROM articles
             WHERE published_at >= ?1
             ORDER BY rowid",
        )?;

        let rows = stmt.query_map(params![format_timestamp(since)], |row| {
            let raw_ts: String = row.get(3)?;
            let published_at = DateTime::parse_from_rfc3339(&raw_ts)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?
                .with_timezone(&Utc);
            Ok(Article {
                fingerprint: row.get(0)?,
                title: row.get(1)?,
                link: row.get(2)?,
                published_at,
                summary: row.get(4)?,
                source_feed: row.get(5)?,
            })
        })?;

        let articles = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(articles)
    }

    pub fn count(&self) -> Result<usize, StorageError> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
        Ok(usize::try_from(n).unwrap_or(0))
    }
}

fn init_schema(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS articles (
            fingerprint TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            link TEXT NOT NULL,
            published_at TEXT NOT NULL,
            summary TEXT NOT NULL,
            source_feed TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_articles_published ON articles(published_at)",
        [],
    )?;
    Ok(())
}
