//! SQLite sink implementation
//!
//! Stores one row per page. Writes run on tokio's blocking pool so that the
//! synchronous SQLite calls never stall a crawl worker.

use crate::output::schema::initialize_schema;
use crate::output::traits::{Sink, SinkError, SinkResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use url::Url;

/// A stored page row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    pub url: String,
    pub captured_at: String,
    pub content: String,
}

/// SQLite sink backend
#[derive(Clone)]
pub struct SqliteSink {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(SinkError)` - Failed to open database or create the schema
    pub fn new(path: &Path) -> SinkResult<Self> {
        let conn = Connection::open(path)?;

        // WAL keeps readers unblocked while the crawl is writing
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Looks up a stored page by URL
    pub fn get_page(&self, url: &str) -> SinkResult<Option<StoredPage>> {
        let conn = self.lock();
        let page = conn
            .query_row(
                "SELECT url, captured_at, content FROM pages WHERE url = ?1",
                params![url],
                |row| {
                    Ok(StoredPage {
                        url: row.get(0)?,
                        captured_at: row.get(1)?,
                        content: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(page)
    }

    /// Counts stored pages
    pub fn count_pages(&self) -> SinkResult<u64> {
        let conn = self.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn upsert_page(conn: &Connection, url: &str, captured_at: &str, content: &str) -> SinkResult<()> {
    conn.execute(
        "INSERT INTO pages (url, captured_at, content) VALUES (?1, ?2, ?3)
         ON CONFLICT(url) DO UPDATE SET captured_at = excluded.captured_at, content = excluded.content",
        params![url, captured_at, content],
    )?;
    Ok(())
}

#[async_trait]
impl Sink for SqliteSink {
    async fn write(&self, url: &Url, text: &str, captured_at: DateTime<Utc>) -> SinkResult<()> {
        let sink = self.clone();
        let url = url.to_string();
        let text = text.to_string();
        let captured_at = captured_at.to_rfc3339();

        tokio::task::spawn_blocking(move || {
            let conn = sink.lock();
            upsert_page(&conn, &url, &captured_at, &text)
        })
        .await
        .map_err(|e| SinkError::Worker(e.to_string()))?
    }
}
