//! Sink trait and error types
//!
//! A sink receives the text extracted from each page. The crawler calls it
//! concurrently from several workers, always with distinct URLs, so
//! implementations must be thread-safe but need no cross-URL ordering.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;

/// Errors that can occur while persisting a page
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Sink worker failed: {0}")]
    Worker(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Destination for scraped page content
#[async_trait]
pub trait Sink: Send + Sync {
    /// Persists the text extracted from `url`
    ///
    /// # Arguments
    ///
    /// * `url` - The page the text came from
    /// * `text` - The extracted text
    /// * `captured_at` - When the page was scraped
    async fn write(&self, url: &Url, text: &str, captured_at: DateTime<Utc>) -> SinkResult<()>;
}
