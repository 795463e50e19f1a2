//! Output module for persisting scraped pages
//!
//! This module handles:
//! - The `Sink` capability the crawler writes extracted text to
//! - A text-file sink and a SQLite sink
//! - The crawl report returned when a crawl finishes

mod files;
mod schema;
mod sqlite;
pub mod stats;
mod traits;

pub use files::{file_name_for, format_page, FileSink};
pub use sqlite::{SqliteSink, StoredPage};
pub use stats::CrawlReport;
pub use traits::{Sink, SinkError, SinkResult};

use crate::config::{OutputConfig, OutputFormat};
use std::path::Path;
use std::sync::Arc;

/// Opens the sink selected by the output configuration
///
/// # Returns
///
/// * `Ok(Arc<dyn Sink>)` - Ready-to-use sink
/// * `Err(SinkError)` - The database could not be opened
pub fn open_sink(config: &OutputConfig) -> SinkResult<Arc<dyn Sink>> {
    match config.format {
        OutputFormat::Files => {
            tracing::info!("Writing pages to directory: {}", config.directory);
            Ok(Arc::new(FileSink::new(&config.directory)))
        }
        OutputFormat::Sqlite => {
            tracing::info!("Writing pages to database: {}", config.database_path);
            Ok(Arc::new(SqliteSink::new(Path::new(&config.database_path))?))
        }
    }
}
