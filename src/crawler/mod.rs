//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with failure classification
//! - Retry with exponential backoff
//! - HTML text and link extraction
//! - The breadth-first frontier and the level-by-level worker pool
//! - Overall crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod retry;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use extractor::{ExtractedPage, Extractor};
pub use fetcher::{build_http_client, fetch_url, FetchResult, Fetcher, HttpFetcher};
pub use frontier::Frontier;
pub use retry::{RetryOutcome, RetryPolicy};
pub use scheduler::{PageOutcome, Scheduler};

pub use crate::output::CrawlReport;

use crate::config::Config;
use crate::ScrapeError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the seed URL
/// 2. Build the HTTP client and open the sink
/// 3. Fetch, extract and write pages level by level
/// 4. Return the crawl report
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seed` - The URL to start from; its host bounds the crawl
/// * `cancel` - Token that stops the crawl early when cancelled
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl finished (possibly with page-level failures)
/// * `Err(ScrapeError)` - Setup failed before any page was fetched
pub async fn crawl(
    config: Config,
    seed: &str,
    cancel: CancellationToken,
) -> Result<CrawlReport, ScrapeError> {
    run_crawl(config, seed, cancel).await
}
