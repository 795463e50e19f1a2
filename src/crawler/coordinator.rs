//! Crawler coordinator - wires configuration to a running crawl
//!
//! This module contains the setup that turns a [`Config`] into a ready
//! scheduler:
//! - Building the shared HTTP client
//! - Opening the configured sink
//! - Deriving the retry policy and extraction order
//! - Validating the seed URL

use crate::config::Config;
use crate::crawler::fetcher::{build_http_client, Fetcher, HttpFetcher};
use crate::crawler::scheduler::Scheduler;
use crate::output::{open_sink, CrawlReport, Sink};
use crate::url::parse_seed;
use crate::ScrapeError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    scheduler: Scheduler,
}

impl Coordinator {
    /// Creates a coordinator with an HTTP fetcher and the configured sink
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Client built and sink opened
    /// * `Err(ScrapeError)` - The client could not be built or the sink could not be opened
    pub fn new(config: Config) -> Result<Self, ScrapeError> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout())?;
        let sink = open_sink(&config.output)?;

        Ok(Self::with_parts(
            config,
            Arc::new(HttpFetcher::new(client)),
            sink,
        ))
    }

    /// Creates a coordinator around caller-supplied collaborators
    pub fn with_parts(config: Config, fetcher: Arc<dyn Fetcher>, sink: Arc<dyn Sink>) -> Self {
        let scheduler = Scheduler::from_config(&config.crawler, fetcher, sink);

        Self {
            config: Arc::new(config),
            scheduler,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Crawls from `seed` until the depth bound, an empty level, or cancellation
    ///
    /// Fails only if the seed is not an absolute http(s) URL.
    pub async fn run(
        &self,
        seed: &str,
        cancel: CancellationToken,
    ) -> Result<CrawlReport, ScrapeError> {
        let seed = parse_seed(seed)?;

        tracing::info!(
            "Crawling {} with max depth {}, {} workers, {} attempts per page",
            seed,
            self.config.crawler.max_depth,
            self.config.crawler.max_workers,
            self.config.crawler.max_attempts
        );

        let report = self.scheduler.run(seed, cancel).await;
        report.log();

        Ok(report)
    }
}

/// Builds a coordinator from `config` and crawls from `seed`
pub async fn run_crawl(
    config: Config,
    seed: &str,
    cancel: CancellationToken,
) -> Result<CrawlReport, ScrapeError> {
    let coordinator = Coordinator::new(config)?;
    coordinator.run(seed, cancel).await
}
