//! Level-by-level worker pool
//!
//! This module handles:
//! - Breadth-first traversal, one level at a time
//! - Global concurrency limiting via a semaphore
//! - Per-level barriers: level N+1 is computed only after every task of
//!   level N has finished
//! - Cancellation, checked before each task is dispatched
//!
//! Each task runs retry(fetch), then extraction, then the sink write, and
//! hands the links it found back to the scheduler, which is the only caller
//! of [`Frontier::admit`] and [`Frontier::advance`].

use crate::config::CrawlerConfig;
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::frontier::Frontier;
use crate::crawler::retry::{RetryOutcome, RetryPolicy};
use crate::output::{CrawlReport, Sink};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What a single page task produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Text written to the sink
    Written { links: BTreeSet<Url> },

    /// Extraction succeeded but the sink rejected the text
    WriteFailed {
        links: BTreeSet<Url>,
        error: String,
    },

    /// Every fetch attempt failed; nothing extracted
    Exhausted,

    /// The crawl was cancelled before the page finished
    Cancelled,
}

impl PageOutcome {
    /// Links to hand back to the frontier
    pub fn into_links(self) -> BTreeSet<Url> {
        match self {
            Self::Written { links } | Self::WriteFailed { links, .. } => links,
            Self::Exhausted | Self::Cancelled => BTreeSet::new(),
        }
    }
}

/// Everything a page task needs, shared by all tasks of a crawl
struct Worker {
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn Sink>,
    extractor: Extractor,
    retry: RetryPolicy,
    scope: Url,
}

impl Worker {
    async fn process(&self, url: Url, cancel: &CancellationToken) -> PageOutcome {
        let (final_url, body) = match self.retry.run(self.fetcher.as_ref(), &url, cancel).await {
            RetryOutcome::Fetched {
                final_url,
                status_code,
                body,
                attempts,
            } => {
                if attempts > 1 {
                    tracing::info!(
                        url = %url,
                        status = status_code,
                        attempts,
                        "Fetched {} after {} attempts",
                        url,
                        attempts
                    );
                }
                (final_url, body)
            }
            RetryOutcome::Exhausted { .. } => return PageOutcome::Exhausted,
            RetryOutcome::Cancelled { .. } => return PageOutcome::Cancelled,
        };

        let page = self.extractor.extract(&body, &final_url, &self.scope);
        tracing::debug!(url = %url, links = page.links.len(), "Extracted page");

        match self.sink.write(&url, &page.text, Utc::now()).await {
            Ok(()) => PageOutcome::Written { links: page.links },
            Err(e) => {
                tracing::error!(url = %url, "Failed to write {}: {}", url, e);
                PageOutcome::WriteFailed {
                    links: page.links,
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Scheduler drives the breadth-first crawl
///
/// The scheduler coordinates:
/// - The depth bound (levels 0 through `max_depth` are fetched)
/// - The concurrency bound (at most `max_workers` page tasks at once)
/// - Frontier admission of the links each level discovers
pub struct Scheduler {
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn Sink>,
    extractor: Extractor,
    retry: RetryPolicy,
    max_depth: u32,
    max_workers: usize,
}

impl Scheduler {
    /// Creates a scheduler with the default settings (depth 3, 10 workers,
    /// 3 attempts with a one-second backoff unit)
    pub fn new(fetcher: Arc<dyn Fetcher>, sink: Arc<dyn Sink>) -> Self {
        Self::from_config(&CrawlerConfig::default(), fetcher, sink)
    }

    /// Creates a scheduler from crawler configuration
    pub fn from_config(
        config: &CrawlerConfig,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn Sink>,
    ) -> Self {
        Self {
            fetcher,
            sink,
            extractor: Extractor::new(config.text_order),
            retry: RetryPolicy::new(config.max_attempts, config.backoff_unit()),
            max_depth: config.max_depth,
            max_workers: config.max_workers.max(1) as usize,
        }
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Crawls from `seed` until the depth bound, an empty level, or cancellation
    ///
    /// Never fails: page-level failures are logged and counted in the report.
    pub async fn run(&self, seed: Url, cancel: CancellationToken) -> CrawlReport {
        let start_time = Instant::now();
        let mut report = CrawlReport::default();

        let mut frontier = Frontier::new(seed.clone(), self.max_depth);
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let worker = Arc::new(Worker {
            fetcher: Arc::clone(&self.fetcher),
            sink: Arc::clone(&self.sink),
            extractor: self.extractor,
            retry: self.retry,
            scope: seed,
        });

        tracing::info!(
            "Starting crawl of {} (max depth {}, {} workers)",
            frontier.scope(),
            self.max_depth,
            self.max_workers
        );

        let mut level = frontier.seed_level();

        loop {
            let depth = frontier.depth();
            tracing::info!(depth, pages = level.len(), "Starting level {}", depth);

            let mut tasks = JoinSet::new();
            for url in level {
                if cancel.is_cancelled() {
                    break;
                }

                let permit = tokio::select! {
                    permit = Arc::clone(&semaphore).acquire_owned() => permit.ok(),
                    _ = cancel.cancelled() => None,
                };
                let Some(permit) = permit else {
                    break;
                };

                let worker = Arc::clone(&worker);
                let cancel = cancel.clone();
                tasks.spawn(async move {
                    let _permit = permit;
                    worker.process(url, &cancel).await
                });
            }

            // Barrier: every task of this level finishes before the next is built
            while let Some(joined) = tasks.join_next().await {
                let outcome = match joined {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!("Page task failed: {}", e);
                        continue;
                    }
                };

                match &outcome {
                    PageOutcome::Written { .. } => report.pages_written += 1,
                    PageOutcome::WriteFailed { .. } => report.write_failures += 1,
                    PageOutcome::Exhausted => report.pages_failed += 1,
                    PageOutcome::Cancelled => {}
                }

                let admitted = frontier.admit(outcome.into_links());
                report.urls_admitted += admitted.len() as u64;
            }

            if cancel.is_cancelled() {
                tracing::warn!(depth, "Crawl cancelled during level {}", depth);
                report.cancelled = true;
                break;
            }

            report.levels_completed += 1;
            tracing::info!(
                depth,
                written = report.pages_written,
                "Finished level {}",
                depth
            );

            match frontier.advance() {
                Some(next) => level = next,
                None => {
                    tracing::info!(depth, "No further levels after depth {}", depth);
                    break;
                }
            }
        }

        report.elapsed = start_time.elapsed();
        report
    }
}
