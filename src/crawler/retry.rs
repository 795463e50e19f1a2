//! Retry policy with exponential backoff
//!
//! Wraps a [`Fetcher`] call. Every failure, transport error or non-2xx
//! status alike, counts as one attempt; after the n-th failed attempt the
//! policy sleeps `unit * 2^n` before trying again. Once the attempts are used
//! up the URL is given up on, which the scheduler treats as "no content, no
//! links".

use crate::crawler::fetcher::{FetchResult, Fetcher};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Terminal state of a retried fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome {
    /// A fetch succeeded
    Fetched {
        final_url: Url,
        status_code: u16,
        body: String,
        /// Attempts used, the successful one included
        attempts: u32,
    },

    /// Every attempt failed
    Exhausted {
        attempts: u32,
        /// Description of the last failure
        last_failure: String,
    },

    /// The crawl was cancelled while waiting to retry
    Cancelled { attempts: u32 },
}

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Creates a policy
    ///
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, backoff_unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_unit,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the given number of failed attempts: `unit * 2^failures`
    ///
    /// # Examples
    ///
    /// ```
    /// use sitescrape::crawler::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::new(3, Duration::from_secs(1));
    /// assert_eq!(policy.backoff(1), Duration::from_secs(2));
    /// assert_eq!(policy.backoff(2), Duration::from_secs(4));
    /// ```
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 1u32.checked_shl(failures).unwrap_or(u32::MAX);
        self.backoff_unit.saturating_mul(factor)
    }

    /// Fetches `url`, retrying failures until success or exhaustion
    ///
    /// Failures are logged as warnings and exhaustion as an error; nothing is
    /// propagated. Cancellation is checked before each backoff sleep and
    /// interrupts a sleep already in progress.
    pub async fn run(
        &self,
        fetcher: &dyn Fetcher,
        url: &Url,
        cancel: &CancellationToken,
    ) -> RetryOutcome {
        let mut attempts = 0;

        loop {
            tracing::info!(url = %url, "Scraping: {}", url);
            let result = fetcher.fetch(url).await;
            attempts += 1;

            let failure = match result {
                FetchResult::Success {
                    final_url,
                    status_code,
                    body,
                } => {
                    return RetryOutcome::Fetched {
                        final_url,
                        status_code,
                        body,
                        attempts,
                    }
                }
                FetchResult::PermanentFailure { status_code } => {
                    tracing::warn!(
                        url = %url,
                        status = status_code,
                        attempt = attempts,
                        "Failed to retrieve {} (Status Code: {})",
                        url,
                        status_code
                    );
                    format!("Status Code: {}", status_code)
                }
                FetchResult::TransientFailure { reason } => {
                    tracing::warn!(
                        url = %url,
                        attempt = attempts,
                        "Error scraping {}: {}",
                        url,
                        reason
                    );
                    reason
                }
            };

            if attempts >= self.max_attempts {
                tracing::error!(
                    url = %url,
                    attempts,
                    "Giving up on {} after {} attempts: {}",
                    url,
                    attempts,
                    failure
                );
                return RetryOutcome::Exhausted {
                    attempts,
                    last_failure: failure,
                };
            }

            if cancel.is_cancelled() {
                return RetryOutcome::Cancelled { attempts };
            }

            let delay = self.backoff(attempts);
            tracing::debug!(url = %url, "Retrying {} in {:?}", url, delay);
            tokio::select! {
                _ = cancel.cancelled() => return RetryOutcome::Cancelled { attempts },
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
