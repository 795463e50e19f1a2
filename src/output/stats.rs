//! Crawl report
//!
//! Counters gathered by the scheduler while a crawl runs, returned to the
//! caller when it finishes.

use std::fmt;
use std::time::Duration;

/// Summary of one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Pages fetched, extracted and written to the sink
    pub pages_written: u64,

    /// Pages whose fetch attempts were all exhausted
    pub pages_failed: u64,

    /// Pages extracted but rejected by the sink
    pub write_failures: u64,

    /// URLs admitted to a level after the seed
    pub urls_admitted: u64,

    /// Levels whose tasks all finished, the seed level included
    pub levels_completed: u32,

    /// Whether the crawl stopped because it was cancelled
    pub cancelled: bool,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}

impl CrawlReport {
    /// Total pages that reached a terminal state
    pub fn pages_processed(&self) -> u64 {
        self.pages_written + self.pages_failed + self.write_failures
    }

    /// Share of processed pages that were written, as a percentage
    pub fn success_rate(&self) -> f64 {
        let processed = self.pages_processed();
        if processed == 0 {
            return 0.0;
        }
        (self.pages_written as f64 / processed as f64) * 100.0
    }

    /// Emits the report as a single structured log event
    pub fn log(&self) {
        tracing::info!(
            pages_written = self.pages_written,
            pages_failed = self.pages_failed,
            write_failures = self.write_failures,
            urls_admitted = self.urls_admitted,
            levels = self.levels_completed,
            cancelled = self.cancelled,
            "Crawl finished in {:.2?}",
            self.elapsed
        );
    }
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Crawl Report ===")?;
        writeln!(f, "Pages written:   {}", self.pages_written)?;
        writeln!(f, "Pages failed:    {}", self.pages_failed)?;
        writeln!(f, "Write failures:  {}", self.write_failures)?;
        writeln!(f, "URLs admitted:   {}", self.urls_admitted)?;
        writeln!(f, "Levels:          {}", self.levels_completed)?;
        writeln!(f, "Success rate:    {:.2}%", self.success_rate())?;
        write!(f, "Elapsed:         {:.2?}", self.elapsed)?;
        if self.cancelled {
            write!(f, "\n(cancelled before completion)")?;
        }
        Ok(())
    }
}
