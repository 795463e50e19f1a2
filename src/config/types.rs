use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Sitescrape
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Deepest level fetched; the seed is level 0
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum number of page tasks running at once
    #[serde(rename = "max-workers")]
    pub max_workers: u32,

    /// Timeout for a single HTTP request (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Fetch attempts per URL before giving up
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Length of one backoff time-unit (milliseconds)
    #[serde(rename = "backoff-unit-ms")]
    pub backoff_unit_ms: u64,

    /// Order in which text blocks are emitted
    #[serde(rename = "text-order")]
    pub text_order: TextOrder,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn backoff_unit(&self) -> Duration {
        Duration::from_millis(self.backoff_unit_ms)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_workers: 10,
            request_timeout: 10,
            max_attempts: 3,
            backoff_unit_ms: 1000,
            text_order: TextOrder::Grouped,
        }
    }
}

/// How extracted text blocks are ordered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextOrder {
    /// Headings, then paragraphs, then list items, then blockquotes
    #[default]
    Grouped,
    /// Blocks in the order they appear in the document
    Document,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler (optional)
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// `Name/Version (+ContactURL)` when a contact URL is set, `Name/Version` otherwise.
    pub fn header_value(&self) -> String {
        if self.contact_url.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, self.contact_url
            )
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "sitescrape".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: String::new(),
        }
    }
}

/// Where scraped text goes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One text file per page
    #[default]
    Files,
    /// One row per page in a SQLite database
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,

    /// Directory for per-page text files
    pub directory: String,

    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Files,
            directory: "scraped_pages".to_string(),
            database_path: "scraped_pages.db".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file path; empty means stderr
    pub file: String,
}
