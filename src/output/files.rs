//! Text-file sink
//!
//! Writes one `.txt` file per page into an output directory.

use crate::output::traits::{Sink, SinkResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use url::Url;

/// Timestamp format used in file headers
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Suffix for the staging file of each write
static STAGING_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Sink that stores each page as a text file
///
/// Distinct URLs can map to the same file name (`/a/b` and `/a_b`, or the
/// same path over http and https). Each write goes to its own staging file
/// and is renamed over the target, so the file always holds one whole page
/// and the last writer wins.
#[derive(Debug, Clone)]
pub struct FileSink {
    directory: PathBuf,
}

impl FileSink {
    /// Creates a sink writing into `directory`
    ///
    /// The directory is created on the first write if it does not exist.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns the output directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the path a page's text is written to
    pub fn path_for(&self, url: &Url) -> PathBuf {
        self.directory.join(file_name_for(url))
    }

    /// A fresh hidden path in the output directory, unique to one write
    fn staging_path_for(&self, url: &Url) -> PathBuf {
        let n = STAGING_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.directory.join(format!(
            ".{}.{}-{}.tmp",
            file_name_for(url),
            std::process::id(),
            n
        ))
    }
}

/// Derives a file name from a URL
///
/// Strips the `https://` / `http://` prefix and replaces every `/` with `_`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitescrape::output::file_name_for;
///
/// let url = Url::parse("https://example.com/docs/intro").unwrap();
/// assert_eq!(file_name_for(&url), "example.com_docs_intro.txt");
/// ```
pub fn file_name_for(url: &Url) -> String {
    let name = url
        .as_str()
        .replace("https://", "")
        .replace("http://", "")
        .replace('/', "_");
    format!("{}.txt", name)
}

/// Formats the file body: a two-line header, a blank line, then the text
pub fn format_page(url: &Url, text: &str, captured_at: DateTime<Utc>) -> String {
    format!(
        "URL: {}\nTimestamp: {}\n\n{}",
        url,
        captured_at.format(TIMESTAMP_FORMAT),
        text
    )
}

#[async_trait]
impl Sink for FileSink {
    async fn write(&self, url: &Url, text: &str, captured_at: DateTime<Utc>) -> SinkResult<()> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let path = self.path_for(url);
        let staging = self.staging_path_for(url);

        if let Err(e) = tokio::fs::write(&staging, format_page(url, text, captured_at)).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(e.into());
        }

        tracing::debug!(url = %url, path = %path.display(), "Wrote page");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_file_name_for_root() {
        assert_eq!(
            file_name_for(&url("https://example.com/")),
            "example.com_.txt"
        );
    }

    #[test]
    fn test_file_name_for_http_with_port() {
        assert_eq!(
            file_name_for(&url("http://127.0.0.1:8080/a/b")),
            "127.0.0.1:8080_a_b.txt"
        );
    }

    #[test]
    fn test_file_name_keeps_query() {
        assert_eq!(
            file_name_for(&url("https://example.com/list?page=2")),
            "example.com_list?page=2.txt"
        );
    }

    #[test]
    fn test_format_page_header() {
        let captured_at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let body = format_page(&url("https://example.com/"), "# Title", captured_at);
        assert_eq!(
            body,
            "URL: https://example.com/\nTimestamp: 2024-03-09 14:05:07\n\n# Title"
        );
    }

    #[tokio::test]
    async fn test_write_creates_directory_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("pages"));
        let page = url("https://example.com/docs");

        sink.write(&page, "hello", Utc::now()).await.unwrap();

        let content = std::fs::read_to_string(sink.path_for(&page)).unwrap();
        assert!(content.starts_with("URL: https://example.com/docs\nTimestamp: "));
        assert!(content.ends_with("\n\nhello"));
    }

    #[tokio::test]
    async fn test_write_overwrites_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let page = url("https://example.com/");

        sink.write(&page, "first", Utc::now()).await.unwrap();
        sink.write(&page, "second", Utc::now()).await.unwrap();

        let content = std::fs::read_to_string(sink.path_for(&page)).unwrap();
        assert!(content.ends_with("second"));
        assert!(!content.contains("first"));
    }

    #[tokio::test]
    async fn test_concurrent_writes_to_colliding_names_stay_whole() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());
        let nested = url("https://e.test/a/b");
        let flat = url("https://e.test/a_b");
        assert_eq!(sink.path_for(&nested), sink.path_for(&flat));

        let long_text = "x".repeat(200_000);
        for _ in 0..50 {
            let (a, b) = tokio::join!(
                sink.write(&nested, &long_text, Utc::now()),
                sink.write(&flat, "short", Utc::now())
            );
            a.unwrap();
            b.unwrap();

            let content = std::fs::read_to_string(sink.path_for(&flat)).unwrap();
            let whole_long = content.starts_with("URL: https://e.test/a/b\n")
                && content.ends_with(&format!("\n\n{}", long_text));
            let whole_short = content.starts_with("URL: https://e.test/a_b\n")
                && content.ends_with("\n\nshort");
            assert!(whole_long || whole_short, "file mixes two pages");
        }

        // No staging files left behind
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }
}
