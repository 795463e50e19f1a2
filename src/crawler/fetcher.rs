//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client (connection pool, timeouts, user agent)
//! - GET requests for page content
//! - Classifying failures as transient (transport) or permanent (status)
//!
//! Deciding whether to try again is the retry policy's job, not the fetcher's.

use crate::config::UserAgentConfig;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Result of a single fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// The server answered with a 2xx status
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content, decoded as text
        body: String,
    },

    /// Network or transport failure (timeout, DNS, connection reset, body read)
    TransientFailure {
        /// Error description
        reason: String,
    },

    /// The server answered with a non-2xx status
    PermanentFailure {
        /// The HTTP status code
        status_code: u16,
    },
}

impl FetchResult {
    /// Returns true for a successful fetch
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { status_code, .. } => write!(f, "HTTP {}", status_code),
            Self::TransientFailure { reason } => write!(f, "{}", reason),
            Self::PermanentFailure { status_code } => write!(f, "Status Code: {}", status_code),
        }
    }
}

/// Something that can fetch one URL
///
/// Implementations are shared across all workers and must be safe for
/// concurrent use.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issues one request for `url` and classifies the outcome
    async fn fetch(&self, url: &Url) -> FetchResult;
}

/// Builds an HTTP client with proper configuration
///
/// One client is built per crawl and shared by every worker, so TCP and TLS
/// connections are reused across pages of the same site.
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Timeout applied to each whole request
///
/// # Example
///
/// ```no_run
/// use sitescrape::config::UserAgentConfig;
/// use sitescrape::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout)
        .pool_idle_timeout(Duration::from_secs(30))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetcher backed by a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult {
        fetch_url(&self.client, url).await
    }
}

/// Fetches a URL with one GET request
///
/// # Classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 2xx | Success |
/// | Any other status | PermanentFailure (status code) |
/// | Timeout, DNS, connect, reset | TransientFailure |
/// | Body could not be read | TransientFailure |
///
/// Redirects are followed by the client; the status classified is the final one.
pub async fn fetch_url(client: &Client, url: &Url) -> FetchResult {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_transport_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::PermanentFailure {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().clone();
    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => FetchResult::TransientFailure {
            reason: format!("Failed to read body: {}", e),
        },
    }
}

/// Maps a reqwest error to a transient failure with a readable cause
fn classify_transport_error(e: &reqwest::Error) -> FetchResult {
    let reason = if e.is_timeout() {
        format!("Request timeout: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_redirect() {
        format!("Redirect error: {}", e)
    } else {
        e.to_string()
    };
    FetchResult::TransientFailure { reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        build_http_client(&UserAgentConfig::default(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10));
        assert!(client.is_ok());
    }

    #[test]
    fn test_display() {
        let failure = FetchResult::PermanentFailure { status_code: 404 };
        assert_eq!(failure.to_string(), "Status Code: 404");
        assert!(!failure.is_success());
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body><p>hi</p></body></html>")
                    .insert_header("content-type", "text/html"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
        match fetch_url(&client(), &url).await {
            FetchResult::Success {
                final_url,
                status_code,
                body,
            } => {
                assert_eq!(final_url, url);
                assert_eq!(status_code, 200);
                assert!(body.contains("<p>hi</p>"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_other_2xx_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(203).set_body_string("ok"))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        assert!(fetch_url(&client(), &url).await.is_success());
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        assert_eq!(
            fetch_url(&client(), &url).await,
            FetchResult::PermanentFailure { status_code: 503 }
        );
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_transient() {
        // Bind then drop a listener so the port is very likely closed
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();
        assert!(matches!(
            fetch_url(&client(), &url).await,
            FetchResult::TransientFailure { .. }
        ));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client =
            build_http_client(&UserAgentConfig::default(), Duration::from_millis(200)).unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        assert!(matches!(
            fetch_url(&client, &url).await,
            FetchResult::TransientFailure { .. }
        ));
    }
}
