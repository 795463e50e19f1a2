//! URL handling module for Sitescrape
//!
//! This module provides seed parsing, the host-based scope check, and link
//! resolution. URLs are compared by their serialized form after resolution;
//! no further canonicalization happens, so `/a` and `/a/` are different pages.

mod domain;
mod resolve;

use crate::{UrlError, UrlResult};
use url::Url;

// Re-export main functions
pub use domain::{is_in_scope, netloc};
pub use resolve::resolve_link;

/// Parses the seed URL a crawl starts from
///
/// The seed defines the crawl scope, so it must be an absolute HTTP(S) URL
/// with a host.
///
/// # Examples
///
/// ```
/// use sitescrape::url::parse_seed;
///
/// let seed = parse_seed("https://example.com/docs/").unwrap();
/// assert_eq!(seed.host_str(), Some("example.com"));
///
/// assert!(parse_seed("ftp://example.com/").is_err());
/// assert!(parse_seed("not a url").is_err());
/// ```
pub fn parse_seed(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    Ok(url)
}
