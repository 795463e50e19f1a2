use url::Url;

/// Returns the network location of a URL: `host` or `host:port`
///
/// The port appears only when it is explicit and not the scheme's default,
/// since the URL parser drops default ports.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitescrape::url::netloc;
///
/// let url = Url::parse("https://example.com/path").unwrap();
/// assert_eq!(netloc(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("http://example.com:8080/").unwrap();
/// assert_eq!(netloc(&url), Some("example.com:8080".to_string()));
/// ```
pub fn netloc(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Checks whether `candidate` lies in the crawl scope defined by `base`
///
/// True iff both URLs have a host and their `host[:port]` strings are equal.
/// Scheme and path are ignored. URLs without a host (`mailto:`, `data:`) are
/// never in scope.
pub fn is_in_scope(base: &Url, candidate: &Url) -> bool {
    match (netloc(base), netloc(candidate)) {
        (Some(base_loc), Some(candidate_loc)) => base_loc == candidate_loc,
        _ => false,
    }
}
