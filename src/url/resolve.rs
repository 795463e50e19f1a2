use url::Url;

/// Resolves a link destination against a base URL
///
/// Follows the standard URL-join rules: relative paths, protocol-relative
/// references and fragment-only references are all resolved against `base`.
/// The result is kept verbatim, fragment included.
///
/// Returns None if the destination cannot be resolved or does not resolve to
/// an HTTP(S) URL (`javascript:`, `mailto:`, `tel:`, `data:` and the like).
///
/// # Examples
///
/// ```
/// use url::Url;
/// use sitescrape::url::resolve_link;
///
/// let base = Url::parse("https://example.com/docs/intro").unwrap();
/// assert_eq!(
///     resolve_link("setup", &base).unwrap().as_str(),
///     "https://example.com/docs/setup"
/// );
/// assert!(resolve_link("mailto:someone@example.com", &base).is_none());
/// ```
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let resolved = base.join(href).ok()?;

    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}
