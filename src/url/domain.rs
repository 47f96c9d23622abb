use crate::UrlError;
use url::Url;

/// Extracts the lowercase domain from a URL string
///
/// Returns None when the URL cannot be parsed or has no host.
///
/// # Examples
///
/// ```
/// use kumo_frontier::url::extract_domain;
///
/// assert_eq!(
///     extract_domain("https://Blog.Example.COM/post"),
///     Some("blog.example.com".to_string())
/// );
/// assert_eq!(extract_domain("not a url"), None);
/// ```
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    parsed.host_str().map(|h| h.to_lowercase())
}

/// Resolves an href found on a page against the page's base URL
///
/// Absolute hrefs are returned as-is; relative and root-relative hrefs are
/// joined against the base. The result is not normalized; callers pass it
/// through `normalize` before enqueueing.
pub fn resolve_relative(base: &str, href: &str) -> Result<String, UrlError> {
    let base_url = Url::parse(base).map_err(|e| UrlError::Parse(e.to_string()))?;
    let resolved = base_url
        .join(href)
        .map_err(|e| UrlError::Parse(e.to_string()))?;
    Ok(resolved.to_string())
}
