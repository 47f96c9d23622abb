use crate::UrlError;
use url::Url;

/// Maximum accepted URL length in bytes
pub const MAX_URL_LEN: usize = 2048;

/// Minimum plausible URL length ("http://a.b" is 10 bytes)
const MIN_URL_LEN: usize = 10;

/// Tracking query parameters removed during normalization.
///
/// Only these enumerated keys are dropped; every other parameter survives
/// in its original order.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "ref",
    "source",
    "campaign_id",
    "ad_id",
];

/// Normalizes a URL into the canonical form the scheduler keys on
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed or longer than [`MAX_URL_LEN`]
/// 2. Require an http or https scheme (lowercased by the parser)
/// 3. Lowercase the host and strip a leading `www.`
/// 4. Remove the fragment
/// 5. Remove the enumerated tracking parameters, keeping the remaining
///    query parameters in their original order
/// 6. Collapse duplicate slashes in the path
/// 7. Remove the trailing slash except at the root
///
/// The result is idempotent: normalizing an already-normalized URL returns
/// it unchanged.
///
/// # Examples
///
/// ```
/// use kumo_frontier::url::normalize;
///
/// let url = normalize("https://WWW.Example.COM/a//b/?utm_source=x#top").unwrap();
/// assert_eq!(url, "https://example.com/a/b");
/// ```
pub fn normalize(url_str: &str) -> Result<String, UrlError> {
    if url_str.len() > MAX_URL_LEN {
        return Err(UrlError::TooLong(url_str.len()));
    }

    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    // Lowercase the host and strip the www. prefix
    match url.host_str() {
        Some(host) => {
            let mut normalized_host = host.to_lowercase();
            if let Some(stripped) = normalized_host.strip_prefix("www.") {
                normalized_host = stripped.to_string();
            }
            url.set_host(Some(&normalized_host))
                .map_err(|e| UrlError::Parse(e.to_string()))?;
        }
        None => return Err(UrlError::MissingDomain),
    }

    url.set_fragment(None);

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    if url.query().is_some() {
        let kept: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        if kept.is_empty() {
            url.set_query(None);
        } else {
            let query = kept
                .iter()
                .map(|(k, v)| {
                    if v.is_empty() {
                        k.clone()
                    } else {
                        format!("{}={}", k, v)
                    }
                })
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query));
        }
    }

    Ok(url.to_string())
}

/// Checks whether a string is a plausible crawl target
///
/// A valid URL uses http or https and has a length within
/// `[10, MAX_URL_LEN]` bytes. This is a cheap pre-filter; `normalize` is
/// the authority on well-formedness.
pub fn is_valid(url: &str) -> bool {
    if url.len() < MIN_URL_LEN || url.len() > MAX_URL_LEN {
        return false;
    }
    url.starts_with("http://") || url.starts_with("https://")
}

/// Collapses duplicate slashes and removes the trailing slash (except root)
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_scheme_and_host() {
        let result = normalize("HTTP://EXAMPLE.COM/Page").unwrap();
        assert_eq!(result, "http://example.com/Page");
    }

    #[test]
    fn test_remove_www() {
        let result = normalize("https://www.example.com/page").unwrap();
        assert_eq!(result, "https://example.com/page");
    }

    #[test]
    fn test_remove_trailing_slash() {
        let result = normalize("https://example.com/page/").unwrap();
        assert_eq!(result, "https://example.com/page");
    }

    #[test]
    fn test_keep_root_slash() {
        let result = normalize("https://example.com/").unwrap();
        assert_eq!(result, "https://example.com/");
    }

    #[test]
    fn test_remove_fragment() {
        let result = normalize("https://example.com/page#section").unwrap();
        assert_eq!(result, "https://example.com/page");
    }

    #[test]
    fn test_collapse_duplicate_slashes() {
        let result = normalize("https://example.com///path//to///page").unwrap();
        assert_eq!(result, "https://example.com/path/to/page");
    }

    #[test]
    fn test_remove_all_tracking_params() {
        for param in TRACKING_PARAMS {
            let url = format!("https://example.com/page?{}=value", param);
            let result = normalize(&url).unwrap();
            assert_eq!(
                result, "https://example.com/page",
                "failed to remove {}",
                param
            );
        }
    }

    #[test]
    fn test_keeps_non_tracking_params_in_order() {
        let result =
            normalize("https://example.com/page?b=2&utm_medium=email&a=1&fbclid=x").unwrap();
        assert_eq!(result, "https://example.com/page?b=2&a=1");
    }

    #[test]
    fn test_enumerated_keys_only() {
        // utm_custom is not on the enumerated list and must survive
        let result = normalize("https://example.com/page?utm_custom=1").unwrap();
        assert_eq!(result, "https://example.com/page?utm_custom=1");
    }

    #[test]
    fn test_idempotent() {
        let urls = [
            "https://WWW.EXAMPLE.COM//a/b/?utm_source=t&x=1#frag",
            "http://example.com/",
            "https://example.com/page?a=1&b=2",
        ];
        for url in urls {
            let once = normalize(url).unwrap();
            let twice = normalize(&once).unwrap();
            assert_eq!(once, twice, "not idempotent for {}", url);
        }
    }

    #[test]
    fn test_invalid_scheme() {
        let result = normalize("ftp://example.com/file");
        assert!(matches!(result, Err(UrlError::InvalidScheme(_))));
    }

    #[test]
    fn test_malformed_url() {
        assert!(normalize("not a url").is_err());
    }

    #[test]
    fn test_too_long_rejected() {
        let url = format!("https://example.com/{}", "a".repeat(MAX_URL_LEN));
        assert!(matches!(normalize(&url), Err(UrlError::TooLong(_))));
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("https://example.com/"));
        assert!(is_valid("http://a.b/cd"));
        assert!(!is_valid("ftp://example.com/"));
        assert!(!is_valid("http://a"));
        let too_long = format!("https://example.com/{}", "a".repeat(MAX_URL_LEN));
        assert!(!is_valid(&too_long));
    }

    #[test]
    fn test_empty_path_becomes_root() {
        let result = normalize("https://example.com").unwrap();
        assert_eq!(result, "https://example.com/");
    }

    #[test]
    fn test_dot_segments_resolved() {
        let result = normalize("https://example.com/a/../b/./c").unwrap();
        assert_eq!(result, "https://example.com/b/c");
    }
}
