//! Content fingerprints for change detection
//!
//! Fingerprints are 64-bit xxh3 hashes rendered as fixed-width hex strings.
//! They only need to be collision-resistant enough to decide whether a page
//! changed between two crawls; they are not cryptographic.

use xxhash_rust::xxh3::xxh3_64;

/// Sentinel fingerprint for empty content
pub const EMPTY_HASH: &str = "empty";

/// Maximum byte length of a `<p>…</p>` body considered for the key digest
const MAX_PARAGRAPH_LEN: usize = 1000;

/// Fallback prefix length when no title or paragraph is found
const FALLBACK_PREFIX_LEN: usize = 2048;

/// Hashes the full content bytes.
///
/// Identical byte contents always hash identically; empty input maps to the
/// reserved [`EMPTY_HASH`] sentinel.
pub fn hash_content(content: &[u8]) -> String {
    if content.is_empty() {
        return EMPTY_HASH.to_string();
    }
    format!("{:016x}", xxh3_64(content))
}

/// Hashes the key parts of an HTML document.
///
/// The digest concatenates the text between the first `<title>` and its
/// closing tag and the text of the first `<p>` under 1000 bytes. When
/// neither is present, the first 2048 bytes of the input are hashed instead.
/// This keeps the fingerprint stable across cosmetic edits elsewhere in the
/// page.
pub fn hash_key_content(html: &str) -> String {
    if html.is_empty() {
        return EMPTY_HASH.to_string();
    }

    let mut key_content = String::new();

    if let Some(title) = between(html, "<title>", "</title>") {
        key_content.push_str(title);
    }

    if let Some(paragraph) = between(html, "<p>", "</p>") {
        if paragraph.len() < MAX_PARAGRAPH_LEN {
            key_content.push_str(paragraph);
        }
    }

    if key_content.is_empty() {
        // No key parts found: hash the leading bytes of the raw input
        let end = html.len().min(FALLBACK_PREFIX_LEN);
        return hash_content(&html.as_bytes()[..end]);
    }

    hash_content(key_content.as_bytes())
}

/// Returns the substring between the first `open` tag and the next `close`
/// tag after it, or None when either is missing.
fn between<'a>(html: &'a str, open: &str, close: &str) -> Option<&'a str> {
    let start = html.find(open)? + open.len();
    let end = html[start..].find(close)? + start;
    Some(&html[start..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_sentinel() {
        assert_eq!(hash_content(b""), EMPTY_HASH);
        assert_eq!(hash_key_content(""), EMPTY_HASH);
    }

    #[test]
    fn test_identical_content_identical_hash() {
        let a = hash_content(b"hello world");
        let b = hash_content(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_content_different_hash() {
        assert_ne!(hash_content(b"hello"), hash_content(b"world"));
    }

    #[test]
    fn test_fixed_width_output() {
        assert_eq!(hash_content(b"x").len(), 16);
        assert_eq!(hash_content(b"a much longer piece of content").len(), 16);
    }

    #[test]
    fn test_key_content_uses_title_and_paragraph() {
        let a = "<html><title>News</title><p>First story</p><footer>v1</footer></html>";
        let b = "<html><title>News</title><p>First story</p><footer>v2</footer></html>";
        // Cosmetic footer change does not affect the key digest
        assert_eq!(hash_key_content(a), hash_key_content(b));

        let c = "<html><title>News</title><p>Different story</p></html>";
        assert_ne!(hash_key_content(a), hash_key_content(c));
    }

    #[test]
    fn test_key_content_skips_oversized_paragraph() {
        let long_p = "x".repeat(MAX_PARAGRAPH_LEN + 1);
        let a = format!("<title>T</title><p>{}</p>", long_p);
        let b = "<title>T</title>".to_string();
        // Oversized paragraph is excluded, so only the title contributes
        assert_eq!(hash_key_content(&a), hash_key_content(&b));
    }

    #[test]
    fn test_key_content_falls_back_to_prefix() {
        let html = "plain text with no markup at all";
        assert_eq!(hash_key_content(html), hash_content(html.as_bytes()));
    }

    #[test]
    fn test_key_content_fallback_truncates_long_input() {
        let mut html = "z".repeat(FALLBACK_PREFIX_LEN);
        let prefix_hash = hash_content(html.as_bytes());
        html.push_str("trailing content beyond the window");
        assert_eq!(hash_key_content(&html), prefix_hash);
    }

    #[test]
    fn test_unclosed_title_ignored() {
        let html = "<title>never closed";
        // Falls back to the raw prefix since no key part was extracted
        assert_eq!(hash_key_content(html), hash_content(html.as_bytes()));
    }
}
