//! Admission filtering and priority hints
//!
//! The content filter decides which discovered URLs are worth queueing at
//! all, assigns the initial priority hint, and judges fetched HTML before
//! a success is recorded. The domain blacklist lives in the submodule.

mod blacklist;

pub use blacklist::DomainBlacklist;

/// Floor on any computed priority
pub const MIN_PRIORITY: f32 = 0.1;

/// Ceiling on any computed priority
pub const MAX_PRIORITY: f32 = 2.0;

/// Priority lost per level of link depth
const DEPTH_PENALTY: f32 = 0.1;

/// URLs longer than this are never crawlable
const MAX_CRAWLABLE_URL_LEN: usize = 500;

/// URLs longer than this take a priority penalty
const LONG_URL_LEN: usize = 200;

/// Bounds on plausible HTML document sizes, in bytes
const MIN_CONTENT_SIZE: usize = 500;
const MAX_CONTENT_SIZE: usize = 2 * 1024 * 1024;

/// Minimum alphanumeric characters of visible text in a quality page
const MIN_TEXT_CHARACTERS: usize = 200;

const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".ico", ".css", ".js", ".pdf", ".zip", ".gz",
    ".tar", ".mp3", ".mp4", ".avi", ".mov", ".woff", ".woff2", ".ttf", ".exe", ".dmg",
];

const DEFAULT_EXCLUDED_PATTERNS: &[&str] = &[
    "/login", "/logout", "/signin", "/signup", "/register", "/cart", "/checkout",
    "/wp-admin", "/cgi-bin", "mailto:", "javascript:", "replytocom=", "sessionid=",
];

/// URL and content admission rules
///
/// Rule sets are fixed at construction; `new` uses the built-in defaults
/// and `with_rules` accepts operator-supplied lists.
pub struct ContentFilter {
    excluded_extensions: Vec<String>,
    excluded_patterns: Vec<String>,
    high_priority_domains: Vec<String>,
}

impl ContentFilter {
    /// Creates a filter with the built-in exclusion lists
    pub fn new() -> Self {
        Self::with_rules(
            DEFAULT_EXCLUDED_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            DEFAULT_EXCLUDED_PATTERNS.iter().map(|s| s.to_string()).collect(),
            Vec::new(),
        )
    }

    /// Creates a filter with explicit rule sets
    pub fn with_rules(
        excluded_extensions: Vec<String>,
        excluded_patterns: Vec<String>,
        high_priority_domains: Vec<String>,
    ) -> Self {
        Self {
            excluded_extensions,
            excluded_patterns,
            high_priority_domains,
        }
    }

    /// Whether a URL is worth fetching at all
    ///
    /// Rejects URLs containing an excluded extension or pattern anywhere
    /// in their lowercased form, and anything over 500 bytes.
    pub fn is_crawlable(&self, url: &str) -> bool {
        if url.len() > MAX_CRAWLABLE_URL_LEN {
            return false;
        }

        let lower = url.to_lowercase();

        if self.excluded_extensions.iter().any(|ext| lower.contains(ext.as_str())) {
            return false;
        }

        if self.excluded_patterns.iter().any(|pat| lower.contains(pat.as_str())) {
            return false;
        }

        true
    }

    /// Initial priority hint for a discovered URL
    ///
    /// Base priority decays with depth and is boosted for high-priority,
    /// educational, government, news and reference domains; very long URLs
    /// are penalized. The result lands in the [0.1, 2.0] band.
    pub fn calculate_priority(&self, url: &str, depth: u32) -> f32 {
        let domain = crate::url::extract_domain(url).unwrap_or_default();

        let mut priority = (1.0 - depth as f32 * DEPTH_PENALTY).max(MIN_PRIORITY);

        if self.high_priority_domains.iter().any(|d| d == &domain) {
            priority *= 1.5;
        }

        if domain.contains(".edu") || domain.contains(".gov") {
            priority *= 1.3;
        }

        if domain.contains("news") || domain.contains("wiki") {
            priority *= 1.2;
        }

        if url.len() > LONG_URL_LEN {
            priority *= 0.8;
        }

        priority.min(MAX_PRIORITY)
    }

    /// Whether fetched HTML is substantial enough to count as a success
    pub fn is_high_quality(&self, html: &str) -> bool {
        if html.len() < MIN_CONTENT_SIZE || html.len() > MAX_CONTENT_SIZE {
            return false;
        }

        if !html.contains("<html") && !html.contains("<!DOCTYPE") {
            return false;
        }

        let mut text_chars = 0;
        let mut in_tag = false;
        for c in html.chars() {
            match c {
                '<' => in_tag = true,
                '>' => in_tag = false,
                c if !in_tag && c.is_alphanumeric() => text_chars += 1,
                _ => {}
            }
        }

        text_chars > MIN_TEXT_CHARACTERS
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new()
    }
}
