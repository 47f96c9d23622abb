//! Frontier record types and their scheduling order

use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::time::Instant;

/// A discovered URL as handed to the frontier by link extraction
#[derive(Debug, Clone)]
pub struct UrlRecord {
    /// Normalized URL
    pub url: String,

    /// Priority hint from the content filter (larger is more important)
    pub priority: f32,

    /// Link distance from the seed set
    pub depth: u32,

    /// Domain of the page this URL was discovered on
    pub referring_domain: String,

    /// Monotonic discovery time
    pub discovered_at: Instant,
}

impl UrlRecord {
    pub fn new(url: impl Into<String>, priority: f32, depth: u32, referring_domain: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            priority,
            depth,
            referring_domain: referring_domain.into(),
            discovered_at: Instant::now(),
        }
    }
}

/// A frontier entry carrying its scheduling decision
///
/// Created at enqueue time from a [`UrlRecord`] plus the URL's metadata;
/// workers receive one back from `dequeue` and may hand it straight back
/// via `enqueue_smart` when re-queueing a URL for its next visit.
#[derive(Debug, Clone)]
pub struct ScheduledUrl {
    pub url: String,
    pub priority: f32,
    pub depth: u32,
    pub referring_domain: String,
    pub discovered_at: Instant,

    /// When this URL becomes eligible to fetch
    pub expected_crawl_at: DateTime<Utc>,
}

impl ScheduledUrl {
    /// Attaches a scheduling decision to a discovered record
    pub fn from_record(record: UrlRecord, expected_crawl_at: DateTime<Utc>, priority: f32) -> Self {
        Self {
            url: record.url,
            priority,
            depth: record.depth,
            referring_domain: record.referring_domain,
            discovered_at: record.discovered_at,
            expected_crawl_at,
        }
    }

    /// Whether this entry is eligible to fetch at `now`
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.expected_crawl_at <= now
    }
}

// Heap order: ready entries outrank not-ready ones; between not-ready
// entries the earlier due time wins; otherwise the higher filter priority,
// then the shallower depth, then the URL string for determinism. Due times
// are deliberately not compared between two ready entries — once both are
// due, priority decides. Readiness moves with the clock, so this is not a
// stable total order across time; dequeue re-checks the top's readiness
// rather than trusting heap position.
impl Ord for ScheduledUrl {
    fn cmp(&self, other: &Self) -> Ordering {
        let now = Utc::now();
        let readiness = match (self.is_ready(now), other.is_ready(now)) {
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => other.expected_crawl_at.cmp(&self.expected_crawl_at),
            (true, true) => Ordering::Equal,
        };

        readiness
            .then_with(|| {
                // Priorities are computed values, never NaN
                self.priority
                    .partial_cmp(&other.priority)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| other.depth.cmp(&self.depth))
            .then_with(|| self.url.cmp(&other.url))
    }
}

impl PartialOrd for ScheduledUrl {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledUrl {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledUrl {}
