//! Per-URL adaptive scheduling state and the revisit policy
//!
//! A `UrlMetadata` records what the crawler has learned about one URL: when
//! it was last fetched, when its content last changed, and how the revisit
//! interval should stretch while the content stays stable. The policy
//! methods are pure over `(record, now)` so they can be exercised at any
//! point in simulated time.

use chrono::{DateTime, Duration, Utc};

/// Cap on the stable-content backoff multiplier
const MAX_BACKOFF_MULTIPLIER: u32 = 8;

/// Upper clamp on the revisit interval, in hours (30 days)
const MAX_BACKOFF_HOURS: i64 = 24 * 30;

/// Lower floor on the revisit interval, in minutes
const MIN_BACKOFF_MINUTES: i64 = 15;

/// Cap on the consecutive temporary-failure counter
const MAX_TEMPORARY_FAILURES: u32 = 5;

/// Adaptive scheduling record for a single URL
#[derive(Debug, Clone, PartialEq)]
pub struct UrlMetadata {
    /// When the URL was last fetched successfully
    pub last_crawl_at: DateTime<Utc>,

    /// When the content fingerprint last changed
    pub previous_change_at: DateTime<Utc>,

    /// When the URL becomes eligible for its next fetch
    pub expected_next_crawl: DateTime<Utc>,

    /// Fingerprint of the content seen at the last successful fetch
    pub content_hash: String,

    /// Interval multiplier while content stays stable: 1, 2, 4 or 8
    pub backoff_multiplier: u32,

    /// Number of successful fetches of this URL
    pub crawl_count: u32,

    /// Observed change frequency in changes per day
    pub change_frequency: f32,

    /// Consecutive transient fetch failures, saturating at 5
    pub temporary_failures: u32,
}

impl UrlMetadata {
    /// Creates a fresh record for a URL that has never been fetched
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            last_crawl_at: now,
            previous_change_at: now,
            expected_next_crawl: now,
            content_hash: String::new(),
            backoff_multiplier: 1,
            crawl_count: 0,
            change_frequency: 0.0,
            temporary_failures: 0,
        }
    }

    /// Recomputes `expected_next_crawl` from the change history
    ///
    /// The interval grows with the time since the last observed change,
    /// scaled by the backoff multiplier, clamped to [1 hour, 30 days] and
    /// floored at 15 minutes.
    pub fn update_next_crawl_time(&mut self, now: DateTime<Utc>) {
        let since_change_hours = (now - self.previous_change_at).num_hours();
        let backoff_hours = (since_change_hours * i64::from(self.backoff_multiplier))
            .clamp(1, MAX_BACKOFF_HOURS);
        let backoff_minutes = (backoff_hours * 60).max(MIN_BACKOFF_MINUTES);
        self.expected_next_crawl = now + Duration::minutes(backoff_minutes);
    }

    /// Records an observed content change: the multiplier resets and the
    /// change clock restarts at `now`
    pub fn reset_backoff_on_change(&mut self, now: DateTime<Utc>) {
        self.backoff_multiplier = 1;
        self.previous_change_at = now;
        self.update_next_crawl_time(now);
    }

    /// Records stable content: the multiplier doubles up to the cap
    pub fn increase_backoff(&mut self, now: DateTime<Utc>) {
        self.backoff_multiplier = (self.backoff_multiplier * 2).min(MAX_BACKOFF_MULTIPLIER);
        self.update_next_crawl_time(now);
    }

    /// Records a transient fetch failure, applying the 2-32 minute ladder
    pub fn record_temporary_failure(&mut self, now: DateTime<Utc>) {
        self.temporary_failures = (self.temporary_failures + 1).min(MAX_TEMPORARY_FAILURES);
        let backoff_minutes = 2i64 << (self.temporary_failures - 1);
        self.expected_next_crawl = now + Duration::minutes(backoff_minutes);
    }

    /// Whether the URL is eligible to fetch at `now`
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        now >= self.expected_next_crawl
    }

    /// Readiness-based priority
    ///
    /// Overdue URLs score above 1.0, growing by 1.0 per overdue hour. URLs
    /// not yet due decay toward 0.1 over the next 24 hours.
    pub fn calculate_priority(&self, now: DateTime<Utc>) -> f32 {
        if now >= self.expected_next_crawl {
            let overdue_minutes = (now - self.expected_next_crawl).num_minutes();
            1.0 + overdue_minutes as f32 / 60.0
        } else {
            let minutes_until_due = (self.expected_next_crawl - now).num_minutes();
            (1.0 - minutes_until_due as f32 / (24.0 * 60.0)).max(0.1)
        }
    }

    /// Serializes the record into its durable pipe-delimited form
    ///
    /// Timestamps are whole seconds since the epoch; the field order is
    /// fixed and matched by `from_record_string`.
    pub fn to_record_string(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}|{}",
            self.last_crawl_at.timestamp(),
            self.previous_change_at.timestamp(),
            self.expected_next_crawl.timestamp(),
            self.content_hash,
            self.backoff_multiplier,
            self.crawl_count,
            self.change_frequency,
            self.temporary_failures,
        )
    }

    /// Deserializes a durable record, tolerating damage
    ///
    /// Partial or malformed records yield a fresh default rather than an
    /// error: a lost record only means the URL is treated as new again.
    pub fn from_record_string(value: &str, now: DateTime<Utc>) -> Self {
        let mut parts = value.split('|');

        let parsed = (|| {
            let last_crawl_at = parse_timestamp(parts.next()?)?;
            let previous_change_at = parse_timestamp(parts.next()?)?;
            let expected_next_crawl = parse_timestamp(parts.next()?)?;
            let content_hash = parts.next()?.to_string();
            let backoff_multiplier = parts.next()?.parse().ok()?;
            let crawl_count = parts.next()?.parse().ok()?;
            let change_frequency = parts.next()?.parse().ok()?;
            let temporary_failures = parts.next()?.parse().ok()?;

            Some(Self {
                last_crawl_at,
                previous_change_at,
                expected_next_crawl,
                content_hash,
                backoff_multiplier,
                crawl_count,
                change_frequency,
                temporary_failures,
            })
        })();

        parsed.unwrap_or_else(|| Self::new(now))
    }
}

fn parse_timestamp(field: &str) -> Option<DateTime<Utc>> {
    let secs: i64 = field.parse().ok()?;
    DateTime::from_timestamp(secs, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn test_new_record_defaults() {
        let now = at(1_700_000_000);
        let meta = UrlMetadata::new(now);

        assert_eq!(meta.last_crawl_at, now);
        assert_eq!(meta.previous_change_at, now);
        assert_eq!(meta.expected_next_crawl, now);
        assert_eq!(meta.content_hash, "");
        assert_eq!(meta.backoff_multiplier, 1);
        assert_eq!(meta.crawl_count, 0);
        assert_eq!(meta.temporary_failures, 0);
        assert!(meta.is_ready(now));
    }

    #[test]
    fn test_update_next_crawl_floor() {
        let now = at(1_700_000_000);
        let mut meta = UrlMetadata::new(now);

        // Content just changed: the minimum interval of one hour applies,
        // which already satisfies the 15-minute floor
        meta.update_next_crawl_time(now);
        assert!(meta.expected_next_crawl - now >= Duration::minutes(15));
        assert_eq!(meta.expected_next_crawl, now + Duration::hours(1));
    }

    #[test]
    fn test_update_next_crawl_scales_with_stability() {
        let now = at(1_700_000_000);
        let mut meta = UrlMetadata::new(now);
        meta.previous_change_at = now - Duration::hours(4);

        meta.update_next_crawl_time(now);
        assert_eq!(meta.expected_next_crawl, now + Duration::hours(4));

        meta.backoff_multiplier = 2;
        meta.update_next_crawl_time(now);
        assert_eq!(meta.expected_next_crawl, now + Duration::hours(8));
    }

    #[test]
    fn test_update_next_crawl_clamped_to_thirty_days() {
        let now = at(1_700_000_000);
        let mut meta = UrlMetadata::new(now);
        meta.previous_change_at = now - Duration::days(365);
        meta.backoff_multiplier = 8;

        meta.update_next_crawl_time(now);
        assert_eq!(meta.expected_next_crawl, now + Duration::days(30));
    }

    #[test]
    fn test_reset_backoff_on_change() {
        let now = at(1_700_000_000);
        let mut meta = UrlMetadata::new(now - Duration::days(10));
        meta.backoff_multiplier = 8;

        meta.reset_backoff_on_change(now);
        assert_eq!(meta.backoff_multiplier, 1);
        assert_eq!(meta.previous_change_at, now);
        assert_eq!(meta.expected_next_crawl, now + Duration::hours(1));
    }

    #[test]
    fn test_increase_backoff_doubles_and_caps() {
        let now = at(1_700_000_000);
        let mut meta = UrlMetadata::new(now);

        for expected in [2, 4, 8, 8, 8] {
            meta.increase_backoff(now);
            assert_eq!(meta.backoff_multiplier, expected);
        }
    }

    #[test]
    fn test_backoff_doubling_doubles_interval() {
        let now = at(1_700_000_000);
        let mut meta = UrlMetadata::new(now);
        meta.previous_change_at = now - Duration::hours(3);

        meta.increase_backoff(now);
        let first = meta.expected_next_crawl - now;
        meta.increase_backoff(now);
        let second = meta.expected_next_crawl - now;

        assert_eq!(first, Duration::hours(6));
        assert_eq!(second, Duration::hours(12));
    }

    #[test]
    fn test_failure_ladder() {
        let now = at(1_700_000_000);
        let mut meta = UrlMetadata::new(now);

        for minutes in [2, 4, 8, 16, 32] {
            meta.record_temporary_failure(now);
            assert_eq!(meta.expected_next_crawl, now + Duration::minutes(minutes));
        }

        // A sixth failure saturates at the 32-minute band
        meta.record_temporary_failure(now);
        assert_eq!(meta.temporary_failures, 5);
        assert_eq!(meta.expected_next_crawl, now + Duration::minutes(32));
    }

    #[test]
    fn test_priority_overdue_grows() {
        let now = at(1_700_000_000);
        let mut meta = UrlMetadata::new(now);
        meta.expected_next_crawl = now - Duration::hours(2);

        let p = meta.calculate_priority(now);
        assert!((p - 3.0).abs() < 1e-4);

        // Monotone in overdue time
        let later = now + Duration::hours(1);
        assert!(meta.calculate_priority(later) > p);
    }

    #[test]
    fn test_priority_not_due_decays() {
        let now = at(1_700_000_000);
        let mut meta = UrlMetadata::new(now);
        meta.expected_next_crawl = now + Duration::hours(12);

        let p = meta.calculate_priority(now);
        assert!((p - 0.5).abs() < 1e-4);

        // Far-future URLs bottom out at 0.1
        meta.expected_next_crawl = now + Duration::days(30);
        assert!((meta.calculate_priority(now) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_priority_exactly_due_is_one() {
        let now = at(1_700_000_000);
        let mut meta = UrlMetadata::new(now);
        meta.expected_next_crawl = now;
        assert!((meta.calculate_priority(now) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_serialization_round_trip() {
        let now = at(1_700_000_000);
        let mut meta = UrlMetadata::new(now);
        meta.last_crawl_at = at(1_700_000_100);
        meta.previous_change_at = at(1_699_990_000);
        meta.expected_next_crawl = at(1_700_010_000);
        meta.content_hash = "00deadbeef001234".to_string();
        meta.backoff_multiplier = 4;
        meta.crawl_count = 17;
        meta.change_frequency = 0.5;
        meta.temporary_failures = 2;

        let restored = UrlMetadata::from_record_string(&meta.to_record_string(), now);
        assert_eq!(restored, meta);
    }

    #[test]
    fn test_round_trip_empty_hash() {
        let now = at(1_700_000_000);
        let meta = UrlMetadata::new(now);
        let restored = UrlMetadata::from_record_string(&meta.to_record_string(), now);
        assert_eq!(restored, meta);
    }

    #[test]
    fn test_deserialize_malformed_returns_default() {
        let now = at(1_700_000_000);
        for bad in ["", "garbage", "1|2|3", "a|b|c|d|e|f|g|h", "1|2|3|h|1|0|x|0"] {
            let meta = UrlMetadata::from_record_string(bad, now);
            assert_eq!(meta, UrlMetadata::new(now), "input {:?}", bad);
        }
    }
}
