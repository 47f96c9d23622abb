//! Sharded, deduplicating, time-gated URL frontier
//!
//! The frontier holds every discovered-but-unfetched URL in one of 16
//! independent shards, each guarded by its own mutex. A URL's shard is
//! fixed by its hash, so deduplication is a purely shard-local question
//! and one shard's contention never blocks another. Dequeue starts at a
//! round-robin shard to keep selection fair across the keyspace.

use crate::frontier::{ScheduledUrl, UrlRecord};
use crate::metadata::MetadataStore;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BinaryHeap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use xxhash_rust::xxh3::xxh3_64;

/// Number of independent frontier shards
pub const FRONTIER_SHARDS: usize = 16;

/// Default bound on the total number of queued URLs
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 100_000;

/// Default bound on link depth
pub const DEFAULT_MAX_DEPTH: u32 = 5;

#[derive(Default)]
struct ShardState {
    queue: BinaryHeap<ScheduledUrl>,
    seen: HashSet<String>,
}

struct Shard {
    state: Mutex<ShardState>,
    /// Queue length mirror, readable without the mutex
    size: AtomicUsize,
}

impl Shard {
    fn new() -> Self {
        Self {
            state: Mutex::new(ShardState::default()),
            size: AtomicUsize::new(0),
        }
    }
}

/// Sharded priority frontier over discovered URLs
pub struct UrlFrontier {
    shards: Vec<Shard>,
    round_robin: AtomicUsize,
    max_queue_size: AtomicUsize,
    max_depth: AtomicU32,
    metadata: Arc<MetadataStore>,
}

impl UrlFrontier {
    /// Creates a frontier consulting `metadata` for scheduling decisions
    pub fn new(metadata: Arc<MetadataStore>) -> Self {
        Self::with_limits(metadata, DEFAULT_MAX_QUEUE_SIZE, DEFAULT_MAX_DEPTH)
    }

    /// Creates a frontier with explicit admission bounds
    pub fn with_limits(metadata: Arc<MetadataStore>, max_queue_size: usize, max_depth: u32) -> Self {
        Self {
            shards: (0..FRONTIER_SHARDS).map(|_| Shard::new()).collect(),
            round_robin: AtomicUsize::new(0),
            max_queue_size: AtomicUsize::new(max_queue_size),
            max_depth: AtomicU32::new(max_depth),
            metadata,
        }
    }

    /// The shard a URL routes to; stable for the life of the process
    pub fn shard_index(&self, url: &str) -> usize {
        xxh3_64(url.as_bytes()) as usize % FRONTIER_SHARDS
    }

    /// Offers one discovered URL to the frontier
    ///
    /// Returns true iff the URL was admitted. Rejection reasons: depth
    /// above the limit, URL already seen this run, or the queue at
    /// capacity. On admission the URL's metadata supplies the entry's
    /// `expected_crawl_at` and priority.
    pub fn enqueue(&self, record: UrlRecord) -> bool {
        if record.depth > self.max_depth.load(Ordering::Relaxed) {
            tracing::trace!("rejecting {} at depth {}", record.url, record.depth);
            return false;
        }

        // Metadata is consulted before the shard lock; a frontier-shard
        // lock is never held across a metadata-shard acquisition
        let meta = self.metadata.get_or_create(&record.url);
        let priority = meta.calculate_priority(Utc::now());

        let shard = &self.shards[self.shard_index(&record.url)];
        let mut state = shard.state.lock();

        if state.seen.contains(&record.url) {
            return false;
        }

        if self.size() >= self.max_queue_size.load(Ordering::Relaxed) {
            tracing::debug!("frontier full; rejecting {}", record.url);
            return false;
        }

        state.seen.insert(record.url.clone());
        state
            .queue
            .push(ScheduledUrl::from_record(record, meta.expected_next_crawl, priority));
        shard.size.fetch_add(1, Ordering::Relaxed);

        true
    }

    /// Offers a batch of discovered URLs, locking each shard at most once
    ///
    /// Pass 1 bins the records by shard with no locks held; pass 2 locks
    /// each non-empty shard exactly once and applies its bin. Returns the
    /// records that could not be admitted (depth, duplicate or capacity)
    /// so the caller may drop or retry them.
    ///
    /// The capacity check reads the shard size counters once up front and
    /// tracks admissions locally, so the bound is approximate: a racing
    /// batch may overshoot it by up to one batch per shard.
    pub fn enqueue_batch(&self, records: Vec<UrlRecord>) -> Vec<UrlRecord> {
        if records.is_empty() {
            return Vec::new();
        }

        let max_depth = self.max_depth.load(Ordering::Relaxed);
        let max_queue_size = self.max_queue_size.load(Ordering::Relaxed);

        let mut bins: Vec<Vec<UrlRecord>> = (0..FRONTIER_SHARDS).map(|_| Vec::new()).collect();
        let mut rejected = Vec::new();

        for record in records {
            if record.depth > max_depth {
                rejected.push(record);
            } else {
                bins[self.shard_index(&record.url)].push(record);
            }
        }

        let mut total_size = self.size();

        for (index, bin) in bins.into_iter().enumerate() {
            if bin.is_empty() {
                continue;
            }

            // All metadata lookups for this bin happen before its shard
            // lock is taken; a frontier-shard lock is never held across a
            // metadata-shard acquisition
            let scheduled: Vec<(UrlRecord, DateTime<Utc>, f32)> = bin
                .into_iter()
                .map(|record| {
                    let meta = self.metadata.get_or_create(&record.url);
                    let priority = meta.calculate_priority(Utc::now());
                    (record, meta.expected_next_crawl, priority)
                })
                .collect();

            let shard = &self.shards[index];
            let mut state = shard.state.lock();

            for (record, expected_crawl_at, priority) in scheduled {
                if total_size >= max_queue_size {
                    rejected.push(record);
                    continue;
                }

                if state.seen.contains(&record.url) {
                    rejected.push(record);
                    continue;
                }

                state.seen.insert(record.url.clone());
                state
                    .queue
                    .push(ScheduledUrl::from_record(record, expected_crawl_at, priority));
                shard.size.fetch_add(1, Ordering::Relaxed);
                total_size += 1;
            }
        }

        rejected
    }

    /// Re-inserts a URL with a pre-computed schedule
    ///
    /// Used by workers handing a fetched URL back for its next visit; the
    /// metadata store is not consulted again. The seen set already records
    /// the URL from its first admission, so unlike `enqueue` this does not
    /// treat membership there as a duplicate.
    pub fn enqueue_smart(&self, scheduled: ScheduledUrl) -> bool {
        if scheduled.depth > self.max_depth.load(Ordering::Relaxed) {
            return false;
        }

        if self.size() >= self.max_queue_size.load(Ordering::Relaxed) {
            return false;
        }

        let shard = &self.shards[self.shard_index(&scheduled.url)];
        let mut state = shard.state.lock();

        state.seen.insert(scheduled.url.clone());
        state.queue.push(scheduled);
        shard.size.fetch_add(1, Ordering::Relaxed);

        true
    }

    /// Takes the best URL available right now
    ///
    /// Pass 1 scans shards from the round-robin start and returns the
    /// first shard top that is ready. If nothing is due yet, pass 2 pops
    /// the entry with the earliest `expected_crawl_at` across all shards,
    /// so callers holding the result know how long to wait. Returns None
    /// only when every shard is empty.
    pub fn dequeue(&self) -> Option<ScheduledUrl> {
        let start = self.round_robin.fetch_add(1, Ordering::Relaxed) % FRONTIER_SHARDS;
        let now = Utc::now();

        // Pass 1: first ready top wins
        for offset in 0..FRONTIER_SHARDS {
            let shard = &self.shards[(start + offset) % FRONTIER_SHARDS];
            let mut state = shard.state.lock();

            let ready = state
                .queue
                .peek()
                .map(|top| top.is_ready(now))
                .unwrap_or(false);
            if ready {
                let top = state.queue.pop();
                shard.size.fetch_sub(1, Ordering::Relaxed);
                return top;
            }
        }

        // Pass 2: nothing due; take the entry scheduled soonest
        let mut earliest: Option<(usize, DateTime<Utc>)> = None;
        for offset in 0..FRONTIER_SHARDS {
            let index = (start + offset) % FRONTIER_SHARDS;
            let state = self.shards[index].state.lock();

            if let Some(top) = state.queue.peek() {
                let is_earlier = earliest
                    .map(|(_, due)| top.expected_crawl_at < due)
                    .unwrap_or(true);
                if is_earlier {
                    earliest = Some((index, top.expected_crawl_at));
                }
            }
        }

        let (index, _) = earliest?;
        let shard = &self.shards[index];
        let mut state = shard.state.lock();
        let top = state.queue.pop();
        if top.is_some() {
            shard.size.fetch_sub(1, Ordering::Relaxed);
        }
        top
    }

    /// Takes up to `max` ready URLs across all shards
    ///
    /// Inspects at most `max` entries per shard; not-ready entries
    /// encountered on the way are buffered and re-inserted before moving
    /// on, so repeated calls do not rescan them within one sweep.
    pub fn drain_ready(&self, max: usize) -> Vec<ScheduledUrl> {
        let mut ready = Vec::new();
        let now = Utc::now();

        for shard in &self.shards {
            let mut state = shard.state.lock();
            let mut deferred = Vec::new();
            let mut inspected = 0;

            while ready.len() < max && inspected < max {
                let top_ready = match state.queue.peek() {
                    Some(top) => top.is_ready(now),
                    None => break,
                };
                inspected += 1;

                match state.queue.pop() {
                    Some(entry) if top_ready => {
                        shard.size.fetch_sub(1, Ordering::Relaxed);
                        ready.push(entry);
                    }
                    Some(entry) => deferred.push(entry),
                    None => break,
                }
            }

            for entry in deferred {
                state.queue.push(entry);
            }

            if ready.len() >= max {
                break;
            }
        }

        ready
    }

    /// Whether a URL was ever admitted during this run
    pub fn is_seen(&self, url: &str) -> bool {
        self.shards[self.shard_index(url)]
            .state
            .lock()
            .seen
            .contains(url)
    }

    /// Approximate number of queued URLs (sum of shard counters)
    pub fn size(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.size.load(Ordering::Relaxed))
            .sum()
    }

    /// Approximate number of shards with a ready entry at their top
    ///
    /// Only shard tops are inspected, so this is a cheap lower bound on
    /// the number of ready URLs.
    pub fn count_ready(&self) -> usize {
        let now = Utc::now();
        self.shards
            .iter()
            .filter(|shard| {
                shard
                    .state
                    .lock()
                    .queue
                    .peek()
                    .map(|top| top.is_ready(now))
                    .unwrap_or(false)
            })
            .count()
    }

    /// Adjusts the queue bound; existing entries are never evicted
    pub fn set_max_queue_size(&self, size: usize) {
        self.max_queue_size.store(size, Ordering::Relaxed);
    }

    /// Adjusts the depth bound; existing entries are never evicted
    pub fn set_max_depth(&self, depth: u32) {
        self.max_depth.store(depth, Ordering::Relaxed);
    }
}
