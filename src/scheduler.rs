//! Scheduler facade wiring discovery intake to the frontier
//!
//! Fetch workers and link extractors talk to this type: discovered links
//! come in through `ingest`, fetchable URLs go out through `next_url` or
//! `drain_ready`, and crawl outcomes flow back through `record_success` /
//! `record_failure`. The facade applies the admission boundary checks
//! (normalization, blacklist, content filter, per-domain configuration)
//! that the frontier itself stays agnostic of.

use crate::config::{domains, SchedulerConfig};
use crate::filter::{ContentFilter, DomainBlacklist};
use crate::frontier::{ScheduledUrl, UrlFrontier, UrlRecord};
use crate::metadata::{MetadataStore, UrlMetadata};
use crate::{url as url_util, KumoError};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

/// Outcome of one `ingest` call
#[derive(Debug, Default)]
pub struct IngestReport {
    /// URLs admitted into the frontier
    pub admitted: usize,

    /// URLs dropped before the frontier saw them (invalid, blacklisted,
    /// filtered or on a disabled domain)
    pub filtered: usize,

    /// URLs the frontier could not admit (depth, duplicate or capacity)
    pub rejected: Vec<UrlRecord>,
}

/// Point-in-time view of scheduler state for logging and the CLI
#[derive(Debug, Clone, Copy)]
pub struct SchedulerStats {
    pub frontier_size: usize,
    pub frontier_ready: usize,
    pub tracked_urls: usize,
    pub tracked_ready: usize,
}

/// The crawl scheduler: admission control, frontier and metadata in one place
pub struct CrawlScheduler {
    frontier: UrlFrontier,
    metadata: Arc<MetadataStore>,
    filter: ContentFilter,
    blacklist: DomainBlacklist,
}

impl CrawlScheduler {
    /// Opens a scheduler as described by the configuration
    ///
    /// Opens the durable metadata store, sizes the frontier, and loads the
    /// optional blacklist and per-domain configuration files. A store open
    /// failure is fatal; boundary config files that fail to load are
    /// logged and skipped.
    pub fn open(config: &SchedulerConfig) -> Result<Self, KumoError> {
        let db = crate::storage::MetaDb::open(Path::new(&config.metadata_db_path))?;
        let metadata = Arc::new(MetadataStore::with_db(
            db,
            std::time::Duration::from_millis(config.persistence_batch_period_ms),
            config.persistence_batch_size,
        ));

        let blacklist = DomainBlacklist::new();
        if let Some(path) = &config.blacklist_path {
            if let Err(e) = blacklist.load_from_file(Path::new(path)) {
                tracing::warn!("could not load blacklist {}: {}", path, e);
            }
        }

        if let Some(path) = &config.domain_config_path {
            if let Err(e) = domains::global().load_config(Path::new(path)) {
                tracing::warn!("could not load domain config {}: {}", path, e);
            }
        }

        Ok(Self {
            frontier: UrlFrontier::with_limits(
                Arc::clone(&metadata),
                config.max_queue_size,
                config.max_depth,
            ),
            metadata,
            filter: ContentFilter::new(),
            blacklist,
        })
    }

    /// Builds a scheduler over an existing metadata store (used by tests
    /// and embedders that manage the store themselves)
    pub fn with_store(metadata: Arc<MetadataStore>, max_queue_size: usize, max_depth: u32) -> Self {
        Self {
            frontier: UrlFrontier::with_limits(Arc::clone(&metadata), max_queue_size, max_depth),
            metadata,
            filter: ContentFilter::new(),
            blacklist: DomainBlacklist::new(),
        }
    }

    /// Feeds discovered links into the frontier
    ///
    /// Each link is normalized and then has to pass the blacklist, the
    /// content filter and the per-domain enabled switch; survivors get
    /// their priority hint (scaled by the domain's multiplier) and enter
    /// the frontier as one batch.
    pub fn ingest(&self, links: &[String], depth: u32, referring_domain: &str) -> IngestReport {
        let mut report = IngestReport::default();
        let mut batch = Vec::with_capacity(links.len());

        for link in links {
            let url = match url_util::normalize(link) {
                Ok(url) => url,
                Err(e) => {
                    tracing::trace!("dropping {}: {}", link, e);
                    report.filtered += 1;
                    continue;
                }
            };

            let domain = match url_util::extract_domain(&url) {
                Some(domain) => domain,
                None => {
                    report.filtered += 1;
                    continue;
                }
            };

            if self.blacklist.is_blacklisted(&domain) {
                tracing::trace!("dropping {}: domain blacklisted", url);
                report.filtered += 1;
                continue;
            }

            if !self.filter.is_crawlable(&url) {
                report.filtered += 1;
                continue;
            }

            let domain_config = domains::global().config_for_domain(&domain);
            if !domain_config.enabled {
                tracing::trace!("dropping {}: domain disabled", url);
                report.filtered += 1;
                continue;
            }

            let priority =
                self.filter.calculate_priority(&url, depth) * domain_config.priority_multiplier;

            batch.push(UrlRecord::new(url, priority, depth, referring_domain));
        }

        let offered = batch.len();
        report.rejected = self.frontier.enqueue_batch(batch);
        report.admitted = offered - report.rejected.len();
        report
    }

    /// Injects seed URLs at depth zero
    pub fn seed(&self, urls: &[String]) -> IngestReport {
        self.ingest(urls, 0, "")
    }

    /// Takes the best URL available right now, if any
    pub fn next_url(&self) -> Option<ScheduledUrl> {
        self.frontier.dequeue()
    }

    /// Takes up to `max` URLs that are ready this instant
    pub fn drain_ready(&self, max: usize) -> Vec<ScheduledUrl> {
        self.frontier.drain_ready(max)
    }

    /// Records a successful fetch and its content fingerprint
    ///
    /// Returns the refreshed metadata; pair it with [`Self::reschedule`]
    /// to queue the revisit.
    pub fn record_success(&self, url: &str, content_hash: &str) -> UrlMetadata {
        self.metadata.record_success(url, content_hash)
    }

    /// Records a transient fetch failure
    pub fn record_failure(&self, url: &str) -> UrlMetadata {
        self.metadata.record_failure(url)
    }

    /// Re-queues a taken URL under its refreshed schedule
    pub fn reschedule(&self, mut taken: ScheduledUrl, meta: &UrlMetadata) -> bool {
        taken.expected_crawl_at = meta.expected_next_crawl;
        taken.priority = meta.calculate_priority(Utc::now());
        self.frontier.enqueue_smart(taken)
    }

    /// Current frontier and store sizes
    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            frontier_size: self.frontier.size(),
            frontier_ready: self.frontier.count_ready(),
            tracked_urls: self.metadata.size(),
            tracked_ready: self.metadata.count_ready(),
        }
    }

    pub fn frontier(&self) -> &UrlFrontier {
        &self.frontier
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    pub fn filter(&self) -> &ContentFilter {
        &self.filter
    }

    pub fn blacklist(&self) -> &DomainBlacklist {
        &self.blacklist
    }
}
