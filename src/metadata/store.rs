//! Sharded crawl-metadata store with an asynchronous durable writer
//!
//! The store keeps every live record in one of 256 mutex-guarded in-memory
//! shards and treats the durable map as a write-behind log: mutations hand
//! an owned copy of the record to a lock-free channel, and a single
//! persistence worker batches those copies into the durable store. Readers
//! and writers therefore never block on disk I/O; a crash can lose at most
//! one batch interval of updates.

use crate::metadata::UrlMetadata;
use crate::storage::{MetaDb, StoreResult};
use chrono::Utc;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use xxhash_rust::xxh3::xxh3_64;

/// Number of independent in-memory shards
pub const METADATA_SHARDS: usize = 256;

/// Default interval between persistence batches
pub const DEFAULT_BATCH_PERIOD: Duration = Duration::from_millis(500);

/// Default maximum number of updates per durable write batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

type Shard = Mutex<HashMap<String, UrlMetadata>>;

/// Persistent, sharded map from URL to adaptive scheduling record
pub struct MetadataStore {
    shards: Vec<Shard>,
    db: Arc<MetaDb>,
    update_tx: Option<Sender<(String, UrlMetadata)>>,
    writer: Option<JoinHandle<()>>,
    shutdown: AtomicBool,
}

impl MetadataStore {
    /// Opens the store backed by the durable map at `path`
    ///
    /// A failure to open the durable store is fatal and propagates.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let db = MetaDb::open(path)?;
        Ok(Self::with_db(db, DEFAULT_BATCH_PERIOD, DEFAULT_BATCH_SIZE))
    }

    /// Builds the store over an already-open durable map
    ///
    /// `batch_period` is the persistence worker's tick interval and
    /// `batch_size` caps the number of puts per durable write batch.
    pub fn with_db(db: MetaDb, batch_period: Duration, batch_size: usize) -> Self {
        let db = Arc::new(db);
        let (update_tx, update_rx) = unbounded();

        let writer_db = Arc::clone(&db);
        let writer = match std::thread::Builder::new()
            .name("metadata-writer".to_string())
            .spawn(move || persistence_worker(writer_db, update_rx, batch_period, batch_size))
        {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::error!("failed to start persistence worker: {}", e);
                None
            }
        };

        let shards = (0..METADATA_SHARDS)
            .map(|_| Mutex::new(HashMap::new()))
            .collect();

        Self {
            shards,
            db,
            update_tx: Some(update_tx),
            writer,
            shutdown: AtomicBool::new(false),
        }
    }

    /// Returns the scheduling record for a URL, creating it if needed
    ///
    /// Lookup order: in-memory shard, then the durable store, then a fresh
    /// default. Only a freshly created default is queued for persistence;
    /// a durable read or deserialize failure is recovered locally by
    /// treating the URL as new.
    pub fn get_or_create(&self, url: &str) -> UrlMetadata {
        let now = Utc::now();
        let mut shard = self.shard(url).lock();

        if let Some(meta) = shard.get(url) {
            return meta.clone();
        }

        if let Some(meta) = self.load_durable(url) {
            shard.insert(url.to_string(), meta.clone());
            return meta;
        }

        let meta = UrlMetadata::new(now);
        shard.insert(url.to_string(), meta.clone());
        drop(shard);
        self.persist(url, &meta);
        meta
    }

    /// Records a successful fetch and its observed content fingerprint
    ///
    /// Resets the failure counter, then either restarts the change clock
    /// (fingerprint changed) or doubles the stable-content backoff
    /// (fingerprint unchanged). Returns the updated record.
    pub fn record_success(&self, url: &str, new_hash: &str) -> UrlMetadata {
        self.with_entry(url, |meta, now| {
            meta.last_crawl_at = now;
            meta.crawl_count += 1;
            meta.temporary_failures = 0;

            if meta.content_hash != new_hash {
                meta.content_hash = new_hash.to_string();
                meta.reset_backoff_on_change(now);
            } else {
                meta.increase_backoff(now);
            }
        })
    }

    /// Records a transient fetch failure, applying the 2-32 minute ladder
    ///
    /// Returns the updated record.
    pub fn record_failure(&self, url: &str) -> UrlMetadata {
        self.with_entry(url, |meta, now| {
            meta.record_temporary_failure(now);
        })
    }

    /// Number of URLs tracked in memory
    ///
    /// Updates still queued for durable writing are already counted here;
    /// this is the authoritative real-time view.
    pub fn size(&self) -> usize {
        self.shards.iter().map(|shard| shard.lock().len()).sum()
    }

    /// Number of tracked URLs whose next crawl is due
    pub fn count_ready(&self) -> usize {
        let now = Utc::now();
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .lock()
                    .values()
                    .filter(|meta| meta.is_ready(now))
                    .count()
            })
            .sum()
    }

    /// Stops the persistence worker after it drains all pending updates
    ///
    /// Idempotent; also invoked on drop.
    pub fn shutdown(&mut self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }

        // Dropping the sender disconnects the channel; the worker drains
        // whatever is still queued and exits.
        self.update_tx.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                tracing::error!("metadata persistence worker panicked");
            }
        }
    }

    fn shard(&self, url: &str) -> &Shard {
        &self.shards[xxh3_64(url.as_bytes()) as usize % METADATA_SHARDS]
    }

    /// Mutates the record for `url` under its shard lock and queues the
    /// result for persistence. Missing records are created first, so the
    /// mutation always sees current state.
    fn with_entry<F>(&self, url: &str, mutate: F) -> UrlMetadata
    where
        F: FnOnce(&mut UrlMetadata, chrono::DateTime<Utc>),
    {
        let now = Utc::now();
        let mut shard = self.shard(url).lock();

        let meta = match shard.entry(url.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let loaded = self
                    .load_durable(url)
                    .unwrap_or_else(|| UrlMetadata::new(now));
                entry.insert(loaded)
            }
        };

        mutate(meta, now);
        let copy = meta.clone();
        drop(shard);

        self.persist(url, &copy);
        copy
    }

    fn load_durable(&self, url: &str) -> Option<UrlMetadata> {
        match self.db.get(url) {
            Ok(Some(value)) => Some(UrlMetadata::from_record_string(&value, Utc::now())),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("durable read failed for {}: {}; treating as new", url, e);
                None
            }
        }
    }

    fn persist(&self, url: &str, meta: &UrlMetadata) {
        if let Some(tx) = &self.update_tx {
            if tx.send((url.to_string(), meta.clone())).is_err() {
                tracing::warn!("persistence queue closed; dropping update for {}", url);
            }
        }
    }
}

impl Drop for MetadataStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Background loop: every tick, drain all pending updates to the durable
/// store in batches; on channel disconnect, drain once more and exit.
fn persistence_worker(
    db: Arc<MetaDb>,
    updates: Receiver<(String, UrlMetadata)>,
    batch_period: Duration,
    batch_size: usize,
) {
    loop {
        std::thread::sleep(batch_period);
        if drain_pending(&db, &updates, batch_size) {
            tracing::debug!("metadata persistence worker exiting");
            return;
        }
    }
}

/// Drains the queue into durable batches. Returns true when the channel is
/// disconnected (final drain complete).
fn drain_pending(
    db: &MetaDb,
    updates: &Receiver<(String, UrlMetadata)>,
    batch_size: usize,
) -> bool {
    let mut disconnected = false;

    loop {
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            match updates.try_recv() {
                Ok((url, meta)) => batch.push((url, meta.to_record_string())),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if batch.is_empty() {
            return disconnected;
        }

        let count = batch.len();
        if let Err(e) = db.write_batch(&batch) {
            // Memory stays authoritative; the next successful batch
            // carries the newest record for each URL anyway.
            tracing::warn!("failed to persist batch of {} updates: {}", count, e);
        } else {
            tracing::trace!("persisted {} metadata updates", count);
        }
    }
}
