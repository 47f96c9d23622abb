//! Crawl-metadata store and revisit policy
//!
//! This module owns everything the scheduler knows about a URL between
//! crawls: the adaptive scheduling record, the policy that stretches or
//! shrinks revisit intervals, and the sharded store that keeps records hot
//! in memory while a background worker writes them through to disk.

mod record;
mod store;

pub use record::UrlMetadata;
pub use store::{
    MetadataStore, DEFAULT_BATCH_PERIOD, DEFAULT_BATCH_SIZE, METADATA_SHARDS,
};
