//! URL frontier: discovery intake and fetch-order selection
//!
//! URLs enter here when link extraction discovers them and leave when a
//! fetch worker takes them. In between they are deduplicated, bounded, and
//! ordered by readiness and priority.
//!
//! There is deliberately no `update_url_priority` operation: a queued
//! entry's priority is whatever was computed at admission, and dequeue
//! re-evaluates readiness against the clock instead of reshuffling heaps
//! in place.

mod queue;
mod record;

pub use queue::{UrlFrontier, DEFAULT_MAX_DEPTH, DEFAULT_MAX_QUEUE_SIZE, FRONTIER_SHARDS};
pub use record::{ScheduledUrl, UrlRecord};
