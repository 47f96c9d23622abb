use serde::Deserialize;

/// Top-level configuration for the scheduler core
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scheduler: SchedulerConfig,

    /// Seed URLs injected into the frontier at startup
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Scheduler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Soft bound on the total number of queued URLs
    #[serde(rename = "max-queue-size")]
    pub max_queue_size: usize,

    /// Maximum link depth admitted into the frontier
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Path to the durable metadata store
    #[serde(rename = "metadata-db-path")]
    pub metadata_db_path: String,

    /// Optional file of permanently blacklisted domains
    #[serde(rename = "blacklist-path", default)]
    pub blacklist_path: Option<String>,

    /// Optional per-domain configuration file
    #[serde(rename = "domain-config-path", default)]
    pub domain_config_path: Option<String>,

    /// Interval between durable write batches (milliseconds)
    #[serde(rename = "persistence-batch-period-ms", default = "default_batch_period_ms")]
    pub persistence_batch_period_ms: u64,

    /// Maximum updates per durable write batch
    #[serde(rename = "persistence-batch-size", default = "default_batch_size")]
    pub persistence_batch_size: usize,
}

fn default_batch_period_ms() -> u64 {
    500
}

fn default_batch_size() -> usize {
    100
}
