//! Kumo-Frontier: an adaptive web-crawl scheduler core
//!
//! This crate implements the scheduling heart of a web crawler: a sharded URL
//! frontier with deduplication and time-gated readiness, a persistent
//! crawl-metadata store with an asynchronous durable writer, and the revisit
//! policy that turns observed content change behavior into next-crawl
//! schedules. Fetching, parsing and robots.txt enforcement live outside this
//! crate and talk to it through the frontier and crawl-outcome APIs.

pub mod config;
pub mod filter;
pub mod frontier;
pub mod hash;
pub mod metadata;
pub mod scheduler;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Kumo-Frontier operations
#[derive(Debug, Error)]
pub enum KumoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] storage::StoreError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("URL exceeds maximum length: {0} bytes")]
    TooLong(usize),
}

/// Result type alias for Kumo-Frontier operations
pub type Result<T> = std::result::Result<T, KumoError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::SchedulerConfig;
pub use frontier::{ScheduledUrl, UrlFrontier, UrlRecord};
pub use metadata::{MetadataStore, UrlMetadata};
pub use scheduler::CrawlScheduler;
pub use url::{extract_domain, is_valid, normalize};
