//! Configuration for the scheduler core
//!
//! Two surfaces live here: the scheduler's own TOML config (queue bounds,
//! store path, persistence knobs) and the per-domain configuration manager
//! that advises revisit intervals and priority multipliers for individual
//! domains.

pub mod domains;
mod parser;
mod types;
mod validation;

pub use domains::{normalize_domain, DomainConfig, DomainConfigManager};
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use types::{Config, SchedulerConfig};
pub use validation::validate;
