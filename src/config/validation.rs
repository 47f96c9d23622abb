use crate::config::types::Config;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let scheduler = &config.scheduler;

    if scheduler.max_queue_size < 1 {
        return Err(ConfigError::Validation(
            "max_queue_size must be >= 1".to_string(),
        ));
    }

    if scheduler.metadata_db_path.is_empty() {
        return Err(ConfigError::Validation(
            "metadata_db_path cannot be empty".to_string(),
        ));
    }

    if scheduler.persistence_batch_period_ms < 10 {
        return Err(ConfigError::Validation(format!(
            "persistence_batch_period_ms must be >= 10ms, got {}ms",
            scheduler.persistence_batch_period_ms
        )));
    }

    if scheduler.persistence_batch_size < 1 {
        return Err(ConfigError::Validation(
            "persistence_batch_size must be >= 1".to_string(),
        ));
    }

    for seed in &config.seeds {
        if !crate::url::is_valid(seed) {
            return Err(ConfigError::Validation(format!(
                "seed is not a valid http(s) URL: {}",
                seed
            )));
        }
    }

    Ok(())
}
