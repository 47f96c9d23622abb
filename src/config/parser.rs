use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads, parses and validates the configuration file at `path`
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use kumo_frontier::config::load_config;
///
/// let config = load_config(Path::new("config.toml")).unwrap();
/// println!("Max depth: {}", config.scheduler.max_depth);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    parse_config(&std::fs::read_to_string(path)?)
}

/// Parses and validates configuration from in-memory TOML
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Loads a configuration along with a hash of its raw content
///
/// The hash lets a later run detect that the configuration changed in
/// between; the file is read once and hashed as-read.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, content_hash(&content)))
}

/// Hex-encoded SHA-256 of raw configuration content
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Hashes the configuration file at `path`
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(content_hash(&std::fs::read_to_string(path)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID: &str = r#"
seeds = ["https://example.com/"]

[scheduler]
max-queue-size = 50000
max-depth = 4
metadata-db-path = "./metadata.db"
"#;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_parse_valid_config() {
        let config = parse_config(VALID).unwrap();

        assert_eq!(config.scheduler.max_queue_size, 50000);
        assert_eq!(config.scheduler.max_depth, 4);
        assert_eq!(config.seeds, vec!["https://example.com/"]);
        // Persistence knobs fall back to their defaults
        assert_eq!(config.scheduler.persistence_batch_period_ms, 500);
        assert_eq!(config.scheduler.persistence_batch_size, 100);
    }

    #[test]
    fn test_load_from_file() {
        let file = write_file(VALID);
        assert!(load_config(file.path()).is_ok());
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(load_config(Path::new("/nonexistent/config.toml")).is_err());
    }

    #[test]
    fn test_broken_toml_errors() {
        assert!(matches!(
            parse_config("this is not valid TOML {{{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validation_failure_surfaces() {
        let invalid = VALID.replace("max-queue-size = 50000", "max-queue-size = 0");
        assert!(matches!(
            parse_config(&invalid),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_hash_is_stable_per_content() {
        assert_eq!(content_hash("same"), content_hash("same"));
        assert_ne!(content_hash("one"), content_hash("two"));
        assert_eq!(content_hash("x").len(), 64);
    }

    #[test]
    fn test_load_with_hash_matches_file_hash() {
        let file = write_file(VALID);
        let (_, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
    }
}
