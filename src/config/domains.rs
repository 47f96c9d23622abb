//! Per-domain crawl configuration
//!
//! Operators can pin revisit behavior per domain: a fixed crawl interval
//! ("this domain never needs more than one visit a day"), a priority
//! multiplier, an enabled switch and a language whitelist. Domains without
//! an entry get the default configuration, which defers to the detected
//! change frequency.

use crate::ConfigError;
use chrono::{DateTime, Duration, Utc};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default fixed revisit interval for configured domains, in hours
const DEFAULT_CRAWL_INTERVAL_HOURS: i64 = 24;

/// Configuration advised for one domain
#[derive(Debug, Clone)]
pub struct DomainConfig {
    /// Fixed revisit interval used when freshness scheduling is off
    pub crawl_interval: Duration,

    /// Prefer the URL's detected change frequency over the fixed interval
    pub use_freshness_based: bool,

    /// Scales the detected change frequency when freshness-based
    pub frequency_multiplier: f32,

    /// Whether this domain should be crawled at all
    pub enabled: bool,

    /// Scales priorities of URLs on this domain
    pub priority_multiplier: f32,

    /// Accepted content languages; empty allows all
    pub language_whitelist: Vec<String>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            crawl_interval: Duration::hours(DEFAULT_CRAWL_INTERVAL_HOURS),
            use_freshness_based: true,
            frequency_multiplier: 1.0,
            enabled: true,
            priority_multiplier: 1.0,
            language_whitelist: Vec::new(),
        }
    }
}

struct Inner {
    configs: HashMap<String, DomainConfig>,
    default_config: DomainConfig,
    config_path: Option<PathBuf>,
}

/// Process-wide registry of per-domain configuration
///
/// The whole map is replaced atomically on `load`/`reload`; a failed load
/// leaves the previously loaded configuration intact.
pub struct DomainConfigManager {
    inner: RwLock<Inner>,
}

impl DomainConfigManager {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                configs: HashMap::new(),
                default_config: DomainConfig::default(),
                config_path: None,
            }),
        }
    }

    /// Loads domain configurations from a TOML file
    ///
    /// The file holds a `[domains."host"]` table per domain. A parse
    /// failure of the whole file returns an error without touching the
    /// current configuration; malformed individual entries or fields are
    /// skipped with a warning. Returns the number of domains loaded.
    pub fn load_config(&self, path: &Path) -> Result<usize, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let parsed: toml::Value = toml::from_str(&content)?;

        let mut configs = HashMap::new();
        let default_config = self.inner.read().default_config.clone();

        match parsed.get("domains").and_then(|d| d.as_table()) {
            Some(domains) => {
                for (domain, entry) in domains {
                    match entry.as_table() {
                        Some(table) => {
                            let config = parse_domain_entry(domain, table, &default_config);
                            configs.insert(normalize_domain(domain), config);
                        }
                        None => {
                            tracing::warn!("skipping domain {}: entry is not a table", domain);
                        }
                    }
                }
            }
            None => {
                tracing::warn!("no [domains] section in {}", path.display());
            }
        }

        let loaded = configs.len();
        let mut inner = self.inner.write();
        inner.configs = configs;
        inner.config_path = Some(path.to_path_buf());
        drop(inner);

        tracing::info!("loaded {} domain configurations from {}", loaded, path.display());
        Ok(loaded)
    }

    /// Re-reads the previously loaded configuration file
    pub fn reload_config(&self) -> Result<usize, ConfigError> {
        let path = self.inner.read().config_path.clone();
        match path {
            Some(path) => self.load_config(&path),
            None => Err(ConfigError::Validation(
                "no domain configuration loaded yet".to_string(),
            )),
        }
    }

    /// Configuration advised for a domain, falling back to the default
    pub fn config_for_domain(&self, domain: &str) -> DomainConfig {
        let inner = self.inner.read();
        inner
            .configs
            .get(&normalize_domain(domain))
            .unwrap_or(&inner.default_config)
            .clone()
    }

    /// Whether a domain has an explicit configuration entry
    pub fn has_domain_config(&self, domain: &str) -> bool {
        self.inner.read().configs.contains_key(&normalize_domain(domain))
    }

    /// Inserts or replaces one domain's configuration at runtime
    pub fn set_domain_config(&self, domain: &str, config: DomainConfig) {
        self.inner
            .write()
            .configs
            .insert(normalize_domain(domain), config);
    }

    /// Removes one domain's configuration
    pub fn remove_domain_config(&self, domain: &str) {
        self.inner.write().configs.remove(&normalize_domain(domain));
    }

    /// Number of explicitly configured domains
    pub fn configured_domain_count(&self) -> usize {
        self.inner.read().configs.len()
    }

    /// Advised next crawl time for a domain
    ///
    /// With freshness-based scheduling and a positive detected change
    /// frequency (changes per day), the interval is `24h / (frequency ×
    /// multiplier)`; otherwise the fixed interval applies.
    pub fn next_crawl_time(
        &self,
        domain: &str,
        last_crawl: DateTime<Utc>,
        detected_frequency: f32,
    ) -> DateTime<Utc> {
        let config = self.config_for_domain(domain);

        if config.use_freshness_based && detected_frequency > 0.0 {
            let hours = (24.0 / (detected_frequency * config.frequency_multiplier)) as i64;
            last_crawl + Duration::hours(hours)
        } else {
            last_crawl + config.crawl_interval
        }
    }

    /// Whether the domain's advised next crawl time has passed
    pub fn should_crawl_now(
        &self,
        domain: &str,
        last_crawl: DateTime<Utc>,
        detected_frequency: f32,
    ) -> bool {
        Utc::now() >= self.next_crawl_time(domain, last_crawl, detected_frequency)
    }
}

impl Default for DomainConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_MANAGER: Lazy<DomainConfigManager> = Lazy::new(DomainConfigManager::new);

/// The process-wide domain configuration manager
///
/// Load it once at startup; `reload_config` replaces the map atomically.
pub fn global() -> &'static DomainConfigManager {
    &GLOBAL_MANAGER
}

/// Normalizes a domain key: lowercase with a leading `www.` stripped
pub fn normalize_domain(domain: &str) -> String {
    let lowered = domain.to_lowercase();
    match lowered.strip_prefix("www.") {
        Some(stripped) => stripped.to_string(),
        None => lowered,
    }
}

fn parse_domain_entry(
    domain: &str,
    table: &toml::value::Table,
    default_config: &DomainConfig,
) -> DomainConfig {
    let mut config = default_config.clone();

    if let Some(value) = table.get("crawl-frequency-limit") {
        match value.as_str() {
            Some(freq) => {
                if let Some(interval) = parse_frequency(domain, freq) {
                    config.crawl_interval = interval;
                    config.use_freshness_based = false;
                }
            }
            None => tracing::warn!("domain {}: crawl-frequency-limit is not a string", domain),
        }
    }

    if let Some(value) = table.get("enabled") {
        match value.as_bool() {
            Some(enabled) => config.enabled = enabled,
            None => tracing::warn!("domain {}: enabled is not a boolean", domain),
        }
    }

    if let Some(value) = table.get("priority-multiplier") {
        match value.as_float().or_else(|| value.as_integer().map(|i| i as f64)) {
            Some(multiplier) => config.priority_multiplier = multiplier as f32,
            None => tracing::warn!("domain {}: priority-multiplier is not a number", domain),
        }
    }

    if let Some(value) = table.get("language-whitelist") {
        match value.as_array() {
            Some(languages) => {
                config.language_whitelist = languages
                    .iter()
                    .filter_map(|lang| lang.as_str().map(str::to_string))
                    .collect();
            }
            None => tracing::warn!("domain {}: language-whitelist is not an array", domain),
        }
    }

    config
}

/// Parses a frequency string like "6h", "2d" or "90m" into an interval
///
/// Hours pass through, days multiply by 24, and minutes floor-divide by 60
/// with a one-hour lower bound. Unknown suffixes are warned about and
/// ignored.
fn parse_frequency(domain: &str, freq: &str) -> Option<Duration> {
    if freq.len() < 2 {
        tracing::warn!("domain {}: invalid frequency value: {}", domain, freq);
        return None;
    }

    let (value_str, unit) = freq.split_at(freq.len() - 1);
    let value: i64 = match value_str.parse() {
        Ok(v) => v,
        Err(_) => {
            tracing::warn!("domain {}: invalid frequency value: {}", domain, freq);
            return None;
        }
    };

    match unit {
        "h" | "H" => Some(Duration::hours(value)),
        "d" | "D" => Some(Duration::hours(value * 24)),
        "m" | "M" => Some(Duration::hours((value / 60).max(1))),
        _ => {
            tracing::warn!("domain {}: unknown time unit in {}", domain, freq);
            None
        }
    }
}
