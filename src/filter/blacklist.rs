//! Domain blacklist with permanent and cooling-down entries
//!
//! Permanent entries come from an operator-maintained file; temporary
//! entries are added at runtime (a misbehaving or overloaded domain) and
//! expire after a fixed cooldown.

use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, Instant};

/// How long a temporary entry keeps a domain blocked
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Default)]
struct Entries {
    permanent: HashSet<String>,
    temporary: HashMap<String, Instant>,
}

/// Thread-safe domain blacklist consulted before enqueue
pub struct DomainBlacklist {
    entries: Mutex<Entries>,
    cooldown: Duration,
}

impl DomainBlacklist {
    /// Creates an empty blacklist with the standard 60-second cooldown
    pub fn new() -> Self {
        Self::with_cooldown(DEFAULT_COOLDOWN)
    }

    /// Creates an empty blacklist with an explicit cooldown
    pub fn with_cooldown(cooldown: Duration) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            cooldown,
        }
    }

    /// Whether a domain is currently blocked
    ///
    /// Permanent entries always block; temporary entries block until their
    /// cooldown elapses. Expired temporary entries stop blocking
    /// immediately and are physically removed by `cleanup_expired`.
    pub fn is_blacklisted(&self, domain: &str) -> bool {
        let entries = self.entries.lock();

        if entries.permanent.contains(domain) {
            return true;
        }

        match entries.temporary.get(domain) {
            Some(added) => added.elapsed() < self.cooldown,
            None => false,
        }
    }

    /// Blocks a domain until the cooldown elapses
    ///
    /// Re-adding an already-listed domain restarts its cooldown.
    pub fn add_temporary(&self, domain: &str) {
        self.entries
            .lock()
            .temporary
            .insert(domain.to_string(), Instant::now());
    }

    /// Blocks a domain for the rest of the run
    pub fn add_permanent(&self, domain: &str) {
        self.entries.lock().permanent.insert(domain.to_string());
    }

    /// Removes temporary entries whose cooldown has elapsed
    pub fn cleanup_expired(&self) {
        let mut entries = self.entries.lock();
        let cooldown = self.cooldown;
        entries.temporary.retain(|_, added| added.elapsed() < cooldown);
    }

    /// Number of entries, permanent and temporary
    pub fn size(&self) -> usize {
        let entries = self.entries.lock();
        entries.permanent.len() + entries.temporary.len()
    }

    /// Loads permanent entries from a file of one domain per line
    ///
    /// Blank lines and `#`-prefixed comment lines are skipped. Returns the
    /// number of domains loaded.
    pub fn load_from_file(&self, path: &Path) -> io::Result<usize> {
        let content = fs::read_to_string(path)?;
        let mut loaded = 0;

        {
            let mut entries = self.entries.lock();
            for line in content.lines() {
                let domain = line.trim();
                if domain.is_empty() || domain.starts_with('#') {
                    continue;
                }
                entries.permanent.insert(domain.to_string());
                loaded += 1;
            }
        }

        tracing::info!("loaded {} domains from blacklist {}", loaded, path.display());
        Ok(loaded)
    }
}

impl Default for DomainBlacklist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_blacklist() {
        let blacklist = DomainBlacklist::new();
        assert!(!blacklist.is_blacklisted("example.com"));
        assert_eq!(blacklist.size(), 0);
    }

    #[test]
    fn test_permanent_entry_blocks() {
        let blacklist = DomainBlacklist::new();
        blacklist.add_permanent("spam.example.com");

        assert!(blacklist.is_blacklisted("spam.example.com"));
        assert!(!blacklist.is_blacklisted("example.com"));
    }

    #[test]
    fn test_temporary_entry_blocks_within_cooldown() {
        let blacklist = DomainBlacklist::new();
        blacklist.add_temporary("slow.example.com");

        assert!(blacklist.is_blacklisted("slow.example.com"));
    }

    #[test]
    fn test_temporary_entry_expires() {
        let blacklist = DomainBlacklist::with_cooldown(Duration::from_millis(10));
        blacklist.add_temporary("slow.example.com");

        std::thread::sleep(Duration::from_millis(20));
        assert!(!blacklist.is_blacklisted("slow.example.com"));

        // Still physically present until cleanup runs
        assert_eq!(blacklist.size(), 1);
        blacklist.cleanup_expired();
        assert_eq!(blacklist.size(), 0);
    }

    #[test]
    fn test_cleanup_keeps_fresh_entries() {
        let blacklist = DomainBlacklist::new();
        blacklist.add_temporary("a.example.com");
        blacklist.add_permanent("b.example.com");

        blacklist.cleanup_expired();
        assert_eq!(blacklist.size(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# known bad actors").unwrap();
        writeln!(file, "spam.example.com").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "tracker.example.net").unwrap();
        file.flush().unwrap();

        let blacklist = DomainBlacklist::new();
        let loaded = blacklist.load_from_file(file.path()).unwrap();

        assert_eq!(loaded, 2);
        assert!(blacklist.is_blacklisted("spam.example.com"));
        assert!(blacklist.is_blacklisted("tracker.example.net"));
        assert!(!blacklist.is_blacklisted("# known bad actors"));
    }

    #[test]
    fn test_load_missing_file_errors() {
        let blacklist = DomainBlacklist::new();
        assert!(blacklist
            .load_from_file(Path::new("/nonexistent/blacklist.txt"))
            .is_err());
    }
}
