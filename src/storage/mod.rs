//! Durable ordered key-value store for crawl metadata
//!
//! One SQLite table maps normalized URL to its serialized scheduling record.
//! The store exposes the minimal contract the metadata layer needs: point
//! reads and batched writes that are atomic per batch. All write traffic
//! flows through the single persistence worker; reads happen on cache
//! misses from any thread.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use parking_lot::Mutex;
use thiserror::Error;

/// Errors that can occur during durable store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for durable store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable URL-keyed metadata map
///
/// The connection is guarded by a mutex: lookups are rare (cache misses
/// only) and batch writes come from a single thread, so contention is not
/// a concern.
pub struct MetaDb {
    conn: Mutex<Connection>,
}

impl MetaDb {
    /// Opens the store at `path`, creating the file and schema if missing
    ///
    /// A failure here is fatal at construction and propagates to the
    /// caller.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory store (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Reads the serialized record for a URL, if one was ever persisted
    pub fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let conn = self.conn.lock();
        let value = conn
            .query_row(
                "SELECT record FROM url_metadata WHERE url = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    /// Writes a batch of `(url, record)` pairs in one transaction
    ///
    /// The batch is atomic: either every put lands or none does, so a
    /// crash can never leave a torn record behind.
    pub fn write_batch(&self, puts: &[(String, String)]) -> StoreResult<()> {
        if puts.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT OR REPLACE INTO url_metadata (url, record) VALUES (?1, ?2)")?;
            for (url, record) in puts {
                stmt.execute(params![url, record])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Number of entries in the durable map
    pub fn len(&self) -> StoreResult<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM url_metadata", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Whether the durable map holds no entries
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS url_metadata (
            url TEXT PRIMARY KEY,
            record TEXT NOT NULL
        );
    ",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = MetaDb::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_get_missing_key() {
        let db = MetaDb::open_in_memory().unwrap();
        assert_eq!(db.get("https://example.com/").unwrap(), None);
    }

    #[test]
    fn test_write_batch_then_get() {
        let db = MetaDb::open_in_memory().unwrap();
        let puts = vec![
            ("https://example.com/a".to_string(), "1|2|3||1|0|0|0".to_string()),
            ("https://example.com/b".to_string(), "4|5|6|h|2|1|0|0".to_string()),
        ];
        db.write_batch(&puts).unwrap();

        assert_eq!(
            db.get("https://example.com/a").unwrap().as_deref(),
            Some("1|2|3||1|0|0|0")
        );
        assert_eq!(
            db.get("https://example.com/b").unwrap().as_deref(),
            Some("4|5|6|h|2|1|0|0")
        );
        assert_eq!(db.len().unwrap(), 2);
    }

    #[test]
    fn test_write_batch_replaces() {
        let db = MetaDb::open_in_memory().unwrap();
        let url = "https://example.com/".to_string();
        db.write_batch(&[(url.clone(), "old".to_string())]).unwrap();
        db.write_batch(&[(url.clone(), "new".to_string())]).unwrap();

        assert_eq!(db.get(&url).unwrap().as_deref(), Some("new"));
        assert_eq!(db.len().unwrap(), 1);
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let db = MetaDb::open_in_memory().unwrap();
        db.write_batch(&[]).unwrap();
        assert!(db.is_empty().unwrap());
    }

    #[test]
    fn test_open_on_disk_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metadata.db");

        {
            let db = MetaDb::open(&path).unwrap();
            db.write_batch(&[("k".to_string(), "v".to_string())]).unwrap();
        }

        // Reopen and confirm the data survived
        let db = MetaDb::open(&path).unwrap();
        assert_eq!(db.get("k").unwrap().as_deref(), Some("v"));
    }
}
