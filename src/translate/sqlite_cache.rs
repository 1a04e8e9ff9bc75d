//! Persistent translation cache backed by SQLite.
//! Survives restarts and can be shared by several worker processes that
//! point at the same file. Each entry carries its own expiry timestamp.

use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info, warn};

use super::cache::{CacheError, CacheStore};

/// SQLite-backed translation cache.
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    /// Open (or create) the SQLite cache database at the given path.
    pub fn open(db_path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(db_path)?;

        // WAL mode for better concurrent read performance
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let cache = Self::with_connection(conn)?;
        info!(path = %db_path.display(), "SQLite translation cache opened");

        let purged = cache.purge_expired();
        if purged > 0 {
            info!(removed = purged, "expired translations purged on open");
        }
        Ok(cache)
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory() -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CacheError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS translation_cache (
                cache_key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_cache_expires
                ON translation_cache(expires_at);",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Remove expired entries, including ones orphaned by edited source
    /// texts. Returns the number of rows deleted.
    pub fn purge_expired(&self) -> usize {
        let conn = self.conn.lock();
        match conn.execute(
            "DELETE FROM translation_cache WHERE expires_at <= ?1",
            params![now_unix()],
        ) {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, "translation cache purge failed");
                0
            }
        }
    }

    /// Number of stored rows, expired or not.
    pub fn len(&self) -> Result<usize, CacheError> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM translation_cache", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

impl CacheStore for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let conn = self.conn.lock();
        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM translation_cache
                 WHERE cache_key = ?1 AND expires_at > ?2",
                params![key, now_unix()],
                |row| row.get(0),
            )
            .optional()?;

        if value.is_some() {
            debug!(key, "SQLite cache hit");
        }
        Ok(value)
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = now_unix().saturating_add(ttl.as_secs().min(i64::MAX as u64) as i64);
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO translation_cache (cache_key, value, expires_at)
             VALUES (?1, ?2, ?3)",
            params![key, value, expires_at],
        )?;
        Ok(())
    }
}

/// Current time as Unix timestamp (seconds).
fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
