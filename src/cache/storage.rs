//! SQLite-based cache storage
//!
//! One table, one row per key. Payloads are stored as opaque blobs and
//! timestamps as Unix milliseconds.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use super::{CacheEntry, CacheStats, HitCounters, ResponseCache};
use crate::error::CacheError;

type Result<T> = std::result::Result<T, CacheError>;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS api_cache (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        cache_key TEXT NOT NULL UNIQUE,
        payload BLOB NOT NULL,
        cached_at INTEGER NOT NULL,
        expires_at INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_api_cache_key ON api_cache(cache_key);
    CREATE INDEX IF NOT EXISTS idx_api_cache_expires_at ON api_cache(expires_at);
"#;

/// SQLite-backed response cache
pub struct SqliteCache {
    conn: Mutex<Option<Connection>>,
    path: PathBuf,
    counters: HitCounters,
}

impl SqliteCache {
    /// Open or create the cache at the default XDG cache location
    pub fn open() -> Result<Self> {
        Self::open_at(&Self::default_path()?)
    }

    /// Default database path (~/.cache/reelscan/cache.db on Linux)
    pub fn default_path() -> Result<PathBuf> {
        let cache_base = dirs::cache_dir().ok_or(CacheError::NoCacheDir)?;
        Ok(cache_base.join("reelscan").join("cache.db"))
    }

    /// Open or create the cache database at `path`, creating parent directories
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::Io(format!("Failed to create cache dir: {}", e)))?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        log::debug!("Opened response cache at {}", path.display());

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            path: path.to_path_buf(),
            counters: HitCounters::default(),
        })
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove every expired entry, returning how many were deleted.
    ///
    /// Lookups already evict lazily; this is for the `cache clear --expired`
    /// maintenance path.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now().timestamp_millis();
        self.with_conn(|conn| {
            conn.execute("DELETE FROM api_cache WHERE expires_at <= ?1", [now])
        })
    }

    /// Number of expired entries not yet evicted
    pub fn expired_count(&self) -> Result<usize> {
        let now = Utc::now().timestamp_millis();
        let count: i64 = self.with_conn(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM api_cache WHERE expires_at <= ?1",
                [now],
                |r| r.get(0),
            )
        })?;
        Ok(count as usize)
    }

    fn lock(&self) -> MutexGuard<'_, Option<Connection>> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T> {
        let guard = self.lock();
        let conn = guard.as_ref().ok_or(CacheError::Closed)?;
        Ok(f(conn)?)
    }
}

impl ResponseCache for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Utc::now().timestamp_millis();

        let result = self.with_conn(|conn| {
            let row: Option<(Vec<u8>, i64)> = conn
                .query_row(
                    "SELECT payload, expires_at FROM api_cache WHERE cache_key = ?1",
                    [key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match row {
                Some((payload, expires_at)) if expires_at > now => Ok(Some(payload)),
                Some(_) => {
                    conn.execute("DELETE FROM api_cache WHERE cache_key = ?1", [key])?;
                    Ok(None)
                }
                None => Ok(None),
            }
        });

        match &result {
            Ok(Some(_)) => self.counters.hit(),
            _ => self.counters.miss(),
        }
        result
    }

    fn set(&self, key: &str, payload: &[u8], ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(key, payload, ttl, Utc::now());

        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO api_cache (cache_key, payload, cached_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(cache_key) DO UPDATE SET
                    payload = excluded.payload,
                    cached_at = excluded.cached_at,
                    expires_at = excluded.expires_at",
                params![
                    entry.key,
                    entry.payload,
                    entry.cached_at.timestamp_millis(),
                    entry.expires_at.timestamp_millis()
                ],
            )
        })?;
        Ok(())
    }

    fn discard(&self, key: &str) -> Result<()> {
        self.counters.demote_hit();
        self.with_conn(|conn| conn.execute("DELETE FROM api_cache WHERE cache_key = ?1", [key]))?;
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.with_conn(|conn| conn.execute("DELETE FROM api_cache", []))?;
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.with_conn(|conn| {
            conn.query_row("SELECT COUNT(*) FROM api_cache", [], |r| r.get(0))
        })?;
        Ok(count as usize)
    }

    fn stats(&self) -> Result<CacheStats> {
        Ok(self.counters.snapshot(self.count()?))
    }

    fn reset_stats(&self) {
        self.counters.reset();
    }

    fn close(&self) -> Result<()> {
        let conn = self.lock().take();
        if let Some(conn) = conn {
            conn.close().map_err(|(_, e)| CacheError::Sqlite(e))?;
            log::debug!("Closed response cache at {}", self.path.display());
        }
        Ok(())
    }
}
