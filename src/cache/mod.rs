//! Local cache for API responses
//!
//! Stores raw response bodies keyed by a hash of the request. Entries expire
//! lazily: an expired entry is removed the next time it is read, there is no
//! background sweep. Two backends implement [`ResponseCache`]: SQLite for
//! persistent use and an in-memory map for tests.

pub mod key;
pub mod memory;
pub mod storage;

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::CacheError;

pub use key::cache_key;
pub use memory::MemoryCache;
pub use storage::SqliteCache;

type Result<T> = std::result::Result<T, CacheError>;

/// Default lifetime of cached responses
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60); // 30 days

/// Capability contract shared by all cache backends.
///
/// Implementations must be usable from several threads at once: hit/miss
/// counters are atomic and storage access is serialized by the backend.
pub trait ResponseCache: Send + Sync {
    /// Look up a payload.
    ///
    /// Returns `Ok(None)` when the key is absent or its entry has expired; an
    /// expired entry is deleted before returning. Every call counts exactly
    /// one hit or one miss, storage failures included (as misses).
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Insert or replace the payload stored under `key`.
    fn set(&self, key: &str, payload: &[u8], ttl: Duration) -> Result<()>;

    /// Drop an entry whose payload the caller could not use.
    ///
    /// The lookup that returned it is recounted as a miss.
    fn discard(&self, key: &str) -> Result<()>;

    /// Remove every entry. Hit/miss counters are left alone.
    fn clear(&self) -> Result<()>;

    /// Number of stored entries, including expired ones not yet evicted.
    fn count(&self) -> Result<usize>;

    /// Snapshot of counters plus the live entry count.
    fn stats(&self) -> Result<CacheStats>;

    /// Zero the hit/miss counters.
    fn reset_stats(&self);

    /// Release the underlying storage. Calling it twice is fine.
    fn close(&self) -> Result<()>;
}

/// One stored response
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Vec<u8>,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Build an entry stamped at `now`.
    ///
    /// Sub-millisecond TTLs are rounded up so that `expires_at > cached_at`
    /// always holds.
    pub fn new(key: &str, payload: &[u8], ttl: Duration, now: DateTime<Utc>) -> Self {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX).max(1);
        let expires_at = now
            .checked_add_signed(chrono::Duration::milliseconds(ttl_ms))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            key: key.to_string(),
            payload: payload.to_vec(),
            cached_at: now,
            expires_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entry_count: usize,
}

impl CacheStats {
    /// Percentage of lookups served from the cache (0 when nothing was looked up)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            return 0.0;
        }
        self.hits as f64 / total as f64 * 100.0
    }
}

/// Lock-free hit/miss bookkeeping shared by the backends
#[derive(Debug, Default)]
pub(crate) struct HitCounters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl HitCounters {
    pub fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Turn one recorded hit into a miss
    pub fn demote_hit(&self) {
        if self
            .hits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |h| h.checked_sub(1))
            .is_ok()
        {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn snapshot(&self, entry_count: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_hit_rate_zero_without_lookups() {
        let stats = CacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_percentage() {
        let stats = CacheStats {
            hits: 3,
            misses: 1,
            entry_count: 0,
        };
        assert_eq!(stats.hit_rate(), 75.0);

        let stats = CacheStats {
            hits: 0,
            misses: 4,
            entry_count: 2,
        };
        assert_eq!(stats.hit_rate(), 0.0);
    }

    #[test]
    fn test_demote_hit_never_underflows() {
        let counters = HitCounters::default();
        counters.demote_hit();
        assert_eq!(counters.snapshot(0), CacheStats::default());

        counters.hit();
        counters.demote_hit();
        let stats = counters.snapshot(0);
        assert_eq!((stats.hits, stats.misses), (0, 1));
    }

    #[test]
    fn test_entry_zero_ttl_still_expires_after_cached_at() {
        let now = Utc::now();
        let entry = CacheEntry::new("k", b"v", Duration::ZERO, now);
        assert!(entry.expires_at > entry.cached_at);
        assert!(!entry.is_expired(now));
        assert!(entry.is_expired(now + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn test_counters_from_many_threads() {
        let counters = Arc::new(HitCounters::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let counters = Arc::clone(&counters);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        if i % 2 == 0 {
                            counters.hit();
                        } else {
                            counters.miss();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stats = counters.snapshot(0);
        assert_eq!(stats.hits, 4000);
        assert_eq!(stats.misses, 4000);

        counters.reset();
        assert_eq!(counters.snapshot(0), CacheStats::default());
    }
}
