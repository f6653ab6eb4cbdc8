//! In-memory cache backend
//!
//! Same semantics as [`SqliteCache`](super::SqliteCache) without touching
//! disk. Used by tests and for one-off runs that should not persist anything.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::Utc;

use super::{CacheEntry, CacheStats, HitCounters, ResponseCache};
use crate::error::CacheError;

type Result<T> = std::result::Result<T, CacheError>;

/// Map-backed response cache
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    counters: HitCounters,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ResponseCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Utc::now();
        let mut entries = self.entries();

        let payload = match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.payload.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };

        if payload.is_some() {
            self.counters.hit();
        } else {
            self.counters.miss();
        }
        Ok(payload)
    }

    fn set(&self, key: &str, payload: &[u8], ttl: Duration) -> Result<()> {
        let entry = CacheEntry::new(key, payload, ttl, Utc::now());
        self.entries().insert(key.to_string(), entry);
        Ok(())
    }

    fn discard(&self, key: &str) -> Result<()> {
        self.counters.demote_hit();
        self.entries().remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.entries().clear();
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.entries().len())
    }

    fn stats(&self) -> Result<CacheStats> {
        Ok(self.counters.snapshot(self.count()?))
    }

    fn reset_stats(&self) {
        self.counters.reset();
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
