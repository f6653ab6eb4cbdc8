//! Spacing between remote calls
//!
//! The catalog enforces a request quota. Every remote call made through one
//! client is separated from the previous call's completion by at least the
//! configured delay. The wait happens before the next call rather than after
//! the current one, so the last call of a batch returns without sleeping.

use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;
use tokio::sync::{Mutex, MutexGuard};

/// Default delay between calls (TMDB allows roughly 40 requests per 10s)
pub const DEFAULT_RATE_LIMIT_DELAY: Duration = Duration::from_millis(250);

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared limiter for one client's remote calls
///
/// One call runs at a time. When a call completes, a single-cell limiter with
/// a period of `delay` is started and its cell spent; the next call waits for
/// that cell to replenish.
pub struct RequestThrottle {
    delay: Duration,
    quota: Option<Quota>,
    limiter: Mutex<Option<DirectLimiter>>,
}

/// Held for the duration of one remote call.
///
/// Dropping the permit starts the delay period.
pub struct ThrottlePermit<'a> {
    quota: Option<Quota>,
    limiter: MutexGuard<'a, Option<DirectLimiter>>,
}

impl Drop for ThrottlePermit<'_> {
    fn drop(&mut self) {
        if let Some(quota) = self.quota {
            let limiter = RateLimiter::direct(quota);
            // A fresh limiter always admits its first cell
            let _ = limiter.check();
            *self.limiter = Some(limiter);
        }
    }
}

impl RequestThrottle {
    /// A zero delay disables throttling; calls are still serialized.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            quota: Quota::with_period(delay),
            limiter: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait until a call may start and hold the slot until the permit drops.
    pub async fn acquire(&self) -> ThrottlePermit<'_> {
        let limiter = self.limiter.lock().await;

        if let Some(active) = limiter.as_ref()
            && active.check().is_err()
        {
            debug!("Throttling remote call (delay {:?})", self.delay);
            active.until_ready().await;
        }

        ThrottlePermit {
            quota: self.quota,
            limiter,
        }
    }
}

impl Default for RequestThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT_DELAY)
    }
}

impl std::fmt::Debug for RequestThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestThrottle")
            .field("delay", &self.delay)
            .finish()
    }
}
