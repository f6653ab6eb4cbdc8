//! Retry with exponential backoff for remote calls
//!
//! Transport failures, HTTP 429 and HTTP 5xx are retried; everything else
//! propagates on the first attempt. The classification lives in [`classify`]
//! so it can be tested without HTTP.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::warn;

use crate::error::ApiError;

/// Default number of attempts per remote call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default wait before the second attempt
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// What to do after one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Retry,
    Terminal,
}

/// Result of one attempt, reduced to what the classifier needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// Connection, timeout or body read failure
    Transport,
    /// The server answered with this status code
    Status(u16),
}

/// Decide whether an attempt succeeded, should be retried, or is final.
pub fn classify(attempt: Attempt) -> Verdict {
    match attempt {
        Attempt::Transport => Verdict::Retry,
        Attempt::Status(200..=299) => Verdict::Success,
        Attempt::Status(429) | Attempt::Status(500..=599) => Verdict::Retry,
        Attempt::Status(_) => Verdict::Terminal,
    }
}

fn verdict_for(err: &ApiError) -> Verdict {
    match err {
        ApiError::Network(_) => classify(Attempt::Transport),
        other => other
            .status()
            .map(|code| classify(Attempt::Status(code)))
            .unwrap_or(Verdict::Terminal),
    }
}

/// State handed to the observer before each backoff sleep
#[derive(Debug)]
pub struct RetryOutcome<'a> {
    /// Attempt that just failed (1-based)
    pub attempt: u32,
    pub max_attempts: u32,
    /// Wait before the next attempt
    pub backoff: Duration,
    pub last_error: &'a ApiError,
}

/// Diagnostics hook, never consulted for control flow
pub type RetryObserver = Arc<dyn Fn(&RetryOutcome<'_>) + Send + Sync>;

/// Exponential backoff policy
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
    observer: Option<RetryObserver>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_INITIAL_BACKOFF)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_backoff", &self.initial_backoff)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}

impl RetryPolicy {
    /// `max_attempts` of zero behaves like one.
    pub fn new(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            observer: None,
        }
    }

    /// Attach a hook that sees every retry before its sleep
    pub fn with_observer(mut self, observer: RetryObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    /// Wait after failed attempt `attempt`: `initial * 2^(attempt-1)`,
    /// doubled once more when the server asked us to slow down.
    pub fn backoff_for(&self, attempt: u32, err: &ApiError) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        let backoff = self.initial_backoff.saturating_mul(factor);
        if matches!(err, ApiError::RateLimited) {
            backoff.saturating_mul(2)
        } else {
            backoff
        }
    }

    /// Run `operation` until it succeeds, fails terminally, or attempts run out.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let mut attempt = 1;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if verdict_for(&err) == Verdict::Terminal || attempt >= self.max_attempts {
                return Err(err);
            }

            let backoff = self.backoff_for(attempt, &err);
            warn!(
                "Attempt {}/{} failed ({}), retrying in {:?}",
                attempt, self.max_attempts, err, backoff
            );
            if let Some(observer) = &self.observer {
                observer(&RetryOutcome {
                    attempt,
                    max_attempts: self.max_attempts,
                    backoff,
                    last_error: &err,
                });
            }

            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

/// Run `operation` under a fresh [`RetryPolicy`] without an observer.
pub async fn retry<T, F, Fut>(
    operation: F,
    max_attempts: u32,
    initial_backoff: Duration,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
{
    RetryPolicy::new(max_attempts, initial_backoff)
        .run(operation)
        .await
}
