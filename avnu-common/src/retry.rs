//! Bounded-retry policy for fire-and-forget deliveries
//!
//! Best-effort sends (notification fan-out, invite emails) must not surface
//! failures into the primary flow, but silently swallowing them hides real
//! delivery problems. The policy returns an explicit [`Delivery`] result so
//! call sites can log exhaustion distinctly from logic failures.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Outcome of a best-effort delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery<T> {
    Delivered(T),
    /// All attempts failed; the caller must treat the send as not guaranteed
    Exhausted,
}

impl<T> Delivery<T> {
    pub fn delivered(self) -> Option<T> {
        match self {
            Delivery::Delivered(value) => Some(value),
            Delivery::Exhausted => None,
        }
    }
}

/// Retry policy: bounded attempts with linear backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Base backoff; attempt `n` sleeps `backoff * n` before retrying
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Run `op` until it succeeds or attempts are exhausted
    ///
    /// `op` receives the 1-based attempt number. Failures are logged per
    /// attempt; exhaustion is the caller's to report.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Delivery<T>
    where
        E: Display,
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        for attempt in 1..=self.max_attempts {
            match op(attempt).await {
                Ok(value) => return Delivery::Delivered(value),
                Err(e) => {
                    warn!(
                        "{} failed (attempt {}/{}): {}",
                        what, attempt, self.max_attempts, e
                    );
                    if attempt < self.max_attempts {
                        tokio::time::sleep(self.backoff * attempt).await;
                    }
                }
            }
        }
        Delivery::Exhausted
    }
}
