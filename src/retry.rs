//! Retry policy with bounded exponential backoff
//!
//! One policy object drives every capability call: the controller wraps
//! Transformer calls and the engine wraps Evaluator calls with the same
//! mechanism, differing only in configured limits. Errors classify
//! themselves through the `Retryable` trait; permanent failures abort
//! immediately, transient ones back off exponentially (2^n growth capped
//! at a maximum delay) until the attempt ceiling.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Classification hook mapping raw errors to transient/permanent
pub trait Retryable {
    /// Whether another attempt could reasonably succeed
    fn is_retryable(&self) -> bool;
}

/// Bounded exponential backoff policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub base_delay_ms: u64,
    /// Ceiling on any single backoff delay
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 60_000,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay after the given (1-based) failed attempt:
    /// `base * 2^(attempt-1)`, capped at `max_delay_ms`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay_ms.saturating_mul(1u64 << exp);
        Duration::from_millis(delay.min(self.max_delay_ms))
    }
}

/// Terminal failure from a retried operation
#[derive(Debug)]
pub struct RetryError<E> {
    /// The last error observed
    pub error: E,
    /// Attempts made, including the failing one
    pub attempts: u32,
    /// True when a retryable error ran out of budget, false when the
    /// error was permanent
    pub exhausted: bool,
}

impl<E: std::fmt::Display> std::fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.exhausted {
            write!(
                f,
                "retry budget exhausted after {} attempts: {}",
                self.attempts, self.error
            )
        } else {
            write!(f, "permanent failure: {}", self.error)
        }
    }
}

/// Drive an async operation under a retry policy.
///
/// The closure receives the 1-based attempt number. On success returns the
/// value together with the attempt count that produced it.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    op: &str,
    mut f: F,
) -> Result<(T, u32), RetryError<E>>
where
    E: Retryable + std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match f(attempt).await {
            Ok(value) => return Ok((value, attempt)),
            Err(error) if error.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    op,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                let exhausted = error.is_retryable();
                return Err(RetryError {
                    error,
                    attempts: attempt,
                    exhausted,
                });
            }
        }
    }
}
