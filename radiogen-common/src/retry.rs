//! Retry combinator for fallible async operations
//!
//! Downloads and uploads share the same retry shape: a bounded number of
//! attempts with a backoff delay between them. The combinator is
//! parameterized over the backoff schedule so callers can pick linear
//! (network transfers) or fixed delays without duplicating the loop.

use crate::{Error, Result};
use std::time::Duration;

/// Linear backoff: `attempt * step` before attempt 2, 3, ...
pub fn linear_backoff(step: Duration) -> impl Fn(u32) -> Duration {
    move |attempt| step * attempt
}

/// Fixed backoff: the same delay before every retry.
pub fn fixed_backoff(delay: Duration) -> impl Fn(u32) -> Duration {
    move |_attempt| delay
}

/// Retry an async operation up to `max_attempts` times.
///
/// Only errors for which [`Error::is_retryable`] returns true are retried;
/// deterministic failures (not-found, config, audio engine) surface
/// immediately. The backoff function receives the just-failed attempt
/// number (1-based) and returns the delay before the next attempt.
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g. "download intro.mp3")
/// * `max_attempts` - Total attempts, including the first (must be >= 1)
/// * `backoff` - Delay schedule between attempts
/// * `operation` - Async closure performing the fallible operation
pub async fn retry<F, Fut, T, B>(
    operation_name: &str,
    max_attempts: u32,
    backoff: B,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
    B: Fn(u32) -> Duration,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if err.is_retryable() && attempt < max_attempts => {
                let delay = backoff(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    backoff_ms = delay.as_millis() as u64,
                    error = %err,
                    "Operation failed, will retry after backoff"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                if attempt > 1 {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Operation failed, retries exhausted"
                    );
                }
                return Err(err);
            }
        }
    }
}
