//! Bounded retries for narrator calls.
//!
//! Every attempt is bounded by a timeout. Only malformed output is retried;
//! transport failures and timeouts end the call immediately.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::narrator::NarratorError;

/// Runs `op` up to `max_attempts` times while it returns
/// `NarratorError::Malformed`.
///
/// `op` receives the 1-based attempt number.
///
/// # Errors
///
/// Returns the last `Malformed` error once attempts are exhausted, or the
/// first `Transport`/`Timeout` error encountered.
pub async fn retry_malformed<T, F, Fut>(
    max_attempts: u32,
    timeout: Duration,
    mut op: F,
) -> Result<T, NarratorError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, NarratorError>>,
{
    let attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        let outcome = match tokio::time::timeout(timeout, op(attempt)).await {
            Ok(result) => result,
            Err(_) => Err(NarratorError::Timeout(timeout)),
        };
        match outcome {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < attempts => {
                warn!(attempt, max_attempts = attempts, error = %err, "narrator output unusable, retrying");
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Like [`retry_malformed`], but yields `fallback()` instead of an error
/// once malformed attempts are exhausted.
///
/// # Errors
///
/// Returns `Transport` and `Timeout` errors unchanged.
pub async fn retry_with_fallback<T, F, Fut, D>(
    max_attempts: u32,
    timeout: Duration,
    op: F,
    fallback: D,
) -> Result<T, NarratorError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, NarratorError>>,
    D: FnOnce() -> T,
{
    match retry_malformed(max_attempts, timeout, op).await {
        Err(NarratorError::Malformed(reason)) => {
            warn!(%reason, "narrator attempts exhausted, using fallback");
            Ok(fallback())
        }
        other => other,
    }
}
