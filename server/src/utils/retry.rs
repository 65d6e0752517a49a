//! Async retry utilities with exponential backoff

use std::future::Future;
use std::time::Duration;

/// Default maximum attempts for upstream fetches
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base delay in milliseconds for exponential backoff
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;

/// Retry an async operation with exponential backoff.
///
/// `is_transient` decides whether a failure is worth another attempt; permanent
/// failures are returned immediately. Returns the value on success, or the last
/// error together with the number of attempts made.
pub async fn retry_with_backoff_async<F, Fut, T, E, P>(
    max_attempts: u32,
    base_delay_ms: u64,
    is_transient: P,
    mut operation: F,
) -> Result<T, (E, u32)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let max_attempts = max_attempts.max(1);
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempts >= max_attempts || !is_transient(&e) {
                    return Err((e, attempts));
                }
                let delay = backoff_delay(base_delay_ms, attempts);
                tracing::warn!(
                    error = %e,
                    attempt = attempts,
                    delay_ms = delay.as_millis(),
                    "Retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Delay before the next attempt (`base * 2^(attempt-1)`, capped at 2^10)
fn backoff_delay(base_delay_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    Duration::from_millis(base_delay_ms.saturating_mul(2_u64.pow(exponent)))
}
