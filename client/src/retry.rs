use std::future::Future;
use std::time::Duration;

/// Backoff policy for rate-limited calls: up to `max_retries` attempts,
/// waiting `initial_delay` after the first failed attempt and doubling
/// the wait after each subsequent one.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(1000),
        }
    }
}

/// Re-invoke `op` while it fails with a retryable error.
///
/// A success is returned immediately, so an operation that never
/// rate-limits costs zero waits. An error matching `should_retry` waits
/// the current delay, doubles it, and tries again; any other error
/// returns as-is. Once `max_retries` attempts are exhausted the call
/// fails with `exhausted()`, so each call site keeps its own error
/// type.
pub async fn retry_with_backoff<T, E, Fut>(
    policy: RetryPolicy,
    mut op: impl FnMut() -> Fut,
    should_retry: impl Fn(&E) -> bool,
    exhausted: impl FnOnce() -> E,
) -> Result<T, E>
where
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = policy.initial_delay;
    for attempt in 1..=policy.max_retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if should_retry(&e) => {
                tracing::warn!("attempt {attempt} of {}: {e}", policy.max_retries);
            }
            Err(e) => return Err(e),
        }
        tokio::time::sleep(delay).await;
        delay *= 2;
    }
    Err(exhausted())
}
