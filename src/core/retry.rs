use crate::utils::error::Result;
use std::future::Future;
use std::time::Duration;

/// Exponential backoff settings shared by every API call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one. Never below 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_factor: f64,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_backoff: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, initial_backoff: Duration, backoff_factor: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            backoff_factor,
            ..Self::default()
        }
    }

    /// No waiting between attempts. Used by tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO, 1.0)
    }

    /// Wait before the attempt that follows failed attempt `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0).powi(attempt as i32);
        let secs = self.initial_backoff.as_secs_f64() * factor;
        if !secs.is_finite() || secs >= self.max_backoff.as_secs_f64() {
            return self.max_backoff;
        }
        Duration::from_secs_f64(secs)
    }
}

/// Runs `operation` until it succeeds, returns a non-retryable error, or
/// `policy.max_attempts` is reached. The last error is returned on exhaustion.
pub async fn retry_with_backoff<T, F, Fut, P>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: P,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&crate::utils::error::MegaverseError) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if !is_retryable(&e) {
                    tracing::debug!("{} failed with non-retryable error: {}", operation_name, e);
                    return Err(e);
                }

                if attempt + 1 >= max_attempts {
                    tracing::error!(
                        "All {} attempts failed for {}: {}",
                        max_attempts,
                        operation_name,
                        e
                    );
                    return Err(e);
                }

                let wait = policy.delay_for(attempt);
                tracing::warn!(
                    "Attempt {}/{} failed for {}: {}. Retrying in {:.1}s...",
                    attempt + 1,
                    max_attempts,
                    operation_name,
                    e,
                    wait.as_secs_f64()
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

/// Re-runs `operation` while `needs_retry` holds for its result. Returns the
/// last result once attempts run out.
pub async fn retry_on_condition<T, F, Fut, C>(
    policy: &RetryPolicy,
    operation_name: &str,
    needs_retry: C,
    mut operation: F,
) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
    C: Fn(&T) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        let value = operation().await;
        if !needs_retry(&value) {
            return value;
        }

        if attempt + 1 >= max_attempts {
            tracing::error!(
                "All {} attempts for {} did not meet condition",
                max_attempts,
                operation_name
            );
            return value;
        }

        let wait = policy.delay_for(attempt);
        tracing::warn!(
            "Attempt {}/{} for {} did not meet condition. Retrying in {:.1}s...",
            attempt + 1,
            max_attempts,
            operation_name,
            wait.as_secs_f64()
        );
        tokio::time::sleep(wait).await;
        attempt += 1;
    }
}
