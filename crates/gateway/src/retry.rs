//! Bounded retry policy with exponential backoff.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::GatewayError;

/// Retry configuration for transient gateway failures.
///
/// The delay doubles per attempt starting from `base_delay`, capped at
/// `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one.
    pub max_attempts: u32,

    /// Backoff delay before the second attempt.
    pub base_delay: Duration,

    /// Upper bound for a single backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Returns the backoff delay after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, fails non-retryably, or the policy is
/// exhausted. Backoff sleeps are preempted by `cancel`, which surfaces as
/// [`GatewayError::Cancelled`] rather than a retryable failure.
pub async fn retry_with_policy<T, F, Fut>(
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    let mut attempt = 1u32;
    loop {
        if cancel.is_cancelled() {
            return Err(GatewayError::Cancelled);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() => {
                if attempt >= policy.max_attempts {
                    return Err(GatewayError::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(err),
                    });
                }

                let delay = policy.delay_for(attempt);
                tracing::warn!(%err, attempt, ?delay, "retryable gateway failure, backing off");
                metrics::counter!("gateway_retries_total").increment(1);

                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                }
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
