use std::future::Future;
use std::time::Duration;

/// Request-level retry settings shared by every store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first attempt.
    pub max_attempts: u32,
    /// HTTP statuses treated as throttling. Everything else fails immediately.
    pub retryable_statuses: Vec<u16>,
    /// Delay before the first retry; doubles on each further retry.
    pub backoff_factor: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 11,
            retryable_statuses: vec![429],
            backoff_factor: Duration::from_millis(500),
            max_backoff: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

/// Terminal state returned by the retry runner.
#[derive(Debug)]
pub struct RetryTerminal<E> {
    pub error: E,
    pub attempts: u32,
    pub exhausted_retryable: bool,
}

/// Executes one async operation under `policy`.
///
/// `is_retryable` classifies each error; `retry_after` lets an error carry a server-suggested
/// delay, which wins over the computed backoff when it is longer.
pub async fn run_with_retry<T, E, F, Fut, R, A>(
    policy: &RetryPolicy,
    mut op: F,
    mut is_retryable: R,
    mut retry_after: A,
) -> Result<(T, u32), RetryTerminal<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: FnMut(&E) -> bool,
    A: FnMut(&E) -> Option<Duration>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok((value, attempt)),
            Err(error) => {
                let retryable = is_retryable(&error);
                if !retryable || attempt >= max_attempts {
                    return Err(RetryTerminal {
                        error,
                        attempts: attempt,
                        exhausted_retryable: retryable,
                    });
                }

                let delay = compute_backoff_delay(policy, attempt).max(
                    retry_after(&error)
                        .unwrap_or(Duration::ZERO)
                        .min(policy.max_backoff),
                );
                tracing::debug!(
                    event = "store_request_retry",
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    "throttled, backing off before retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

/// Backoff before retry number `attempt` (1-based): `factor * 2^(attempt - 1)`, capped.
pub fn compute_backoff_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    if policy.backoff_factor.is_zero() {
        return Duration::ZERO;
    }

    let shift = u32::min(attempt.saturating_sub(1), 20);
    let exponential_ms = policy
        .backoff_factor
        .as_millis()
        .saturating_mul(1u128 << shift);
    let capped_ms = exponential_ms.min(policy.max_backoff.as_millis());

    Duration::from_millis(capped_ms.min(u64::MAX as u128) as u64)
}
