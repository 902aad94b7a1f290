//! Retry logic with exponential backoff.
//!
//! Wraps fallible operations, usually calls to a remote ticket service, so
//! transient failures are retried instead of surfacing immediately.

use std::time::Duration;

/// Backoff policy for a retried operation.
///
/// The delay before retry `n` (1-based) is `min(max_delay, base_delay * 2^(n-1))`
/// and an operation is attempted at most `max_retries + 1` times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,

    /// Maximum number of retries (0 = no retries).
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), Duration::from_secs(60), 5)
    }
}

impl RetryPolicy {
    /// Create a policy.
    pub fn new(base_delay: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self { base_delay, max_delay, max_retries }
    }

    /// Create a policy with no retries (fail fast).
    pub fn no_retry() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    /// Total number of attempts the policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Calculate the delay after the given failed attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let factor = 1u32.checked_shl(attempt - 1).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final result (success or last error).
    pub result: Result<T, E>,

    /// Number of attempts made.
    pub attempts: u32,

    /// Delays slept between attempts, in order.
    pub delays: Vec<Duration>,
}

impl<T, E> RetryResult<T, E> {
    /// Check if the operation succeeded.
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Whether the operation was retried.
    pub fn was_retried(&self) -> bool {
        self.attempts > 1
    }

    /// Get the result.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Retry a blocking operation, sleeping the current thread between attempts.
pub fn retry<T, E, F>(policy: &RetryPolicy, operation: F) -> RetryResult<T, E>
where
    F: FnMut() -> Result<T, E>,
{
    retry_with_sleep(policy, std::thread::sleep, operation)
}

/// Retry an operation using `sleep` to wait between attempts.
///
/// The attempt counter starts at zero on every call. Once retries are
/// exhausted the last error is returned unchanged.
pub fn retry_with_sleep<T, E, F, S>(
    policy: &RetryPolicy,
    mut sleep: S,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut() -> Result<T, E>,
    S: FnMut(Duration),
{
    let max_attempts = policy.max_attempts();
    let mut attempts = 0;
    let mut delays = Vec::new();

    loop {
        attempts += 1;
        let result = operation();

        if result.is_ok() || attempts >= max_attempts {
            if result.is_err() && attempts > 1 {
                tracing::debug!(attempts, "Retries exhausted");
            }
            return RetryResult { result, attempts, delays };
        }

        let delay = policy.delay_for_attempt(attempts);
        tracing::debug!(attempt = attempts, delay_ms = delay.as_millis() as u64, "Retrying");
        delays.push(delay);
        sleep(delay);
    }
}

/// Wrap an operation so every call to the returned closure is retried
/// under `policy`.
///
/// The wrapper has the same signature as the operation it wraps.
pub fn with_retry<T, E, F>(policy: RetryPolicy, mut operation: F) -> impl FnMut() -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
{
    move || retry(&policy, &mut operation).into_result()
}
