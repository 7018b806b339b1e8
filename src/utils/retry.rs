//! Retry policy with exponential backoff.
//!
//! One policy object is shared by the embedding client and the persistence
//! batcher; the retryable-error predicate lives on the error type itself via
//! [`Retryable`].

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Policy describing how an operation is retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first call.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Backoff multiplier applied after each retry.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(16),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    /// Set the delay before the first retry.
    #[must_use]
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the upper bound on any single delay.
    #[must_use]
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }
}

/// Outcome of a retried operation.
#[derive(Debug)]
pub enum RetryOutcome<T, E> {
    /// Operation succeeded within the attempt budget.
    Success(T),
    /// Operation failed on every attempt, or hit a non-retryable error.
    Failed { last_error: E, attempts: u32 },
}

impl<T, E> RetryOutcome<T, E> {
    /// Convert to a `Result`, discarding the attempt count.
    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryOutcome::Success(value) => Ok(value),
            RetryOutcome::Failed { last_error, .. } => Err(last_error),
        }
    }
}

/// Determines whether a failed operation is worth retrying.
pub trait Retryable {
    /// Returns true if the operation should be retried.
    fn is_retryable(&self) -> bool;
}

/// Execute an async operation under the given policy.
///
/// Retries only while the error reports itself retryable; a non-retryable
/// error fails immediately with a single attempt recorded.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut operation: F) -> RetryOutcome<T, E>
where
    E: Retryable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts = 0;
    let mut delay = policy.base_delay;

    loop {
        attempts += 1;

        match operation().await {
            Ok(value) => return RetryOutcome::Success(value),
            Err(error) => {
                if attempts >= policy.max_attempts.max(1) || !error.is_retryable() {
                    return RetryOutcome::Failed {
                        last_error: error,
                        attempts,
                    };
                }

                // Jitter avoids synchronized retry storms across workers
                let jitter_ms = rand_jitter(delay.as_millis() as u64 / 4);
                sleep(delay + Duration::from_millis(jitter_ms)).await;

                delay = Duration::from_secs_f64(delay.as_secs_f64() * policy.multiplier)
                    .min(policy.max_delay);
            }
        }
    }
}

/// Generate a random jitter value below `max` milliseconds.
fn rand_jitter(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    // Clock-seeded modulo is plenty for spreading retries out
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    seed % max
}
