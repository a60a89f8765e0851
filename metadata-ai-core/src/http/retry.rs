//! Retry policy with exponential backoff
//!
//! Only the unary path goes through [`RetryExecutor`]; event streams are never
//! replayed once bytes may have been consumed.

use crate::config::ValidationError;
use crate::error::{AiSdkError, AiSdkResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not including the initial attempt)
    pub max_retries: u32,

    /// Delay before the first retry (milliseconds)
    pub initial_delay_ms: u64,

    /// Optional cap on the computed backoff (milliseconds)
    pub max_delay_ms: Option<u64>,

    /// Base for exponential backoff (e.g., 2.0 for doubling)
    pub exponential_base: f64,

    /// Jitter factor (0.0 to 1.0) to randomize delays
    pub jitter_factor: f64,

    /// Whether to use the server's `Retry-After` value when present
    pub respect_retry_after: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: None,
            exponential_base: 2.0,
            jitter_factor: 0.0,
            respect_retry_after: true,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom configuration
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = Some(delay.as_millis() as u64);
        self
    }

    pub fn with_jitter(mut self, jitter_factor: f64) -> Self {
        self.jitter_factor = jitter_factor;
        self
    }

    /// Calculate the delay before retry number `attempt + 1`
    ///
    /// A server-supplied `Retry-After` wins over the exponential formula and
    /// is used verbatim (no cap, no jitter).
    pub fn calculate_delay(&self, attempt: u32, error: &AiSdkError) -> Duration {
        if self.respect_retry_after {
            if let Some(retry_after) = error.retry_after() {
                return retry_after;
            }
        }

        let base_delay =
            self.initial_delay_ms as f64 * self.exponential_base.powi(attempt.min(i32::MAX as u32) as i32);
        let capped_delay = match self.max_delay_ms {
            Some(max) => base_delay.min(max as f64),
            None => base_delay,
        };

        let delay_with_jitter = if self.jitter_factor > 0.0 && capped_delay > 0.0 {
            let mut rng = rand::thread_rng();
            let jitter_range = capped_delay * self.jitter_factor;
            let jitter = rng.gen_range(-jitter_range..=jitter_range);
            (capped_delay + jitter).max(0.0)
        } else {
            capped_delay
        };

        Duration::from_millis(delay_with_jitter as u64)
    }

    /// Check if we should retry based on the error and attempt count
    pub fn should_retry(&self, error: &AiSdkError, attempt: u32) -> bool {
        if attempt >= self.max_retries {
            return false;
        }

        error.is_retryable()
    }

    /// Validate retry policy
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if !self.exponential_base.is_finite() || self.exponential_base < 1.0 {
            return Err(ValidationError::out_of_range(
                format!("{}.exponential_base", path),
                "Must be at least 1.0",
            ));
        }

        if !(0.0..=1.0).contains(&self.jitter_factor) {
            return Err(ValidationError::out_of_range(
                format!("{}.jitter_factor", path),
                "Must be between 0.0 and 1.0",
            ));
        }

        if let Some(max) = self.max_delay_ms {
            if max < self.initial_delay_ms {
                return Err(ValidationError::new(
                    format!("{}.max_delay_ms", path),
                    crate::config::ValidationErrorKind::Incompatible {
                        message: "Must be >= initial_delay_ms".to_string(),
                    },
                ));
            }
        }

        Ok(())
    }
}

/// Bookkeeping for one logical request and its retries
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetryState {
    /// Retries performed so far (0 on the first attempt)
    pub attempt: u32,
    /// Delay awaited before the most recent retry
    pub last_delay: Option<Duration>,
    /// Set once the request failed for good
    pub exhausted: bool,
}

impl RetryState {
    /// Total number of attempts made, including the first
    pub fn attempts_made(&self) -> u32 {
        self.attempt + 1
    }
}

/// Executor for retry operations
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create a new retry executor with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute an operation with retry logic
    ///
    /// The closure receives the zero-based attempt number.
    pub async fn execute<F, T, Fut>(&self, operation: F) -> AiSdkResult<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AiSdkResult<T>>,
    {
        self.execute_with_state(operation).await.0
    }

    /// Like [`execute`](Self::execute), also returning the final retry state
    pub async fn execute_with_state<F, T, Fut>(&self, mut operation: F) -> (AiSdkResult<T>, RetryState)
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = AiSdkResult<T>>,
    {
        let mut state = RetryState::default();

        loop {
            match operation(state.attempt).await {
                Ok(result) => return (Ok(result), state),
                Err(error) => {
                    if !self.policy.should_retry(&error, state.attempt) {
                        if error.is_retryable() {
                            warn!("Giving up after {} attempts: {}", state.attempts_made(), error);
                        } else {
                            debug!("Not retrying non-retryable error: {}", error);
                        }
                        state.exhausted = true;
                        return (Err(error), state);
                    }

                    let delay = self.policy.calculate_delay(state.attempt, &error);
                    warn!(
                        "Attempt {} failed: {}; retrying in {:?}",
                        state.attempts_made(),
                        error,
                        delay
                    );
                    state.last_delay = Some(delay);

                    tokio::time::sleep(delay).await;
                    state.attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn server_error(status: u16) -> AiSdkError {
        AiSdkError::ExecutionFailure {
            status: Some(status),
            message: "unavailable".into(),
            agent: None,
            retry_after: None,
        }
    }

    #[test]
    fn test_retry_policy_defaults() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.initial_delay_ms, 1000);
        assert_eq!(policy.exponential_base, 2.0);
        assert_eq!(policy.max_delay_ms, None);
        assert_eq!(policy.jitter_factor, 0.0);
    }

    #[test]
    fn test_exponential_backoff_calculation() {
        let policy = RetryPolicy {
            initial_delay_ms: 100,
            max_delay_ms: Some(1000),
            ..Default::default()
        };

        let error = AiSdkError::Timeout;

        assert_eq!(policy.calculate_delay(0, &error).as_millis(), 100);
        assert_eq!(policy.calculate_delay(1, &error).as_millis(), 200);
        assert_eq!(policy.calculate_delay(2, &error).as_millis(), 400);
        assert_eq!(policy.calculate_delay(3, &error).as_millis(), 800);
        // 1600 capped
        assert_eq!(policy.calculate_delay(4, &error).as_millis(), 1000);
    }

    #[test]
    fn test_retry_after_used_verbatim() {
        let policy = RetryPolicy {
            max_delay_ms: Some(500),
            ..Default::default()
        };

        let error = AiSdkError::RateLimited {
            retry_after: Some(Duration::from_secs(5)),
        };
        assert_eq!(policy.calculate_delay(2, &error), Duration::from_secs(5));

        let error = AiSdkError::ExecutionFailure {
            status: Some(503),
            message: "busy".into(),
            agent: None,
            retry_after: Some(Duration::from_millis(1500)),
        };
        assert_eq!(policy.calculate_delay(0, &error), Duration::from_millis(1500));
    }

    #[test]
    fn test_retry_after_ignored_when_disabled() {
        let policy = RetryPolicy {
            respect_retry_after: false,
            ..Default::default()
        };
        let error = AiSdkError::RateLimited {
            retry_after: Some(Duration::from_secs(30)),
        };
        assert_eq!(policy.calculate_delay(1, &error), Duration::from_secs(2));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let policy = RetryPolicy::default().with_jitter(0.5);
        for _ in 0..50 {
            let delay = policy.calculate_delay(0, &AiSdkError::Timeout).as_millis();
            assert!((500..=1500).contains(&delay), "delay {} out of range", delay);
        }
    }

    #[test]
    fn test_should_retry_logic() {
        let policy = RetryPolicy::new(2);

        let timeout = AiSdkError::Timeout;
        assert!(policy.should_retry(&timeout, 0));
        assert!(policy.should_retry(&timeout, 1));
        assert!(!policy.should_retry(&timeout, 2));

        assert!(!policy.should_retry(&AiSdkError::Authentication, 0));
        assert!(!policy.should_retry(&server_error(501), 0));
        assert!(policy.should_retry(&server_error(502), 0));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let policy = RetryPolicy {
            jitter_factor: 1.5,
            ..Default::default()
        };
        assert_eq!(policy.validate("retry").unwrap_err().field_path, "retry.jitter_factor");

        let policy = RetryPolicy {
            exponential_base: 0.5,
            ..Default::default()
        };
        assert_eq!(
            policy.validate("retry").unwrap_err().field_path,
            "retry.exponential_base"
        );

        let policy = RetryPolicy {
            max_delay_ms: Some(10),
            ..Default::default()
        };
        assert!(policy.validate("retry").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_executor_retries_until_success() {
        let executor = RetryExecutor::new(RetryPolicy::default());
        let calls = AtomicU32::new(0);

        let (result, state) = executor
            .execute_with_state(|_| {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(server_error(503))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(state.attempt, 2);
        assert_eq!(state.last_delay, Some(Duration::from_secs(2)));
        assert!(!state.exhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_executor_exhausts_budget() {
        let executor = RetryExecutor::new(RetryPolicy::new(2));
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let (result, state) = executor
            .execute_with_state(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(AiSdkError::Timeout) }
            })
            .await;

        assert!(matches!(result, Err(AiSdkError::Timeout)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(state.exhausted);
        // 1s + 2s of backoff
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_executor_single_attempt_for_non_retryable() {
        let executor = RetryExecutor::new(RetryPolicy::default());
        let calls = AtomicU32::new(0);

        let result = executor
            .execute(|_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(AiSdkError::Authentication) }
            })
            .await;

        assert!(matches!(result, Err(AiSdkError::Authentication)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
