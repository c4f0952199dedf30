//! Retry with exponential backoff at the provider boundary.
//!
//! Only `BackendTransient` failures are retried. Everything else, and the
//! last transient failure once attempts run out, is returned unchanged.

use crate::client::{LlmClient, LlmRequest, LlmResponse};
use grounded_core::{AppError, AppResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Maximum attempts (including the first one)
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Backoff before the second attempt
const DEFAULT_INITIAL_BACKOFF_MS: u64 = 100;

/// Upper bound for a single backoff sleep
const DEFAULT_MAX_BACKOFF_MS: u64 = 5_000;

/// Backoff schedule for transient backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: Duration::from_millis(DEFAULT_INITIAL_BACKOFF_MS),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Sleep before attempt `attempt + 1`, where `attempt` counts from 1.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// Run `op` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(AppError::BackendTransient(reason)) if attempt < max_attempts => {
                    let backoff = self.backoff(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        "{} failed transiently: {}",
                        operation,
                        reason
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// `LlmClient` decorator that applies a `RetryPolicy` to every completion.
pub struct RetryingClient {
    inner: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl RetryingClient {
    pub fn new(inner: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait::async_trait]
impl LlmClient for RetryingClient {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.policy
            .run("completion", || self.inner.complete(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::LlmUsage;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FlakyClient {
        failures_before_success: u32,
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl LlmClient for FlakyClient {
        fn provider_name(&self) -> &str {
            "flaky"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures_before_success {
                return Err(AppError::BackendTransient(format!("503 on call {}", call)));
            }
            Ok(LlmResponse {
                content: "ok".into(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(350));
        assert_eq!(policy.backoff(40), Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let inner = Arc::new(FlakyClient {
            failures_before_success: 2,
            calls: AtomicU32::new(0),
        });
        let client = RetryingClient::new(inner.clone(), RetryPolicy::default());

        let response = client
            .complete(&LlmRequest::new("q", "m"))
            .await
            .unwrap();
        assert_eq!(response.text(), "ok");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_surfaces_transient_after_exhaustion() {
        let inner = Arc::new(FlakyClient {
            failures_before_success: 5,
            calls: AtomicU32::new(0),
        });
        let client = RetryingClient::new(inner.clone(), RetryPolicy::default());

        let err = client
            .complete(&LlmRequest::new("q", "m"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BackendTransient(_)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = RetryPolicy::default()
            .run("auth", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::FatalConfig("401 Unauthorized".to_string()))
            })
            .await;

        assert!(matches!(result, Err(AppError::FatalConfig(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_none_policy_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let result: AppResult<()> = RetryPolicy::none()
            .run("once", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::BackendTransient("timeout".to_string()))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
