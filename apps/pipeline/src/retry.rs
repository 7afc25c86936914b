//! Retry — the single wrapper around every external call the pipeline makes.
//!
//! The combinator is parameterized (attempts, fixed or exponential delay,
//! optional jitter) and bounds each attempt with a timeout. A shared
//! cancellation token threads the run's deadline through every call site;
//! this module is the only place the pipeline ever sleeps.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::errors::PipelineError;

/// Delay growth strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Fixed,
    Exponential,
}

/// Retry parameters for one class of external call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
    /// Adds up to 50% random extra delay to desynchronize callers.
    pub jitter: bool,
    /// Upper bound on a single attempt, not the whole call.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            backoff: Backoff::Fixed,
            jitter: false,
            attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep after the given 1-based failed attempt.
    fn delay_after(&self, attempt: u32) -> Duration {
        let base = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => self.base_delay * 2u32.saturating_pow(attempt - 1),
        };
        if self.jitter {
            let extra_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64 / 2);
            base + Duration::from_millis(extra_ms)
        } else {
            base
        }
    }
}

/// Executes fallible async operations under a [`RetryPolicy`], honoring a
/// shared cancellation token. Cloned freely; call sites hold it by reference.
#[derive(Clone)]
pub struct Retry {
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl Retry {
    pub fn new(policy: RetryPolicy, cancel: CancellationToken) -> Self {
        Retry { policy, cancel }
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs `op` up to `max_attempts` times. Each failure is logged with the
    /// attempt number and `label`; after the last attempt the final error is
    /// returned unchanged. Cancellation and per-attempt timeouts short-circuit
    /// without consuming further attempts.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, PipelineError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, PipelineError>>,
    {
        let mut last_error: Option<PipelineError> = None;

        for attempt in 1..=self.policy.max_attempts {
            if self.cancel.is_cancelled() {
                return Err(PipelineError::Cancelled(format!(
                    "{label} aborted before attempt {attempt}"
                )));
            }

            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => {
                    return Err(PipelineError::Cancelled(format!(
                        "{label} cancelled mid-attempt {attempt}"
                    )));
                }
                timed = tokio::time::timeout(self.policy.attempt_timeout, op()) => match timed {
                    Ok(result) => result,
                    Err(_) => Err(PipelineError::Cancelled(format!(
                        "{label} attempt {attempt} timed out after {:?}",
                        self.policy.attempt_timeout
                    ))),
                },
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) if e.is_cancelled() && self.cancel.is_cancelled() => return Err(e),
                Err(e) => {
                    warn!("Attempt {attempt} failed for {label}: {e}");
                    last_error = Some(e);
                    if attempt < self.policy.max_attempts {
                        tokio::time::sleep(self.policy.delay_after(attempt)).await;
                    } else {
                        error!(
                            "All {} retries failed for {label}",
                            self.policy.max_attempts
                        );
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            PipelineError::Internal(anyhow::anyhow!("{label} ran zero attempts"))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn retry(policy: RetryPolicy) -> Retry {
        Retry::new(policy, CancellationToken::new())
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_uses_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = retry(RetryPolicy::default())
            .run("probe", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, PipelineError>(42)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_last_error_after_exhaustion() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = retry(RetryPolicy::default())
            .run("probe", move || {
                let counter = counter.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                    Err(PipelineError::Lookup(format!("boom {n}")))
                }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(PipelineError::Lookup(msg)) => assert_eq!(msg, "boom 3"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_on_second_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result = retry(RetryPolicy::default())
            .run("probe", move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(PipelineError::Lookup("transient".into()))
                    } else {
                        Ok("recovered")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "recovered");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_token_stops_immediately() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let executor = Retry::new(RetryPolicy::default(), cancel);
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let result: Result<(), _> = executor
            .run("probe", move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
            })
            .await;
        assert!(matches!(result, Err(PipelineError::Cancelled(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_exponential_backoff_doubles() {
        let policy = RetryPolicy {
            backoff: Backoff::Exponential,
            base_delay: Duration::from_secs(1),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay_after(1), Duration::from_secs(1));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
        assert_eq!(policy.delay_after(3), Duration::from_secs(4));
    }

    #[test]
    fn test_fixed_backoff_is_constant() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_after(1), Duration::from_secs(2));
        assert_eq!(policy.delay_after(2), Duration::from_secs(2));
    }
}
