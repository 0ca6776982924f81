//! Retry executor
//!
//! Runs one async operation up to `max_retries` times, sleeping
//! `base_delay * backoff_factor^(n - 1)` before the n-th retry. The final
//! failure is handed back unchanged.

use std::fmt::Display;
use std::future::Future;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use super::policy::RetryPolicy;
use super::qualify::QualifyingFailures;
use crate::error::Result;

/// Retry executor that handles the actual retry logic
#[derive(Debug, Clone)]
pub struct Retrier<E> {
    policy: RetryPolicy,
    qualifying: QualifyingFailures<E>,
}

impl<E> Retrier<E> {
    /// Create a retrier after validating `policy`. Every failure qualifies
    /// until [`Retrier::with_qualifying`] narrows it.
    pub fn new(policy: RetryPolicy) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            qualifying: QualifyingFailures::all(),
        })
    }

    // The default policy always validates.
    fn with_default_policy() -> Self {
        Self {
            policy: RetryPolicy::default(),
            qualifying: QualifyingFailures::all(),
        }
    }

    /// Restrict which failures are retried
    pub fn with_qualifying(mut self, qualifying: QualifyingFailures<E>) -> Self {
        self.qualifying = qualifying;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn qualifying(&self) -> &QualifyingFailures<E> {
        &self.qualifying
    }
}

impl<E: Display> Retrier<E> {
    /// Execute a function with retry logic
    pub async fn execute<F, Fut, T>(&self, operation: F) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
    {
        self.execute_with_handler(operation, |_, _| true).await
    }

    /// Execute with custom error handling.
    ///
    /// `handler` sees every failure together with the 1-based attempt that
    /// produced it. Returning `false` hands that failure back immediately.
    pub async fn execute_with_handler<F, Fut, T, H>(
        &self,
        mut operation: F,
        mut handler: H,
    ) -> std::result::Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        H: FnMut(&E, u32) -> bool,
    {
        let max_retries = self.policy.max_retries;
        let mut attempt: u32 = 0;

        // `max_retries >= 1` is checked on construction, so the first pass
        // always runs and every exit below carries a value or a failure.
        loop {
            attempt += 1;

            let failure = match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(attempt, max_retries, "operation succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            if !self.qualifying.qualifies(&failure) || !handler(&failure, attempt) {
                debug!(
                    attempt,
                    max_retries,
                    failure = %failure,
                    "failure is not retryable, giving up"
                );
                return Err(failure);
            }

            if attempt >= max_retries {
                error!(
                    attempt,
                    max_retries,
                    failure = %failure,
                    "all {max_retries} attempts failed"
                );
                return Err(failure);
            }

            let wait = self.policy.delay_for(attempt);
            warn!(
                attempt,
                max_retries,
                failure = %failure,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                "attempt {attempt}/{max_retries} failed: {failure}, retrying in {:.3}s",
                wait.as_secs_f64()
            );
            sleep(wait).await;
        }
    }
}

/// Retry an operation with the default policy: 3 attempts, factor 2.0,
/// every failure qualifies.
pub async fn retry<F, Fut, T, E>(operation: F) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Display,
{
    Retrier::with_default_policy().execute(operation).await
}

/// Retry an operation with the default policy, retrying only failures in
/// `qualifying`.
pub async fn retry_on<F, Fut, T, E>(
    qualifying: QualifyingFailures<E>,
    operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Display,
{
    Retrier::with_default_policy()
        .with_qualifying(qualifying)
        .execute(operation)
        .await
}
