use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use super::{ContentRequest, ContentResponse, GenerativeApi};
use crate::error::GenerationError;

/// Policy controlling how many times a transient failure is retried and the
/// delay between attempts.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of additional attempts after the first failure.
    pub max_retries: usize,
    /// Delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_millis(500))
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Never retry.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Execute `op`, retrying while `should_retry` accepts the error.
    pub async fn retry_if<F, Fut, T, E, P>(&self, mut op: F, should_retry: P) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if attempts < self.max_retries && should_retry(&e) => {
                    attempts += 1;
                    warn!(error = %e, attempt = attempts, "retrying after transient failure");
                    tokio::time::sleep(self.delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Wrapper around a [`GenerativeApi`] that retries transient failures.
#[derive(Clone)]
pub struct RetryApi<C> {
    inner: C,
    policy: RetryPolicy,
}

impl<C> RetryApi<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<C> GenerativeApi for RetryApi<C>
where
    C: GenerativeApi,
{
    async fn generate(&self, request: &ContentRequest) -> Result<ContentResponse, GenerationError> {
        self.policy
            .retry_if(|| self.inner.generate(request), GenerationError::is_transient)
            .await
    }
}
