//! Bounded retry of transient provider failures.
//!
//! [`RetryingSource`] and [`RetryingGenerator`] wrap any search or generation
//! backend. Only errors for which [`ScoutError::is_transient`] holds are
//! retried; configuration and parse failures return immediately.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use partnerscout_llm::TextGenerator;
use partnerscout_search::ResultSource;
use partnerscout_shared::{PipelineConfig, Result, SearchRequest, SearchResult};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Retry count and base delay; the delay doubles after each failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .checked_mul(1u32 << exponent)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }

    async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    warn!(%label, attempt, ?delay, error = %e, "transient failure, retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// [`ResultSource`] decorator with retry.
pub struct RetryingSource<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: ResultSource> RetryingSource<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<S: ResultSource> ResultSource for RetryingSource<S> {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        self.policy
            .run("search", || self.inner.search(request))
            .await
    }
}

/// [`TextGenerator`] decorator with retry.
pub struct RetryingGenerator<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: TextGenerator> RetryingGenerator<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for RetryingGenerator<G> {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.policy
            .run("generate", || self.inner.generate(prompt))
            .await
    }

    fn model(&self) -> &str {
        self.inner.model()
    }
}
