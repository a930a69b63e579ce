//! Retry with exponential backoff around any provider.
//!
//! Only errors that [`ProviderError::is_retryable`] classifies as
//! transient are retried. The workflow itself never retries; this
//! wrapper is the provider-side policy the extractor inherits.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use super::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError};

/// Backoff settings for transient provider failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 disables retrying)
    pub max_retries: usize,

    #[serde(with = "duration_str")]
    pub min_delay: Duration,

    #[serde(with = "duration_str")]
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_retries)
            .with_jitter()
    }
}

/// Durations as humantime strings ("500ms", "2s") in config files.
pub(crate) mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*value).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

/// Wraps a provider and retries transient failures.
pub struct RetryingProvider {
    inner: Arc<dyn LlmProvider>,
    policy: RetryPolicy,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl LlmProvider for RetryingProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let provider = self.inner.name().to_string();

        (|| {
            let inner = Arc::clone(&self.inner);
            let messages = messages.clone();
            async move { inner.complete(messages, config).await }
        })
        .retry(self.policy.backoff())
        .when(|e: &ProviderError| e.is_retryable())
        .notify(|e: &ProviderError, delay: Duration| {
            tracing::warn!(
                provider = %provider,
                error = %e,
                delay = ?delay,
                "Provider call failed, retrying"
            );
        })
        .await
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn estimate_tokens(&self, text: &str) -> u32 {
        self.inner.estimate_tokens(text)
    }
}
