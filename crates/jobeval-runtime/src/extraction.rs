//! Structured extraction of job information from posting text.
//!
//! The workflow depends only on [`StructuredExtractor`]; [`LlmExtractor`]
//! is the language-model implementation. One extraction is one provider
//! call: the posting goes out with the schema in the system prompt and
//! the reply is parsed and validated against that schema.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use jobeval_core::patterns::strip_code_fence;
use jobeval_core::{JobInfo, SchemaDescriptor, SchemaError};

use crate::metrics::MetricsCollector;
use crate::observability::{CallConfig, SpanOutcome};
use crate::prompts::{build_system_prompt, build_user_prompt};
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError};

/// Span name reported for extraction calls.
pub const EXTRACTION_SPAN: &str = "structured_extraction";

/// Errors from structured extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Model output is not valid job info: {0}")]
    Malformed(String),

    #[error("Model returned no JSON object")]
    Empty,
}

impl ExtractionError {
    /// Whether retrying the same extraction could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ExtractionError::Provider(e) => e.is_retryable(),
            ExtractionError::Malformed(_) | ExtractionError::Empty => false,
        }
    }
}

impl From<SchemaError> for ExtractionError {
    fn from(e: SchemaError) -> Self {
        ExtractionError::Malformed(e.to_string())
    }
}

/// Turns posting text into a typed record matching a schema.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    async fn extract(
        &self,
        posting_text: &str,
        schema: &SchemaDescriptor,
        call: &CallConfig,
    ) -> Result<JobInfo, ExtractionError>;

    /// Extractor name for logs.
    fn name(&self) -> &str;
}

/// Pull the JSON object out of a model reply.
///
/// Strips a markdown fence if present, then takes everything from the
/// first `{` to the last `}`.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let body = strip_code_fence(reply);
    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

/// Parse a model reply into job info.
pub fn parse_reply(reply: &str, schema: &SchemaDescriptor) -> Result<JobInfo, ExtractionError> {
    let json = extract_json_object(reply).ok_or(ExtractionError::Empty)?;
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|e| ExtractionError::Malformed(e.to_string()))?;
    Ok(schema.parse(&value)?)
}

/// Extractor backed by an [`LlmProvider`].
pub struct LlmExtractor {
    provider: Arc<dyn LlmProvider>,
    config: CompletionConfig,
    metrics: Arc<MetricsCollector>,
}

impl std::fmt::Debug for LlmExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmExtractor")
            .field("provider", &self.provider.name())
            .field("config", &self.config)
            .finish()
    }
}

impl LlmExtractor {
    pub fn new(provider: Arc<dyn LlmProvider>, config: CompletionConfig) -> Self {
        Self {
            provider,
            config,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    /// Share a metrics collector with other components.
    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub fn completion_config(&self) -> &CompletionConfig {
        &self.config
    }

    async fn call_model(
        &self,
        posting_text: &str,
        schema: &SchemaDescriptor,
    ) -> Result<JobInfo, ExtractionError> {
        let messages = vec![
            ChatMessage::system(build_system_prompt(schema)),
            ChatMessage::user(build_user_prompt(posting_text)),
        ];

        let started = Instant::now();
        let response = match self.provider.complete(messages, &self.config).await {
            Ok(response) => response,
            Err(e) => {
                self.metrics.record_failure(&self.config.model);
                return Err(e.into());
            }
        };
        self.metrics
            .record_success(&response.model, &response.usage, started.elapsed());

        tracing::debug!(
            provider = self.provider.name(),
            model = %response.model,
            tokens = response.usage.total(),
            "Extraction reply received"
        );

        parse_reply(&response.content, schema)
    }
}

#[async_trait]
impl StructuredExtractor for LlmExtractor {
    async fn extract(
        &self,
        posting_text: &str,
        schema: &SchemaDescriptor,
        call: &CallConfig,
    ) -> Result<JobInfo, ExtractionError> {
        let run_id = call
            .metadata
            .get("run_id")
            .map(String::as_str)
            .unwrap_or("standalone");

        call.emit_start(run_id, EXTRACTION_SPAN);
        let started = Instant::now();
        let result = self.call_model(posting_text, schema).await;

        let outcome = match &result {
            Ok(_) => SpanOutcome::Ok,
            Err(e) => {
                tracing::warn!(provider = self.provider.name(), error = %e, "Extraction failed");
                SpanOutcome::Error(e.to_string())
            }
        };
        call.emit_end(run_id, EXTRACTION_SPAN, started.elapsed(), outcome);

        result
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}
