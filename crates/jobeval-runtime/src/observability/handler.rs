//! Trace handlers: the objects a [`CallConfig`](super::CallConfig) carries.
//!
//! The engine and the extractor never talk to the tracing backend
//! directly; they report span boundaries to whatever handlers the call
//! configuration holds.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use super::settings::TracingSettings;

/// Errors from the tracing layer.
#[derive(Error, Debug)]
pub enum ObservabilityError {
    #[error("Failed to create trace handler: {0}")]
    HandlerCreation(String),

    #[error("Tracing inactive: {0}")]
    Inactive(String),
}

/// A span that has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanStart {
    pub run_id: String,
    pub name: String,
    pub metadata: BTreeMap<String, String>,
}

/// How a span finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanOutcome {
    Ok,
    Error(String),
}

/// A span that has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanEnd {
    pub run_id: String,
    pub name: String,
    pub duration: Duration,
    pub outcome: SpanOutcome,
}

/// Receives span boundaries for a traced call.
pub trait TraceHandler: Send + Sync {
    /// Handler name for logs.
    fn name(&self) -> &str;

    fn on_span_start(&self, span: &SpanStart);

    fn on_span_end(&self, span: &SpanEnd);
}

/// Creates the process-wide handler from settings.
pub trait TraceHandlerFactory: Send + Sync {
    fn create(&self, settings: &TracingSettings)
        -> Result<Arc<dyn TraceHandler>, ObservabilityError>;
}

/// Writes spans as structured `tracing` events under `jobeval::trace`.
#[derive(Debug, Clone)]
pub struct LogTraceHandler {
    host: String,
}

impl LogTraceHandler {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl TraceHandler for LogTraceHandler {
    fn name(&self) -> &str {
        "log"
    }

    fn on_span_start(&self, span: &SpanStart) {
        tracing::info!(
            target: "jobeval::trace",
            host = %self.host,
            run_id = %span.run_id,
            span = %span.name,
            metadata = ?span.metadata,
            "span started"
        );
    }

    fn on_span_end(&self, span: &SpanEnd) {
        match &span.outcome {
            SpanOutcome::Ok => tracing::info!(
                target: "jobeval::trace",
                host = %self.host,
                run_id = %span.run_id,
                span = %span.name,
                duration_ms = span.duration.as_millis() as u64,
                "span finished"
            ),
            SpanOutcome::Error(error) => tracing::warn!(
                target: "jobeval::trace",
                host = %self.host,
                run_id = %span.run_id,
                span = %span.name,
                duration_ms = span.duration.as_millis() as u64,
                error = %error,
                "span failed"
            ),
        }
    }
}

/// Builds a [`LogTraceHandler`] for active settings.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogTraceHandlerFactory;

impl TraceHandlerFactory for LogTraceHandlerFactory {
    fn create(
        &self,
        settings: &TracingSettings,
    ) -> Result<Arc<dyn TraceHandler>, ObservabilityError> {
        if let Some(reason) = settings.inactive_reason() {
            return Err(ObservabilityError::Inactive(reason));
        }
        Ok(Arc::new(LogTraceHandler::new(settings.host.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ApiCredential, CredentialSource};

    #[test]
    fn test_factory_rejects_inactive_settings() {
        let result = LogTraceHandlerFactory.create(&TracingSettings::disabled());
        assert!(matches!(result, Err(ObservabilityError::Inactive(_))));
    }

    #[test]
    fn test_factory_creates_log_handler() {
        let settings = TracingSettings {
            enabled: true,
            host: "http://localhost:3000".to_string(),
            public_key: Some(ApiCredential::new("pk", CredentialSource::Programmatic, "pk")),
            secret_key: Some(ApiCredential::new("sk", CredentialSource::Programmatic, "sk")),
        };
        let handler = LogTraceHandlerFactory.create(&settings).unwrap();
        assert_eq!(handler.name(), "log");

        // Emitting without a subscriber is a no-op
        handler.on_span_start(&SpanStart {
            run_id: "run-1".to_string(),
            name: "job_evaluation".to_string(),
            metadata: BTreeMap::new(),
        });
        handler.on_span_end(&SpanEnd {
            run_id: "run-1".to_string(),
            name: "job_evaluation".to_string(),
            duration: Duration::from_millis(3),
            outcome: SpanOutcome::Error("boom".to_string()),
        });
    }
}
