//! Tracing context for workflow runs and extraction calls.
//!
//! A [`CallConfig`] is what a call site receives: the trace handlers to
//! report to (possibly none) plus string metadata. The
//! [`TracingManager`] decides which configuration each call gets.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

mod handler;
mod manager;
mod settings;

pub use handler::{
    LogTraceHandler, LogTraceHandlerFactory, ObservabilityError, SpanEnd, SpanOutcome, SpanStart,
    TraceHandler, TraceHandlerFactory,
};
pub use manager::TracingManager;
pub use settings::{
    is_valid_host, TracingConfig, TracingSettings, DEFAULT_TRACING_HOST, TRACING_ENABLED_ENV,
    TRACING_HOST_ENV, TRACING_PUBLIC_KEY_ENV, TRACING_SECRET_KEY_ENV,
};

/// Per-call tracing configuration.
#[derive(Clone, Default)]
pub struct CallConfig {
    pub callbacks: Vec<Arc<dyn TraceHandler>>,
    pub metadata: BTreeMap<String, String>,
}

impl std::fmt::Debug for CallConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.callbacks.iter().map(|h| h.name()).collect();
        f.debug_struct("CallConfig")
            .field("callbacks", &names)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl CallConfig {
    /// No handlers attached.
    pub fn untraced() -> Self {
        Self::default()
    }

    pub fn with_handler(handler: Arc<dyn TraceHandler>) -> Self {
        Self {
            callbacks: vec![handler],
            metadata: BTreeMap::new(),
        }
    }

    /// Add a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn is_traced(&self) -> bool {
        !self.callbacks.is_empty()
    }

    /// Report a span start to every handler.
    pub fn emit_start(&self, run_id: &str, name: &str) {
        if self.callbacks.is_empty() {
            return;
        }
        let span = SpanStart {
            run_id: run_id.to_string(),
            name: name.to_string(),
            metadata: self.metadata.clone(),
        };
        for handler in &self.callbacks {
            handler.on_span_start(&span);
        }
    }

    /// Report a span end to every handler.
    pub fn emit_end(&self, run_id: &str, name: &str, duration: Duration, outcome: SpanOutcome) {
        if self.callbacks.is_empty() {
            return;
        }
        let span = SpanEnd {
            run_id: run_id.to_string(),
            name: name.to_string(),
            duration,
            outcome,
        };
        for handler in &self.callbacks {
            handler.on_span_end(&span);
        }
    }
}
