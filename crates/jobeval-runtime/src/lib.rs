//! # jobeval-runtime
//!
//! The job-evaluation workflow with its external collaborators: the
//! language model used for structured extraction and the tracing
//! backend.
//!
//! The deterministic parts (criteria, verdicts, recommendation, state)
//! live in `jobeval-core`. This crate adds:
//! - [`WorkflowEngine`]: runs validate → extract → evaluate → recommend
//! - [`StructuredExtractor`] and the LLM-backed [`LlmExtractor`]
//! - [`providers`]: the `LlmProvider` trait, registry, retry and credentials
//! - [`observability`]: the tracing context manager and trace handlers
//! - [`AppConfig`]: the YAML application config
//!
//! ## Example
//!
//! ```rust,ignore
//! use jobeval_runtime::{AppConfig, MetricsCollector, ProviderRegistry, RunOptions, WorkflowEngine};
//!
//! let config = AppConfig::from_yaml_file("jobeval.yaml")?;
//! let engine = WorkflowEngine::from_config(
//!     &config,
//!     &ProviderRegistry::with_defaults(),
//!     Arc::new(MetricsCollector::new()),
//! )?;
//!
//! let result = engine.run(&posting, &config.criteria, RunOptions::default()).await;
//! println!("{:?}: {}", result.recommendation, result.reasoning);
//! ```

pub mod config;
pub mod engine;
pub mod extraction;
pub mod metrics;
pub mod observability;
pub mod prompts;
pub mod providers;

pub use config::{AppConfig, ConfigError, ExtractionProfile, LoggingConfig};
pub use engine::{EngineError, RunOptions, WorkflowEngine, WorkflowEngineBuilder, WORKFLOW_SPAN};
pub use extraction::{ExtractionError, LlmExtractor, StructuredExtractor, EXTRACTION_SPAN};
pub use metrics::{MetricsCollector, ModelUsage};
pub use observability::{
    CallConfig, LogTraceHandler, TraceHandler, TraceHandlerFactory, TracingConfig,
    TracingManager, TracingSettings,
};
pub use providers::{LlmProvider, ProviderError, ProviderRegistry, RetryPolicy};
