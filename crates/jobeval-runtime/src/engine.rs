//! Workflow engine: validate → extract → evaluate → recommend.
//!
//! Each call to [`WorkflowEngine::run`] owns a fresh [`WorkflowState`]
//! and its own tracing scope. Stages run strictly in order with no
//! internal parallelism. Only validation can halt a run; an extraction
//! failure is recorded and the run continues, so evaluation produces a
//! failing missing-data verdict and the result is DO_NOT_APPLY.
//!
//! Criteria are passed in per invocation and never cached here.

use chrono::Utc;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::Instrument;

use jobeval_core::{
    validate_posting, CriteriaConfig, CriteriaError, CriteriaEvaluator, CriteriaSource,
    EvaluationResult, Recommender, RunMetadata, SchemaDescriptor, Stage, StageError, StateError,
    WorkflowState, WORKFLOW_VERSION,
};

use crate::config::AppConfig;
use crate::extraction::{LlmExtractor, StructuredExtractor};
use crate::metrics::MetricsCollector;
use crate::observability::{CallConfig, SpanOutcome, TracingManager, TracingSettings};
use crate::providers::{ProviderError, ProviderRegistry};

/// Span name reported for a whole run.
pub const WORKFLOW_SPAN: &str = "job_evaluation";

static RUN_COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_run_id() -> String {
    format!(
        "run-{}-{:04}",
        Utc::now().format("%Y%m%dT%H%M%S%.3fZ"),
        RUN_COUNTER.fetch_add(1, Ordering::Relaxed)
    )
}

/// Errors from building or feeding the engine.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No structured extractor configured")]
    ExtractorNotConfigured,

    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Criteria unavailable: {0}")]
    Criteria(#[from] CriteriaError),
}

/// Per-invocation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Trace the extraction call on its own even inside the workflow span
    pub force_call_tracing: bool,
}

impl RunOptions {
    pub fn forced() -> Self {
        Self {
            force_call_tracing: true,
        }
    }
}

/// Runs job evaluations.
pub struct WorkflowEngine {
    extractor: Arc<dyn StructuredExtractor>,
    tracing: Arc<TracingManager>,
    schema: SchemaDescriptor,
    evaluator: CriteriaEvaluator,
    recommender: Recommender,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("extractor", &self.extractor.name())
            .field("tracing", &self.tracing)
            .field("schema", &self.schema.name())
            .finish()
    }
}

impl WorkflowEngine {
    pub fn builder() -> WorkflowEngineBuilder {
        WorkflowEngineBuilder::new()
    }

    /// Build an engine from application config.
    ///
    /// The provider comes from `registry` and is wrapped in the
    /// configured retry policy. Tracing settings are resolved with
    /// environment overrides.
    pub fn from_config(
        config: &AppConfig,
        registry: &ProviderRegistry,
        metrics: Arc<MetricsCollector>,
    ) -> Result<Self, EngineError> {
        let profile = &config.extraction;
        let provider = registry.create_with_retry(
            &profile.provider,
            &profile.settings,
            profile.retry,
        )?;
        let extractor =
            LlmExtractor::new(provider, profile.completion_config()).with_metrics(metrics);
        let settings = TracingSettings::from_config(&config.tracing)?;

        Self::builder()
            .extractor(Arc::new(extractor))
            .tracing(Arc::new(TracingManager::from_settings(settings)))
            .build()
    }

    pub fn tracing(&self) -> &Arc<TracingManager> {
        &self.tracing
    }

    /// Evaluate one posting.
    ///
    /// Always returns a result; failures are reported in its `error`
    /// and `reasoning` fields.
    pub async fn run(
        &self,
        posting_text: &str,
        criteria: &CriteriaConfig,
        options: RunOptions,
    ) -> EvaluationResult {
        let run_id = next_run_id();
        let span = tracing::info_span!("job_evaluation", run_id = %run_id);

        TracingManager::scope(self.run_in_scope(posting_text, criteria, options, run_id))
            .instrument(span)
            .await
    }

    /// Evaluate one posting with criteria freshly loaded from `source`.
    pub async fn run_with_source(
        &self,
        posting_text: &str,
        source: &dyn CriteriaSource,
        options: RunOptions,
    ) -> Result<EvaluationResult, EngineError> {
        let criteria = source.load()?;
        Ok(self.run(posting_text, &criteria, options).await)
    }

    /// Evaluate several postings concurrently.
    ///
    /// Results come back in input order. Each run has its own state and
    /// tracing scope.
    pub async fn run_batch<S: AsRef<str>>(
        &self,
        postings: &[S],
        criteria: &CriteriaConfig,
        options: RunOptions,
    ) -> Vec<EvaluationResult> {
        join_all(
            postings
                .iter()
                .map(|posting| self.run(posting.as_ref(), criteria, options)),
        )
        .await
    }

    async fn run_in_scope(
        &self,
        posting_text: &str,
        criteria: &CriteriaConfig,
        options: RunOptions,
        run_id: String,
    ) -> EvaluationResult {
        let workflow_call = self
            .tracing
            .enter_workflow_scope()
            .metadata("run_id", run_id.as_str());
        workflow_call.emit_start(&run_id, WORKFLOW_SPAN);
        let started = Instant::now();

        let mut state = WorkflowState::new(posting_text);
        if let Err(e) = self
            .drive(&mut state, criteria, options, &run_id)
            .await
        {
            tracing::error!(error = %e, "Workflow state violation");
        }

        let outcome = match state.error() {
            Some(err) => SpanOutcome::Error(err.to_string()),
            None => SpanOutcome::Ok,
        };
        workflow_call.emit_end(&run_id, WORKFLOW_SPAN, started.elapsed(), outcome);

        let result = state.into_result(RunMetadata {
            run_id,
            workflow_version: WORKFLOW_VERSION.to_string(),
        });

        tracing::info!(
            recommendation = result.recommendation.map(|r| r.as_str()).unwrap_or("NONE"),
            passed = result.passed,
            total = result.total,
            "Evaluation complete"
        );
        result
    }

    async fn drive(
        &self,
        state: &mut WorkflowState,
        criteria: &CriteriaConfig,
        options: RunOptions,
        run_id: &str,
    ) -> Result<(), StateError> {
        while let Some(stage) = state.next_stage() {
            let started = Instant::now();
            tracing::info!(stage = %stage, "Stage started");

            match stage {
                Stage::Validate => match validate_posting(state.posting_text()) {
                    Ok(()) => state.record_validated()?,
                    Err(e) => {
                        tracing::warn!(error = %e, "Posting rejected");
                        state.record_validation_failure(e)?;
                    }
                },
                Stage::Extract => {
                    let call = self
                        .extraction_call(options)
                        .metadata("run_id", run_id);
                    let posting = state.posting_text().to_string();
                    match self.extractor.extract(&posting, &self.schema, &call).await {
                        Ok(info) => {
                            let meaningful = info.is_meaningful();
                            if !meaningful {
                                tracing::warn!(
                                    summary = %info.summary(),
                                    "Extraction returned little usable information"
                                );
                            }
                            state.record_extracted(info)?;
                        }
                        Err(e) => {
                            tracing::warn!(
                                error = %e,
                                retryable = e.is_retryable(),
                                "Extraction failed, continuing without job info"
                            );
                            state.record_extraction_failure(StageError::extraction(e.to_string()))?;
                        }
                    }
                }
                Stage::Evaluate => {
                    let verdicts = self.evaluator.evaluate(state.extracted_info(), criteria);
                    state.record_evaluation(verdicts)?;
                }
                Stage::Recommend => {
                    let outcome = self
                        .recommender
                        .recommend(state.evaluation_result().unwrap_or_default());
                    state.record_recommendation(outcome.recommendation, outcome.reasoning)?;
                }
            }

            let elapsed = started.elapsed();
            state.record_timing(stage, elapsed);
            tracing::info!(
                stage = %stage,
                duration_ms = elapsed.as_secs_f64() * 1000.0,
                "Stage finished"
            );
        }
        Ok(())
    }

    fn extraction_call(&self, options: RunOptions) -> CallConfig {
        self.tracing
            .call_config(options.force_call_tracing)
            .metadata("stage", Stage::Extract.as_str())
    }
}

/// Builder for [`WorkflowEngine`].
pub struct WorkflowEngineBuilder {
    extractor: Option<Arc<dyn StructuredExtractor>>,
    tracing: Option<Arc<TracingManager>>,
}

impl WorkflowEngineBuilder {
    pub fn new() -> Self {
        Self {
            extractor: None,
            tracing: None,
        }
    }

    /// Set the structured extractor.
    pub fn extractor(mut self, extractor: Arc<dyn StructuredExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Set the tracing manager. Defaults to a disabled one.
    pub fn tracing(mut self, tracing: Arc<TracingManager>) -> Self {
        self.tracing = Some(tracing);
        self
    }

    /// Build the engine.
    pub fn build(self) -> Result<WorkflowEngine, EngineError> {
        let extractor = self.extractor.ok_or(EngineError::ExtractorNotConfigured)?;

        Ok(WorkflowEngine {
            extractor,
            tracing: self
                .tracing
                .unwrap_or_else(|| Arc::new(TracingManager::disabled())),
            schema: SchemaDescriptor::job_info(),
            evaluator: CriteriaEvaluator::new(),
            recommender: Recommender::new(),
        })
    }
}

impl Default for WorkflowEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
