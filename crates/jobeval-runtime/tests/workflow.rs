use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use jobeval_core::{CriteriaConfig, Criterion, ErrorKind, Recommendation};
use jobeval_runtime::observability::{
    ObservabilityError, SpanEnd, SpanOutcome, SpanStart, TraceHandler, TraceHandlerFactory,
};
use jobeval_runtime::providers::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, CredentialSource,
    LlmProvider, ProviderError, RetryPolicy, RetryingProvider, TokenUsage,
};
use jobeval_runtime::{
    LlmExtractor, RunOptions, StructuredExtractor, TracingManager, TracingSettings,
    WorkflowEngine, EXTRACTION_SPAN, WORKFLOW_SPAN,
};

const STAFF_REMOTE_IC: &str = r#"{
  "title": "Staff Software Engineer",
  "company": "Acme",
  "salary_min": 120000,
  "salary_max": 150000,
  "location_policy": "Remote (US only)",
  "role_type": "ic"
}"#;

const LOW_SALARY_REMOTE_IC: &str = r#"{
  "title": "Staff Software Engineer",
  "company": "Acme",
  "salary_min": null,
  "salary_max": 90000,
  "location_policy": "remote",
  "role_type": "ic"
}"#;

const FLOAT_SALARY_REMOTE_IC: &str = r#"{
  "title": "Staff Software Engineer",
  "company": "Acme",
  "salary_min": 120000.0,
  "salary_max": 150000.0,
  "location_policy": "remote",
  "role_type": "ic"
}"#;

/// Provider that answers with a fixed reply after an optional delay,
/// failing the first `failures` calls with a 503.
struct MockProvider {
    reply: String,
    delay: Duration,
    failures: usize,
    calls: AtomicUsize,
}

impl MockProvider {
    fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: Duration::ZERO,
            failures: 0,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn failing_first(mut self, failures: usize) -> Self {
        self.failures = failures;
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if call < self.failures {
            return Err(ProviderError::ApiError {
                status: 503,
                message: "overloaded".to_string(),
            });
        }
        Ok(CompletionResponse {
            content: self.reply.clone(),
            usage: TokenUsage {
                prompt_tokens: 300,
                completion_tokens: 40,
            },
            model: "mock-model".to_string(),
            stop_reason: Some("end_turn".to_string()),
        })
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[derive(Default)]
struct RecordingHandler {
    spans: Mutex<Vec<(String, String, SpanOutcome)>>,
}

impl RecordingHandler {
    fn spans_for(&self, run_id: &str) -> Vec<String> {
        self.spans
            .lock()
            .iter()
            .filter(|(id, _, _)| id == run_id)
            .map(|(_, name, _)| name.clone())
            .collect()
    }
}

impl TraceHandler for RecordingHandler {
    fn name(&self) -> &str {
        "recording"
    }

    fn on_span_start(&self, _span: &SpanStart) {}

    fn on_span_end(&self, span: &SpanEnd) {
        self.spans
            .lock()
            .push((span.run_id.clone(), span.name.clone(), span.outcome.clone()));
    }
}

struct RecordingFactory(Arc<RecordingHandler>);

impl TraceHandlerFactory for RecordingFactory {
    fn create(
        &self,
        _settings: &TracingSettings,
    ) -> Result<Arc<dyn TraceHandler>, ObservabilityError> {
        Ok(self.0.clone())
    }
}

fn active_tracing(handler: Arc<RecordingHandler>) -> Arc<TracingManager> {
    let settings = TracingSettings {
        enabled: true,
        host: "http://localhost:3000".to_string(),
        public_key: Some(ApiCredential::new("pk-test", CredentialSource::Programmatic, "pk")),
        secret_key: Some(ApiCredential::new("sk-test", CredentialSource::Programmatic, "sk")),
    };
    Arc::new(TracingManager::new(settings, Arc::new(RecordingFactory(handler))))
}

fn criteria() -> CriteriaConfig {
    CriteriaConfig::default()
        .with_min_salary(100_000)
        .with_remote_required(true)
        .with_ic_title_requirements(["lead", "staff", "principal", "senior staff"])
}

fn engine_with(provider: Arc<MockProvider>) -> WorkflowEngine {
    WorkflowEngine::builder()
        .extractor(Arc::new(LlmExtractor::new(provider, CompletionConfig::default())))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_empty_posting_makes_no_extraction_call() {
    let provider = Arc::new(MockProvider::replying(STAFF_REMOTE_IC));
    let engine = engine_with(provider.clone());

    for text in ["", "   \n\t"] {
        let result = engine.run(text, &criteria(), RunOptions::default()).await;
        assert_eq!(result.recommendation, None);
        assert_eq!(result.error.unwrap().kind, ErrorKind::ValidationError);
        assert!(!result.reasoning.is_empty());
    }
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_all_criteria_pass() {
    let provider = Arc::new(MockProvider::replying(STAFF_REMOTE_IC));
    let engine = engine_with(provider.clone());

    let result = engine
        .run("Staff Software Engineer at Acme...", &criteria(), RunOptions::default())
        .await;

    assert_eq!(result.recommendation, Some(Recommendation::Apply));
    assert!(result.error.is_none());
    assert_eq!((result.passed, result.total), (3, 3));
    assert_eq!(result.extraction_meaningful, Some(true));
    assert_eq!(result.reasoning.matches("PASS").count(), 3);
    for name in ["salary", "remote", "title_level"] {
        assert!(result.reasoning.contains(name), "missing {name}");
    }
    assert_eq!(result.timings.len(), 4);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_only_salary_fails() {
    let engine = engine_with(Arc::new(MockProvider::replying(LOW_SALARY_REMOTE_IC)));

    let result = engine
        .run("Staff Software Engineer at Acme...", &criteria(), RunOptions::default())
        .await;

    assert_eq!(result.recommendation, Some(Recommendation::DoNotApply));
    let failed: Vec<_> = result.failed_criteria().map(|v| v.criterion).collect();
    assert_eq!(failed, vec![Criterion::Salary]);
    assert!(result.reasoning.contains("salary: FAIL"));
    assert!(!result.reasoning.contains("remote: FAIL"));
    assert!(!result.reasoning.contains("title_level: FAIL"));
}

#[tokio::test]
async fn test_malformed_extraction_degrades_to_do_not_apply() {
    let provider = Arc::new(MockProvider::replying("I could not find a job posting."));
    let engine = engine_with(provider.clone());

    let result = engine
        .run("Some posting", &criteria(), RunOptions::default())
        .await;

    assert_eq!(result.recommendation, Some(Recommendation::DoNotApply));
    assert_eq!(result.error.as_ref().unwrap().kind, ErrorKind::ExtractionError);
    assert!(result.extracted_info.is_none());
    assert!(result
        .evaluation_result
        .iter()
        .any(|v| v.criterion == Criterion::Extraction && !v.passed));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_whole_number_float_salary_still_applies() {
    let engine = engine_with(Arc::new(MockProvider::replying(FLOAT_SALARY_REMOTE_IC)));

    let result = engine
        .run("Staff Software Engineer at Acme...", &criteria(), RunOptions::default())
        .await;

    assert!(result.error.is_none());
    assert_eq!(result.recommendation, Some(Recommendation::Apply));
    let info = result.extracted_info.unwrap();
    assert_eq!(info.salary_max, Some(150_000));
    assert_eq!((result.passed, result.total), (3, 3));
}

#[tokio::test]
async fn test_retry_policy_lives_in_provider() {
    let flaky = Arc::new(MockProvider::replying(STAFF_REMOTE_IC).failing_first(2));
    let policy = RetryPolicy {
        max_retries: 3,
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    };
    let provider = Arc::new(RetryingProvider::new(flaky.clone(), policy));
    let engine = WorkflowEngine::builder()
        .extractor(Arc::new(LlmExtractor::new(provider, CompletionConfig::default())))
        .build()
        .unwrap();

    let result = engine.run("posting", &criteria(), RunOptions::default()).await;

    assert_eq!(result.recommendation, Some(Recommendation::Apply));
    assert_eq!(flaky.calls(), 3);
}

#[tokio::test]
async fn test_criteria_changes_apply_to_next_run() {
    let engine = engine_with(Arc::new(MockProvider::replying(STAFF_REMOTE_IC)));

    let strict = criteria().with_min_salary(200_000);
    let first = engine.run("posting", &strict, RunOptions::default()).await;
    assert_eq!(first.recommendation, Some(Recommendation::DoNotApply));

    let relaxed = criteria();
    let second = engine.run("posting", &relaxed, RunOptions::default()).await;
    assert_eq!(second.recommendation, Some(Recommendation::Apply));
}

#[tokio::test]
async fn test_run_batch_keeps_input_order() {
    let engine = engine_with(Arc::new(MockProvider::replying(STAFF_REMOTE_IC)));

    let results = engine
        .run_batch(&["posting one", "", "posting three"], &criteria(), RunOptions::default())
        .await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].recommendation, Some(Recommendation::Apply));
    assert_eq!(results[1].recommendation, None);
    assert_eq!(results[2].recommendation, Some(Recommendation::Apply));

    let ids: BTreeSet<_> = results.iter().map(|r| r.run_id.as_str()).collect();
    assert_eq!(ids.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tracing_scope_isolated_between_concurrent_runs() {
    let handler = Arc::new(RecordingHandler::default());
    let provider =
        Arc::new(MockProvider::replying(STAFF_REMOTE_IC).with_delay(Duration::from_millis(20)));
    let engine = Arc::new(
        WorkflowEngine::builder()
            .extractor(Arc::new(LlmExtractor::new(provider, CompletionConfig::default())))
            .tracing(active_tracing(handler.clone()))
            .build()
            .unwrap(),
    );

    let forced = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .run("posting", &criteria(), RunOptions::forced())
                .await
        })
    };
    let unforced = {
        let engine = Arc::clone(&engine);
        tokio::spawn(async move {
            engine
                .run("posting", &criteria(), RunOptions::default())
                .await
        })
    };

    let forced = forced.await.unwrap();
    let unforced = unforced.await.unwrap();

    let mut forced_spans = handler.spans_for(&forced.run_id);
    forced_spans.sort();
    let mut expected = vec![EXTRACTION_SPAN.to_string(), WORKFLOW_SPAN.to_string()];
    expected.sort();
    assert_eq!(forced_spans, expected);

    assert_eq!(handler.spans_for(&unforced.run_id), vec![WORKFLOW_SPAN.to_string()]);

    // Neither run leaked its flag into this task
    assert!(!TracingManager::in_workflow_scope());
}

#[tokio::test]
async fn test_run_nested_in_outer_workflow_scope() {
    let handler = Arc::new(RecordingHandler::default());
    let tracing = active_tracing(handler.clone());
    let engine = WorkflowEngine::builder()
        .extractor(Arc::new(LlmExtractor::new(
            Arc::new(MockProvider::replying(STAFF_REMOTE_IC)),
            CompletionConfig::default(),
        )))
        .tracing(tracing.clone())
        .build()
        .unwrap();

    let (plain, forced, still_in_scope) = TracingManager::scope(async {
        tracing.enter_workflow_scope();
        let plain = engine.run("posting", &criteria(), RunOptions::default()).await;
        let forced = engine.run("posting", &criteria(), RunOptions::forced()).await;
        (plain, forced, TracingManager::in_workflow_scope())
    })
    .await;

    assert!(still_in_scope);
    assert_eq!(plain.recommendation, Some(Recommendation::Apply));
    let plain_spans = handler.spans_for(&plain.run_id);
    assert!(!plain_spans.iter().any(|name| name == EXTRACTION_SPAN));
    assert_eq!(plain_spans, vec![WORKFLOW_SPAN.to_string()]);

    assert!(handler
        .spans_for(&forced.run_id)
        .iter()
        .any(|name| name == EXTRACTION_SPAN));
    assert!(!TracingManager::in_workflow_scope());
}

#[tokio::test]
async fn test_standalone_extraction_is_traced() {
    let handler = Arc::new(RecordingHandler::default());
    let tracing = active_tracing(handler.clone());
    let extractor = LlmExtractor::new(
        Arc::new(MockProvider::replying(STAFF_REMOTE_IC)),
        CompletionConfig::default(),
    );

    let call = tracing.call_config(false).metadata("run_id", "standalone-1");
    let info = extractor
        .extract("posting", &jobeval_core::SchemaDescriptor::job_info(), &call)
        .await
        .unwrap();

    assert_eq!(info.company.as_deref(), Some("Acme"));
    assert_eq!(handler.spans_for("standalone-1"), vec![EXTRACTION_SPAN.to_string()]);
}

#[tokio::test]
async fn test_failed_extraction_reported_to_trace() {
    let handler = Arc::new(RecordingHandler::default());
    let engine = WorkflowEngine::builder()
        .extractor(Arc::new(LlmExtractor::new(
            Arc::new(MockProvider::replying("not json")),
            CompletionConfig::default(),
        )))
        .tracing(active_tracing(handler.clone()))
        .build()
        .unwrap();

    let result = engine.run("posting", &criteria(), RunOptions::forced()).await;

    let spans = handler.spans.lock();
    let outcomes: Vec<_> = spans
        .iter()
        .filter(|(id, _, _)| *id == result.run_id)
        .map(|(_, _, outcome)| outcome.clone())
        .collect();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes
        .iter()
        .all(|o| matches!(o, SpanOutcome::Error(_))));
}
