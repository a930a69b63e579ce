//! Per-invocation workflow state.
//!
//! A [`WorkflowState`] is owned by exactly one run. Stages write their
//! own fields through `record_*` methods, each field at most once, and
//! stages must complete in order: validate, extract, evaluate, recommend.
//! Violations are programming errors in the pipeline and surface as
//! [`StateError`] instead of silently overwriting data.

use chrono::Utc;
use std::time::Duration;
use thiserror::Error;

use crate::job::JobInfo;
use crate::types::{
    EvaluationResult, Recommendation, RunMetadata, Stage, StageError, StageTiming, Verdict,
};

/// Errors from illegal state transitions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Stage {found} recorded out of order (expected {expected:?})")]
    OutOfOrder {
        expected: Option<Stage>,
        found: Stage,
    },

    #[error("Field '{0}' already recorded")]
    AlreadyRecorded(&'static str),

    #[error("Workflow halted at validation; no further stages may run")]
    Halted,

    #[error("Recommendation {0} contradicts the recorded verdicts")]
    InconsistentRecommendation(Recommendation),
}

/// Accumulator for a single evaluation run.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    posting_text: String,
    extracted_info: Option<JobInfo>,
    extraction_meaningful: Option<bool>,
    evaluation_result: Option<Vec<Verdict>>,
    recommendation: Option<Recommendation>,
    reasoning: Option<String>,
    error: Option<StageError>,
    last_stage: Option<Stage>,
    halted: bool,
    timings: Vec<StageTiming>,
}

impl WorkflowState {
    /// Create state holding only the posting text.
    pub fn new(posting_text: impl Into<String>) -> Self {
        Self {
            posting_text: posting_text.into(),
            extracted_info: None,
            extraction_meaningful: None,
            evaluation_result: None,
            recommendation: None,
            reasoning: None,
            error: None,
            last_stage: None,
            halted: false,
            timings: Vec::new(),
        }
    }

    pub fn posting_text(&self) -> &str {
        &self.posting_text
    }

    pub fn extracted_info(&self) -> Option<&JobInfo> {
        self.extracted_info.as_ref()
    }

    pub fn evaluation_result(&self) -> Option<&[Verdict]> {
        self.evaluation_result.as_deref()
    }

    pub fn recommendation(&self) -> Option<Recommendation> {
        self.recommendation
    }

    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning.as_deref()
    }

    pub fn error(&self) -> Option<&StageError> {
        self.error.as_ref()
    }

    /// Last stage that completed.
    pub fn last_stage(&self) -> Option<Stage> {
        self.last_stage
    }

    /// True once validation has rejected the input.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// The stage that must run next, or `None` if the run is finished.
    pub fn next_stage(&self) -> Option<Stage> {
        if self.halted {
            return None;
        }
        match self.last_stage {
            None => Some(Stage::Validate),
            Some(stage) => stage.next(),
        }
    }

    fn advance(&mut self, stage: Stage) -> Result<(), StateError> {
        if self.halted {
            return Err(StateError::Halted);
        }
        let expected = self.next_stage();
        if expected != Some(stage) {
            return Err(StateError::OutOfOrder {
                expected,
                found: stage,
            });
        }
        self.last_stage = Some(stage);
        Ok(())
    }

    fn set_error(&mut self, error: StageError) -> Result<(), StateError> {
        if self.error.is_some() {
            return Err(StateError::AlreadyRecorded("error"));
        }
        self.error = Some(error);
        Ok(())
    }

    /// Validation accepted the input.
    pub fn record_validated(&mut self) -> Result<(), StateError> {
        self.advance(Stage::Validate)
    }

    /// Validation rejected the input. Halts the run.
    pub fn record_validation_failure(&mut self, error: StageError) -> Result<(), StateError> {
        self.advance(Stage::Validate)?;
        self.reasoning = Some(format!("Validation failed: {}", error.message));
        self.set_error(error)?;
        self.halted = true;
        Ok(())
    }

    /// Extraction succeeded.
    pub fn record_extracted(&mut self, info: JobInfo) -> Result<(), StateError> {
        self.advance(Stage::Extract)?;
        self.extraction_meaningful = Some(info.is_meaningful());
        self.extracted_info = Some(info);
        Ok(())
    }

    /// Extraction failed. The run continues without extracted info.
    pub fn record_extraction_failure(&mut self, error: StageError) -> Result<(), StateError> {
        self.advance(Stage::Extract)?;
        self.set_error(error)
    }

    /// Criteria evaluation finished.
    pub fn record_evaluation(&mut self, verdicts: Vec<Verdict>) -> Result<(), StateError> {
        self.advance(Stage::Evaluate)?;
        if self.evaluation_result.is_some() {
            return Err(StateError::AlreadyRecorded("evaluation_result"));
        }
        self.evaluation_result = Some(verdicts);
        Ok(())
    }

    /// Recommendation produced.
    ///
    /// Rejects an APPLY that is not backed by a non-empty, all-passing
    /// verdict list, and a DO_NOT_APPLY that contradicts one.
    pub fn record_recommendation(
        &mut self,
        recommendation: Recommendation,
        reasoning: impl Into<String>,
    ) -> Result<(), StateError> {
        let verdicts = self.evaluation_result.as_deref().unwrap_or_default();
        let all_passed = !verdicts.is_empty() && verdicts.iter().all(|v| v.passed);
        if all_passed != (recommendation == Recommendation::Apply) {
            return Err(StateError::InconsistentRecommendation(recommendation));
        }

        self.advance(Stage::Recommend)?;
        if self.reasoning.is_some() {
            return Err(StateError::AlreadyRecorded("reasoning"));
        }
        self.recommendation = Some(recommendation);
        self.reasoning = Some(reasoning.into());
        Ok(())
    }

    /// Record how long a stage took.
    pub fn record_timing(&mut self, stage: Stage, duration: Duration) {
        self.timings.push(StageTiming {
            stage,
            duration_ms: duration.as_secs_f64() * 1000.0,
        });
    }

    /// Consume the state into the caller-facing result.
    pub fn into_result(self, metadata: RunMetadata) -> EvaluationResult {
        let evaluation_result = self.evaluation_result.unwrap_or_default();
        let total = evaluation_result.len();
        let passed = evaluation_result.iter().filter(|v| v.passed).count();

        let reasoning = self.reasoning.unwrap_or_else(|| match &self.error {
            Some(err) => err.to_string(),
            None => "Workflow did not complete".to_string(),
        });

        EvaluationResult {
            recommendation: self.recommendation,
            reasoning,
            evaluation_result,
            error: self.error,
            extracted_info: self.extracted_info,
            extraction_meaningful: self.extraction_meaningful,
            passed,
            total,
            timings: self.timings,
            run_id: metadata.run_id,
            workflow_version: metadata.workflow_version,
            evaluated_at: Utc::now(),
        }
    }
}
