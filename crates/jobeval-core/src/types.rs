//! Shared types for job evaluation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::job::JobInfo;

/// Final recommendation for a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Apply,
    DoNotApply,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Apply => "APPLY",
            Recommendation::DoNotApply => "DO_NOT_APPLY",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The criteria a posting is checked against.
///
/// `Extraction` is synthetic: it only appears when no job information
/// could be extracted and the real criteria cannot be evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Criterion {
    #[serde(rename = "salary")]
    Salary,
    #[serde(rename = "remote")]
    RemotePolicy,
    #[serde(rename = "title_level")]
    TitleLevel,
    #[serde(rename = "extraction")]
    Extraction,
}

impl Criterion {
    /// Stable name used in reasoning text and serialized output.
    pub fn name(&self) -> &'static str {
        match self {
            Criterion::Salary => "salary",
            Criterion::RemotePolicy => "remote",
            Criterion::TitleLevel => "title_level",
            Criterion::Extraction => "extraction",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of checking a single criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub criterion: Criterion,
    pub passed: bool,
    pub reasoning: String,
}

impl Verdict {
    pub fn pass(criterion: Criterion, reasoning: impl Into<String>) -> Self {
        Self {
            criterion,
            passed: true,
            reasoning: reasoning.into(),
        }
    }

    pub fn fail(criterion: Criterion, reasoning: impl Into<String>) -> Self {
        Self {
            criterion,
            passed: false,
            reasoning: reasoning.into(),
        }
    }
}

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validate,
    Extract,
    Evaluate,
    Recommend,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Validate,
        Stage::Extract,
        Stage::Evaluate,
        Stage::Recommend,
    ];

    /// The stage that must follow this one, if any.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Validate => Some(Stage::Extract),
            Stage::Extract => Some(Stage::Evaluate),
            Stage::Evaluate => Some(Stage::Recommend),
            Stage::Recommend => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Extract => "extract",
            Stage::Evaluate => "evaluate",
            Stage::Recommend => "recommend",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a stage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input rejected before any external call. Halts the pipeline.
    ValidationError,
    /// The extraction collaborator failed or returned unusable output.
    ExtractionError,
    /// Evaluation ran without extracted data.
    EvaluationDataMissing,
}

/// A failure recorded against a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageError {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

impl StageError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            stage: Stage::Validate,
            kind: ErrorKind::ValidationError,
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self {
            stage: Stage::Extract,
            kind: ErrorKind::ExtractionError,
            message: message.into(),
        }
    }
}

impl fmt::Display for StageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} stage failed ({:?}): {}", self.stage, self.kind, self.message)
    }
}

/// Wall-clock duration of one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub duration_ms: f64,
}

/// Identifies a single workflow run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: String,
    pub workflow_version: String,
}

/// Result returned to the caller for one invocation.
///
/// `recommendation` is `None` only when validation rejected the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub recommendation: Option<Recommendation>,

    /// Human-readable explanation, always populated
    pub reasoning: String,

    /// Per-criterion verdicts, in evaluation order
    pub evaluation_result: Vec<Verdict>,

    pub error: Option<StageError>,

    pub extracted_info: Option<JobInfo>,

    /// Whether the extracted data carried enough signal to be useful
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extraction_meaningful: Option<bool>,

    pub passed: usize,
    pub total: usize,

    pub timings: Vec<StageTiming>,

    pub run_id: String,
    pub workflow_version: String,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationResult {
    /// True when the caller should apply.
    pub fn should_apply(&self) -> bool {
        self.recommendation == Some(Recommendation::Apply)
    }

    /// Verdicts that did not pass.
    pub fn failed_criteria(&self) -> impl Iterator<Item = &Verdict> {
        self.evaluation_result.iter().filter(|v| !v.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_serializes_screaming_case() {
        assert_eq!(
            serde_json::to_string(&Recommendation::Apply).unwrap(),
            "\"APPLY\""
        );
        assert_eq!(
            serde_json::to_string(&Recommendation::DoNotApply).unwrap(),
            "\"DO_NOT_APPLY\""
        );
    }

    #[test]
    fn test_criterion_names_match_serialization() {
        for criterion in [
            Criterion::Salary,
            Criterion::RemotePolicy,
            Criterion::TitleLevel,
            Criterion::Extraction,
        ] {
            let json = serde_json::to_string(&criterion).unwrap();
            assert_eq!(json, format!("\"{}\"", criterion.name()));
        }
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(Stage::Validate.next(), Some(Stage::Extract));
        assert_eq!(Stage::Extract.next(), Some(Stage::Evaluate));
        assert_eq!(Stage::Evaluate.next(), Some(Stage::Recommend));
        assert_eq!(Stage::Recommend.next(), None);
        assert!(Stage::ALL.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_stage_error_constructors() {
        let err = StageError::validation("empty");
        assert_eq!(err.stage, Stage::Validate);
        assert_eq!(err.kind, ErrorKind::ValidationError);

        let err = StageError::extraction("timeout");
        assert_eq!(err.stage, Stage::Extract);
        assert_eq!(err.kind, ErrorKind::ExtractionError);
        assert!(err.to_string().contains("timeout"));
    }
}
