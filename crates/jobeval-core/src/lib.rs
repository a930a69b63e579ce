//! # jobeval-core
//!
//! Deterministic job-posting evaluation.
//!
//! This crate holds everything about a job evaluation that does not need
//! a language model:
//! - the structured [`JobInfo`] record and the schema it is extracted against
//! - the user's [`CriteriaConfig`]
//! - per-criterion verdicts and the APPLY / DO_NOT_APPLY recommendation
//! - the append-only [`WorkflowState`] a run accumulates
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same job info and criteria always give the same verdicts
//! 2. **No LLM calls**: Extraction lives in `jobeval-runtime`
//! 3. **Total**: Missing fields produce failing verdicts, never errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use jobeval_core::{evaluate, CriteriaConfig, JobInfo};
//!
//! let criteria = CriteriaConfig::from_yaml_file("criteria.yaml")?;
//! let info = JobInfo { salary_max: Some(200_000), ..Default::default() };
//! let outcome = evaluate(Some(&info), &criteria);
//! println!("{}: {}", outcome.recommendation, outcome.reasoning);
//! ```

pub mod criteria;
pub mod job;
pub mod patterns;
pub mod recommender;
pub mod schema;
pub mod state;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use criteria::{
    CriteriaConfig, CriteriaError, CriteriaEvaluator, CriteriaSource, FileCriteriaSource,
};
pub use job::{format_usd, JobInfo, LocationPolicy, RoleType};
pub use recommender::{RecommendationOutcome, Recommender};
pub use schema::{SchemaDescriptor, SchemaError};
pub use state::{StateError, WorkflowState};
pub use types::{
    Criterion, ErrorKind, EvaluationResult, Recommendation, RunMetadata, Stage, StageError,
    StageTiming, Verdict,
};
pub use validation::validate_posting;

/// Version stamped on every evaluation result.
pub const WORKFLOW_VERSION: &str = "1.0.0";

/// Evaluate job info against criteria and recommend.
///
/// Runs the evaluate and recommend stages back to back. Use
/// `jobeval-runtime` for the full pipeline including extraction.
pub fn evaluate(info: Option<&JobInfo>, criteria: &CriteriaConfig) -> RecommendationOutcome {
    let verdicts = CriteriaEvaluator::new().evaluate(info, criteria);
    Recommender::new().recommend(&verdicts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn criteria() -> CriteriaConfig {
        CriteriaConfig::default()
            .with_min_salary(100_000)
            .with_ic_title_requirements(["lead", "staff", "principal", "senior staff"])
    }

    #[test]
    fn test_all_criteria_pass() {
        let info = JobInfo {
            title: Some("Staff Software Engineer".to_string()),
            salary_max: Some(150_000),
            location_policy: Some("Remote (US only)".to_string()),
            role_type: Some("ic".to_string()),
            ..Default::default()
        };

        let outcome = evaluate(Some(&info), &criteria());
        assert_eq!(outcome.recommendation, Recommendation::Apply);
        assert_eq!(outcome.reasoning.matches(": PASS - ").count(), 3);
    }

    #[test]
    fn test_salary_failure_only() {
        let info = JobInfo {
            title: Some("Staff Software Engineer".to_string()),
            salary_max: Some(90_000),
            location_policy: Some("remote".to_string()),
            role_type: Some("ic".to_string()),
            ..Default::default()
        };

        let outcome = evaluate(Some(&info), &criteria());
        assert_eq!(outcome.recommendation, Recommendation::DoNotApply);
        assert!(outcome.reasoning.contains("salary: FAIL"));
        assert_eq!(outcome.reasoning.matches(": FAIL - ").count(), 1);
    }

    #[test]
    fn test_missing_info_does_not_apply() {
        let outcome = evaluate(None, &criteria());
        assert_eq!(outcome.recommendation, Recommendation::DoNotApply);
        assert!(outcome.reasoning.contains("extraction: FAIL"));
    }
}
