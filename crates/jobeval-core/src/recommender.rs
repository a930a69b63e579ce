//! Recommender: folds criterion verdicts into a final recommendation.
//!
//! The policy is fixed:
//! 1. If there are no verdicts → DO_NOT_APPLY
//! 2. Else if ANY verdict failed → DO_NOT_APPLY
//! 3. Else → APPLY
//!
//! The reasoning always lists every criterion, in evaluation order, so a
//! reader can see what passed as well as what failed.

use serde::{Deserialize, Serialize};

use crate::types::{Recommendation, Verdict};

/// Recommendation plus the explanation that goes with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationOutcome {
    pub recommendation: Recommendation,
    pub reasoning: String,
    pub passed: usize,
    pub total: usize,
}

/// The Recommender turns verdicts into an APPLY / DO_NOT_APPLY decision.
#[derive(Debug, Default, Clone, Copy)]
pub struct Recommender;

impl Recommender {
    pub fn new() -> Self {
        Self
    }

    /// Produce a recommendation for the given verdicts. Never fails.
    pub fn recommend(&self, verdicts: &[Verdict]) -> RecommendationOutcome {
        let total = verdicts.len();
        let passed = verdicts.iter().filter(|v| v.passed).count();

        if total == 0 {
            return RecommendationOutcome {
                recommendation: Recommendation::DoNotApply,
                reasoning: "No criteria were evaluated; cannot recommend applying".to_string(),
                passed,
                total,
            };
        }

        let recommendation = if passed == total {
            Recommendation::Apply
        } else {
            Recommendation::DoNotApply
        };

        RecommendationOutcome {
            recommendation,
            reasoning: self.build_reasoning(verdicts, passed, total),
            passed,
            total,
        }
    }

    /// Build the reasoning text: a headline followed by one entry per criterion.
    fn build_reasoning(&self, verdicts: &[Verdict], passed: usize, total: usize) -> String {
        let headline = if passed == total {
            format!("All {} criteria passed.", total)
        } else {
            format!("Failed {} of {} criteria.", total - passed, total)
        };

        let details = verdicts
            .iter()
            .map(|v| {
                format!(
                    "{}: {} - {}",
                    v.criterion.name(),
                    if v.passed { "PASS" } else { "FAIL" },
                    v.reasoning
                )
            })
            .collect::<Vec<_>>()
            .join("; ");

        format!("{} {}", headline, details)
    }
}
