//! Criteria evaluation: turns extracted job info into verdicts.
//!
//! Each criterion is checked independently and in a fixed order
//! (salary, remote, title level). A failing criterion never prevents the
//! next one from being evaluated, and missing fields produce failing
//! verdicts instead of errors.
//!
//! Two criteria are conditional:
//! - `remote` is only checked when the criteria require remote work
//! - `title_level` is only checked for individual contributor roles

use crate::criteria::CriteriaConfig;
use crate::job::{format_usd, JobInfo};
use crate::types::{Criterion, Verdict};

/// Reasoning attached to the synthetic verdict when extraction failed.
pub const MISSING_EXTRACTION_REASON: &str =
    "Job information could not be extracted; criteria cannot be evaluated";

/// Evaluates job information against a [`CriteriaConfig`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CriteriaEvaluator;

impl CriteriaEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate all applicable criteria.
    ///
    /// Without job info, returns a single failing `extraction` verdict.
    pub fn evaluate(&self, info: Option<&JobInfo>, criteria: &CriteriaConfig) -> Vec<Verdict> {
        let Some(info) = info else {
            tracing::debug!("No extracted info, emitting missing-data verdict");
            return vec![Verdict::fail(
                Criterion::Extraction,
                MISSING_EXTRACTION_REASON,
            )];
        };

        let mut verdicts = Vec::with_capacity(3);

        verdicts.push(check_salary(info, criteria.min_salary));

        if criteria.remote_required {
            verdicts.push(check_remote(info));
        }

        if info.is_individual_contributor() {
            verdicts.push(check_title_level(info, &criteria.ic_title_requirements));
        }

        for verdict in &verdicts {
            tracing::debug!(
                criterion = verdict.criterion.name(),
                passed = verdict.passed,
                "Criterion evaluated"
            );
        }

        verdicts
    }
}

/// Salary passes iff the top of the range meets the minimum.
///
/// `salary_min` is deliberately ignored.
pub fn check_salary(info: &JobInfo, min_salary: u64) -> Verdict {
    match info.salary_max {
        None => Verdict::fail(Criterion::Salary, "Salary not specified"),
        Some(max) if max < min_salary => Verdict::fail(
            Criterion::Salary,
            format!(
                "Highest salary ({}) is lower than required salary ({})",
                format_usd(max),
                format_usd(min_salary)
            ),
        ),
        Some(max) => Verdict::pass(
            Criterion::Salary,
            format!(
                "Salary ({}) meets minimum requirement ({})",
                format_usd(max),
                format_usd(min_salary)
            ),
        ),
    }
}

/// Remote passes iff the location policy contains "remote" (any case).
pub fn check_remote(info: &JobInfo) -> Verdict {
    match info.location_policy.as_deref() {
        None => Verdict::fail(Criterion::RemotePolicy, "Location policy not specified"),
        Some(policy) if policy.to_lowercase().contains("remote") => {
            Verdict::pass(Criterion::RemotePolicy, "Position is remote")
        }
        Some(policy) => Verdict::fail(
            Criterion::RemotePolicy,
            format!("Position is not remote (location policy: {})", policy),
        ),
    }
}

/// Title passes iff it contains at least one seniority marker (any case).
pub fn check_title_level(info: &JobInfo, requirements: &[String]) -> Verdict {
    let Some(title) = info.title.as_deref() else {
        return Verdict::fail(Criterion::TitleLevel, "Job title not specified");
    };

    let lowered = title.to_lowercase();
    let matched = requirements
        .iter()
        .map(|r| r.trim().to_lowercase())
        .find(|r| !r.is_empty() && lowered.contains(r.as_str()));

    match matched {
        Some(marker) => Verdict::pass(
            Criterion::TitleLevel,
            format!("IC role has appropriate seniority level (matched: {})", marker),
        ),
        None if requirements.is_empty() => Verdict::fail(
            Criterion::TitleLevel,
            "IC role lacks required seniority (no seniority markers configured)",
        ),
        None => Verdict::fail(
            Criterion::TitleLevel,
            format!(
                "IC role lacks required seniority (needs: {})",
                requirements.join(", ")
            ),
        ),
    }
}
