//! Structured job information extracted from a posting.
//!
//! Every field is optional: the extraction model reports `null` for
//! anything the posting does not state, and evaluation treats absent
//! fields as failing rather than erroring.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::patterns;

/// Fields extracted from free-text job postings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    /// Job title as written in the posting
    #[serde(default)]
    pub title: Option<String>,

    /// Hiring company
    #[serde(default)]
    pub company: Option<String>,

    /// Lower bound of the advertised salary range (USD per year)
    #[serde(default, deserialize_with = "whole_amount")]
    pub salary_min: Option<u64>,

    /// Upper bound of the advertised salary range (USD per year)
    #[serde(default, deserialize_with = "whole_amount")]
    pub salary_max: Option<u64>,

    /// Free-form location policy ("remote", "Hybrid, 3 days onsite", ...)
    #[serde(default)]
    pub location_policy: Option<String>,

    /// Individual contributor vs manager
    #[serde(default)]
    pub role_type: Option<String>,
}

/// Salary figures arrive as JSON integers or as whole-number floats
/// (`150000.0`); both pass the schema's `integer` type.
#[derive(Deserialize)]
#[serde(untagged)]
enum Amount {
    Whole(u64),
    Float(f64),
}

fn whole_amount<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Amount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Amount::Whole(value)) => Ok(Some(value)),
        Some(Amount::Float(value))
            if value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64 =>
        {
            Ok(Some(value as u64))
        }
        Some(Amount::Float(value)) => Err(serde::de::Error::custom(format!(
            "salary must be a non-negative whole number, got {}",
            value
        ))),
    }
}

/// Normalized location policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationPolicy {
    Remote,
    Hybrid,
    Onsite,
    Unclear,
}

impl LocationPolicy {
    /// Classify a free-form location string.
    ///
    /// Hybrid wins over the other signals because hybrid postings
    /// usually mention both remote and onsite days.
    pub fn from_text(text: &str) -> Self {
        if patterns::mentions_hybrid(text) {
            LocationPolicy::Hybrid
        } else if patterns::mentions_remote(text) {
            LocationPolicy::Remote
        } else if patterns::mentions_onsite(text) {
            LocationPolicy::Onsite
        } else {
            LocationPolicy::Unclear
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationPolicy::Remote => "remote",
            LocationPolicy::Hybrid => "hybrid",
            LocationPolicy::Onsite => "onsite",
            LocationPolicy::Unclear => "unclear",
        }
    }
}

impl fmt::Display for LocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized role type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    IndividualContributor,
    Manager,
    Unclear,
}

impl RoleType {
    pub fn from_text(text: &str) -> Self {
        if patterns::is_individual_contributor(text) {
            RoleType::IndividualContributor
        } else if patterns::is_manager(text) {
            RoleType::Manager
        } else {
            RoleType::Unclear
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::IndividualContributor => "ic",
            RoleType::Manager => "manager",
            RoleType::Unclear => "unclear",
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JobInfo {
    /// Normalized location policy (`Unclear` when absent).
    pub fn location(&self) -> LocationPolicy {
        self.location_policy
            .as_deref()
            .map(LocationPolicy::from_text)
            .unwrap_or(LocationPolicy::Unclear)
    }

    /// Normalized role type (`Unclear` when absent).
    pub fn role(&self) -> RoleType {
        self.role_type
            .as_deref()
            .map(RoleType::from_text)
            .unwrap_or(RoleType::Unclear)
    }

    /// Whether the posting describes an individual contributor role.
    pub fn is_individual_contributor(&self) -> bool {
        self.role() == RoleType::IndividualContributor
    }

    /// Whether the extraction carried enough signal to be useful.
    ///
    /// Requires an identity (title or company) plus at least one of:
    /// any salary figure, a clear location policy, a clear role type.
    pub fn is_meaningful(&self) -> bool {
        let has_identity = non_blank(&self.title) || non_blank(&self.company);
        let has_salary = self.salary_min.is_some() || self.salary_max.is_some();
        let has_location = self.location() != LocationPolicy::Unclear;
        let has_role = self.role() != RoleType::Unclear;

        has_identity && (has_salary || has_location || has_role)
    }

    /// One-line human-readable summary of what was extracted.
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();

        if let Some(title) = &self.title {
            parts.push(format!("Title: {}", title));
        }
        if let Some(company) = &self.company {
            parts.push(format!("Company: {}", company));
        }
        match (self.salary_min, self.salary_max) {
            (Some(min), Some(max)) => {
                parts.push(format!("Salary: {} - {}", format_usd(min), format_usd(max)))
            }
            (None, Some(max)) => parts.push(format!("Salary: up to {}", format_usd(max))),
            (Some(min), None) => parts.push(format!("Salary: from {}", format_usd(min))),
            (None, None) => {}
        }
        if self.location_policy.is_some() {
            parts.push(format!("Location: {}", self.location()));
        }
        if self.role_type.is_some() {
            parts.push(format!("Role: {}", self.role()));
        }

        if parts.is_empty() {
            "No information extracted".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

fn non_blank(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Format a dollar amount with thousands separators: `$160,000`.
pub fn format_usd(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
