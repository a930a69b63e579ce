//! Shared text patterns for job-posting fields.
//!
//! Location and role values come back from the extraction model as
//! free-form strings ("Remote (US only)", "Individual Contributor", ...).
//! These patterns classify them without touching the evaluation rules,
//! which keep their plain substring semantics.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // =========================================================================
    // LOCATION POLICY PATTERNS
    // =========================================================================

    /// Fully remote signal
    pub static ref REMOTE_PATTERN: Regex = Regex::new(
        r"(?i)\bremote\b"
    ).unwrap();

    /// Hybrid arrangements
    pub static ref HYBRID_PATTERN: Regex = Regex::new(
        r"(?i)\bhybrid\b"
    ).unwrap();

    /// In-office work
    pub static ref ONSITE_PATTERN: Regex = Regex::new(
        r"(?i)\b(on[\s-]?site|in[\s-]office|in[\s-]person|office[\s-]based)\b"
    ).unwrap();

    // =========================================================================
    // ROLE TYPE PATTERNS
    // =========================================================================

    /// Individual contributor roles ("ic", "individual contributor")
    pub static ref IC_ROLE_PATTERN: Regex = Regex::new(
        r"(?i)\b(ic|individual[\s-]+contributor)\b"
    ).unwrap();

    /// People-management roles
    pub static ref MANAGER_ROLE_PATTERN: Regex = Regex::new(
        r"(?i)\b(manager|management|people[\s-]+lead)\b"
    ).unwrap();

    // =========================================================================
    // MODEL OUTPUT PATTERNS
    // =========================================================================

    /// Markdown code fence around a JSON payload
    pub static ref CODE_FENCE_PATTERN: Regex = Regex::new(
        r"(?s)^\s*```(?:json|JSON)?\s*(.*?)\s*```\s*$"
    ).unwrap();
}

/// Check if a location string signals remote work.
pub fn mentions_remote(text: &str) -> bool {
    REMOTE_PATTERN.is_match(text)
}

/// Check if a location string signals a hybrid arrangement.
pub fn mentions_hybrid(text: &str) -> bool {
    HYBRID_PATTERN.is_match(text)
}

/// Check if a location string signals in-office work.
pub fn mentions_onsite(text: &str) -> bool {
    ONSITE_PATTERN.is_match(text)
}

/// Check if a role string describes an individual contributor.
pub fn is_individual_contributor(text: &str) -> bool {
    IC_ROLE_PATTERN.is_match(text)
}

/// Check if a role string describes a manager.
pub fn is_manager(text: &str) -> bool {
    MANAGER_ROLE_PATTERN.is_match(text)
}

/// Strip a surrounding markdown code fence, if any.
pub fn strip_code_fence(text: &str) -> &str {
    match CODE_FENCE_PATTERN.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text.trim(),
    }
}
