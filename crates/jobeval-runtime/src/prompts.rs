//! Prompts for structured job-information extraction.
//!
//! The system prompt is static and carries the extraction rules plus the
//! JSON Schema; the user prompt only wraps the posting text.

use jobeval_core::SchemaDescriptor;

/// Extraction instructions shared by every request.
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"
You extract structured information from job postings.

Read the posting and report ONLY what it states. Do not guess.

## Field Rules
- title: the job title exactly as written
- company: the hiring company name
- salary_min / salary_max: annual base salary in USD as whole numbers
  (no currency symbols, no "k" suffixes). If only one number is
  mentioned, use it as salary_max and leave salary_min null.
- location_policy: one of "remote", "hybrid", "onsite", "unclear".
  Add the posting's qualifier in parentheses when present,
  e.g. "remote (US only)".
- role_type: "ic" for individual contributors, "manager" for people
  managers, "unclear" otherwise.
- Use lowercase for location_policy and role_type.
- Use null for anything the posting does not state.

## Output Format
Respond with a single JSON object matching the schema below and
nothing else: no prose, no markdown fences.
"#;

/// Build the full system prompt for a schema.
pub fn build_system_prompt(schema: &SchemaDescriptor) -> String {
    format!(
        "{}\n## Schema: {}\n{}",
        EXTRACTION_SYSTEM_PROMPT.trim_start(),
        schema.name(),
        schema.schema_json().trim()
    )
}

/// Wrap posting text for the user turn.
pub fn build_user_prompt(posting_text: &str) -> String {
    format!(
        "Extract the job information from this posting:\n\n<posting>\n{}\n</posting>",
        posting_text.trim()
    )
}
