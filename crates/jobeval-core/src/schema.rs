//! JSON Schema for extracted job information.
//!
//! Extraction output is validated against `schema/job_info.schema.json`
//! before it is deserialized into a [`JobInfo`]. The schema is the
//! contract handed to the extraction model; anything that deviates from
//! it is rejected as malformed.

use std::sync::OnceLock;
use thiserror::Error;

use crate::job::JobInfo;

/// Embedded job-info schema (loaded at compile time).
const JOB_INFO_SCHEMA_JSON: &str = include_str!("../schema/job_info.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation and typed parsing.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),

    #[error("Output does not match schema: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("Failed to deserialize job info: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Inconsistent job info: {0}")]
    Inconsistent(String),
}

/// Get or initialize the compiled schema validator.
fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(JOB_INFO_SCHEMA_JSON) {
            Ok(v) => v,
            Err(e) => return Err(format!("Invalid schema JSON: {}", e)),
        };

        match jsonschema::options().build(&schema_value) {
            Ok(v) => Ok(v),
            Err(e) => Err(format!("Failed to compile schema: {}", e)),
        }
    });

    match result {
        Ok(v) => Ok(v),
        Err(e) => Err(SchemaError::LoadError(e.clone())),
    }
}

/// Validate a JSON value against the job-info schema.
///
/// Returns every validation error, each suffixed with its instance path.
pub fn validate_job_info_schema(value: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check if a JSON value is valid against the job-info schema.
pub fn is_valid_job_info(value: &serde_json::Value) -> bool {
    get_validator()
        .map(|v| v.is_valid(value))
        .unwrap_or(false)
}

/// Describes the fixed output schema an extractor must produce.
///
/// Only [`SchemaDescriptor::job_info`] builds one, so the schema sent to
/// the model is always the one [`SchemaDescriptor::parse`] validates
/// against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaDescriptor {
    name: &'static str,
    schema_json: &'static str,
}

impl SchemaDescriptor {
    /// The job-info extraction schema.
    pub fn job_info() -> Self {
        Self {
            name: "JobInfo",
            schema_json: JOB_INFO_SCHEMA_JSON,
        }
    }

    /// Schema name, used in prompts and trace metadata.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Raw JSON Schema document.
    pub fn schema_json(&self) -> &'static str {
        self.schema_json
    }

    /// Field names declared by the schema, sorted.
    pub fn field_names(&self) -> Vec<String> {
        serde_json::from_str::<serde_json::Value>(self.schema_json)
            .ok()
            .and_then(|v| {
                v["properties"]
                    .as_object()
                    .map(|props| props.keys().cloned().collect())
            })
            .unwrap_or_default()
    }

    /// Validate and deserialize a model response into [`JobInfo`].
    ///
    /// Fails when the value violates the schema, cannot be deserialized,
    /// or reports a maximum salary below the minimum.
    pub fn parse(&self, value: &serde_json::Value) -> Result<JobInfo, SchemaError> {
        validate_job_info_schema(value).map_err(SchemaError::Invalid)?;

        let info: JobInfo = serde_json::from_value(value.clone())?;

        if let (Some(min), Some(max)) = (info.salary_min, info.salary_max) {
            if max < min {
                return Err(SchemaError::Inconsistent(format!(
                    "salary_max ({}) is lower than salary_min ({})",
                    max, min
                )));
            }
        }

        Ok(info)
    }
}

impl Default for SchemaDescriptor {
    fn default() -> Self {
        Self::job_info()
    }
}
