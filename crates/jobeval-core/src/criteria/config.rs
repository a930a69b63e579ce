//! Criteria configuration from YAML/JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur when loading criteria.
#[derive(Error, Debug)]
pub enum CriteriaError {
    #[error("Failed to read criteria file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Criteria validation failed: {0}")]
    ValidationError(String),
}

/// Default minimum acceptable salary (USD per year).
pub const DEFAULT_MIN_SALARY: u64 = 160_000;

/// Default seniority markers for individual contributor titles.
pub const DEFAULT_IC_TITLE_REQUIREMENTS: [&str; 4] = ["lead", "staff", "principal", "senior staff"];

/// The user's acceptance criteria.
///
/// Read-only for the workflow; supplied fresh on every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriteriaConfig {
    /// Minimum acceptable value for the top of the salary range
    pub min_salary: u64,

    /// Reject anything that is not remote
    pub remote_required: bool,

    /// Seniority markers an IC title must contain (case-insensitive)
    pub ic_title_requirements: Vec<String>,
}

impl Default for CriteriaConfig {
    fn default() -> Self {
        Self {
            min_salary: DEFAULT_MIN_SALARY,
            remote_required: true,
            ic_title_requirements: DEFAULT_IC_TITLE_REQUIREMENTS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl CriteriaConfig {
    /// Parse criteria from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, CriteriaError> {
        let criteria: CriteriaConfig = serde_yaml::from_str(yaml)?;
        criteria.normalized()
    }

    /// Parse criteria from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, CriteriaError> {
        let criteria: CriteriaConfig = serde_json::from_str(json)?;
        criteria.normalized()
    }

    /// Parse criteria from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, CriteriaError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse criteria from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CriteriaError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse criteria from a file, choosing the format by extension.
    ///
    /// `.json` is parsed as JSON; anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CriteriaError> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json_file(path),
            _ => Self::from_yaml_file(path),
        }
    }

    pub fn with_min_salary(mut self, min_salary: u64) -> Self {
        self.min_salary = min_salary;
        self
    }

    pub fn with_remote_required(mut self, remote_required: bool) -> Self {
        self.remote_required = remote_required;
        self
    }

    pub fn with_ic_title_requirements<I, S>(mut self, requirements: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ic_title_requirements = requirements.into_iter().map(Into::into).collect();
        self
    }

    /// Validate the criteria structure.
    pub fn validate(&self) -> Result<(), CriteriaError> {
        if let Some(pos) = self
            .ic_title_requirements
            .iter()
            .position(|r| r.trim().is_empty())
        {
            return Err(CriteriaError::ValidationError(format!(
                "ic_title_requirements[{}] is blank",
                pos
            )));
        }

        Ok(())
    }

    /// Validate, then lowercase and trim the title markers.
    pub fn normalized(mut self) -> Result<Self, CriteriaError> {
        self.validate()?;
        for marker in &mut self.ic_title_requirements {
            *marker = marker.trim().to_lowercase();
        }
        Ok(self)
    }
}

/// Supplies criteria for an invocation.
///
/// Implementations are consulted on every run; nothing is cached, so
/// edits to a backing file take effect on the next evaluation.
pub trait CriteriaSource: Send + Sync {
    fn load(&self) -> Result<CriteriaConfig, CriteriaError>;
}

impl CriteriaSource for CriteriaConfig {
    fn load(&self) -> Result<CriteriaConfig, CriteriaError> {
        Ok(self.clone())
    }
}

/// Criteria read from a YAML or JSON file on each call.
#[derive(Debug, Clone)]
pub struct FileCriteriaSource {
    path: PathBuf,
}

impl FileCriteriaSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CriteriaSource for FileCriteriaSource {
    fn load(&self) -> Result<CriteriaConfig, CriteriaError> {
        CriteriaConfig::from_file(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let criteria = CriteriaConfig::default();
        assert_eq!(criteria.min_salary, 160_000);
        assert!(criteria.remote_required);
        assert_eq!(
            criteria.ic_title_requirements,
            vec!["lead", "staff", "principal", "senior staff"]
        );
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
min_salary: 100000
remote_required: false
ic_title_requirements:
  - " Staff "
  - Principal
"#;
        let criteria = CriteriaConfig::from_yaml(yaml).unwrap();
        assert_eq!(criteria.min_salary, 100_000);
        assert!(!criteria.remote_required);
        assert_eq!(criteria.ic_title_requirements, vec!["staff", "principal"]);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let criteria = CriteriaConfig::from_yaml("min_salary: 120000\n").unwrap();
        assert_eq!(criteria.min_salary, 120_000);
        assert!(criteria.remote_required);
        assert_eq!(criteria.ic_title_requirements.len(), 4);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"min_salary": 90000, "ic_title_requirements": ["Lead"]}"#;
        let criteria = CriteriaConfig::from_json(json).unwrap();
        assert_eq!(criteria.min_salary, 90_000);
        assert_eq!(criteria.ic_title_requirements, vec!["lead"]);
    }

    #[test]
    fn test_blank_marker_rejected() {
        let yaml = r#"
ic_title_requirements:
  - staff
  - "  "
"#;
        let result = CriteriaConfig::from_yaml(yaml);
        assert!(matches!(result, Err(CriteriaError::ValidationError(_))));
    }

    #[test]
    fn test_negative_salary_rejected() {
        let result = CriteriaConfig::from_yaml("min_salary: -1\n");
        assert!(matches!(result, Err(CriteriaError::YamlError(_))));
    }

    #[test]
    fn test_builder_methods() {
        let criteria = CriteriaConfig::default()
            .with_min_salary(50_000)
            .with_remote_required(false)
            .with_ic_title_requirements(["senior"]);
        assert_eq!(criteria.min_salary, 50_000);
        assert!(!criteria.remote_required);
        assert_eq!(criteria.ic_title_requirements, vec!["senior"]);
    }

    #[test]
    fn test_file_source_rereads_on_each_load() {
        let path = std::env::temp_dir().join(format!(
            "jobeval-criteria-{}.yaml",
            std::process::id()
        ));
        fs::write(&path, "min_salary: 100000\n").unwrap();

        let source = FileCriteriaSource::new(&path);
        assert_eq!(source.load().unwrap().min_salary, 100_000);

        fs::write(&path, "min_salary: 200000\n").unwrap();
        assert_eq!(source.load().unwrap().min_salary, 200_000);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file() {
        let source = FileCriteriaSource::new("/nonexistent/criteria.yaml");
        assert!(matches!(source.load(), Err(CriteriaError::IoError(_))));
    }
}
