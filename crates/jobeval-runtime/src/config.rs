//! Application configuration.
//!
//! One YAML document holds the user's criteria, the extraction profile
//! (provider, model, retry policy), tracing settings and the log level.
//! Every section is optional.
//!
//! ```yaml
//! criteria:
//!   min_salary: 160000
//!   remote_required: true
//!   ic_title_requirements: [lead, staff, principal, senior staff]
//! extraction:
//!   provider: anthropic
//!   model: claude-sonnet-4-5-20250514
//!   timeout: 30s
//!   retry:
//!     max_retries: 3
//!     min_delay: 1s
//!     max_delay: 8s
//! tracing:
//!   enabled: false
//! logging:
//!   level: info
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use jobeval_core::{CriteriaConfig, CriteriaError};

use crate::observability::TracingConfig;
use crate::providers::{duration_str, CompletionConfig, RetryPolicy};

/// Errors from loading the application config.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid criteria: {0}")]
    Criteria(#[from] CriteriaError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// How to reach the extraction model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionProfile {
    /// Registry key of the provider
    pub provider: String,

    pub model: String,

    pub temperature: f32,

    pub max_tokens: u32,

    /// Per-request timeout, e.g. "30s"
    #[serde(with = "duration_str")]
    pub timeout: Duration,

    pub retry: RetryPolicy,

    /// Provider-specific settings passed to its factory
    pub settings: serde_json::Value,
}

impl Default for ExtractionProfile {
    fn default() -> Self {
        let completion = CompletionConfig::default();
        Self {
            provider: "anthropic".to_string(),
            model: completion.model,
            temperature: completion.temperature,
            max_tokens: completion.max_tokens,
            timeout: completion.timeout,
            retry: RetryPolicy::default(),
            settings: serde_json::json!({}),
        }
    }
}

impl ExtractionProfile {
    /// Completion settings for provider calls.
    pub fn completion_config(&self) -> CompletionConfig {
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            timeout: self.timeout,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub criteria: CriteriaConfig,
    pub extraction: ExtractionProfile,
    pub tracing: TracingConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Parse and validate config from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: AppConfig = serde_yaml::from_str(yaml)?;
        config.criteria = config.criteria.normalized()?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.extraction.provider.trim().is_empty() {
            return Err(ConfigError::Invalid("extraction.provider is empty".to_string()));
        }
        if self.extraction.model.trim().is_empty() {
            return Err(ConfigError::Invalid("extraction.model is empty".to_string()));
        }
        if self.extraction.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "extraction.max_tokens must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.extraction.temperature) {
            return Err(ConfigError::Invalid(format!(
                "extraction.temperature must be within 0.0..=1.0, got {}",
                self.extraction.temperature
            )));
        }
        if self.extraction.retry.min_delay > self.extraction.retry.max_delay {
            return Err(ConfigError::Invalid(
                "extraction.retry.min_delay exceeds max_delay".to_string(),
            ));
        }
        if !self.extraction.settings.is_object() {
            return Err(ConfigError::Invalid(
                "extraction.settings must be a mapping".to_string(),
            ));
        }
        Ok(())
    }
}
