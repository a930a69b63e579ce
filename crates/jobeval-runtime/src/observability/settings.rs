//! Tracing backend settings.
//!
//! Settings come from the `tracing` section of the application config.
//! `TRACING_ENABLED` and `TRACING_HOST` override the file; the keys are
//! read from the file first and fall back to their environment
//! variables. Tracing is only active
//! when it is enabled, both keys are present and the host is a valid
//! `http(s)://` URL; otherwise the manager runs as a no-op.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::providers::{ApiCredential, CredentialBuilder, ProviderError};

/// Default tracing backend host.
pub const DEFAULT_TRACING_HOST: &str = "https://cloud.langfuse.com";

pub const TRACING_ENABLED_ENV: &str = "TRACING_ENABLED";
pub const TRACING_HOST_ENV: &str = "TRACING_HOST";
pub const TRACING_PUBLIC_KEY_ENV: &str = "TRACING_PUBLIC_KEY";
pub const TRACING_SECRET_KEY_ENV: &str = "TRACING_SECRET_KEY";

lazy_static! {
    /// Scheme, host and optional port/path
    static ref HOST_URL_PATTERN: Regex = Regex::new(
        r"^https?://[A-Za-z0-9](?:[A-Za-z0-9.-]*[A-Za-z0-9])?(?::\d{1,5})?(?:/\S*)?$"
    ).unwrap();
}

/// Check that a host is an absolute `http(s)://` URL.
pub fn is_valid_host(host: &str) -> bool {
    HOST_URL_PATTERN.is_match(host)
}

/// Raw `tracing` section as written in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    pub enabled: bool,
    pub host: Option<String>,
    pub public_key: Option<String>,
    pub secret_key: Option<String>,
}

/// Resolved, read-only tracing settings shared by all invocations.
#[derive(Debug)]
pub struct TracingSettings {
    pub enabled: bool,
    pub host: String,
    pub public_key: Option<ApiCredential>,
    pub secret_key: Option<ApiCredential>,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self::disabled()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl TracingSettings {
    /// Tracing switched off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            host: DEFAULT_TRACING_HOST.to_string(),
            public_key: None,
            secret_key: None,
        }
    }

    /// Resolve settings from config, letting environment variables override.
    pub fn from_config(config: &TracingConfig) -> Result<Self, ProviderError> {
        let enabled = std::env::var(TRACING_ENABLED_ENV)
            .ok()
            .and_then(|v| parse_bool(&v))
            .unwrap_or(config.enabled);

        let host = std::env::var(TRACING_HOST_ENV)
            .ok()
            .filter(|h| !h.trim().is_empty())
            .or_else(|| config.host.clone())
            .unwrap_or_else(|| DEFAULT_TRACING_HOST.to_string());

        let raw = serde_json::json!({
            "public_key": config.public_key,
            "secret_key": config.secret_key,
        });
        let mut credentials = CredentialBuilder::new()
            .optional("public_key", TRACING_PUBLIC_KEY_ENV, "Tracing public key")
            .optional("secret_key", TRACING_SECRET_KEY_ENV, "Tracing secret key")
            .build(&raw)?;

        Ok(Self {
            enabled,
            host: host.trim_end_matches('/').to_string(),
            public_key: credentials.take("public_key"),
            secret_key: credentials.take("secret_key"),
        })
    }

    /// Why tracing is inactive, or `None` if it is active.
    pub fn inactive_reason(&self) -> Option<String> {
        if !self.enabled {
            return Some("tracing disabled".to_string());
        }
        if self.public_key.is_none() || self.secret_key.is_none() {
            return Some(format!(
                "tracing keys missing: set {} and {}",
                TRACING_PUBLIC_KEY_ENV, TRACING_SECRET_KEY_ENV
            ));
        }
        if !is_valid_host(&self.host) {
            return Some(format!("invalid tracing host '{}'", self.host));
        }
        None
    }

    /// True when spans should actually be sent.
    pub fn is_active(&self) -> bool {
        self.inactive_reason().is_none()
    }
}
