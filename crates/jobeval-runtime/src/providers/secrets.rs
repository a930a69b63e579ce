//! Credential handling for providers and the tracing backend.
//!
//! Every key the runtime holds (the provider API key, the tracing
//! public/secret key pair) goes through [`ApiCredential`], which never
//! prints its value through `Debug` or `Display`.
//!
//! ## Usage
//!
//! ```ignore
//! // Config value first, environment variable as fallback
//! let cred = ApiCredential::from_config_or_env(&config, "api_key", "ANTHROPIC_API_KEY", "Anthropic API key")?;
//!
//! // Expose only at the point of use
//! request.header("x-api-key", cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Configuration file/JSON
    Config,
    /// Environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored credential.
///
/// `Debug` and `Display` show `[REDACTED]`; the value is zeroed on drop
/// by `secrecy` and is only reachable through [`ApiCredential::expose`].
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

/// Read a non-blank string from config.
fn config_str<'a>(config: &'a JsonValue, key: &str) -> Option<&'a str> {
    config[key].as_str().filter(|v| !v.trim().is_empty())
}

/// Read a non-blank environment variable.
fn env_str(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load a credential from an environment variable.
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, ProviderError> {
        env_str(env_var)
            .map(|v| Self::new(v, CredentialSource::Environment, name))
            .ok_or_else(|| {
                ProviderError::NotConfigured(format!(
                    "{} not set: configure '{}' environment variable",
                    name, env_var
                ))
            })
    }

    /// Load a credential from JSON config, falling back to an environment
    /// variable. Blank values count as missing.
    pub fn from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Result<Self, ProviderError> {
        if let Some(value) = config_str(config, config_key) {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        if let Some(value) = env_str(env_var) {
            return Ok(Self::new(value, CredentialSource::Environment, name));
        }

        Err(ProviderError::NotConfigured(format!(
            "{} required: set '{}' in config or {} environment variable",
            name, config_key, env_var
        )))
    }

    /// Check if a credential is available without loading it.
    pub fn is_available(config: &JsonValue, config_key: &str, env_var: &str) -> bool {
        config_str(config, config_key).is_some() || env_str(env_var).is_some()
    }

    /// Expose the value. Call only where the credential is sent.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

/// Loads several credentials at once, e.g. the tracing key pair.
///
/// ```ignore
/// let mut creds = CredentialBuilder::new()
///     .optional("public_key", "TRACING_PUBLIC_KEY", "Tracing public key")
///     .optional("secret_key", "TRACING_SECRET_KEY", "Tracing secret key")
///     .build(&config)?;
/// let public_key = creds.take("public_key");
/// ```
#[derive(Default)]
pub struct CredentialBuilder {
    optional: Vec<CredentialSpec>,
}

struct CredentialSpec {
    config_key: &'static str,
    env_var: &'static str,
    name: &'static str,
}

impl CredentialBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a credential that may be absent.
    pub fn optional(
        mut self,
        config_key: &'static str,
        env_var: &'static str,
        name: &'static str,
    ) -> Self {
        self.optional.push(CredentialSpec {
            config_key,
            env_var,
            name,
        });
        self
    }

    pub fn build(self, config: &JsonValue) -> Result<CredentialSet, ProviderError> {
        let mut credentials = BTreeMap::new();

        for spec in self.optional {
            if ApiCredential::is_available(config, spec.config_key, spec.env_var) {
                let cred = ApiCredential::from_config_or_env(
                    config,
                    spec.config_key,
                    spec.env_var,
                    spec.name,
                )?;
                credentials.insert(spec.config_key, cred);
            }
        }

        Ok(CredentialSet { credentials })
    }
}

/// Credentials loaded by a [`CredentialBuilder`].
pub struct CredentialSet {
    credentials: BTreeMap<&'static str, ApiCredential>,
}

impl CredentialSet {
    /// Move a credential out of the set.
    pub fn take(&mut self, key: &str) -> Option<ApiCredential> {
        self.credentials.remove(key)
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("keys", &self.credentials.keys().collect::<Vec<_>>())
            .finish()
    }
}
