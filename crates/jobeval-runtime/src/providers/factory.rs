//! Provider factories and the registry that looks them up by name.
//!
//! The extraction profile in the application config names a provider
//! ("anthropic", ...) and carries provider-specific JSON settings. The
//! registry turns that pair into a ready-to-use [`LlmProvider`].
//!
//! ## Usage
//!
//! ```ignore
//! let registry = ProviderRegistry::with_defaults();
//! let provider = registry.create_with_retry("anthropic", &settings, RetryPolicy::default())?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{LlmProvider, ProviderError, RetryPolicy, RetryingProvider};

/// Builds one kind of LLM provider from JSON settings.
pub trait ProviderFactory: Send + Sync {
    /// Registry key, e.g. "anthropic".
    fn provider_type(&self) -> &'static str;

    /// Create a provider instance from JSON settings.
    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError>;

    /// Check settings (including credential availability) without
    /// creating a provider. Used by `jobeval check`.
    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError>;

    /// Defaults for optional settings.
    fn default_config(&self) -> JsonValue {
        serde_json::json!({})
    }

    /// Human-readable description of this provider.
    fn description(&self) -> &'static str {
        "LLM Provider"
    }
}

/// Registry of available provider factories, keyed by provider type.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory, replacing any with the same type.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    fn factory(&self, provider_type: &str) -> Result<&Arc<dyn ProviderFactory>, ProviderError> {
        self.factories.get(provider_type).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Unknown provider type: '{}'. Available: {:?}",
                provider_type,
                self.available_types()
            ))
        })
    }

    /// Create a provider from type name and settings.
    pub fn create(
        &self,
        provider_type: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let provider = self.factory(provider_type)?.create(config)?;
        tracing::debug!(provider = provider_type, "Provider created");
        Ok(provider)
    }

    /// Create a provider wrapped in the given retry policy.
    pub fn create_with_retry(
        &self,
        provider_type: &str,
        config: &JsonValue,
        policy: RetryPolicy,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let inner = self.create(provider_type, config)?;
        Ok(Arc::new(RetryingProvider::new(inner, policy)))
    }

    /// Validate settings for a provider type.
    pub fn validate(&self, provider_type: &str, config: &JsonValue) -> Result<(), ProviderError> {
        self.factory(provider_type)?.validate_config(config)
    }

    /// List available provider types.
    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a provider type is registered.
    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    /// Default settings for a provider type.
    pub fn default_config(&self, provider_type: &str) -> Option<JsonValue> {
        self.factories
            .get(provider_type)
            .map(|f| f.default_config())
    }

    /// Create a registry with all built-in providers registered.
    #[cfg(feature = "anthropic")]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::AnthropicProviderFactory));
        registry
    }

    /// Create a registry with all built-in providers registered.
    #[cfg(not(feature = "anthropic"))]
    pub fn with_defaults() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatMessage, CompletionConfig, CompletionResponse, TokenUsage};
    use async_trait::async_trait;

    struct CannedProvider {
        name: String,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn complete(
            &self,
            _messages: Vec<ChatMessage>,
            _config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                content: r#"{"title": "Staff Engineer"}"#.to_string(),
                usage: TokenUsage::default(),
                model: "canned".to_string(),
                stop_reason: Some("end_turn".to_string()),
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    struct CannedProviderFactory;

    impl ProviderFactory for CannedProviderFactory {
        fn provider_type(&self) -> &'static str {
            "canned"
        }

        fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
            let name = config["name"].as_str().unwrap_or("canned").to_string();
            Ok(Arc::new(CannedProvider { name }))
        }

        fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
            if config.get("reject").is_some() {
                return Err(ProviderError::NotConfigured("rejected".to_string()));
            }
            Ok(())
        }
    }

    fn registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(CannedProviderFactory));
        registry
    }

    #[test]
    fn test_register_and_create() {
        let registry = registry();
        assert!(registry.has_provider("canned"));
        assert!(!registry.has_provider("unknown"));

        let provider = registry
            .create("canned", &serde_json::json!({"name": "extractor"}))
            .unwrap();
        assert_eq!(provider.name(), "extractor");
    }

    #[test]
    fn test_unknown_provider_lists_available() {
        let result = registry().create("unknown", &serde_json::json!({}));
        match result {
            Err(ProviderError::NotConfigured(msg)) => {
                assert!(msg.contains("Unknown provider type"));
                assert!(msg.contains("canned"));
            }
            _ => panic!("Expected NotConfigured error"),
        }
    }

    #[test]
    fn test_validate_delegates_to_factory() {
        let registry = registry();
        assert!(registry.validate("canned", &serde_json::json!({})).is_ok());
        assert!(registry
            .validate("canned", &serde_json::json!({"reject": true}))
            .is_err());
        assert!(registry.validate("unknown", &serde_json::json!({})).is_err());
    }

    #[tokio::test]
    async fn test_create_with_retry_wraps_provider() {
        let provider = registry()
            .create_with_retry("canned", &serde_json::json!({}), RetryPolicy::none())
            .unwrap();
        assert_eq!(provider.name(), "canned");

        let response = provider
            .complete(vec![ChatMessage::user("posting")], &CompletionConfig::default())
            .await
            .unwrap();
        assert!(response.content.contains("Staff Engineer"));
    }

    #[test]
    fn test_available_types_and_defaults() {
        assert!(ProviderRegistry::new().available_types().is_empty());
        let registry = registry();
        assert_eq!(registry.available_types(), vec!["canned"]);
        assert_eq!(registry.default_config("canned"), Some(serde_json::json!({})));
        assert_eq!(registry.default_config("unknown"), None);
    }
}
