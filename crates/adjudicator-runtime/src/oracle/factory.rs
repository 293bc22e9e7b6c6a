//! Oracle provider registration.
//!
//! Providers register an [`OracleFactory`]; the runtime builds the configured
//! provider by type name from its JSON settings.
//!
//! ```ignore
//! let registry = OracleRegistry::with_defaults();
//! let oracle = registry.create("anthropic", &settings)?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{OracleClient, OracleError};

/// Creates oracle clients of one provider type from JSON configuration.
pub trait OracleFactory: Send + Sync {
    /// Unique identifier, e.g. `"anthropic"`.
    fn provider_type(&self) -> &'static str;

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn OracleClient>, OracleError>;

    /// Validate configuration without creating a client.
    fn validate_config(&self, config: &JsonValue) -> Result<(), OracleError>;

    fn default_config(&self) -> JsonValue {
        serde_json::json!({})
    }

    fn description(&self) -> &'static str {
        "Oracle provider"
    }
}

/// Registry of available oracle factories, keyed by provider type.
#[derive(Default)]
pub struct OracleRegistry {
    factories: BTreeMap<String, Arc<dyn OracleFactory>>,
}

impl OracleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in providers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::anthropic::AnthropicOracleFactory));
        registry
    }

    /// Register a factory, replacing any previous one of the same type.
    pub fn register(&mut self, factory: Arc<dyn OracleFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    pub fn create(
        &self,
        provider_type: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn OracleClient>, OracleError> {
        self.factory(provider_type)?.create(config)
    }

    pub fn validate(&self, provider_type: &str, config: &JsonValue) -> Result<(), OracleError> {
        self.factory(provider_type)?.validate_config(config)
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    /// Provider defaults overlaid with `config`.
    pub fn merged_config(&self, provider_type: &str, config: &JsonValue) -> Result<JsonValue, OracleError> {
        let mut merged = self.factory(provider_type)?.default_config();
        if let (Some(target), Some(overrides)) = (merged.as_object_mut(), config.as_object()) {
            for (key, value) in overrides {
                target.insert(key.clone(), value.clone());
            }
        }
        Ok(merged)
    }

    fn factory(&self, provider_type: &str) -> Result<&Arc<dyn OracleFactory>, OracleError> {
        self.factories.get(provider_type).ok_or_else(|| {
            OracleError::NotConfigured(format!(
                "Unknown oracle provider: '{}'. Available: {:?}",
                provider_type,
                self.available_types()
            ))
        })
    }
}

impl std::fmt::Debug for OracleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}
