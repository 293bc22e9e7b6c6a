//! Runtime configuration.
//!
//! Loaded from YAML. Durations are human-readable strings (`"500ms"`,
//! `"30s"`, `"1h"`). Every section is optional and falls back to defaults.
//!
//! ```yaml
//! oracle:
//!   provider: anthropic
//!   model: claude-sonnet-4-5-20250514
//!   timeout: 60s
//! retry:
//!   max_attempts: 3
//!   initial_delay: 500ms
//!   max_delay: 8s
//! qualification:
//!   mode: oracle
//!   acceptance_threshold: 40
//! card:
//!   payer_name: Zakład Ubezpieczeń Społecznych
//! ```

use adjudicator_core::{CardConfig, QualificationPolicy, DEFAULT_ACCEPTANCE_THRESHOLD};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::resilience::{CircuitBreakerConfig, RetryConfig};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "ADJUDICATOR_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Serde adapter for `humantime` duration strings.
pub mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

/// Which oracle provider to build and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    pub provider: String,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
    /// Provider-specific settings passed to the provider factory.
    pub settings: JsonValue,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: None,
            max_tokens: None,
            timeout: Duration::from_secs(60),
            settings: JsonValue::Object(Default::default()),
        }
    }
}

impl OracleSettings {
    /// JSON handed to the provider factory.
    pub fn provider_config(&self) -> JsonValue {
        let mut config = match &self.settings {
            JsonValue::Object(map) => map.clone(),
            _ => Default::default(),
        };
        if let Some(model) = &self.model {
            config.insert("model".to_string(), JsonValue::from(model.clone()));
        }
        if let Some(max_tokens) = self.max_tokens {
            config.insert("max_tokens".to_string(), JsonValue::from(max_tokens));
        }
        config.insert(
            "timeout".to_string(),
            JsonValue::from(humantime::format_duration(self.timeout).to_string()),
        );
        JsonValue::Object(config)
    }
}

/// How qualification findings are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualificationMode {
    /// The oracle assesses each condition; the decision is still computed locally.
    #[default]
    Oracle,
    /// Keyword rule tables only, no oracle call.
    Rules,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualificationSettings {
    pub mode: QualificationMode,
    pub acceptance_threshold: u8,
}

impl Default for QualificationSettings {
    fn default() -> Self {
        Self {
            mode: QualificationMode::Oracle,
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }
}

impl QualificationSettings {
    pub fn policy(&self) -> QualificationPolicy {
        QualificationPolicy {
            acceptance_threshold: self.acceptance_threshold,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub max_parallel_extractions: usize,
    /// How long a reviewer decision waits for a running analysis of the same case.
    #[serde(with = "duration_serde")]
    pub decision_lock_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_parallel_extractions: 4,
            decision_lock_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub max_entries: u64,
    #[serde(with = "duration_serde")]
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: 1_000,
            ttl: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub oracle: OracleSettings,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub qualification: QualificationSettings,
    pub pipeline: PipelineSettings,
    pub cache: CacheSettings,
    pub card: CardConfig,
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.retry.validate().map_err(ConfigError::Invalid)?;

        if self.qualification.acceptance_threshold > 100 {
            return Err(ConfigError::Invalid(format!(
                "qualification.acceptance_threshold must be at most 100, got {}",
                self.qualification.acceptance_threshold
            )));
        }
        if self.pipeline.max_parallel_extractions == 0 {
            return Err(ConfigError::Invalid(
                "pipeline.max_parallel_extractions must be at least 1".to_string(),
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 || self.circuit_breaker.success_threshold == 0 {
            return Err(ConfigError::Invalid(
                "circuit_breaker thresholds must be at least 1".to_string(),
            ));
        }
        if self.cache.max_entries == 0 {
            return Err(ConfigError::Invalid("cache.max_entries must be at least 1".to_string()));
        }
        if self.card.payer_name.trim().is_empty() {
            return Err(ConfigError::Invalid("card.payer_name must not be blank".to_string()));
        }
        if self.oracle.provider.trim().is_empty() {
            return Err(ConfigError::Invalid("oracle.provider must not be blank".to_string()));
        }
        Ok(())
    }
}
