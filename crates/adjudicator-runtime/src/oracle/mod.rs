//! Oracle client abstraction.
//!
//! The oracle is the external reasoning service that reads documents and
//! writes assessments. Every pipeline stage reaches it through the
//! [`OracleClient`] trait so providers can be swapped and scripted in tests.

pub mod anthropic;
pub mod factory;
pub mod resilient;
pub mod secrets;

use adjudicator_core::{AdjudicationError, PipelineStage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use factory::{OracleFactory, OracleRegistry};
pub use resilient::ResilientOracle;

/// Errors from oracle providers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    InvalidResponse(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Oracle not configured: {0}")]
    NotConfigured(String),

    #[error("Circuit open for {0} stage")]
    CircuitOpen(PipelineStage),
}

impl OracleError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            OracleError::Transport(_) | OracleError::Timeout(_) | OracleError::RateLimited { .. } => true,
            OracleError::Api { status, .. } => *status >= 500 || *status == 408,
            _ => false,
        }
    }

    /// Convert into the pipeline error for the given stage.
    pub fn into_adjudication(self, stage: PipelineStage) -> AdjudicationError {
        AdjudicationError::Oracle {
            stage,
            message: self.to_string(),
        }
    }
}

/// A document attached to an oracle request.
#[derive(Clone, PartialEq, Eq)]
pub struct OracleDocument {
    pub bytes: Vec<u8>,
    pub media_type: String,
    pub name: String,
}

impl std::fmt::Debug for OracleDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleDocument")
            .field("bytes", &self.bytes.len())
            .field("media_type", &self.media_type)
            .field("name", &self.name)
            .finish()
    }
}

impl OracleDocument {
    /// Whether the provider can read this document natively rather than as text.
    pub fn is_binary(&self) -> bool {
        self.media_type == "application/pdf" || self.media_type.starts_with("image/")
    }
}

/// One request to the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleRequest {
    /// Stage issuing the request; used for circuit breaking and logging.
    pub stage: PipelineStage,
    pub instructions: String,
    pub text: Option<String>,
    pub document: Option<OracleDocument>,
}

impl OracleRequest {
    pub fn new(stage: PipelineStage, instructions: impl Into<String>) -> Self {
        Self {
            stage,
            instructions: instructions.into(),
            text: None,
            document: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_document(mut self, document: OracleDocument) -> Self {
        self.document = Some(document);
        self
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub cache_read_tokens: u32,
    pub cache_creation_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Raw oracle answer. Decoding belongs to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleResponse {
    pub content: String,
    pub usage: TokenUsage,
    pub model: String,
}

/// Per-call generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub model: String,
    pub max_tokens: u32,
    /// 0.0 keeps answers as repeatable as the provider allows.
    pub temperature: f32,
    #[serde(with = "crate::config::duration_serde")]
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-5-20250514".to_string(),
            max_tokens: 4096,
            temperature: 0.0,
            timeout: Duration::from_secs(60),
        }
    }
}

impl CompletionConfig {
    /// Read overrides from a provider JSON config.
    pub fn from_json(config: &serde_json::Value) -> Self {
        let defaults = Self::default();
        Self {
            model: config["model"]
                .as_str()
                .map(str::to_string)
                .unwrap_or(defaults.model),
            max_tokens: config["max_tokens"]
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.max_tokens),
            temperature: config["temperature"]
                .as_f64()
                .map(|v| v as f32)
                .unwrap_or(defaults.temperature),
            timeout: config["timeout"]
                .as_str()
                .and_then(|v| humantime::parse_duration(v).ok())
                .unwrap_or(defaults.timeout),
        }
    }
}

/// Trait for oracle providers.
#[async_trait]
pub trait OracleClient: Send + Sync {
    /// Send one request and return the raw answer.
    async fn complete(&self, request: OracleRequest) -> Result<OracleResponse, OracleError>;

    /// Check if the provider is usable.
    async fn health_check(&self) -> bool;

    /// Provider name for logging.
    fn name(&self) -> &str;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(OracleError::Transport("reset".into()).is_transient());
        assert!(OracleError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(OracleError::RateLimited { retry_after: None }.is_transient());
        assert!(OracleError::Api { status: 503, message: "overloaded".into() }.is_transient());
        assert!(!OracleError::Api { status: 400, message: "bad".into() }.is_transient());
        assert!(!OracleError::Auth("bad key".into()).is_transient());
        assert!(!OracleError::InvalidResponse("eof".into()).is_transient());
    }

    #[test]
    fn test_into_adjudication_keeps_stage() {
        let err = OracleError::Timeout(Duration::from_secs(2)).into_adjudication(PipelineStage::Consistency);
        assert!(matches!(
            err,
            AdjudicationError::Oracle { stage: PipelineStage::Consistency, .. }
        ));
    }

    #[test]
    fn test_document_debug_hides_bytes() {
        let doc = OracleDocument {
            bytes: b"PESEL 80010112345".to_vec(),
            media_type: "application/pdf".into(),
            name: "zgloszenie.pdf".into(),
        };
        let debug = format!("{:?}", doc);
        assert!(!debug.contains("PESEL"));
        assert!(doc.is_binary());
    }

    #[test]
    fn test_completion_config_from_json() {
        let config = CompletionConfig::from_json(&serde_json::json!({
            "model": "claude-test",
            "max_tokens": 1024,
            "timeout": "20s"
        }));
        assert_eq!(config.model, "claude-test");
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.timeout, Duration::from_secs(20));
        assert_eq!(config.temperature, 0.0);
    }

    #[test]
    fn test_token_usage_total() {
        let usage = TokenUsage {
            prompt_tokens: 100,
            completion_tokens: 50,
            cache_read_tokens: 80,
            cache_creation_tokens: 0,
        };
        assert_eq!(usage.total(), 150);
    }
}
