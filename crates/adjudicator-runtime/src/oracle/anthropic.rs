//! Anthropic Claude oracle.
//!
//! PDFs and images are sent as base64 `document`/`image` content blocks;
//! text documents are inlined. The API key lives in an [`ApiCredential`].

use super::{
    factory::OracleFactory,
    secrets::{ApiCredential, CredentialSource},
    CompletionConfig, OracleClient, OracleError, OracleRequest, OracleResponse,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Environment variable holding the Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicOracle {
    credential: ApiCredential,
    base_url: String,
    completion: CompletionConfig,
    #[cfg(feature = "anthropic")]
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicOracle")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .field("model", &self.completion.model)
            .finish()
    }
}

impl AnthropicOracle {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_credential(
            ApiCredential::new(api_key, CredentialSource::Programmatic, "Anthropic API key"),
            DEFAULT_BASE_URL.to_string(),
            CompletionConfig::default(),
        )
    }

    /// Build from JSON settings, falling back to `ANTHROPIC_API_KEY`.
    pub fn from_config(config: &JsonValue) -> Result<Self, OracleError> {
        let credential = ApiCredential::from_config_or_env(
            config,
            "api_key",
            ANTHROPIC_API_KEY_ENV,
            "Anthropic API key",
        )?;

        let base_url = config["base_url"]
            .as_str()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self::with_credential(
            credential,
            base_url,
            CompletionConfig::from_json(config),
        ))
    }

    fn with_credential(credential: ApiCredential, base_url: String, completion: CompletionConfig) -> Self {
        Self {
            credential,
            base_url,
            completion,
            #[cfg(feature = "anthropic")]
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn completion(&self) -> &CompletionConfig {
        &self.completion
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    Document { source: Base64Source },
    Image { source: Base64Source },
}

#[derive(Debug, Serialize)]
struct Base64Source {
    #[serde(rename = "type")]
    type_: &'static str,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
    model: String,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ResponseBlock {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
    #[serde(default)]
    cache_creation_input_tokens: u32,
    #[serde(default)]
    cache_read_input_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl AnthropicOracle {
    fn build_request(&self, request: OracleRequest) -> MessagesRequest {
        let mut content = Vec::new();

        if let Some(document) = request.document {
            if document.is_binary() {
                let source = Base64Source {
                    type_: "base64",
                    media_type: document.media_type.clone(),
                    data: encode_base64(&document.bytes),
                };
                if document.media_type.starts_with("image/") {
                    content.push(ContentBlock::Image { source });
                } else {
                    content.push(ContentBlock::Document { source });
                }
            } else {
                content.push(ContentBlock::Text {
                    text: format!(
                        "Dokument \"{}\":\n{}",
                        document.name,
                        String::from_utf8_lossy(&document.bytes)
                    ),
                });
            }
        }

        if let Some(text) = request.text {
            content.push(ContentBlock::Text { text });
        }

        if content.is_empty() {
            content.push(ContentBlock::Text {
                text: "Brak dodatkowych danych.".to_string(),
            });
        }

        MessagesRequest {
            model: self.completion.model.clone(),
            max_tokens: self.completion.max_tokens,
            system: request.instructions,
            messages: vec![Message {
                role: "user",
                content,
            }],
            temperature: if self.completion.temperature == 0.0 {
                None
            } else {
                Some(self.completion.temperature)
            },
        }
    }
}

fn encode_base64(bytes: &[u8]) -> String {
    use base64::Engine as _;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[async_trait]
impl OracleClient for AnthropicOracle {
    #[cfg(feature = "anthropic")]
    async fn complete(&self, request: OracleRequest) -> Result<OracleResponse, OracleError> {
        let stage = request.stage;
        let body = self.build_request(request);
        let timeout = self.completion.timeout;

        tracing::debug!(stage = %stage, model = %body.model, "Sending oracle request");

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.credential.expose())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout(timeout)
                } else {
                    OracleError::Transport(e.to_string())
                }
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(std::time::Duration::from_secs);
            return Err(OracleError::RateLimited { retry_after });
        }

        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(OracleError::Auth(format!("provider returned {}", status)));
        }

        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status.to_string(),
            };
            return Err(OracleError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        let content = body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(OracleResponse {
            content,
            usage: super::TokenUsage {
                prompt_tokens: body.usage.input_tokens,
                completion_tokens: body.usage.output_tokens,
                cache_read_tokens: body.usage.cache_read_input_tokens,
                cache_creation_tokens: body.usage.cache_creation_input_tokens,
            },
            model: body.model,
        })
    }

    #[cfg(not(feature = "anthropic"))]
    async fn complete(&self, _request: OracleRequest) -> Result<OracleResponse, OracleError> {
        Err(OracleError::NotConfigured(
            "Anthropic oracle requires the 'anthropic' feature".to_string(),
        ))
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_blank()
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

/// Factory for [`AnthropicOracle`].
///
/// ```json
/// {
///   "api_key": "sk-ant-...",
///   "base_url": "https://...",
///   "model": "claude-sonnet-4-5-20250514",
///   "max_tokens": 4096,
///   "timeout": "60s"
/// }
/// ```
pub struct AnthropicOracleFactory;

impl OracleFactory for AnthropicOracleFactory {
    fn provider_type(&self) -> &'static str {
        "anthropic"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn OracleClient>, OracleError> {
        Ok(Arc::new(AnthropicOracle::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), OracleError> {
        if !ApiCredential::is_available(config, "api_key", ANTHROPIC_API_KEY_ENV) {
            return Err(OracleError::NotConfigured(format!(
                "Anthropic API key required: set 'api_key' in config or {} env",
                ANTHROPIC_API_KEY_ENV
            )));
        }

        if let Some(url) = config["base_url"].as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(OracleError::NotConfigured(
                    "base_url must start with http:// or https://".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({
            "model": "claude-sonnet-4-5-20250514",
            "max_tokens": 4096
        })
    }

    fn description(&self) -> &'static str {
        "Anthropic Claude with native PDF and image input"
    }
}
