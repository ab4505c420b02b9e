//! Chat client for OpenAI-compatible endpoints.
//!
//! The same client serves the public OpenAI API and self-hosted servers
//! (Ollama's `/v1`, vLLM, ...): only [`LlmConfig::base_url`] differs.

use std::time::Duration;

use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use backoff::ExponentialBackoffBuilder;
use serde_json::{json, Value};
use tracing::warn;

use crate::errors::{GraphError, LlmError, Result};

use super::{LlmClient, Message};

/// Model used when no explicit configuration is supplied.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Cheaper model used for simple prompts when no explicit configuration is supplied.
pub const DEFAULT_SMALL_MODEL: &str = "gpt-4.1-nano";

/// Endpoint and model selection for an [`OpenAiClient`].
#[derive(Debug, Clone, PartialEq)]
pub struct LlmConfig {
    /// `None` reads `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    pub model: String,
    /// Used for one-token prompts such as reranking.
    pub small_model: String,
    /// `None` means the public OpenAI endpoint.
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            small_model: DEFAULT_SMALL_MODEL.to_string(),
            base_url: None,
        }
    }
}

/// `async-openai` config shared by the chat and embedding clients.
pub(crate) fn openai_config(api_key: Option<&str>, base_url: Option<&str>) -> OpenAIConfig {
    let mut config = OpenAIConfig::new();
    if let Some(key) = api_key {
        config = config.with_api_key(key);
    }
    if let Some(url) = base_url {
        config = config.with_api_base(url.trim_end_matches('/'));
    }
    config
}

pub struct OpenAiClient {
    client: async_openai::Client<OpenAIConfig>,
    config: LlmConfig,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> Self {
        let client = async_openai::Client::with_config(openai_config(
            config.api_key.as_deref(),
            config.base_url.as_deref(),
        ));
        Self { client, config }
    }

    /// Public OpenAI API with the default models.
    pub fn from_env() -> Self {
        Self::new(LlmConfig::default())
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    pub(crate) fn messages_to_json(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| json!({ "role": m.role, "content": m.content }))
            .collect()
    }

    /// POST a raw chat-completions request, retrying rate limits and 5xx.
    pub(crate) async fn chat_completion(&self, request: Value) -> Result<Value> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_interval(Duration::from_secs(30))
            .with_max_elapsed_time(Some(Duration::from_secs(120)))
            .build();

        backoff::future::retry(policy, || async {
            let outcome: std::result::Result<Value, OpenAIError> =
                self.client.chat().create_byot(request.clone()).await;
            outcome.map_err(|e| match classify(e) {
                err @ LlmError::RateLimit => {
                    warn!(model = %self.config.model, "rate limited, backing off");
                    backoff::Error::transient(err)
                }
                err @ LlmError::Api { status: 500.., .. } => {
                    warn!(model = %self.config.model, error = %err, "server error, backing off");
                    backoff::Error::transient(err)
                }
                err => backoff::Error::permanent(err),
            })
        })
        .await
        .map_err(GraphError::Llm)
    }
}

impl LlmClient for OpenAiClient {
    async fn generate(&self, messages: &[Message]) -> Result<String> {
        let request = json!({
            "model": self.config.model,
            "messages": Self::messages_to_json(messages),
            "temperature": 0.0,
        });
        let response = self.chat_completion(request).await?;
        response["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_owned)
            .ok_or(GraphError::Llm(LlmError::EmptyResponse))
    }
}

/// Error bodies carry no HTTP status, so classify by `code` / `type`.
fn classify(err: OpenAIError) -> LlmError {
    let OpenAIError::ApiError(api) = err else {
        return LlmError::Api {
            status: 0,
            message: err.to_string(),
        };
    };
    let code = api.code.as_deref().unwrap_or_default();
    let kind = api.r#type.as_deref().unwrap_or_default();
    match (code, kind) {
        ("invalid_api_key", _) | (_, "authentication_error") => LlmError::Authentication,
        ("rate_limit_exceeded", _) | (_, "requests") => LlmError::RateLimit,
        (_, "server_error") => LlmError::Api {
            status: 500,
            message: api.message,
        },
        _ => LlmError::Api {
            status: 0,
            message: api.message,
        },
    }
}
