//! Provider resolution.
//!
//! Turns a [`ModelConfig`] into the backend bundle a graph store is opened
//! with. Resolution is a fail-fast configuration step: it validates, builds
//! clients, and never touches the network.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::info;

use crate::cross_encoder::OpenAiRerankerClient;
use crate::embedder::{EmbedderConfig, OpenAiEmbedder};
use crate::errors::ConfigError;
use crate::llm_client::{LlmConfig, OpenAiClient};
use crate::types::{ConnectionParams, GraphClients, ModelConfig};

/// Keys the self-hosted provider cannot do without, in reporting order.
pub const SELF_HOSTED_REQUIRED_KEYS: [&str; 5] =
    ["api_key", "llm_model", "embed_model", "embed_dim", "url"];

/// Supported backend kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Managed OpenAI endpoint; the store builds its own default clients.
    Default,
    /// Operator-controlled OpenAI-compatible endpoint (e.g. Ollama).
    SelfHosted,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OpenAI" | "default" => Ok(ProviderKind::Default),
            "Ollama" | "self-hosted" => Ok(ProviderKind::SelfHosted),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Default => f.write_str("OpenAI"),
            ProviderKind::SelfHosted => f.write_str("Ollama"),
        }
    }
}

impl ModelConfig {
    /// Validate the provider tag.
    pub fn provider_kind(&self) -> Result<ProviderKind, ConfigError> {
        self.provider.parse()
    }

    /// Required self-hosted keys that are absent. Empty values are passed
    /// through; Ollama, for one, ignores the API key.
    pub fn missing_self_hosted_keys(&self) -> Vec<&'static str> {
        SELF_HOSTED_REQUIRED_KEYS
            .into_iter()
            .filter(|key| match *key {
                "api_key" => self.api_key.is_none(),
                "llm_model" => self.llm_model.is_none(),
                "embed_model" => self.embed_model.is_none(),
                "embed_dim" => self.embed_dim.is_none(),
                "url" => self.url.is_none(),
                _ => false,
            })
            .collect()
    }
}

/// The client set a graph store is opened with.
#[derive(Debug, Clone)]
pub enum BackendBundle {
    /// Let the store construct its own default clients.
    Default,
    /// Explicitly configured clients.
    Explicit(GraphClients),
}

impl BackendBundle {
    /// Materialise the clients, building the defaults if none were given.
    pub fn into_clients(self) -> GraphClients {
        match self {
            BackendBundle::Default => GraphClients::from_env(),
            BackendBundle::Explicit(clients) => clients,
        }
    }
}

/// Output of [`resolve`]: everything needed to open a store session.
#[derive(Debug, Clone)]
pub struct ResolvedBackend {
    pub connection: ConnectionParams,
    pub bundle: BackendBundle,
}

/// Resolve a model configuration into a backend bundle.
///
/// # Errors
/// - [`ConfigError::UnsupportedProvider`] for an unknown provider tag, before
///   any client is constructed.
/// - [`ConfigError::MissingKeys`] listing every absent self-hosted key.
/// - [`ConfigError::Invalid`] for a zero embedding dimension.
pub fn resolve(
    model: &ModelConfig,
    connection: ConnectionParams,
) -> Result<ResolvedBackend, ConfigError> {
    let kind = model.provider_kind()?;

    let bundle = match kind {
        ProviderKind::Default => BackendBundle::Default,
        ProviderKind::SelfHosted => BackendBundle::Explicit(self_hosted_clients(model)?),
    };

    info!(provider = %kind, uri = %connection.uri, "resolved backend provider");
    Ok(ResolvedBackend { connection, bundle })
}

fn self_hosted_clients(model: &ModelConfig) -> Result<GraphClients, ConfigError> {
    let missing = model.missing_self_hosted_keys();
    if !missing.is_empty() {
        return Err(ConfigError::MissingKeys(missing));
    }

    // All five keys are present past this point.
    let (Some(api_key), Some(llm_model), Some(embed_model), Some(embed_dim), Some(url)) = (
        model.api_key.clone(),
        model.llm_model.clone(),
        model.embed_model.clone(),
        model.embed_dim,
        model.url.clone(),
    ) else {
        return Err(ConfigError::MissingKeys(model.missing_self_hosted_keys()));
    };

    if embed_dim == 0 {
        return Err(ConfigError::Invalid("embed_dim must be > 0".to_string()));
    }

    let llm_config = LlmConfig {
        api_key: Some(api_key.clone()),
        model: llm_model.clone(),
        small_model: llm_model,
        base_url: Some(url.clone()),
    };
    let llm_client = Arc::new(OpenAiClient::new(llm_config.clone()));

    let embedder = Arc::new(OpenAiEmbedder::new(EmbedderConfig {
        api_key: Some(api_key),
        model: embed_model,
        dim: embed_dim,
        base_url: Some(url),
    }));

    let cross_encoder = Arc::new(OpenAiRerankerClient::new(llm_client.clone(), llm_config));

    Ok(GraphClients {
        llm_client,
        embedder,
        cross_encoder,
    })
}
