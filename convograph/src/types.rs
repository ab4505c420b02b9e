//! Shared configuration and client container types.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::cross_encoder::OpenAiRerankerClient;
use crate::embedder::OpenAiEmbedder;
use crate::llm_client::OpenAiClient;

/// Graph store connection parameters, required whatever the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ConnectionParams {
    /// Neo4j connection URI (e.g. `bolt://localhost:7687`).
    #[validate(length(min = 1))]
    pub uri: String,

    /// Neo4j username.
    pub user: String,

    /// Neo4j password.
    #[serde(rename = "pass")]
    #[validate(length(min = 1))]
    pub password: String,

    /// Partition label stamped on every persisted episode.
    #[serde(default)]
    pub group_id: String,
}

impl Default for ConnectionParams {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            group_id: String::new(),
        }
    }
}

/// Model configuration descriptor, as written in the `model_config` section
/// of the config file.
///
/// Which fields are required depends on `provider`; see
/// [`crate::provider::resolve`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Backend kind tag (`OpenAI` or `Ollama`).
    pub provider: String,

    pub api_key: Option<String>,

    /// Chat model used for both the primary and the small model slot.
    pub llm_model: Option<String>,

    pub embed_model: Option<String>,

    pub embed_dim: Option<usize>,

    /// Base URL of the OpenAI-compatible endpoint.
    pub url: Option<String>,
}

/// The backend clients a graph store works with.
#[derive(Clone)]
pub struct GraphClients {
    pub llm_client: Arc<OpenAiClient>,
    pub embedder: Arc<OpenAiEmbedder>,
    pub cross_encoder: Arc<OpenAiRerankerClient>,
}

impl GraphClients {
    /// Clients for the public OpenAI API with default models.
    ///
    /// The API key is read from `OPENAI_API_KEY` when the first request is made.
    pub fn from_env() -> Self {
        let llm_client = Arc::new(OpenAiClient::from_env());
        let cross_encoder = Arc::new(OpenAiRerankerClient::new(
            llm_client.clone(),
            llm_client.config().clone(),
        ));
        Self {
            llm_client,
            embedder: Arc::new(OpenAiEmbedder::from_env()),
            cross_encoder,
        }
    }
}

impl std::fmt::Debug for GraphClients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphClients")
            .field("llm_model", &self.llm_client.config().model)
            .field("embed_model", &self.embedder.model())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::EmbedderClient;

    #[test]
    fn connection_params_defaults() {
        let params = ConnectionParams::default();
        assert_eq!(params.uri, "bolt://localhost:7687");
        assert_eq!(params.user, "neo4j");
        assert!(params.group_id.is_empty());
    }

    #[test]
    fn connection_params_require_password() {
        let params = ConnectionParams::default();
        assert!(params.validate().is_err());

        let params = ConnectionParams {
            password: "secret".to_string(),
            ..ConnectionParams::default()
        };
        assert!(params.validate().is_ok());
    }

    #[test]
    fn connection_params_deserialize_from_config_keys() {
        let params: ConnectionParams = serde_json::from_value(serde_json::json!({
            "uri": "bolt://db:7687",
            "user": "admin",
            "pass": "hunter2",
        }))
        .unwrap();
        assert_eq!(params.uri, "bolt://db:7687");
        assert_eq!(params.password, "hunter2");
        assert_eq!(params.group_id, "");
    }

    #[test]
    fn model_config_missing_fields_deserialize_as_none() {
        let config: ModelConfig =
            serde_json::from_value(serde_json::json!({ "provider": "OpenAI" })).unwrap();
        assert_eq!(config.provider, "OpenAI");
        assert!(config.api_key.is_none());
        assert!(config.embed_dim.is_none());
    }

    #[test]
    fn default_clients_use_default_models() {
        let clients = GraphClients::from_env();
        assert_eq!(clients.llm_client.config().model, "gpt-4.1-mini");
        assert_eq!(clients.embedder.model(), "text-embedding-3-small");
        assert_eq!(clients.embedder.dim(), 1536);
    }
}
