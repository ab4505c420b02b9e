//! OpenAI-compatible embedding client implementation.
//!
//! Wraps [`async_openai`] to provide [`EmbedderClient`] for any server speaking
//! the OpenAI Embeddings API, with chunked batch support and exponential-backoff
//! retry.

use async_openai::{
    config::OpenAIConfig, error::OpenAIError, types::CreateEmbeddingRequestArgs, Client,
};
use backoff::{future::retry, ExponentialBackoffBuilder};
use std::time::Duration;

use crate::embedder::{EmbedderClient, Embedding};
use crate::errors::{GraphError, Result};
use crate::llm_client::openai::openai_config;

/// Default embedding model name.
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

/// Maximum number of inputs per embeddings API call.
const BATCH_CHUNK_SIZE: usize = 2048;

/// Return the embedding dimension for a given model name.
///
/// Falls back to 1536 (the `text-embedding-3-small` dimension) for
/// unrecognised models.
fn model_dim(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

/// Classify an [`OpenAIError`] as transient (should retry) or permanent.
fn classify_error(err: OpenAIError) -> backoff::Error<GraphError> {
    let msg = err.to_string();
    match &err {
        // Network-level failures (timeouts, connection refused) are transient.
        OpenAIError::Reqwest(e) if e.is_timeout() || e.is_connect() => {
            backoff::Error::transient(GraphError::Embedder(msg))
        }
        _ => backoff::Error::permanent(GraphError::Embedder(msg)),
    }
}

/// Connection and model settings for an [`OpenAiEmbedder`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedderConfig {
    /// API key. `None` falls back to the `OPENAI_API_KEY` environment variable.
    pub api_key: Option<String>,
    /// Embedding model identifier.
    pub model: String,
    /// Vectors longer than this are truncated.
    pub dim: usize,
    /// API base URL. `None` means the public OpenAI endpoint.
    pub base_url: Option<String>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            dim: model_dim(DEFAULT_MODEL),
            base_url: None,
        }
    }
}

/// OpenAI-compatible embedding client that implements [`EmbedderClient`].
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
    dim: usize,
}

impl OpenAiEmbedder {
    /// Create a new embedder from an explicit configuration.
    pub fn new(config: EmbedderConfig) -> Self {
        let openai = openai_config(config.api_key.as_deref(), config.base_url.as_deref());
        Self {
            client: Client::with_config(openai),
            model: config.model,
            dim: config.dim,
        }
    }

    /// Embedder for the public OpenAI API; the key comes from `OPENAI_API_KEY`.
    pub fn from_env() -> Self {
        Self::new(EmbedderConfig::default())
    }

    /// Embedder for `model` with the dimension OpenAI documents for it.
    pub fn for_model(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(EmbedderConfig {
            api_key: Some(api_key.into()),
            dim: model_dim(&model),
            model,
            base_url: None,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Issue a single embeddings API call for up to [`BATCH_CHUNK_SIZE`] texts.
    ///
    /// Retries on transient network failures with exponential back-off
    /// (initial 500 ms, cap 10 s, total budget 60 s).
    async fn embed_chunk(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let backoff_policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_interval(Duration::from_secs(10))
            .with_max_elapsed_time(Some(Duration::from_secs(60)))
            .build();

        // Materialise owned data before entering the retry closure.
        let input: Vec<String> = texts.iter().map(|s| (*s).to_owned()).collect();
        let model = self.model.clone();
        let client = self.client.clone();
        let dim = self.dim;

        retry(backoff_policy, move || {
            let input = input.clone();
            let model = model.clone();
            let client = client.clone();
            async move {
                let request = CreateEmbeddingRequestArgs::default()
                    .model(model.as_str())
                    .input(input)
                    .build()
                    .map_err(|e| {
                        backoff::Error::permanent(GraphError::Embedder(e.to_string()))
                    })?;

                let response = client
                    .embeddings()
                    .create(request)
                    .await
                    .map_err(classify_error)?;

                let embeddings: Vec<Embedding> = response
                    .data
                    .into_iter()
                    .map(|item| item.embedding.into_iter().take(dim).collect())
                    .collect();

                Ok(embeddings)
            }
        })
        .await
    }
}

impl EmbedderClient for OpenAiEmbedder {
    /// Embed a single text string.
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let mut embeddings = self.embed_chunk(&[text]).await?;
        embeddings
            .pop()
            .ok_or_else(|| GraphError::Embedder("empty response from embedding API".to_string()))
    }

    /// Embed multiple texts, automatically splitting into chunks of at most
    /// [`BATCH_CHUNK_SIZE`] items to respect per-call limits.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut result = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(BATCH_CHUNK_SIZE) {
            let chunk_embeddings = self.embed_chunk(chunk).await?;
            result.extend(chunk_embeddings);
        }
        Ok(result)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}
