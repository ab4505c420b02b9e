//! Embedder client abstraction.
//!
//! Provides a trait for generating vector embeddings from text. The graph store
//! embeds each episode body before persisting it.

pub mod openai;

pub use openai::{EmbedderConfig, OpenAiEmbedder};

use crate::errors::Result;

/// A vector embedding (f32 components).
pub type Embedding = Vec<f32>;

/// Trait for text-to-vector embedding clients.
#[allow(async_fn_in_trait)]
pub trait EmbedderClient: Send + Sync {
    /// Generate an embedding for a single text string.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embeddings for a batch of texts.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Returns the dimensionality of embeddings produced by this client.
    fn dim(&self) -> usize;
}
