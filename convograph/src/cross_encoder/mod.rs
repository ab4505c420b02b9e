//! Cross-encoder (reranking) client abstraction.
//!
//! A cross-encoder scores `(query, passage)` pairs jointly and returns the
//! passages ordered by relevance.

pub mod openai;

pub use openai::OpenAiRerankerClient;

use crate::errors::Result;

/// Trait for passage reranking clients.
#[allow(async_fn_in_trait)]
pub trait CrossEncoderClient: Send + Sync {
    /// Score every passage against `query`, highest score first.
    ///
    /// Scores lie in `[0.0, 1.0]`.
    async fn rank(&self, query: &str, passages: &[String]) -> Result<Vec<(String, f64)>>;
}
