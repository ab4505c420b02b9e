//! LLM client abstraction.
//!
//! # Implementations
//! - [`openai::OpenAiClient`]: any OpenAI-compatible chat completions endpoint
//!   (OpenAI itself, or a self-hosted server such as Ollama) via `async-openai`.

pub mod openai;

pub use openai::{LlmConfig, OpenAiClient};

use crate::errors::Result;
use serde::Serialize;

/// A chat message for the LLM conversation.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Speaker role in a chat conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat-completion backend.
#[allow(async_fn_in_trait)]
pub trait LlmClient: Send + Sync {
    /// Send `messages` and return the assistant's reply text.
    async fn generate(&self, messages: &[Message]) -> Result<String>;
}
