//! Reranker that uses an OpenAI-compatible chat model as a boolean classifier.
//!
//! Each passage gets a one-token "True"/"False" relevance question. With
//! `logprobs` enabled the probability of the returned token becomes the score;
//! servers that ignore `logprobs` still yield a hard 1.0 / 0.0 from the token.

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::json;
use tracing::debug;

use crate::errors::{GraphError, Result};
use crate::llm_client::{LlmConfig, Message, OpenAiClient};

use super::CrossEncoderClient;

const SYSTEM_PROMPT: &str =
    "You are an expert tasked with determining whether the passage is relevant to the query";

/// Cross-encoder backed by the same client and configuration as the LLM.
#[derive(Clone)]
pub struct OpenAiRerankerClient {
    client: Arc<OpenAiClient>,
    config: LlmConfig,
}

impl OpenAiRerankerClient {
    pub fn new(client: Arc<OpenAiClient>, config: LlmConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn prompt(query: &str, passage: &str) -> Vec<Message> {
        vec![
            Message::system(SYSTEM_PROMPT),
            Message::user(format!(
                "Respond with \"True\" if PASSAGE is relevant to QUERY and \"False\" otherwise.\n\
                 <PASSAGE>\n{passage}\n</PASSAGE>\n<QUERY>\n{query}\n</QUERY>"
            )),
        ]
    }

    async fn score(&self, query: &str, passage: &str) -> Result<f64> {
        let request = json!({
            "model": self.config.small_model,
            "messages": OpenAiClient::messages_to_json(&Self::prompt(query, passage)),
            "temperature": 0,
            "max_tokens": 1,
            "logprobs": true,
            "top_logprobs": 2,
        });

        let response = self.client.chat_completion(request).await?;
        score_from_response(&response)
    }
}

impl CrossEncoderClient for OpenAiRerankerClient {
    async fn rank(&self, query: &str, passages: &[String]) -> Result<Vec<(String, f64)>> {
        let scores = try_join_all(passages.iter().map(|p| self.score(query, p))).await?;

        let mut ranked: Vec<(String, f64)> = passages.iter().cloned().zip(scores).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

        debug!(passages = ranked.len(), "reranked passages");
        Ok(ranked)
    }
}

/// Turn a chat-completions response into a relevance score in `[0, 1]`.
fn score_from_response(response: &serde_json::Value) -> Result<f64> {
    let choice = &response["choices"][0];

    if let Some(top) = choice["logprobs"]["content"][0]["top_logprobs"][0].as_object() {
        let token = top.get("token").and_then(|t| t.as_str()).unwrap_or_default();
        let logprob = top
            .get("logprob")
            .and_then(|l| l.as_f64())
            .ok_or_else(|| GraphError::CrossEncoder("logprob missing from response".to_string()))?;
        let p = logprob.exp();
        return Ok(if is_true_token(token) { p } else { 1.0 - p });
    }

    let content = choice["message"]["content"]
        .as_str()
        .ok_or_else(|| GraphError::CrossEncoder("empty reranker response".to_string()))?;
    Ok(if is_true_token(content) { 1.0 } else { 0.0 })
}

fn is_true_token(token: &str) -> bool {
    token
        .trim()
        .split(' ')
        .next()
        .is_some_and(|word| word.eq_ignore_ascii_case("true"))
}
