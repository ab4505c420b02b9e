//! Conversation summaries and the episodes built from them.
//!
//! A [`ConversationSummary`] is the export parser's output: conversations
//! grouped by time bucket (`"2025_08"`, ...), in the order the parser wrote
//! them. [`EpisodeBuilder`] turns it into the [`Episode`] sequence the
//! ingestion driver submits.

pub mod builder;

pub use builder::{BuiltEpisodes, EpisodeBuilder};

use std::path::Path;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::EpisodeError;
use crate::nodes::episodic::EpisodeType;

/// File name the export parser writes into its output folder.
pub const SUMMARY_FILE_NAME: &str = "conversation_summary.json";

/// Provenance string attached to every conversation episode.
pub const EPISODE_DESCRIPTION: &str = "Conversation between user and agent";

/// Conversations grouped by time bucket, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationSummary {
    buckets: IndexMap<String, Vec<Conversation>>,
}

impl ConversationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a conversation to `bucket`, creating the bucket at the end if needed.
    pub fn push(&mut self, bucket: impl Into<String>, conversation: Conversation) {
        self.buckets
            .entry(bucket.into())
            .or_default()
            .push(conversation);
    }

    /// Buckets with their conversations, in insertion order.
    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[Conversation])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Total number of conversations across all buckets.
    pub fn conversation_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.conversation_count() == 0
    }

    pub fn from_json_str(json: &str) -> Result<Self, EpisodeError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a summary written by the export parser.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EpisodeError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| EpisodeError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}

/// One exported conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub title: String,

    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub update_time: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub create_time: Option<String>,
}

impl Conversation {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            messages: None,
            update_time: None,
            create_time: None,
        }
    }

    pub fn with_message(mut self, author: impl Into<String>, text: impl Into<String>) -> Self {
        self.messages.get_or_insert_with(Vec::new).push(ChatMessage {
            author: author.into(),
            text: text.into(),
        });
        self
    }

    pub fn with_update_time(mut self, time: impl Into<String>) -> Self {
        self.update_time = Some(time.into());
        self
    }

    pub fn with_create_time(mut self, time: impl Into<String>) -> Self {
        self.create_time = Some(time.into());
        self
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.messages.as_deref().unwrap_or_default()
    }

    /// `update_time` if set and non-empty, otherwise `create_time`.
    pub fn timestamp(&self) -> Option<&str> {
        self.update_time
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.create_time.as_deref())
    }
}

/// One message inside a conversation. Both keys are required; a `null`
/// value reads as an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(deserialize_with = "null_as_empty")]
    pub author: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub text: String,
}

/// A time-stamped unit of conversation content, ready for submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub name: String,
    #[serde(rename = "episode_body")]
    pub body: String,
    #[serde(rename = "source")]
    pub kind: EpisodeType,
    #[serde(rename = "source_description")]
    pub description: String,
    pub reference_time: DateTime<Utc>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keep strings as-is and stringify anything else, so an odd timestamp value
/// ends up as an unparseable string instead of failing the whole file.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
