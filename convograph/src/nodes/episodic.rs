//! EpisodicNode: represents an ingested data episode.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The source type of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    Message,
    Json,
    Text,
}

impl EpisodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpisodeType::Message => "message",
            EpisodeType::Json => "json",
            EpisodeType::Text => "text",
        }
    }
}

impl fmt::Display for EpisodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label every episode node carries.
pub const EPISODIC_LABEL: &str = "Episodic";

/// An episode as persisted in the graph store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicNode {
    pub uuid: Uuid,
    pub name: String,
    pub group_id: String,
    pub labels: Vec<String>,
    /// When the node was written (transaction time).
    pub created_at: DateTime<Utc>,
    pub source: EpisodeType,
    pub source_description: String,
    pub content: String,
    /// The episode's reference time (valid time).
    pub valid_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::{EpisodeType, EpisodicNode, EPISODIC_LABEL};
    use uuid::Uuid;

    #[test]
    fn test_episode_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EpisodeType::Message).unwrap(),
            "\"message\""
        );
        assert_eq!(serde_json::to_string(&EpisodeType::Json).unwrap(), "\"json\"");
        assert_eq!(serde_json::to_string(&EpisodeType::Text).unwrap(), "\"text\"");
    }

    #[test]
    fn test_episode_type_display_matches_serde() {
        for kind in [EpisodeType::Message, EpisodeType::Json, EpisodeType::Text] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json.trim_matches('"'), kind.to_string());
        }
    }

    /// EpisodicNode serializes and deserializes without data loss.
    #[test]
    fn test_episodic_node_serde_roundtrip() {
        let node = EpisodicNode {
            uuid: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            name: "My_Trip_Plan".to_string(),
            group_id: "group-1".to_string(),
            labels: vec![EPISODIC_LABEL.to_string()],
            created_at: chrono::DateTime::parse_from_rfc3339("2025-08-02T10:30:00Z")
                .expect("parse created_at")
                .with_timezone(&chrono::Utc),
            source: EpisodeType::Message,
            source_description: "Conversation between user and agent".to_string(),
            content: "user: hi\nagent: hello".to_string(),
            valid_at: chrono::DateTime::parse_from_rfc3339("2025-08-01T10:00:00Z")
                .expect("parse valid_at")
                .with_timezone(&chrono::Utc),
        };

        let json = serde_json::to_string(&node).expect("serialize EpisodicNode");
        let restored: EpisodicNode =
            serde_json::from_str(&json).expect("deserialize EpisodicNode");

        assert_eq!(node, restored);
    }
}
