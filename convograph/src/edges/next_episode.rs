//! NextEpisodeEdge: NEXT_EPISODE sequencing (EpisodicNode → EpisodicNode).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Relationship type used in Cypher.
pub const NEXT_EPISODE: &str = "NEXT_EPISODE";

/// Links an episode to the one submitted right after it in the same session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextEpisodeEdge {
    /// Unique identifier for this edge.
    pub uuid: Uuid,
    /// UUID of the earlier EpisodicNode.
    pub source_node_uuid: Uuid,
    /// UUID of the later EpisodicNode.
    pub target_node_uuid: Uuid,
    /// When this edge was created in the graph.
    pub created_at: DateTime<Utc>,
}

impl NextEpisodeEdge {
    pub fn between(previous: Uuid, next: Uuid) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            source_node_uuid: previous,
            target_node_uuid: next,
            created_at: Utc::now(),
        }
    }
}
