//! Node types persisted in the knowledge graph.
//!
//! - [`episodic::EpisodicNode`]: an ingested conversation episode

pub mod episodic;

pub use episodic::{EpisodeType, EpisodicNode};
