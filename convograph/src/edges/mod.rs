//! Edge types persisted in the knowledge graph.
//!
//! - [`next_episode::NextEpisodeEdge`]: NEXT_EPISODE sequencing between consecutively ingested episodes

pub mod next_episode;

pub use next_episode::NextEpisodeEdge;
