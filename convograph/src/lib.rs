//! # convograph
//!
//! Ingests exported chat conversations into a temporal knowledge graph.
//!
//! ## Architecture
//!
//! - **Provider resolution**: model configuration → backend client bundle ([`provider`])
//! - **Episode construction**: conversation summary → ordered, time-stamped episodes ([`episodes`])
//! - **Ingestion driver**: one store session per run, strictly sequential submission,
//!   guaranteed release ([`pipeline`])
//! - **Backends**: OpenAI-compatible LLM / embedding / reranking clients and a Neo4j store

pub mod edges;
pub mod errors;
pub mod nodes;
pub mod types;

pub mod cross_encoder;
pub mod driver;
pub mod embedder;
pub mod llm_client;

pub mod episodes;
pub mod pipeline;
pub mod provider;
pub mod utils;

pub use driver::{GraphStore, Neo4jConnector, StoreConnector};
pub use episodes::{Conversation, ConversationSummary, Episode, EpisodeBuilder};
pub use errors::{ConfigError, EpisodeError, GraphError, IngestError, Phase, Result};
pub use pipeline::{IngestReport, IngestionDriver};
pub use provider::{resolve, BackendBundle, ProviderKind, ResolvedBackend};
pub use types::{ConnectionParams, GraphClients, ModelConfig};
