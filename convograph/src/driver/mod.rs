//! Graph database driver abstraction.
//!
//! Defines the [`GraphStore`] trait the ingestion pipeline talks to, the
//! [`StoreConnector`] that opens one, and the Neo4j implementation.

pub mod neo4j;

pub use neo4j::{Neo4jConnector, Neo4jStore};

use crate::episodes::Episode;
use crate::errors::Result;
use crate::nodes::EpisodicNode;
use crate::provider::BackendBundle;
use crate::types::ConnectionParams;

/// An open session against a graph-backed memory store.
#[allow(async_fn_in_trait)]
pub trait GraphStore: Send + Sync {
    /// Health check: verify connectivity to the database.
    async fn ping(&self) -> Result<()>;

    /// Create the indices and constraints ingestion relies on.
    ///
    /// Idempotent: calling it on an already-initialised database is a no-op.
    async fn build_indices_and_constraints(&self) -> Result<()>;

    /// Persist one episode and return the node written for it.
    async fn add_episode(&self, episode: &Episode) -> Result<EpisodicNode>;

    /// Release the connection. Further calls fail with [`crate::GraphError::Closed`].
    async fn close(&self) -> Result<()>;
}

/// Opens [`GraphStore`] sessions.
#[allow(async_fn_in_trait)]
pub trait StoreConnector {
    type Store: GraphStore;

    /// Establish a session using `params` and the clients in `bundle`.
    async fn open(&self, params: &ConnectionParams, bundle: BackendBundle) -> Result<Self::Store>;
}
