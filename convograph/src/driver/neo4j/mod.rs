//! Neo4j graph store implementation.
//!
//! Uses `neo4rs` 0.8 for async, pooled Bolt connections. Episodes become
//! `Episodic` nodes carrying the body embedding, chained in submission order
//! with `NEXT_EPISODE` edges.

use chrono::Utc;
use neo4rs::{query, ConfigBuilder, Graph};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::edges::next_episode::{NextEpisodeEdge, NEXT_EPISODE};
use crate::embedder::EmbedderClient;
use crate::episodes::Episode;
use crate::errors::{GraphError, Result};
use crate::nodes::episodic::{EpisodicNode, EPISODIC_LABEL};
use crate::provider::BackendBundle;
use crate::types::{ConnectionParams, GraphClients};
use crate::utils::format_neo4j_datetime;

use super::{GraphStore, StoreConnector};

/// Schema statements; every one is `IF NOT EXISTS`, so re-running them is harmless.
pub const INDEX_AND_CONSTRAINT_STATEMENTS: [&str; 6] = [
    "CREATE CONSTRAINT episodic_uuid IF NOT EXISTS FOR (n:Episodic) REQUIRE n.uuid IS UNIQUE",
    "CREATE INDEX episodic_group_id IF NOT EXISTS FOR (n:Episodic) ON (n.group_id)",
    "CREATE INDEX episodic_name IF NOT EXISTS FOR (n:Episodic) ON (n.name)",
    "CREATE INDEX episodic_valid_at IF NOT EXISTS FOR (n:Episodic) ON (n.valid_at)",
    "CREATE INDEX episodic_created_at IF NOT EXISTS FOR (n:Episodic) ON (n.created_at)",
    "CREATE FULLTEXT INDEX episode_content IF NOT EXISTS FOR (e:Episodic) \
     ON EACH [e.content, e.source, e.source_description, e.group_id]",
];

const LINK_NEXT_EPISODE: &str = "MATCH (prev:Episodic {uuid: $source_uuid}) \
     MATCH (next:Episodic {uuid: $target_uuid}) \
     MERGE (prev)-[r:NEXT_EPISODE {uuid: $uuid}]->(next) \
     SET r.created_at = datetime($created_at)";

/// Cypher for persisting one episode; the embedding is only written when present.
fn save_episode_cypher(with_embedding: bool) -> String {
    let mut cypher = String::from(
        "MERGE (n:Episodic {uuid: $uuid}) \
         SET n.name = $name, \
             n.group_id = $group_id, \
             n.source = $source, \
             n.source_description = $source_description, \
             n.content = $content, \
             n.created_at = datetime($created_at), \
             n.valid_at = datetime($valid_at)",
    );
    if with_embedding {
        cypher.push_str(", n.content_embedding = $content_embedding");
    }
    cypher
}

/// Neo4j-backed [`GraphStore`].
pub struct Neo4jStore {
    graph: Mutex<Option<Graph>>,
    clients: GraphClients,
    group_id: String,
    /// Last episode written in this session, for NEXT_EPISODE chaining.
    last_episode: Mutex<Option<Uuid>>,
}

impl Neo4jStore {
    /// Open a connection pool and verify it with a round trip.
    pub async fn connect(params: &ConnectionParams, clients: GraphClients) -> Result<Self> {
        let config = ConfigBuilder::default()
            .uri(params.uri.as_str())
            .user(params.user.as_str())
            .password(params.password.as_str())
            .build()?;
        let graph = Graph::connect(config).await?;

        let store = Self {
            graph: Mutex::new(Some(graph)),
            clients,
            group_id: params.group_id.clone(),
            last_episode: Mutex::new(None),
        };
        store.ping().await?;

        info!(uri = %params.uri, user = %params.user, "connected to Neo4j");
        Ok(store)
    }

    pub fn clients(&self) -> &GraphClients {
        &self.clients
    }

    /// A handle on the pool; fails once the store is closed.
    async fn graph(&self) -> Result<Graph> {
        self.graph.lock().await.clone().ok_or(GraphError::Closed)
    }

    async fn link_next_episode(&self, graph: &Graph, edge: &NextEpisodeEdge) -> Result<()> {
        graph
            .run(
                query(LINK_NEXT_EPISODE)
                    .param("uuid", edge.uuid.to_string())
                    .param("source_uuid", edge.source_node_uuid.to_string())
                    .param("target_uuid", edge.target_node_uuid.to_string())
                    .param("created_at", format_neo4j_datetime(&edge.created_at)),
            )
            .await?;
        debug!(rel = NEXT_EPISODE, from = %edge.source_node_uuid, to = %edge.target_node_uuid, "linked episodes");
        Ok(())
    }
}

impl GraphStore for Neo4jStore {
    async fn ping(&self) -> Result<()> {
        self.graph().await?.run(query("RETURN 1")).await?;
        Ok(())
    }

    async fn build_indices_and_constraints(&self) -> Result<()> {
        let graph = self.graph().await?;
        for statement in INDEX_AND_CONSTRAINT_STATEMENTS {
            graph.run(query(statement)).await?;
        }
        info!(
            statements = INDEX_AND_CONSTRAINT_STATEMENTS.len(),
            "indices and constraints in place"
        );
        Ok(())
    }

    async fn add_episode(&self, episode: &Episode) -> Result<EpisodicNode> {
        let graph = self.graph().await?;

        let embedding = if episode.body.is_empty() {
            None
        } else {
            Some(self.clients.embedder.embed(&episode.body).await?)
        };

        let node = EpisodicNode {
            uuid: Uuid::new_v4(),
            name: episode.name.clone(),
            group_id: self.group_id.clone(),
            labels: vec![EPISODIC_LABEL.to_string()],
            created_at: Utc::now(),
            source: episode.kind,
            source_description: episode.description.clone(),
            content: episode.body.clone(),
            valid_at: episode.reference_time,
        };

        let mut save = query(&save_episode_cypher(embedding.is_some()))
            .param("uuid", node.uuid.to_string())
            .param("name", node.name.as_str())
            .param("group_id", node.group_id.as_str())
            .param("source", node.source.as_str())
            .param("source_description", node.source_description.as_str())
            .param("content", node.content.as_str())
            .param("created_at", format_neo4j_datetime(&node.created_at))
            .param("valid_at", format_neo4j_datetime(&node.valid_at));
        if let Some(embedding) = embedding {
            let values: Vec<f64> = embedding.into_iter().map(f64::from).collect();
            save = save.param("content_embedding", values);
        }
        graph.run(save).await?;

        let mut last = self.last_episode.lock().await;
        if let Some(previous) = *last {
            self.link_next_episode(&graph, &NextEpisodeEdge::between(previous, node.uuid))
                .await?;
        }
        *last = Some(node.uuid);

        debug!(uuid = %node.uuid, name = %node.name, "episode persisted");
        Ok(node)
    }

    async fn close(&self) -> Result<()> {
        // Dropping the last `Graph` handle shuts the pool down.
        match self.graph.lock().await.take() {
            Some(_graph) => Ok(()),
            None => Err(GraphError::Closed),
        }
    }
}

/// Opens [`Neo4jStore`] sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neo4jConnector;

impl StoreConnector for Neo4jConnector {
    type Store = Neo4jStore;

    async fn open(&self, params: &ConnectionParams, bundle: BackendBundle) -> Result<Neo4jStore> {
        Neo4jStore::connect(params, bundle.into_clients()).await
    }
}
