use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use uuid::Uuid;

use convograph::driver::{GraphStore, StoreConnector};
use convograph::nodes::EpisodicNode;
use convograph::{BackendBundle, ConnectionParams, Episode, GraphError};

/// Something the in-memory store was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open,
    BuildIndices,
    AddEpisode(String),
    Close,
}

/// Shared state of the fake database, surviving across sessions.
#[derive(Debug, Default)]
pub struct Database {
    pub calls: Vec<Call>,
    pub indices: BTreeSet<&'static str>,
    pub episodes: Vec<EpisodicNode>,
}

/// Failure injection for [`MemoryConnector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub fail_open: bool,
    pub fail_indexing: bool,
    /// 1-based submission that fails.
    pub fail_on_episode: Option<usize>,
    /// 1-based submission that panics.
    pub panic_on_episode: Option<usize>,
    pub fail_close: bool,
}

#[derive(Clone, Default)]
pub struct MemoryConnector {
    pub db: Arc<Mutex<Database>>,
    pub faults: Faults,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self {
            db: Arc::default(),
            faults,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.db.lock().unwrap().calls.clone()
    }

    pub fn close_count(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Close).count()
    }

    pub fn stored_names(&self) -> Vec<String> {
        self.db
            .lock()
            .unwrap()
            .episodes
            .iter()
            .map(|n| n.name.clone())
            .collect()
    }
}

pub struct MemoryStore {
    db: Arc<Mutex<Database>>,
    faults: Faults,
    group_id: String,
    submissions: Mutex<usize>,
    open: Mutex<bool>,
}

impl MemoryStore {
    fn record(&self, call: Call) {
        self.db.lock().unwrap().calls.push(call);
    }
}

impl GraphStore for MemoryStore {
    async fn ping(&self) -> convograph::Result<()> {
        Ok(())
    }

    async fn build_indices_and_constraints(&self) -> convograph::Result<()> {
        self.record(Call::BuildIndices);
        if self.faults.fail_indexing {
            return Err(GraphError::Driver("index creation refused".to_string()));
        }
        let mut db = self.db.lock().unwrap();
        db.indices.insert("episodic_uuid");
        db.indices.insert("episodic_group_id");
        db.indices.insert("episode_content");
        Ok(())
    }

    async fn add_episode(&self, episode: &Episode) -> convograph::Result<EpisodicNode> {
        self.record(Call::AddEpisode(episode.name.clone()));

        let attempt = {
            let mut n = self.submissions.lock().unwrap();
            *n += 1;
            *n
        };
        if self.faults.panic_on_episode == Some(attempt) {
            panic!("extraction crashed on episode {attempt}");
        }
        if self.faults.fail_on_episode == Some(attempt) {
            return Err(GraphError::Llm(convograph::errors::LlmError::RateLimit));
        }

        let node = EpisodicNode {
            uuid: Uuid::new_v4(),
            name: episode.name.clone(),
            group_id: self.group_id.clone(),
            labels: vec!["Episodic".to_string()],
            created_at: Utc::now(),
            source: episode.kind,
            source_description: episode.description.clone(),
            content: episode.body.clone(),
            valid_at: episode.reference_time,
        };
        self.db.lock().unwrap().episodes.push(node.clone());
        Ok(node)
    }

    async fn close(&self) -> convograph::Result<()> {
        self.record(Call::Close);
        let mut open = self.open.lock().unwrap();
        if !*open {
            return Err(GraphError::Closed);
        }
        *open = false;
        if self.faults.fail_close {
            return Err(GraphError::Driver("socket already gone".to_string()));
        }
        Ok(())
    }
}

impl StoreConnector for MemoryConnector {
    type Store = MemoryStore;

    async fn open(
        &self,
        params: &ConnectionParams,
        _bundle: BackendBundle,
    ) -> convograph::Result<MemoryStore> {
        self.db.lock().unwrap().calls.push(Call::Open);
        if self.faults.fail_open {
            return Err(GraphError::Driver(format!(
                "authentication failure for {}",
                params.user
            )));
        }
        Ok(MemoryStore {
            db: self.db.clone(),
            faults: self.faults,
            group_id: params.group_id.clone(),
            submissions: Mutex::new(0),
            open: Mutex::new(true),
        })
    }
}

pub fn params() -> ConnectionParams {
    ConnectionParams {
        password: "test".to_string(),
        group_id: "chat-export".to_string(),
        ..ConnectionParams::default()
    }
}
