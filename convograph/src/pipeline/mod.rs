//! Ingestion pipeline.
//!
//! [`IngestionDriver::run`] owns one graph-store session end to end:
//!
//! 1. **Open**: connect through the [`StoreConnector`]
//! 2. **Index**: create indices and constraints (idempotent)
//! 3. **Submit**: add episodes one at a time, strictly in order, reporting progress
//! 4. **Close**: release the session on every path, including errors and panics
//!
//! Submission stops at the first failing episode. Episodes before it stay in
//! the store; the error says how many.

pub mod progress;

pub use progress::{BarProgress, LogProgress, ProgressReporter, RecordingProgress};

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, error, info};

use crate::driver::{GraphStore, StoreConnector};
use crate::episodes::Episode;
use crate::errors::IngestError;
use crate::nodes::EpisodicNode;
use crate::provider::BackendBundle;
use crate::types::ConnectionParams;

/// Lifecycle of a store session within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconnected,
    Connected,
    Indexed,
    Submitting,
    Closed,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestReport {
    pub submitted: usize,
    pub total: usize,
    /// Nodes written, in submission order.
    pub nodes: Vec<EpisodicNode>,
}

/// Runs ingestion sessions against stores opened by `C`.
#[derive(Debug, Clone, Default)]
pub struct IngestionDriver<C> {
    connector: C,
}

struct Session<'a, S> {
    store: &'a S,
    state: SessionState,
}

impl<S> Session<'_, S> {
    fn transition(&mut self, next: SessionState) {
        debug!(from = ?self.state, to = ?next, "session state");
        self.state = next;
    }
}

impl<C: StoreConnector> IngestionDriver<C> {
    pub fn new(connector: C) -> Self {
        Self { connector }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Open a session, ensure indices, submit `episodes` in order, and close.
    ///
    /// The session is closed exactly once whenever it was opened. If the run
    /// itself failed, that error is returned and a close failure is only
    /// logged; if the run succeeded, a close failure becomes
    /// [`IngestError::Close`]. A panic in the indexing or submission phase is
    /// resumed after the session is closed.
    pub async fn run<P: ProgressReporter>(
        &self,
        params: &ConnectionParams,
        bundle: BackendBundle,
        episodes: &[Episode],
        progress: &mut P,
    ) -> Result<IngestReport, IngestError> {
        let store = self
            .connector
            .open(params, bundle)
            .await
            .map_err(IngestError::Connection)?;

        let mut session = Session {
            store: &store,
            state: SessionState::Unconnected,
        };
        session.transition(SessionState::Connected);

        let outcome = AssertUnwindSafe(index_and_submit(&mut session, episodes, progress))
            .catch_unwind()
            .await;

        let closed = store.close().await;
        session.transition(SessionState::Closed);
        match &closed {
            Ok(()) => info!("connection closed"),
            Err(e) => error!(error = %e, "failed to close graph store session"),
        }

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        };

        match (outcome, closed) {
            (Ok(report), Ok(())) => Ok(report),
            (Ok(_), Err(e)) => Err(IngestError::Close(e)),
            (Err(e), _) => Err(e),
        }
    }
}

async fn index_and_submit<S: GraphStore, P: ProgressReporter>(
    session: &mut Session<'_, S>,
    episodes: &[Episode],
    progress: &mut P,
) -> Result<IngestReport, IngestError> {
    session
        .store
        .build_indices_and_constraints()
        .await
        .map_err(IngestError::Indexing)?;
    session.transition(SessionState::Indexed);

    session.transition(SessionState::Submitting);
    progress.start(episodes.len());
    let result = submit_all(session.store, episodes, progress).await;
    progress.finish();

    if let Ok(report) = &result {
        info!(submitted = report.submitted, "all episodes ingested");
    }
    result
}

async fn submit_all<S: GraphStore, P: ProgressReporter>(
    store: &S,
    episodes: &[Episode],
    progress: &mut P,
) -> Result<IngestReport, IngestError> {
    let total = episodes.len();
    let mut nodes = Vec::with_capacity(total);

    for (i, episode) in episodes.iter().enumerate() {
        let index = i + 1;
        match store.add_episode(episode).await {
            Ok(node) => {
                nodes.push(node);
                progress.advance(index, total, episode);
            }
            Err(source) => {
                error!(index, total, name = %episode.name, error = %source, "episode submission failed");
                return Err(IngestError::Submission {
                    index,
                    total,
                    name: episode.name.clone(),
                    committed: i,
                    source,
                });
            }
        }
    }

    Ok(IngestReport {
        submitted: nodes.len(),
        total,
        nodes,
    })
}
