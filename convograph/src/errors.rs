//! Error types for convograph.
//!
//! Four layers, matching where a run can fail:
//! - [`ConfigError`]: bad or incomplete model configuration, raised before any connection.
//! - [`GraphError`]: anything the graph store or one of its backend clients reports.
//! - [`EpisodeError`]: loading the conversation summary or building episodes from it.
//! - [`IngestError`]: a failed ingestion run, tagged with the [`Phase`] it failed in.

use std::fmt;

/// Alias for Results returning [`GraphError`].
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by the graph store and its backend clients.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Driver error: {0}")]
    Driver(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Embedder error: {0}")]
    Embedder(String),

    #[error("Reranker error: {0}")]
    CrossEncoder(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Graph store connection already closed")]
    Closed,
}

impl From<neo4rs::Error> for GraphError {
    fn from(err: neo4rs::Error) -> Self {
        GraphError::Driver(err.to_string())
    }
}

/// LLM-specific errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited")]
    RateLimit,

    #[error("Model refused to respond")]
    Refusal,

    #[error("Empty response from LLM")]
    EmptyResponse,

    #[error("Authentication failed")]
    Authentication,

    #[error("API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },
}

/// Invalid or incomplete model configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unsupported provider '{0}': expected one of OpenAI, Ollama")]
    UnsupportedProvider(String),

    #[error("Missing required keys for self-hosted provider: {}", .0.join(", "))]
    MissingKeys(Vec<&'static str>),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Errors raised while loading a conversation summary or building episodes.
#[derive(Debug, thiserror::Error)]
pub enum EpisodeError {
    #[error("Cannot read conversation summary '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed conversation summary: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Conversation '{title}' has no usable timestamp (got {value:?})")]
    Timestamp { title: String, value: Option<String> },
}

/// Stage of an ingestion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Configuration,
    Connection,
    Indexing,
    Submission,
    Close,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Configuration => "configuration",
            Phase::Connection => "connection",
            Phase::Indexing => "indexing",
            Phase::Submission => "submission",
            Phase::Close => "close",
        };
        f.write_str(name)
    }
}

/// A failed ingestion run.
///
/// The originating error is kept intact as the `source`; the variant records the
/// phase, and for submission failures, how far the run got.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("Failed to open graph store session")]
    Connection(#[source] GraphError),

    #[error("Failed to build indices and constraints")]
    Indexing(#[source] GraphError),

    #[error("Failed to submit episode {index}/{total} '{name}' ({committed} already ingested)")]
    Submission {
        /// 1-based position of the failing episode.
        index: usize,
        total: usize,
        name: String,
        committed: usize,
        #[source]
        source: GraphError,
    },

    #[error("Failed to close graph store session")]
    Close(#[source] GraphError),
}

impl IngestError {
    /// The phase the run was in when it failed.
    pub fn phase(&self) -> Phase {
        match self {
            IngestError::Configuration(_) => Phase::Configuration,
            IngestError::Connection(_) => Phase::Connection,
            IngestError::Indexing(_) => Phase::Indexing,
            IngestError::Submission { .. } => Phase::Submission,
            IngestError::Close(_) => Phase::Close,
        }
    }

    /// Number of episodes the backend accepted before the failure.
    ///
    /// Only a submission failure can leave a partial ingestion behind; every
    /// other phase fails before the first episode is attempted.
    pub fn committed(&self) -> usize {
        match self {
            IngestError::Submission { committed, .. } => *committed,
            _ => 0,
        }
    }
}
