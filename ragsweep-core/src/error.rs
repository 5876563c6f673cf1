//! Error types for the ragsweep core.
//!
//! Only setup failures (configuration, corpus) are meant to stop a sweep.
//! Everything raised while building or querying one configuration is caught
//! by the orchestrator or the strategy runner and turned into a log line or
//! an error-marked result record.

use crate::rag::ConfigKey;

/// Top-level error type for the ragsweep core library.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Corpus error: {message}")]
    Corpus { message: String },

    #[error("Index build error: {0}")]
    Build(#[from] ConfigBuildError),

    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SweepError {
    pub fn corpus(message: impl Into<String>) -> Self {
        Self::Corpus {
            message: message.into(),
        }
    }
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Building the chunks, embeddings or index for one configuration key failed.
///
/// Never fatal to the sweep: the key is marked failed and its strategies
/// are skipped.
#[derive(Debug, thiserror::Error)]
pub enum ConfigBuildError {
    #[error("no chunks produced for {key}")]
    NoChunks { key: ConfigKey },

    #[error("embedding failed for {key}: {source}")]
    EmbeddingFailed {
        key: ConfigKey,
        #[source]
        source: ProviderError,
    },

    #[error("embedding row count mismatch for {key}: expected {expected}, got {actual}")]
    RowCountMismatch {
        key: ConfigKey,
        expected: usize,
        actual: usize,
    },

    #[error("inconsistent embedding dimension for {key}: row {row} has {actual}, expected {expected}")]
    DimensionMismatch {
        key: ConfigKey,
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("index for {key} is empty")]
    EmptyIndex { key: ConfigKey },
}

/// Errors from querying a built index.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("index is empty or k is zero")]
    EmptyIndex,

    #[error("query vector has dimension {actual}, index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors from embedding and chat-completion backends.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("request to {provider} failed: {message}")]
    Request { provider: String, message: String },

    #[error("{provider} returned HTTP {code}: {body}")]
    Status {
        provider: String,
        code: u16,
        body: String,
    },

    #[error("could not parse {provider} response: {message}")]
    ResponseParse { provider: String, message: String },

    #[error("{provider} response had no content")]
    MissingContent { provider: String },

    #[error("{provider} returned {actual} embeddings for {expected} inputs")]
    BatchSizeMismatch {
        provider: String,
        expected: usize,
        actual: usize,
    },
}

/// A judge response that could not be read as a score.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("judge response is not a number: {raw:?}")]
pub struct JudgeParseError {
    pub raw: String,
}
