//! Error types for the document pre-processing pipeline.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors raised when caller input violates a precondition.
///
/// Validation happens before any tokenization or network traffic, so these
/// never wrap a downstream cause.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Input text cannot be empty")]
    EmptyInput,

    #[error("max_tokens must be greater than zero")]
    ZeroMaxTokens,

    #[error("overlap ({overlap}) must be smaller than max_tokens ({max_tokens})")]
    OverlapTooLarge { overlap: usize, max_tokens: usize },

    #[error("batch_size must be greater than zero")]
    ZeroBatchSize,

    #[error("corpus cannot be empty")]
    EmptyCorpus,

    #[error("corpus item {0} is blank")]
    BlankCorpusItem(usize),
}

/// Errors raised by the tokenizer adapter.
#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("failed to load tokenizer: {0}")]
    Load(String),

    #[error("failed to decode token span: {0}")]
    Decode(String),
}

/// Errors that abort a chunking operation.
///
/// Chunking is all-or-nothing: a failure in any window discards the whole
/// result rather than returning a partial chunk set.
#[derive(Debug, Error)]
pub enum ChunkError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("tokenizer error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("failed to materialize chunk {index}: {source}")]
    Decode {
        index: usize,
        source: EncodingError,
    },

    #[error("chunk worker failed: {0}")]
    Worker(String),
}

/// Errors raised by embedding-service calls.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding service: {0}")]
    ConnectionError(String),

    #[error("embedding service error (status {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding request timed out")]
    Timeout,

    #[error("embedding service returned {actual} vectors for {expected} inputs")]
    CountMismatch { expected: usize, actual: usize },
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            // Rate limiting and 5xx-class responses may clear on their own
            EmbeddingError::ServerError { status, .. } => {
                *status == 429 || (500..600).contains(&u32::from(*status))
            }
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            // A malformed or miscounted response will not improve on retry
            EmbeddingError::InvalidResponse(_) | EmbeddingError::CountMismatch { .. } => false,
        }
    }
}

/// Errors that abort a vectorization operation.
///
/// Persistence assumes a complete, positionally consistent vector array, so a
/// single failed batch fails the whole call; no partial embedding set is
/// surfaced.
#[derive(Debug, Error)]
pub enum VectorizerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("embedding batch {index} failed: {source}")]
    Batch {
        index: usize,
        source: EmbeddingError,
    },

    #[error("embedding worker failed: {0}")]
    Worker(String),
}

/// Errors related to vector store operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("invalid payload: {0}")]
    PayloadError(String),
}

impl Retryable for VectorStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            VectorStoreError::ConnectionError(_) => true,
            VectorStoreError::CollectionError(msg) | VectorStoreError::UpsertError(msg) => {
                let msg = msg.to_lowercase();
                msg.contains("timeout")
                    || msg.contains("connection")
                    || msg.contains("unavailable")
                    || msg.contains("too many")
            }
            VectorStoreError::PayloadError(_) => false,
        }
    }
}

/// Terminal errors for a pipeline run, identifying the failing stage.
///
/// Per-batch persistence failures are not terminal; they are collected in the
/// run's [`BatchReport`](crate::models::BatchReport) instead.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("chunking failed: {0}")]
    Chunking(#[from] ChunkError),

    #[error("vectorization failed: {0}")]
    Vectorization(#[from] VectorizerError),

    #[error("vector store unavailable: {0}")]
    Store(#[from] VectorStoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),
}
