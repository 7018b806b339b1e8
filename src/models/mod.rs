mod chunk;
mod config;
mod record;

pub use chunk::{Chunk, ChunkResult};
pub use config::{
    ChunkingConfig, Config, DEFAULT_COLLECTION, DEFAULT_EMBEDDING_MODEL, DEFAULT_EMBEDDING_URL,
    DEFAULT_QDRANT_URL, EmbeddingConfig, PipelineConfig, VectorStoreConfig,
};
pub use record::{BatchOutcome, BatchReport, RunMetadata, RunResult, RunStatus, VectorRecord};

use serde::{Deserialize, Serialize};

/// Output format for CLI results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
