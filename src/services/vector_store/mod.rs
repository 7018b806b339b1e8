//! Vector store abstraction layer.
//!
//! A trait seam over the external store keeps the pipeline testable with
//! in-memory fakes and the backend swappable without touching callers.

mod qdrant;

pub use qdrant::QdrantBackend;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{VectorRecord, VectorStoreConfig};

/// Collection information surfaced by health probes.
#[derive(Debug, Clone)]
pub struct CollectionInfo {
    pub points_count: u64,
}

/// Operations the pipeline needs from a vector store.
///
/// `collection_info` and `health_check` exist for status probes only; the
/// ingestion path uses `create_collection` and `upsert`.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check if the store is reachable.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Describe the collection, or `None` if it does not exist yet.
    async fn collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError>;

    /// Create the collection if it does not exist.
    async fn create_collection(&self) -> Result<(), VectorStoreError>;

    /// Insert or overwrite records by id.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError>;

    /// The collection name this handle writes to.
    fn collection(&self) -> &str;
}

/// Create the configured vector store backend.
pub fn create_backend(
    config: &VectorStoreConfig,
) -> Result<Arc<dyn VectorStore>, VectorStoreError> {
    let backend = QdrantBackend::new(config)?;
    Ok(Arc::new(backend))
}
