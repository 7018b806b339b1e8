use async_trait::async_trait;
use qdrant_client::Payload;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, UpsertPointsBuilder, VectorParamsBuilder,
};

use super::{CollectionInfo, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{VectorRecord, VectorStoreConfig};

/// Qdrant-backed vector store.
pub struct QdrantBackend {
    client: Qdrant,
    collection: String,
    dimension: u64,
}

impl QdrantBackend {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            dimension: config.dimension,
        })
    }
}

/// Convert a record into a Qdrant point, carrying the metadata as payload.
fn to_point(record: VectorRecord) -> Result<PointStruct, VectorStoreError> {
    let payload = Payload::try_from(serde_json::Value::Object(record.metadata))
        .map_err(|e| VectorStoreError::PayloadError(e.to_string()))?;
    Ok(PointStruct::new(record.id, record.values, payload))
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError> {
        match self.client.collection_info(&self.collection).await {
            Ok(info) => Ok(Some(CollectionInfo {
                points_count: info
                    .result
                    .map(|r| r.points_count.unwrap_or(0))
                    .unwrap_or(0),
            })),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("not found") || msg.contains("doesn't exist") {
                    Ok(None)
                } else {
                    Err(VectorStoreError::CollectionError(msg))
                }
            }
        }
    }

    async fn create_collection(&self) -> Result<(), VectorStoreError> {
        if self.collection_info().await?.is_some() {
            return Ok(());
        }

        let create_collection = CreateCollectionBuilder::new(&self.collection)
            .vectors_config(VectorParamsBuilder::new(self.dimension, Distance::Cosine));

        self.client
            .create_collection(create_collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        tracing::info!(
            collection = %self.collection,
            dimension = self.dimension,
            "collection created"
        );
        Ok(())
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = records
            .into_iter()
            .map(to_point)
            .collect::<Result<_, _>>()?;

        let upsert = UpsertPointsBuilder::new(&self.collection, points);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_metadata_becomes_point_payload() {
        let mut metadata = serde_json::Map::new();
        metadata.insert("document_name".to_string(), json!("report.txt"));
        metadata.insert("chunk_index".to_string(), json!(2));
        metadata.insert("chunk".to_string(), json!("some text"));

        let record = VectorRecord {
            id: VectorRecord::generate_id("report.txt", 2),
            values: vec![0.1, 0.2, 0.3],
            metadata,
        };

        let point = to_point(record).unwrap();
        assert_eq!(point.payload.len(), 3);
        assert!(point.payload.contains_key("document_name"));
    }

    #[test]
    fn backend_builds_from_config() {
        let backend = QdrantBackend::new(&VectorStoreConfig::default()).unwrap();
        assert_eq!(backend.collection(), "document-text-embeddings");
    }
}
