//! Fault-isolated persistence of vector records.

use std::sync::Arc;

use crate::error::ValidationError;
use crate::models::{BatchOutcome, BatchReport, VectorRecord};
use crate::services::vector_store::VectorStore;
use crate::utils::retry::{RetryOutcome, RetryPolicy, with_retry};

/// Writes vector records to the store in payload-size-safe batches.
///
/// Unlike vectorization, persistence is best-effort and fully reported: a
/// failed batch is logged and recorded, and the remaining batches still run.
/// Vectors that did make it into the store are retrievable, so partial
/// writes have value where partial embeddings do not.
pub struct PersistenceBatcher {
    store: Arc<dyn VectorStore>,
    retry: RetryPolicy,
}

impl PersistenceBatcher {
    pub fn new(store: Arc<dyn VectorStore>) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy shared across batches.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Upsert all records, at most `batch_size` per request.
    ///
    /// Returns a per-batch report; individual batch failures never abort the
    /// operation and never raise. An empty record set yields an empty report.
    pub async fn upsert(
        &self,
        records: Vec<VectorRecord>,
        batch_size: usize,
    ) -> Result<BatchReport, ValidationError> {
        if batch_size == 0 {
            return Err(ValidationError::ZeroBatchSize);
        }

        let mut report = BatchReport::default();
        for (index, batch) in records.chunks(batch_size).enumerate() {
            let records_in_batch = batch.len();
            let outcome =
                with_retry(&self.retry, || self.store.upsert(batch.to_vec())).await;

            match outcome {
                RetryOutcome::Success(()) => {
                    tracing::debug!(batch = index, records = records_in_batch, "batch upserted");
                    report.push(BatchOutcome {
                        index,
                        records: records_in_batch,
                        error: None,
                    });
                }
                RetryOutcome::Failed {
                    last_error,
                    attempts,
                } => {
                    tracing::warn!(
                        batch = index,
                        records = records_in_batch,
                        attempts,
                        error = %last_error,
                        "batch upsert failed; continuing with remaining batches"
                    );
                    report.push(BatchOutcome {
                        index,
                        records: records_in_batch,
                        error: Some(last_error.to_string()),
                    });
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VectorStoreError;
    use crate::services::vector_store::CollectionInfo;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    /// In-memory store that can reject batches containing a poison record id.
    struct StubStore {
        upserts: Mutex<Vec<Vec<VectorRecord>>>,
        fail_containing: Option<String>,
    }

    impl StubStore {
        fn new(fail_containing: Option<&str>) -> Self {
            Self {
                upserts: Mutex::new(Vec::new()),
                fail_containing: fail_containing.map(String::from),
            }
        }
    }

    #[async_trait]
    impl VectorStore for StubStore {
        async fn health_check(&self) -> Result<bool, VectorStoreError> {
            Ok(true)
        }

        async fn collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError> {
            Ok(None)
        }

        async fn create_collection(&self) -> Result<(), VectorStoreError> {
            Ok(())
        }

        async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorStoreError> {
            if let Some(ref poison) = self.fail_containing
                && records.iter().any(|r| &r.id == poison)
            {
                return Err(VectorStoreError::UpsertError("bad point id".into()));
            }
            self.upserts.lock().unwrap().push(records);
            Ok(())
        }

        fn collection(&self) -> &str {
            "test"
        }
    }

    fn records(n: usize) -> Vec<VectorRecord> {
        (0..n)
            .map(|i| VectorRecord {
                id: format!("r{i}"),
                values: vec![i as f32],
                metadata: serde_json::Map::new(),
            })
            .collect()
    }

    fn batcher(store: Arc<StubStore>) -> PersistenceBatcher {
        PersistenceBatcher::new(store)
            .with_retry_policy(RetryPolicy::new(2).with_base_delay(Duration::from_millis(5)))
    }

    #[tokio::test]
    async fn writes_all_batches_on_success() {
        let store = Arc::new(StubStore::new(None));
        let report = batcher(store.clone()).upsert(records(5), 2).await.unwrap();

        assert!(report.is_complete());
        assert_eq!(report.records_written(), 5);
        assert_eq!(report.batches.len(), 3);
        assert_eq!(store.upserts.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn failed_batch_is_reported_not_raised() {
        // Five records in batches of two: [r0 r1] [r2 r3] [r4]; the final
        // single-record batch fails
        let store = Arc::new(StubStore::new(Some("r4")));
        let report = batcher(store.clone()).upsert(records(5), 2).await.unwrap();

        assert_eq!(report.successful_batches(), 2);
        assert_eq!(report.records_written(), 4);
        assert_eq!(report.failed_batches(), 1);
        assert_eq!(report.batches[2].records, 1);
        assert!(report.batches[2].error.is_some());
    }

    #[tokio::test]
    async fn later_batches_run_after_a_failure() {
        // Poison the middle batch; the final batch must still be written
        let store = Arc::new(StubStore::new(Some("r2")));
        let report = batcher(store.clone()).upsert(records(5), 2).await.unwrap();

        assert_eq!(report.failed_batches(), 1);
        assert_eq!(report.records_written(), 3);

        let written = store.upserts.lock().unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(written[1][0].id, "r4");
    }

    #[tokio::test]
    async fn empty_records_yield_empty_report() {
        let store = Arc::new(StubStore::new(None));
        let report = batcher(store).upsert(Vec::new(), 2).await.unwrap();
        assert!(report.batches.is_empty());
        assert!(report.is_complete());
    }

    #[tokio::test]
    async fn zero_batch_size_is_rejected() {
        let store = Arc::new(StubStore::new(None));
        let err = batcher(store).upsert(records(2), 0).await.unwrap_err();
        assert_eq!(err, ValidationError::ZeroBatchSize);
    }
}
