//! Corpus-wide embedding with bounded concurrent batches.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{ValidationError, VectorizerError};
use crate::services::Embedder;

/// Embeds an arbitrary corpus by partitioning it into fixed-size batches.
///
/// Batches are independent and dispatched concurrently up to the worker
/// cap, then concatenated in batch order so the output stays aligned with
/// the corpus position for position.
pub struct BatchVectorizer {
    embedder: Arc<dyn Embedder>,
    workers: Arc<Semaphore>,
}

impl BatchVectorizer {
    pub fn new(embedder: Arc<dyn Embedder>, workers: Arc<Semaphore>) -> Self {
        Self { embedder, workers }
    }

    /// Embed the whole corpus, preserving its order.
    ///
    /// All-or-nothing: if any batch fails after the client's retries, the
    /// whole call fails and no vectors are returned. In-flight sibling
    /// batches are left to finish; their results are discarded.
    pub async fn vectorize(
        &self,
        corpus: &[String],
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>, VectorizerError> {
        if batch_size == 0 {
            return Err(ValidationError::ZeroBatchSize.into());
        }
        if corpus.is_empty() {
            return Err(ValidationError::EmptyCorpus.into());
        }
        for (index, item) in corpus.iter().enumerate() {
            if item.trim().is_empty() {
                return Err(ValidationError::BlankCorpusItem(index).into());
            }
        }

        let batch_count = corpus.len().div_ceil(batch_size);
        tracing::debug!(
            items = corpus.len(),
            batch_size,
            batches = batch_count,
            "vectorizing corpus"
        );

        let mut handles = Vec::with_capacity(batch_count);
        for (index, batch) in corpus.chunks(batch_size).enumerate() {
            let batch = batch.to_vec();
            let embedder = Arc::clone(&self.embedder);
            let workers = Arc::clone(&self.workers);
            handles.push(tokio::spawn(async move {
                let _permit = workers
                    .acquire_owned()
                    .await
                    .map_err(|e| VectorizerError::Worker(e.to_string()))?;
                embedder
                    .embed(&batch)
                    .await
                    .map_err(|source| VectorizerError::Batch { index, source })
            }));
        }

        // Join in batch order; completion order never reaches the output
        let mut vectors = Vec::with_capacity(corpus.len());
        for handle in handles {
            let batch_vectors = handle
                .await
                .map_err(|e| VectorizerError::Worker(e.to_string()))??;
            vectors.extend(batch_vectors);
        }

        Ok(vectors)
    }
}
