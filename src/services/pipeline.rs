//! The ingestion pipeline: chunk, embed, assemble, persist.

use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use tokio::sync::Semaphore;

use crate::error::PipelineError;
use crate::models::{ChunkResult, ChunkingConfig, Config, RunMetadata, RunResult, VectorRecord};
use crate::services::vector_store::VectorStore;
use crate::services::{
    BatchVectorizer, Embedder, PersistenceBatcher, TokenChunker, TokenCodec,
};
use crate::utils::retry::RetryPolicy;

/// Composes the chunker, vectorizer, and persistence batcher into one
/// ingestion run.
///
/// The pipeline owns the bounded worker pool shared by chunk decoding and
/// embedding dispatch, and holds injected handles to the tokenizer, the
/// embedding service, and the vector store; runs share nothing else, so the
/// same pipeline can serve successive documents.
pub struct IngestionPipeline {
    chunker: TokenChunker,
    vectorizer: BatchVectorizer,
    batcher: PersistenceBatcher,
    store: Arc<dyn VectorStore>,
    chunking: ChunkingConfig,
    embed_batch_size: usize,
    upsert_batch_size: usize,
}

impl IngestionPipeline {
    pub fn new(
        config: &Config,
        tokenizer: Arc<dyn TokenCodec>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
    ) -> Self {
        let workers = Arc::new(Semaphore::new(config.pipeline.concurrency.max(1)));

        Self {
            chunker: TokenChunker::new(tokenizer, Arc::clone(&workers)),
            vectorizer: BatchVectorizer::new(embedder, workers),
            batcher: PersistenceBatcher::new(Arc::clone(&store))
                .with_retry_policy(RetryPolicy::new(config.embedding.max_retries)),
            store,
            chunking: config.chunking.clone(),
            embed_batch_size: config.embedding.batch_size,
            upsert_batch_size: config.vector_store.upsert_batch_size,
        }
    }

    /// Run the full pipeline over one document.
    ///
    /// Chunking and vectorization failures are terminal; persistence-batch
    /// failures are collected into the result, which then reports a partial
    /// status. The caller always gets either a run summary or one error
    /// naming the failing stage.
    pub async fn run(
        &self,
        text: &str,
        metadata: RunMetadata,
    ) -> Result<RunResult, PipelineError> {
        let started = Instant::now();
        tracing::info!(document = %metadata.document_name, "processing document");

        self.store.create_collection().await?;

        let chunked = self
            .chunker
            .chunk(text, self.chunking.max_tokens, self.chunking.overlap)
            .await?;
        tracing::debug!(
            chunks = chunked.chunk_count,
            tokens = chunked.total_tokens,
            "document chunked"
        );

        let corpus: Vec<String> = chunked.chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .vectorizer
            .vectorize(&corpus, self.embed_batch_size)
            .await?;
        debug_assert_eq!(vectors.len(), chunked.chunk_count);

        let records = assemble_records(&chunked, vectors, &metadata);
        let report = self.batcher.upsert(records, self.upsert_batch_size).await?;

        let result = RunResult {
            document_name: metadata.document_name,
            total_tokens: chunked.total_tokens,
            total_chunks: chunked.chunk_count,
            vectors_written: report.records_written(),
            failed_batches: report.failed_batches(),
            failures: report.failures(),
            duration_ms: started.elapsed().as_millis() as u64,
        };

        tracing::info!(
            document = %result.document_name,
            chunks = result.total_chunks,
            written = result.vectors_written,
            failed_batches = result.failed_batches,
            duration_ms = result.duration_ms,
            "document processed"
        );

        Ok(result)
    }
}

/// Pair each chunk with its vector and the caller's metadata.
fn assemble_records(
    chunked: &ChunkResult,
    vectors: Vec<Vec<f32>>,
    metadata: &RunMetadata,
) -> Vec<VectorRecord> {
    let upload_date = chrono::Utc::now().format("%Y/%m/%d").to_string();

    chunked
        .chunks
        .iter()
        .zip(vectors)
        .enumerate()
        .map(|(index, (chunk, values))| {
            let mut fields = metadata.extra.clone();
            fields.insert(
                "document_name".to_string(),
                json!(metadata.document_name),
            );
            if let Some(ref company) = metadata.company {
                fields.insert("company_name".to_string(), json!(company));
            }
            if let Some(ref checksum) = metadata.checksum {
                fields.insert("checksum".to_string(), json!(checksum));
            }
            fields.insert("chunk".to_string(), json!(chunk.text));
            fields.insert("chunk_index".to_string(), json!(index));
            fields.insert("start_token".to_string(), json!(chunk.start_token));
            fields.insert("end_token".to_string(), json!(chunk.end_token));
            fields.insert("upload_date".to_string(), json!(upload_date));

            VectorRecord {
                id: VectorRecord::generate_id(&metadata.document_name, index),
                values,
                metadata: fields,
            }
        })
        .collect()
}
