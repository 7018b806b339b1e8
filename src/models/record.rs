use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A vector ready for persistence: id, embedding values, and opaque metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Map<String, Value>,
}

impl VectorRecord {
    /// Deterministic record id for a chunk of a named document.
    ///
    /// Re-ingesting the same document produces the same ids, so the store
    /// overwrites stale vectors instead of accumulating duplicates.
    pub fn generate_id(document_name: &str, chunk_index: usize) -> String {
        use uuid::Uuid;
        let name = format!("{}:{}", document_name, chunk_index);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }
}

/// Caller-supplied context attached to every record of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunMetadata {
    pub document_name: String,
    pub company: Option<String>,
    pub checksum: Option<String>,
    /// Additional opaque fields merged into each record's metadata.
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl RunMetadata {
    pub fn new(document_name: impl Into<String>) -> Self {
        Self {
            document_name: document_name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.checksum = Some(checksum.into());
        self
    }
}

/// Outcome of one persistence batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Zero-based batch position.
    pub index: usize,
    /// Records in the batch.
    pub records: usize,
    /// Failure message, if the batch could not be written.
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-batch accounting for a persistence operation.
///
/// Batches are fault-isolated: the report can mix successes and failures, and
/// it is the only place individual upsert failures surface.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub batches: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn push(&mut self, outcome: BatchOutcome) {
        self.batches.push(outcome);
    }

    /// Records written by successful batches.
    pub fn records_written(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.succeeded())
            .map(|b| b.records)
            .sum()
    }

    pub fn successful_batches(&self) -> usize {
        self.batches.iter().filter(|b| b.succeeded()).count()
    }

    pub fn failed_batches(&self) -> usize {
        self.batches.len() - self.successful_batches()
    }

    /// Failure messages, in batch order.
    pub fn failures(&self) -> Vec<String> {
        self.batches
            .iter()
            .filter_map(|b| {
                b.error
                    .as_ref()
                    .map(|e| format!("batch {}: {}", b.index, e))
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failed_batches() == 0
    }
}

/// Overall status of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every record was written.
    Complete,
    /// The run finished, but some persistence batches failed.
    Partial,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub document_name: String,
    pub total_tokens: usize,
    pub total_chunks: usize,
    pub vectors_written: usize,
    pub failed_batches: usize,
    pub failures: Vec<String>,
    pub duration_ms: u64,
}

impl RunResult {
    pub fn status(&self) -> RunStatus {
        if self.failed_batches == 0 {
            RunStatus::Complete
        } else {
            RunStatus::Partial
        }
    }
}
