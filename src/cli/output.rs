use std::fmt::Write as FmtWrite;

use crate::models::{OutputFormat, RunResult, RunStatus};

pub trait Formatter {
    fn format_ingest_summary(&self, summary: &IngestSummary) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

/// Aggregate over one `ingest` invocation, possibly spanning many files.
#[derive(Debug, Clone, Default)]
pub struct IngestSummary {
    pub files_scanned: u64,
    pub files_ingested: u64,
    pub files_skipped: u64,
    pub runs: Vec<RunResult>,
    pub duration_ms: u64,
}

impl IngestSummary {
    pub fn total_chunks(&self) -> usize {
        self.runs.iter().map(|r| r.total_chunks).sum()
    }

    pub fn vectors_written(&self) -> usize {
        self.runs.iter().map(|r| r.vectors_written).sum()
    }

    pub fn failed_batches(&self) -> usize {
        self.runs.iter().map(|r| r.failed_batches).sum()
    }

    pub fn partial_runs(&self) -> usize {
        self.runs
            .iter()
            .filter(|r| r.status() == RunStatus::Partial)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub embedding_url: String,
    pub embedding_model: String,
    pub vector_store_url: String,
    pub vector_store_connected: bool,
    pub vector_store_points: u64,
    pub collection: String,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_ingest_summary(&self, summary: &IngestSummary) -> String {
        let mut output = String::new();
        writeln!(output, "Ingestion Complete").unwrap();
        writeln!(output, "------------------").unwrap();
        writeln!(output, "Files scanned:  {}", summary.files_scanned).unwrap();
        writeln!(output, "Files ingested: {}", summary.files_ingested).unwrap();
        writeln!(output, "Files skipped:  {}", summary.files_skipped).unwrap();
        writeln!(output, "Chunks created: {}", summary.total_chunks()).unwrap();
        writeln!(output, "Vectors written: {}", summary.vectors_written()).unwrap();
        if summary.failed_batches() > 0 {
            writeln!(
                output,
                "Failed batches: {} ({} partial run(s))",
                summary.failed_batches(),
                summary.partial_runs()
            )
            .unwrap();
            for run in &summary.runs {
                for failure in &run.failures {
                    writeln!(output, "  {}: {}", run.document_name, failure).unwrap();
                }
            }
        }
        writeln!(output, "Duration: {}ms", summary.duration_ms).unwrap();
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();
        writeln!(output, "Embedding:     {}", status.embedding_model).unwrap();
        writeln!(output, "  URL:         {}", status.embedding_url).unwrap();
        writeln!(output).unwrap();

        let store_status = if status.vector_store_connected {
            "[CONNECTED]"
        } else {
            "[DISCONNECTED]"
        };
        writeln!(output, "Vector Store:  {}", store_status).unwrap();
        writeln!(output, "  URL:         {}", status.vector_store_url).unwrap();
        if status.vector_store_connected {
            writeln!(output, "  Collection:  {}", status.collection).unwrap();
            writeln!(output, "  Points:      {}", status.vector_store_points).unwrap();
        }

        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, value: &serde_json::Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(value).unwrap()
        } else {
            serde_json::to_string(value).unwrap()
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_ingest_summary(&self, summary: &IngestSummary) -> String {
        let json = serde_json::json!({
            "files_scanned": summary.files_scanned,
            "files_ingested": summary.files_ingested,
            "files_skipped": summary.files_skipped,
            "chunks_created": summary.total_chunks(),
            "vectors_written": summary.vectors_written(),
            "failed_batches": summary.failed_batches(),
            "runs": summary.runs,
            "duration_ms": summary.duration_ms,
        });
        self.render(&json)
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "embedding": {
                "url": status.embedding_url,
                "model": status.embedding_model,
            },
            "vector_store": {
                "url": status.vector_store_url,
                "connected": status.vector_store_connected,
                "collection": status.collection,
                "points": status.vector_store_points,
            }
        });
        self.render(&json)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({ "message": message }).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({ "error": error }).to_string()
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
    }
}
