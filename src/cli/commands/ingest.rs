//! Ingest command implementation.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

use crate::cli::output::{IngestSummary, get_formatter};
use crate::models::{Config, OutputFormat, RunMetadata};
use crate::services::{Cl100kTokenizer, EmbeddingClient, IngestionPipeline, create_backend};
use crate::utils::file::{calculate_checksum, is_text_file, read_file_content};

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Text file or directory of text files to ingest
    #[arg(required = true)]
    pub path: PathBuf,

    /// Company name recorded in each vector's metadata
    #[arg(long, short = 'c')]
    pub company: Option<String>,

    /// Document name override (defaults to the file name)
    #[arg(long)]
    pub document_name: Option<String>,

    /// Maximum tokens per chunk (overrides config)
    #[arg(long)]
    pub max_tokens: Option<usize>,

    /// Overlapping tokens between chunks (overrides config)
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Texts per embedding request (overrides config)
    #[arg(long)]
    pub embed_batch_size: Option<usize>,

    /// Records per upsert request (overrides config)
    #[arg(long)]
    pub upsert_batch_size: Option<usize>,

    /// Show what would be ingested without calling any service
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn handle_ingest(args: IngestArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let mut config = Config::load()?;
    if let Some(max_tokens) = args.max_tokens {
        config.chunking.max_tokens = max_tokens;
    }
    if let Some(overlap) = args.overlap {
        config.chunking.overlap = overlap;
    }
    if let Some(batch_size) = args.embed_batch_size {
        config.embedding.batch_size = batch_size;
    }
    if let Some(batch_size) = args.upsert_batch_size {
        config.vector_store.upsert_batch_size = batch_size;
    }

    let formatter = get_formatter(format);
    let started = Instant::now();

    let path = args.path.canonicalize().context("invalid path")?;
    let files = collect_files(&path)?;

    if files.is_empty() {
        println!("{}", formatter.format_message("No files found to ingest."));
        return Ok(());
    }

    if verbose {
        println!("Found {} file(s) to process", files.len());
    }

    if args.dry_run {
        println!(
            "{}",
            formatter.format_message(&format!("Dry run: would ingest {} file(s)", files.len()))
        );
        for file in &files {
            println!("  {}", file.display());
        }
        return Ok(());
    }

    let tokenizer = Arc::new(Cl100kTokenizer::new()?);
    let embedder = Arc::new(EmbeddingClient::new(&config.embedding)?);
    let store = create_backend(&config.vector_store)?;
    let pipeline = IngestionPipeline::new(&config, tokenizer, embedder, store);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut summary = IngestSummary {
        files_scanned: files.len() as u64,
        ..Default::default()
    };

    for file_path in &files {
        pb.inc(1);

        if !is_text_file(file_path) {
            summary.files_skipped += 1;
            continue;
        }

        let content = match read_file_content(file_path, config.pipeline.max_file_size) {
            Ok(c) => c,
            Err(e) => {
                if verbose {
                    pb.println(format!("Skipping {}: {}", file_path.display(), e));
                }
                summary.files_skipped += 1;
                continue;
            }
        };

        let document_name = args.document_name.clone().unwrap_or_else(|| {
            file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| file_path.to_string_lossy().to_string())
        });

        let mut metadata =
            RunMetadata::new(document_name).with_checksum(calculate_checksum(&content));
        if let Some(ref company) = args.company {
            metadata = metadata.with_company(company.clone());
        }

        match pipeline.run(&content, metadata).await {
            Ok(result) => {
                summary.files_ingested += 1;
                summary.runs.push(result);
            }
            Err(e) => {
                pb.println(format!("Failed {}: {}", file_path.display(), e));
                summary.files_skipped += 1;
            }
        }
    }

    pb.finish_and_clear();
    summary.duration_ms = started.elapsed().as_millis() as u64;
    print!("{}", formatter.format_ingest_summary(&summary));

    Ok(())
}

fn collect_files(path: &PathBuf) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        files.push(path.clone());
        return Ok(files);
    }

    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry.context("failed to read directory entry")?;
        if entry.path().is_file() {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
