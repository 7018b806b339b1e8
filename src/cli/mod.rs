//! CLI module for the document pre-processing pipeline.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Chunk, embed, and persist document text for similarity search.
#[derive(Debug, Parser)]
#[command(name = "docprep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(long, short = 'f', global = true, help = "Output format: text or json")]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest a text file or directory into the vector store
    Ingest(commands::IngestArgs),

    /// Check embedding service and vector store status
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}
