mod config;
mod ingest;
mod status;

pub use config::{ConfigCommand, handle_config};
pub use ingest::{IngestArgs, handle_ingest};
pub use status::handle_status;
