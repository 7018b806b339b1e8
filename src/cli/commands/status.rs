use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::create_backend;

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let (vector_store_connected, vector_store_points) =
        if let Ok(store) = create_backend(&config.vector_store) {
            let connected = store.health_check().await.unwrap_or(false);
            let points = if connected {
                store
                    .collection_info()
                    .await
                    .ok()
                    .flatten()
                    .map_or(0, |info| info.points_count)
            } else {
                0
            };
            (connected, points)
        } else {
            (false, 0)
        };

    let status = StatusInfo {
        embedding_url: config.embedding.url.clone(),
        embedding_model: config.embedding.model.clone(),
        vector_store_url: config.vector_store.url.clone(),
        vector_store_connected,
        vector_store_points,
        collection: config.vector_store.collection.clone(),
    };

    print!("{}", formatter.format_status(&status));

    if !vector_store_connected {
        eprintln!();
        eprintln!("Warning: vector store not reachable at {}.", config.vector_store.url);
        eprintln!("         Check the [vector_store] section of the config.");
    }
    if config.embedding.api_key.is_none() {
        eprintln!("Hint: OPENAI_API_KEY is not set; ingestion will fail to authenticate.");
    }

    Ok(())
}
