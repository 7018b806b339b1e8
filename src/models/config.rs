use serde::{Deserialize, Serialize};

pub const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-large";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_COLLECTION: &str = "document-text-embeddings";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("docprep").join("config.toml"))
    }

    /// Load the config file if present, falling back to defaults, then apply
    /// environment overrides for secrets.
    pub fn load() -> Result<Self, crate::error::ConfigError> {
        let mut config = if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        // Secrets come from the environment, never the config file
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.embedding.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("QDRANT_API_KEY") {
            config.vector_store.api_key = Some(key);
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<(), crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Keys are env-only; strip them so `init` never writes a secret
        let mut on_disk = self.clone();
        on_disk.embedding.api_key = None;
        on_disk.vector_store.api_key = None;

        let content = toml::to_string_pretty(&on_disk)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

/// Token windowing parameters for the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum tokens per chunk.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    /// Overlapping tokens between consecutive chunks.
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_max_tokens() -> usize {
    500
}

fn default_overlap() -> usize {
    20
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            overlap: default_overlap(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Bearer token for the embedding service; resolved from
    /// `OPENAI_API_KEY` at load time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Texts per embedding request.
    #[serde(default = "default_embed_batch_size")]
    pub batch_size: usize,

    /// Attempt budget for transient service failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_embed_batch_size() -> usize {
    64
}

fn default_max_retries() -> u32 {
    3
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_embedding_model(),
            api_key: None,
            timeout_secs: default_timeout(),
            batch_size: default_embed_batch_size(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Vector dimension of the collection; must match the embedding model.
    #[serde(default = "default_dimension")]
    pub dimension: u64,

    /// Records per upsert request, sized to stay under the store's payload
    /// limit.
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_dimension() -> u64 {
    // text-embedding-3-large
    3072
}

fn default_upsert_batch_size() -> usize {
    100
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection: default_collection(),
            api_key: None,
            dimension: default_dimension(),
            upsert_batch_size: default_upsert_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Cap on concurrent decode/embedding tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Largest document accepted by the ingest surface, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_concurrency() -> usize {
    4
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            max_file_size: default_max_file_size(),
        }
    }
}
