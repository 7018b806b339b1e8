mod chunker;
mod embedding;
mod persistence;
mod pipeline;
mod tokenizer;
mod vectorizer;

pub mod vector_store;

pub use chunker::TokenChunker;
pub use embedding::{Embedder, EmbeddingClient};
pub use persistence::PersistenceBatcher;
pub use pipeline::IngestionPipeline;
pub use tokenizer::{Cl100kTokenizer, TokenCodec};
pub use vector_store::{CollectionInfo, QdrantBackend, VectorStore, create_backend};
pub use vectorizer::BatchVectorizer;
