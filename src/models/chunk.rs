use serde::{Deserialize, Serialize};

/// A token-bounded window of the source text.
///
/// `start_token` and `end_token` index into the document's token stream as a
/// half-open range; consecutive chunks share `overlap` tokens, so for every
/// chunk after the first, `start_token == previous.end_token - overlap`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub start_token: usize,
    pub end_token: usize,
}

impl Chunk {
    /// Number of tokens covered by this chunk.
    pub fn token_len(&self) -> usize {
        self.end_token - self.start_token
    }
}

/// The complete output of one chunking operation.
///
/// Chunks are in source order and their token ranges cover
/// `[0, total_tokens)` without gaps. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkResult {
    pub chunks: Vec<Chunk>,
    pub total_tokens: usize,
    pub chunk_count: usize,
}

impl ChunkResult {
    pub fn new(chunks: Vec<Chunk>, total_tokens: usize) -> Self {
        let chunk_count = chunks.len();
        Self {
            chunks,
            total_tokens,
            chunk_count,
        }
    }

}
