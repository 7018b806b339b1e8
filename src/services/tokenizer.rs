//! Tokenizer adapter over the `cl100k_base` byte-pair encoding.

use tiktoken_rs::{CoreBPE, cl100k_base};

use crate::error::EncodingError;

/// Encode/decode between text and token ids.
///
/// Implementations hold no mutable state, so one handle can be shared across
/// concurrent tasks. Chunk sizes and overlaps are measured in these tokens.
pub trait TokenCodec: Send + Sync {
    /// Tokenize text into its id stream. Deterministic for a fixed encoding.
    fn encode(&self, text: &str) -> Result<Vec<u32>, EncodingError>;

    /// Restore text from a token subsequence.
    ///
    /// Fails when the span does not decode to valid UTF-8, which can happen
    /// for an arbitrary slice of a longer stream.
    fn decode(&self, tokens: &[u32]) -> Result<String, EncodingError>;
}

/// `cl100k_base` tokenizer, the encoding used by OpenAI embedding models.
pub struct Cl100kTokenizer {
    bpe: CoreBPE,
}

impl Cl100kTokenizer {
    pub fn new() -> Result<Self, EncodingError> {
        let bpe = cl100k_base().map_err(|e| EncodingError::Load(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl TokenCodec for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>, EncodingError> {
        Ok(self.bpe.encode_ordinary(text))
    }

    fn decode(&self, tokens: &[u32]) -> Result<String, EncodingError> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| EncodingError::Decode(e.to_string()))
    }
}
