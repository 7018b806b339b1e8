//! Token-bounded chunking with overlapping windows.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::{ChunkError, ValidationError};
use crate::models::{Chunk, ChunkResult};
use crate::services::TokenCodec;

/// Splits text into overlapping token windows and restores per-window text.
///
/// Window boundaries are computed sequentially (each start depends on the
/// previous end), but window decoding is independent and runs on the shared
/// worker pool; the result is reassembled in window order no matter which
/// task finishes first.
pub struct TokenChunker {
    tokenizer: Arc<dyn TokenCodec>,
    workers: Arc<Semaphore>,
}

impl TokenChunker {
    pub fn new(tokenizer: Arc<dyn TokenCodec>, workers: Arc<Semaphore>) -> Self {
        Self { tokenizer, workers }
    }

    /// Chunk `text` into windows of at most `max_tokens` tokens, consecutive
    /// windows sharing `overlap` tokens.
    ///
    /// The union of window ranges covers the whole token stream with no gaps;
    /// only the final window may be shorter than `max_tokens`. Because each
    /// window is decoded independently, chunk text at window seams may show
    /// minor token-boundary artifacts relative to the original formatting;
    /// the token ranges are exact.
    ///
    /// Fails with a [`ValidationError`] before any tokenization when the
    /// parameters or input are unusable, and aborts without partial output if
    /// any window fails to decode.
    pub async fn chunk(
        &self,
        text: &str,
        max_tokens: usize,
        overlap: usize,
    ) -> Result<ChunkResult, ChunkError> {
        if max_tokens == 0 {
            return Err(ValidationError::ZeroMaxTokens.into());
        }
        if overlap >= max_tokens {
            return Err(ValidationError::OverlapTooLarge {
                overlap,
                max_tokens,
            }
            .into());
        }
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyInput.into());
        }

        let tokens = Arc::new(self.tokenizer.encode(text)?);
        let total_tokens = tokens.len();
        if total_tokens == 0 {
            return Err(ValidationError::EmptyInput.into());
        }

        let windows = plan_windows(total_tokens, max_tokens, overlap);
        tracing::debug!(
            total_tokens,
            windows = windows.len(),
            max_tokens,
            overlap,
            "chunking document"
        );

        let mut handles = Vec::with_capacity(windows.len());
        for (index, &(start, end)) in windows.iter().enumerate() {
            let tokens = Arc::clone(&tokens);
            let tokenizer = Arc::clone(&self.tokenizer);
            let workers = Arc::clone(&self.workers);
            handles.push(tokio::spawn(async move {
                let _permit = workers
                    .acquire_owned()
                    .await
                    .map_err(|e| ChunkError::Worker(e.to_string()))?;
                tokenizer
                    .decode(&tokens[start..end])
                    .map_err(|source| ChunkError::Decode { index, source })
            }));
        }

        // Join in spawn order so chunks land at their window index
        let mut chunks = Vec::with_capacity(windows.len());
        for (handle, (start, end)) in handles.into_iter().zip(windows) {
            let text = handle
                .await
                .map_err(|e| ChunkError::Worker(e.to_string()))??;
            chunks.push(Chunk {
                text,
                start_token: start,
                end_token: end,
            });
        }

        Ok(ChunkResult::new(chunks, total_tokens))
    }
}

/// Compute half-open window ranges over a stream of `total` tokens.
fn plan_windows(total: usize, max_tokens: usize, overlap: usize) -> Vec<(usize, usize)> {
    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + max_tokens).min(total);
        windows.push((start, end));
        if end == total {
            break;
        }
        start = end - overlap;
    }
    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodingError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Deterministic test codec: one token per whitespace-separated word.
    struct WordCodec {
        words: Mutex<Vec<String>>,
        encode_calls: AtomicUsize,
    }

    impl WordCodec {
        fn new() -> Self {
            Self {
                words: Mutex::new(Vec::new()),
                encode_calls: AtomicUsize::new(0),
            }
        }
    }

    impl TokenCodec for WordCodec {
        fn encode(&self, text: &str) -> Result<Vec<u32>, EncodingError> {
            self.encode_calls.fetch_add(1, Ordering::SeqCst);
            let mut words = self.words.lock().unwrap();
            Ok(text
                .split_whitespace()
                .map(|word| {
                    if let Some(id) = words.iter().position(|w| w == word) {
                        id as u32
                    } else {
                        words.push(word.to_string());
                        (words.len() - 1) as u32
                    }
                })
                .collect())
        }

        fn decode(&self, tokens: &[u32]) -> Result<String, EncodingError> {
            let words = self.words.lock().unwrap();
            Ok(tokens
                .iter()
                .map(|&id| words[id as usize].as_str())
                .collect::<Vec<_>>()
                .join(" "))
        }
    }

    /// Codec whose decode fails for any span containing the poison token.
    struct PoisonCodec {
        inner: WordCodec,
        poison: u32,
    }

    impl TokenCodec for PoisonCodec {
        fn encode(&self, text: &str) -> Result<Vec<u32>, EncodingError> {
            self.inner.encode(text)
        }

        fn decode(&self, tokens: &[u32]) -> Result<String, EncodingError> {
            if tokens.contains(&self.poison) {
                return Err(EncodingError::Decode("invalid utf-8 boundary".into()));
            }
            self.inner.decode(tokens)
        }
    }

    fn chunker_with(codec: Arc<dyn TokenCodec>) -> TokenChunker {
        TokenChunker::new(codec, Arc::new(Semaphore::new(4)))
    }

    fn numbered_words(n: usize) -> String {
        (0..n)
            .map(|i| format!("w{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[tokio::test]
    async fn short_input_yields_single_chunk() {
        let chunker = chunker_with(Arc::new(WordCodec::new()));
        let result = chunker.chunk("just a few words here", 500, 20).await.unwrap();

        assert_eq!(result.chunk_count, 1);
        assert_eq!(result.total_tokens, 5);
        assert_eq!(result.chunks[0].start_token, 0);
        assert_eq!(result.chunks[0].end_token, 5);
        assert_eq!(result.chunks[0].text, "just a few words here");
    }

    #[tokio::test]
    async fn windows_overlap_and_cover_the_stream() {
        let chunker = chunker_with(Arc::new(WordCodec::new()));
        let text = numbered_words(1100);
        let result = chunker.chunk(&text, 500, 20).await.unwrap();

        let ranges: Vec<(usize, usize)> = result
            .chunks
            .iter()
            .map(|c| (c.start_token, c.end_token))
            .collect();
        assert_eq!(ranges, vec![(0, 500), (480, 980), (960, 1100)]);
        assert_eq!(result.chunk_count, 3);
        assert_eq!(result.total_tokens, 1100);

        // Constant overlap between consecutive windows, full coverage
        for pair in result.chunks.windows(2) {
            assert_eq!(pair[1].start_token, pair[0].end_token - 20);
        }
        assert_eq!(result.chunks.first().unwrap().start_token, 0);
        assert_eq!(result.chunks.last().unwrap().end_token, 1100);
    }

    #[tokio::test]
    async fn chunk_texts_match_their_token_ranges() {
        let chunker = chunker_with(Arc::new(WordCodec::new()));
        let text = numbered_words(1100);
        let result = chunker.chunk(&text, 500, 20).await.unwrap();

        assert!(result.chunks[0].text.starts_with("w0 w1 "));
        assert!(result.chunks[0].text.ends_with(" w499"));
        assert!(result.chunks[1].text.starts_with("w480 "));
        assert!(result.chunks[2].text.ends_with(" w1099"));
    }

    #[tokio::test]
    async fn chunk_count_matches_closed_form() {
        let chunker = chunker_with(Arc::new(WordCodec::new()));

        for (total, max_tokens, overlap) in [(1100, 500, 20), (1000, 100, 10), (251, 50, 0)] {
            let text = numbered_words(total);
            let result = chunker.chunk(&text, max_tokens, overlap).await.unwrap();
            let expected = (total - overlap).div_ceil(max_tokens - overlap);
            assert_eq!(
                result.chunk_count, expected,
                "total={total} max={max_tokens} overlap={overlap}"
            );
        }
    }

    #[tokio::test]
    async fn empty_input_is_rejected() {
        let chunker = chunker_with(Arc::new(WordCodec::new()));
        let err = chunker.chunk("   \n  ", 500, 20).await.unwrap_err();
        assert!(matches!(
            err,
            ChunkError::Validation(ValidationError::EmptyInput)
        ));
        assert_eq!(err.to_string(), "Input text cannot be empty");
    }

    #[tokio::test]
    async fn bad_parameters_fail_before_tokenization() {
        let codec = Arc::new(WordCodec::new());
        let chunker = chunker_with(codec.clone());

        let err = chunker.chunk("some text", 100, 100).await.unwrap_err();
        assert!(matches!(
            err,
            ChunkError::Validation(ValidationError::OverlapTooLarge {
                overlap: 100,
                max_tokens: 100
            })
        ));

        let err = chunker.chunk("some text", 0, 0).await.unwrap_err();
        assert!(matches!(
            err,
            ChunkError::Validation(ValidationError::ZeroMaxTokens)
        ));

        assert_eq!(codec.encode_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn decode_failure_aborts_without_partial_result() {
        let codec = PoisonCodec {
            inner: WordCodec::new(),
            poison: 7,
        };
        let chunker = chunker_with(Arc::new(codec));
        let text = numbered_words(20);

        let err = chunker.chunk(&text, 5, 0).await.unwrap_err();
        assert!(matches!(err, ChunkError::Decode { index: 1, .. }));
    }

    #[tokio::test]
    async fn planned_windows_stop_exactly_at_stream_end() {
        assert_eq!(plan_windows(500, 500, 20), vec![(0, 500)]);
        assert_eq!(plan_windows(501, 500, 20), vec![(0, 500), (480, 501)]);
        assert_eq!(plan_windows(3, 500, 20), vec![(0, 3)]);
    }
}
