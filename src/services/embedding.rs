//! Embedding client for an OpenAI-compatible embeddings endpoint.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;
use crate::utils::retry::{RetryOutcome, RetryPolicy, with_retry};

/// Turns an ordered batch of texts into an ordered batch of vectors.
///
/// Output is position-for-position aligned with input and has the same
/// length; implementations must fail rather than truncate or pad.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Request body for the `/embeddings` endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

/// Response from the `/embeddings` endpoint.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
    index: usize,
}

/// HTTP client for the external embedding service.
///
/// Issues one request per batch with a bounded timeout. Transient failures
/// (rate limiting, 5xx, connect/timeout) are retried with exponential
/// backoff; anything else fails immediately with the cause attached.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    endpoint: String,
    model: String,
    retry: RetryPolicy,
}

impl EmbeddingClient {
    /// Create a new embedding client with the given configuration.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref api_key) = config.api_key {
            let auth = format!("Bearer {}", api_key.trim());
            let value = HeaderValue::from_str(&auth)
                .map_err(|e| EmbeddingError::ConnectionError(format!("invalid api key: {e}")))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", config.url.trim_end_matches('/')),
            model: config.model.clone(),
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    /// Override the retry policy, mainly to shorten delays in tests.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Issue a single embeddings request without retrying.
    async fn request_embeddings(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(EmbeddingError::ServerError { status, message });
        }

        let mut parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        // The service reports each vector's input position; restore input order
        parsed.data.sort_by_key(|entry| entry.index);

        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                actual: parsed.data.len(),
            });
        }

        Ok(parsed.data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        match with_retry(&self.retry, || self.request_embeddings(texts)).await {
            RetryOutcome::Success(vectors) => Ok(vectors),
            RetryOutcome::Failed {
                last_error,
                attempts,
            } => {
                tracing::warn!(attempts, error = %last_error, "embedding request failed");
                Err(last_error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer, max_retries: u32) -> EmbeddingClient {
        let config = EmbeddingConfig {
            url: server.base_url(),
            model: "text-embedding-3-large".to_string(),
            api_key: Some("test-key".to_string()),
            timeout_secs: 5,
            max_retries,
            ..Default::default()
        };
        EmbeddingClient::new(&config).unwrap().with_retry_policy(
            RetryPolicy::new(max_retries).with_base_delay(Duration::from_millis(5)),
        )
    }

    #[tokio::test]
    async fn restores_input_order_from_response_indices() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(json!({
                    "data": [
                        { "embedding": [2.0], "index": 1 },
                        { "embedding": [1.0], "index": 0 },
                    ]
                }));
            })
            .await;

        let client = client_for(&server, 3);
        let vectors = client
            .embed(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(vectors, vec![vec![1.0], vec![2.0]]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn retries_server_errors_until_budget_is_spent() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(503).body("service unavailable");
            })
            .await;

        let client = client_for(&server, 3);
        let err = client.embed(&["text".to_string()]).await.unwrap_err();

        assert!(matches!(
            err,
            EmbeddingError::ServerError { status: 503, .. }
        ));
        assert_eq!(mock.hits_async().await, 3);
    }

    #[tokio::test]
    async fn client_errors_fail_without_retry() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(401).body("invalid api key");
            })
            .await;

        let client = client_for(&server, 3);
        let err = client.embed(&["text".to_string()]).await.unwrap_err();

        assert!(matches!(
            err,
            EmbeddingError::ServerError { status: 401, .. }
        ));
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn count_mismatch_is_a_contract_violation() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(json!({
                    "data": [ { "embedding": [1.0], "index": 0 } ]
                }));
            })
            .await;

        let client = client_for(&server, 3);
        let err = client
            .embed(&["one".to_string(), "two".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EmbeddingError::CountMismatch {
                expected: 2,
                actual: 1
            }
        ));
        // Contract violations are terminal, not retried
        assert_eq!(mock.hits_async().await, 1);
    }

    #[tokio::test]
    async fn empty_batch_short_circuits() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/embeddings");
                then.status(200).json_body(json!({ "data": [] }));
            })
            .await;

        let client = client_for(&server, 3);
        let vectors = client.embed(&[]).await.unwrap();

        assert!(vectors.is_empty());
        assert_eq!(mock.hits_async().await, 0);
    }
}
