
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use crate::config::OpenAiConfig;

/// Dimension assumed for embedding vectors when the provider or index does
/// not report one. Matches `text-embedding-ada-002`.
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 1536;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Client for the OpenAI embeddings endpoint.
///
/// Network and HTTP failures surface as errors; responses that decode but do
/// not carry a usable embedding degrade to `None` instead. Callers rely on
/// that distinction to tell "the call failed" apart from "the call succeeded
/// but the payload was not embeddable".
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    api_base: Url,
    api_key: String,
    model: String,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: EmbeddingInput<'a>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum EmbeddingInput<'a> {
    Single(&'a str),
    Batch(&'a [String]),
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
}

impl OpenAiClient {
    #[inline]
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let api_base = config
            .api_base_url()
            .context("Failed to build OpenAI base URL from config")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            api_base,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Embed a single text. Returns `None` when the provider responds
    /// successfully but without an embedding.
    #[inline]
    pub fn embed_one(&self, text: &str) -> Result<Option<Vec<f32>>> {
        debug!("Requesting embedding for text (length: {})", text.len());

        let request = EmbeddingRequest {
            model: &self.model,
            input: EmbeddingInput::Single(text),
        };

        let response = self.send_embedding_request(&request)?;

        let embedding = response.data.into_iter().next().and_then(|d| d.embedding);
        if embedding.is_none() {
            warn!("Embedding response carried no usable embedding");
        }

        Ok(embedding)
    }

    /// Embed a list of texts with one batched request.
    ///
    /// The result is index-aligned with `texts`. If any entry of the response
    /// lacks an embedding the whole batch degrades to `None` — partial
    /// success is not reported at this layer.
    #[inline]
    pub fn embed_many(&self, texts: &[String]) -> Result<Option<Vec<Vec<f32>>>> {
        if texts.is_empty() {
            return Ok(Some(Vec::new()));
        }

        debug!("Requesting embeddings for {} texts", texts.len());

        let request = EmbeddingRequest {
            model: &self.model,
            input: EmbeddingInput::Batch(texts),
        };

        let response = self.send_embedding_request(&request)?;

        if response.data.is_empty() {
            warn!("Embedding response carried no data entries");
            return Ok(None);
        }

        let mut vectors = Vec::with_capacity(response.data.len());
        for entry in response.data {
            match entry.embedding {
                Some(values) => vectors.push(values),
                None => {
                    warn!("Embedding response entry lacked an embedding; dropping batch");
                    return Ok(None);
                }
            }
        }

        debug!("Received {} embeddings", vectors.len());
        Ok(Some(vectors))
    }

    fn send_embedding_request(&self, request: &EmbeddingRequest<'_>) -> Result<EmbeddingResponse> {
        let url = self
            .api_base
            .join("/v1/embeddings")
            .context("Failed to build embeddings URL")?;

        let request_json =
            serde_json::to_string(request).context("Failed to serialize embedding request")?;

        let response_text = self
            .make_request_with_retry(|| {
                self.agent
                    .post(url.as_str())
                    .header("Authorization", &format!("Bearer {}", self.api_key))
                    .header("Content-Type", "application/json")
                    .send(&request_json)
                    .and_then(|mut resp| resp.body_mut().read_to_string())
            })
            .context("Embedding request failed")?;

        serde_json::from_str(&response_text).context("Failed to parse embedding response")
    }

    fn make_request_with_retry<F>(&self, mut request_fn: F) -> Result<String>
    where
        F: FnMut() -> Result<String, ureq::Error>,
    {
        let mut last_error = None;

        for attempt in 1..=self.retry_attempts {
            debug!("HTTP request attempt {}/{}", attempt, self.retry_attempts);

            match request_fn() {
                Ok(response_text) => {
                    debug!("Request succeeded on attempt {}", attempt);
                    return Ok(response_text);
                }
                Err(error) => {
                    let should_retry = match &error {
                        ureq::Error::StatusCode(status) => {
                            if *status >= 500 {
                                warn!(
                                    "Server error (status {}), attempt {}/{}",
                                    status, attempt, self.retry_attempts
                                );
                                true
                            } else {
                                warn!("Client error (status {}), not retrying", status);
                                return Err(anyhow::anyhow!("Client error: HTTP {}", status));
                            }
                        }
                        ureq::Error::ConnectionFailed
                        | ureq::Error::HostNotFound
                        | ureq::Error::Timeout(_)
                        | ureq::Error::Io(_) => {
                            warn!(
                                "Transport error: {}, attempt {}/{}",
                                error, attempt, self.retry_attempts
                            );
                            true
                        }
                        _ => {
                            warn!("Non-retryable error: {}", error);
                            false
                        }
                    };

                    if !should_retry {
                        return Err(anyhow::anyhow!("Non-retryable error: {}", error));
                    }

                    last_error = Some(anyhow::anyhow!("Request error: {}", error));

                    if attempt < self.retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        let delay = Duration::from_millis(delay_ms);
                        debug!("Waiting {:?} before retry", delay);
                        std::thread::sleep(delay);
                    }
                }
            }
        }

        error!("All retry attempts failed for request to {}", self.api_base);

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
    }
}
