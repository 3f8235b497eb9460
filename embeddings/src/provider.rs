//! Embedding providers.
//!
//! The engine talks to a local text-to-vector service. Every failure at this
//! boundary is reported as [`EmbeddingError::Unavailable`]; retrying is the
//! caller's decision.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Embedding;
use crate::config::ProviderConfig;
use crate::error::{EmbeddingError, Result};

/// Request for generating an embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Text to embed.
    pub text: String,

    /// Model to use (provider-specific).
    pub model: Option<String>,
}

impl EmbeddingRequest {
    /// Create a new embedding request.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: None,
        }
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Response from embedding generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The generated embedding, as returned by the model.
    pub embedding: Embedding,

    /// Model used to generate the embedding.
    pub model: String,

    /// Dimension of the embedding.
    pub dimension: usize,
}

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the default embedding dimension.
    fn default_dimension(&self) -> usize;

    /// Generate an embedding for the given text. One attempt, no retries.
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Check if the provider is usable at all.
    fn is_available(&self) -> bool;
}

/// Client for an Ollama-compatible `/api/embeddings` endpoint.
pub struct OllamaProvider {
    /// HTTP client with the request timeout applied.
    client: reqwest::Client,

    /// Service configuration.
    config: ProviderConfig,
}

impl OllamaProvider {
    /// Create a provider from configuration.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(EmbeddingError::Config("base_url is empty".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| EmbeddingError::Config(format!("failed to build http client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/embeddings", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    fn default_model(&self) -> &str {
        &self.config.model
    }

    fn default_dimension(&self) -> usize {
        self.config.dimension.unwrap_or(crate::DEFAULT_DIMENSION)
    }

    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let model = request.model.unwrap_or_else(|| self.config.model.clone());

        debug!("Generating embedding with model: {model}");

        let body = OllamaEmbeddingRequest {
            model: &model,
            prompt: &request.text,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Unavailable(format!(
                        "request timed out after {}s",
                        self.config.timeout_secs
                    ))
                } else {
                    EmbeddingError::Unavailable(format!("request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!("Embedding service returned {status}: {error_text}");
            return Err(EmbeddingError::Unavailable(format!(
                "service returned {status}"
            )));
        }

        let result: OllamaEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Unavailable(format!("malformed response: {e}")))?;

        let embedding = result.embedding.ok_or_else(|| {
            EmbeddingError::Unavailable("response has no embedding field".to_string())
        })?;

        if embedding.is_empty() {
            return Err(EmbeddingError::Unavailable(
                "service returned an empty embedding".to_string(),
            ));
        }

        if let Some(expected) = self.config.dimension {
            if embedding.len() != expected {
                return Err(EmbeddingError::Unavailable(format!(
                    "expected {expected} dimensions from {model}, got {}",
                    embedding.len()
                )));
            }
        }

        let dimension = embedding.len();
        debug!("Generated embedding with {dimension} dimensions");

        Ok(EmbeddingResponse {
            embedding,
            model,
            dimension,
        })
    }

    fn is_available(&self) -> bool {
        !self.config.model.is_empty()
    }
}

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Option<Vec<f32>>,
}
