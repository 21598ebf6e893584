//! Cohere embedding provider using the Cohere v2 embed API.
//!
//! This module is only available when the `cohere` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// The Cohere v2 embed endpoint.
const COHERE_EMBED_URL: &str = "https://api.cohere.com/v2/embed";

/// The default Cohere embedding model.
const DEFAULT_MODEL: &str = "embed-english-v3.0";

/// The dimensionality of `embed-english-v3.0` vectors.
const DEFAULT_DIMENSIONS: usize = 1024;

/// The input role sent with embed requests.
///
/// Cohere embeds documents and queries into the same space but asks callers
/// to label which side of the retrieval a text belongs to.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    /// Text that will be stored and retrieved.
    SearchDocument,
    /// A query used to search stored documents.
    SearchQuery,
}

/// An [`EmbeddingProvider`] backed by the Cohere embed API.
///
/// Uses `reqwest` to call `/v2/embed` directly; batching is native.
///
/// # Configuration
///
/// - `model` — defaults to `embed-english-v3.0`.
/// - `input_type` — defaults to [`InputType::SearchDocument`]; use
///   [`InputType::SearchQuery`] for the retriever side.
/// - `api_key` — from the constructor or the `COHERE_API_KEY` environment
///   variable.
///
/// # Example
///
/// ```rust,ignore
/// use ragline::cohere::CohereEmbeddingProvider;
///
/// let provider = CohereEmbeddingProvider::from_env()?;
/// let embedding = provider.embed("hello world").await?;
/// ```
pub struct CohereEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    input_type: InputType,
    dimensions: usize,
}

impl CohereEmbeddingProvider {
    /// Create a new provider with the given API key and default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Embedding(
                "Cohere: API key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            input_type: InputType::SearchDocument,
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Create a new provider using the `COHERE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("COHERE_API_KEY").map_err(|_| {
            RagError::Embedding("Cohere: COHERE_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the input role sent with requests.
    pub fn with_input_type(mut self, input_type: InputType) -> Self {
        self.input_type = input_type;
        self
    }

    /// Override the expected output dimensionality (for models other than
    /// the default).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }
}

// ── Cohere API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    texts: Vec<&'a str>,
    input_type: InputType,
    embedding_types: [&'a str; 1],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Embeddings,
}

#[derive(Deserialize)]
struct Embeddings {
    float: Vec<Vec<f32>>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for CohereEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vectors = self.embed_batch(&[text]).await?;
        vectors
            .into_iter()
            .next()
            .ok_or_else(|| RagError::Embedding("Cohere: API returned empty response".to_string()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "Cohere", batch_size = texts.len(), model = %self.model, "embedding batch");

        let request_body = EmbedRequest {
            model: &self.model,
            texts: texts.to_vec(),
            input_type: self.input_type,
            embedding_types: ["float"],
        };

        let response = self
            .client
            .post(COHERE_EMBED_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Cohere", error = %e, "request failed");
                RagError::Embedding(format!("Cohere: request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or(body);

            error!(provider = "Cohere", %status, "API error");
            return Err(RagError::Embedding(format!("Cohere: API returned {status}: {detail}")));
        }

        let embed_response: EmbedResponse = response.json().await.map_err(|e| {
            error!(provider = "Cohere", error = %e, "failed to parse response");
            RagError::Embedding(format!("Cohere: failed to parse response: {e}"))
        })?;

        Ok(embed_response.embeddings.float)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
