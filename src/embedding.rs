//! Embedding gateway trait.

use async_trait::async_trait;

use crate::error::Result;

/// A gateway that maps text to fixed-dimension embedding vectors.
///
/// Implementations wrap a specific embedding backend (Cohere, OpenAI, a
/// local model) behind a narrow async interface so that the ingestor and
/// retriever can be handed test doubles. The default
/// [`embed_batch`](EmbeddingProvider::embed_batch) calls
/// [`embed`](EmbeddingProvider::embed) once per input; backends with a
/// native batch endpoint should override it.
///
/// Every vector returned must have exactly
/// [`dimensions()`](EmbeddingProvider::dimensions) components — the pipeline
/// treats a mismatch as a fatal configuration problem for the document or
/// query at hand, not a retryable fault.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving input order and length.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// The dimensionality of every vector this provider produces.
    fn dimensions(&self) -> usize;
}
