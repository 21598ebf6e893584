//! Top-k similarity retrieval.

use std::sync::Arc;

use tracing::info;

use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::retry::call_bounded;
use crate::vectorstore::VectorStore;

/// Embeds a query and runs a nearest-neighbor search against a collection.
///
/// The query embedding and the index search are strictly sequential — the
/// search needs the vector. Results come back in the index's native ranking
/// order, highest similarity first, at most `k` of them. An absent or empty
/// collection yields an empty result.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    config: RagConfig,
}

impl Retriever {
    /// Create a retriever over the given gateway and store.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        config: RagConfig,
    ) -> Self {
        Self { embedder, store, config }
    }

    /// Return the top `k` chunks of `collection` most similar to `query`.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidConfiguration`] if `k` is zero.
    /// - [`RagError::QueryEmbedding`] if the query cannot be embedded.
    /// - [`RagError::Search`] if the index query fails.
    pub async fn retrieve(
        &self,
        query: &str,
        collection: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Err(RagError::InvalidConfiguration(
                "k must be greater than zero".to_string(),
            ));
        }

        let timeout = self.config.call_timeout;
        let attempts = self.config.retry_attempts;

        let query_embedding = call_bounded(
            attempts,
            timeout,
            || self.embedder.embed(query),
            || RagError::QueryEmbedding(format!("gateway call timed out after {timeout:?}")),
        )
        .await
        .map_err(|e| match e {
            e @ RagError::QueryEmbedding(_) => e,
            other => RagError::QueryEmbedding(other.to_string()),
        })?;

        let results = call_bounded(
            attempts,
            timeout,
            || self.store.search(collection, &query_embedding, k),
            || RagError::Search(format!("index query timed out after {timeout:?}")),
        )
        .await
        .map_err(|e| match e {
            e @ RagError::Search(_) => e,
            other => RagError::Search(other.to_string()),
        })?;

        info!(collection, k, result_count = results.len(), "retrieved context");
        Ok(results)
    }

    /// Retrieve with the configured default `top_k`.
    pub async fn retrieve_default(
        &self,
        query: &str,
        collection: &str,
    ) -> Result<Vec<SearchResult>> {
        self.retrieve(query, collection, self.config.top_k).await
    }
}
