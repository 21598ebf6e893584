//! Vector index trait.

use async_trait::async_trait;

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// A storage backend holding named collections of embedded chunks and
/// answering nearest-neighbor queries.
///
/// Collections come into existence on the first successful upsert, sized to
/// the dimension of the first inserted vector; this core never deletes them.
/// Implementations must tolerate concurrent upserts and searches, including
/// to the same collection.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upsert chunks into a collection, creating the collection on first use
    /// with the dimension of the first chunk's embedding.
    ///
    /// Upserting a chunk whose ID already exists overwrites the stored entry.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Store`](crate::RagError::Store) on a dimension
    /// mismatch or a backend failure.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Return the `top_k` chunks most similar to `embedding`, in the index's
    /// native ranking order (highest similarity first, ties stable by
    /// insertion order).
    ///
    /// An absent or empty collection yields an empty result, not an error.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;
}
