//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] backs the integration tests and small deployments
//! that do not need a remote index. Collections are plain maps behind a
//! `tokio::sync::RwLock`; ranking ties are broken by insertion order.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// One named collection: fixed dimension plus chunks in insertion order.
#[derive(Debug, Default)]
struct Collection {
    dimension: usize,
    /// Chunk IDs in first-insertion order; re-upserts keep their slot.
    order: Vec<String>,
    chunks: HashMap<String, Chunk>,
}

/// An in-memory [`VectorStore`] ranking by cosine similarity.
///
/// Collections are created implicitly on first upsert with the dimension of
/// the first inserted vector. Search over an absent collection returns an
/// empty result.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of chunks currently stored in a collection (0 if absent).
    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, |c| c.chunks.len())
    }
}

/// Cosine similarity of two vectors; 0.0 if either has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        for chunk in chunks {
            if chunk.embedding.is_empty() {
                return Err(RagError::Store(format!(
                    "chunk '{}' has no embedding",
                    chunk.id
                )));
            }
        }

        let mut collections = self.collections.write().await;
        let entry = collections.entry(collection.to_string()).or_insert_with(|| Collection {
            dimension: chunks[0].embedding.len(),
            ..Collection::default()
        });

        for chunk in chunks {
            if chunk.embedding.len() != entry.dimension {
                return Err(RagError::Store(format!(
                    "dimension mismatch in collection '{collection}': expected {}, got {}",
                    entry.dimension,
                    chunk.embedding.len()
                )));
            }
            if !entry.chunks.contains_key(&chunk.id) {
                entry.order.push(chunk.id.clone());
            }
            entry.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let Some(entry) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        // Scoring walks insertion order; the stable sort below then keeps
        // that order among equal scores.
        let mut scored: Vec<SearchResult> = entry
            .order
            .iter()
            .filter_map(|id| entry.chunks.get(id))
            .map(|chunk| SearchResult {
                text: chunk.text.clone(),
                score: cosine_similarity(&chunk.embedding, embedding),
                metadata: chunk.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }
}
