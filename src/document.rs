//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document queued for ingestion.
///
/// Carries already-extracted plain text together with a stable source
/// identifier (typically a file path) and the name of the collection the
/// document's chunks should land in. Documents are immutable and discarded
/// once ingestion completes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Stable identifier of the source (e.g. a file path).
    pub source_id: String,
    /// Name of the target collection in the vector store.
    pub collection: String,
    /// The extracted text content.
    pub text: String,
    /// Key-value metadata inherited by every chunk of this document.
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with empty metadata.
    pub fn new(
        source_id: impl Into<String>,
        collection: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            collection: collection.into(),
            text: text.into(),
            metadata: HashMap::new(),
        }
    }
}

/// A bounded-length contiguous slice of a [`Document`]'s text.
///
/// Chunk IDs are derived from the parent source ID and the chunk's sequence
/// index (`{source_id}_{index}`), so re-ingesting the same document with the
/// same chunking parameters overwrites matching entries instead of
/// duplicating them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Stable identifier, `{source_id}_{sequence_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until the ingestor
    /// attaches one.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus a `chunk_index` field
    /// recording the chunk's position within the document.
    pub metadata: HashMap<String, String>,
    /// The source ID of the parent [`Document`].
    pub source_id: String,
}

/// A retrieved chunk text paired with its similarity score.
///
/// Produced per query in descending score order; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk text.
    pub text: String,
    /// The similarity score in the index's native ranking order
    /// (higher is more relevant).
    pub score: f32,
    /// Metadata stored alongside the chunk.
    pub metadata: HashMap<String, String>,
}
