//! Document chunking.
//!
//! The [`Chunker`] trait turns a document's text into an ordered sequence of
//! bounded-size chunks. The default [`FixedSizeChunker`] splits by character
//! count; a boundary-aware strategy (sentences, tokens) can be substituted
//! by implementing the trait, without touching the rest of the pipeline.

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations must be deterministic (identical input yields identical
/// output) and must return an empty `Vec` for empty text. Returned chunks
/// carry no embeddings; the ingestor attaches them later.
pub trait Chunker: Send + Sync {
    /// Split a document into ordered chunks.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Splits text into consecutive chunks of at most `chunk_size` characters.
///
/// Sizes are counted in Unicode scalar values, so a chunk boundary never
/// lands inside a multi-byte character. With the default overlap of zero,
/// concatenating a document's chunks in sequence order reconstructs the
/// original text exactly; only the final chunk may be shorter than
/// `chunk_size`.
///
/// # Example
///
/// ```rust,ignore
/// use ragline::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(1000)?;
/// let chunks = chunker.chunk(&document);
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a chunker producing non-overlapping chunks of at most
    /// `chunk_size` characters.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Result<Self> {
        Self::with_overlap(chunk_size, 0)
    }

    /// Create a chunker where consecutive chunks share `chunk_overlap`
    /// trailing characters.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn with_overlap(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidConfiguration(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::InvalidConfiguration(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = document.text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;
        let mut chunk_index = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let text: String = chars[start..end].iter().collect();

            let mut metadata = document.metadata.clone();
            metadata.insert("chunk_index".to_string(), chunk_index.to_string());

            chunks.push(Chunk {
                id: format!("{}_{chunk_index}", document.source_id),
                text,
                embedding: Vec::new(),
                metadata,
                source_id: document.source_id.clone(),
            });

            if end == chars.len() {
                break;
            }
            start += step;
            chunk_index += 1;
        }

        chunks
    }
}
