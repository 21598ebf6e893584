//! Error types for the `ragline` crate.

use thiserror::Error;

/// Errors that can occur in the retrieval-augmented generation pipeline.
///
/// Every variant is recoverable at the call-site that produced it: ingestion
/// errors are captured per document into an
/// [`IngestReport`](crate::ingest::IngestReport), while retrieval and
/// streaming errors propagate to the caller of the failing operation.
/// Timeouts on external calls are reported as the failure kind of the
/// operation that timed out, not as a distinct class.
#[derive(Debug, Error)]
pub enum RagError {
    /// A document produced no chunks during ingestion.
    #[error("document '{0}' produced no content to index")]
    EmptyContent(String),

    /// Embedding a document's chunks failed, or the gateway returned a vector
    /// of the wrong dimension.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Embedding a query string failed.
    #[error("query embedding failed: {0}")]
    QueryEmbedding(String),

    /// Upserting into the vector store failed.
    #[error("vector store upsert failed: {0}")]
    Store(String),

    /// A nearest-neighbor search against the vector store failed.
    #[error("vector store search failed: {0}")]
    Search(String),

    /// Opening or consuming a completion stream failed.
    #[error("completion failed: {0}")]
    Completion(String),

    /// A configuration validation error (non-positive k or chunk size,
    /// a budget too small to hold any prompt, and similar caller mistakes).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;
