//! Document ingestion: chunk, embed, store — with per-document
//! failure isolation.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::retry::call_bounded;
use crate::vectorstore::VectorStore;

/// Outcome of ingesting one document.
#[derive(Debug)]
pub struct DocumentReport {
    /// The source ID of the document.
    pub source_id: String,
    /// The collection the document was ingested into.
    pub collection: String,
    /// Number of chunks inserted (0 on failure).
    pub chunks_inserted: usize,
    /// The failure, if the document could not be ingested.
    pub error: Option<RagError>,
}

impl DocumentReport {
    /// Whether this document was ingested successfully.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Accumulated outcome of an ingestion batch, one entry per input document
/// in input order. The batch as a whole always completes; failures are
/// recorded here rather than propagated.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Per-document outcomes, in the order the documents were supplied.
    pub documents: Vec<DocumentReport>,
}

impl IngestReport {
    /// Number of documents ingested successfully.
    pub fn succeeded(&self) -> usize {
        self.documents.iter().filter(|d| d.succeeded()).count()
    }

    /// Number of documents that failed.
    pub fn failed(&self) -> usize {
        self.documents.len() - self.succeeded()
    }

    /// Total chunks inserted across all documents.
    pub fn chunks_inserted(&self) -> usize {
        self.documents.iter().map(|d| d.chunks_inserted).sum()
    }
}

/// Drives the chunk → embed → upsert sequence for batches of documents.
///
/// Documents are independent: each one is processed in isolation, up to
/// [`RagConfig::ingest_concurrency`] at a time, and a failure in one is
/// recorded in the [`IngestReport`] without aborting its siblings. The only
/// shared resource is the injected [`VectorStore`]. Construct one via
/// [`Ingestor::builder()`].
pub struct Ingestor {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    config: RagConfig,
}

impl Ingestor {
    /// Create a new [`IngestorBuilder`].
    pub fn builder() -> IngestorBuilder {
        IngestorBuilder::default()
    }

    /// Ingest a batch of documents, returning one report entry per document
    /// in input order.
    pub async fn ingest(&self, documents: Vec<Document>) -> IngestReport {
        let semaphore = Arc::new(Semaphore::new(self.config.ingest_concurrency));

        let tasks = documents.into_iter().map(|document| {
            let semaphore = semaphore.clone();
            async move {
                // The semaphore is never closed, so acquire cannot fail.
                let _permit = semaphore.acquire().await.ok();
                let source_id = document.source_id.clone();
                let collection = document.collection.clone();
                match self.ingest_document(&document).await {
                    Ok(chunks_inserted) => {
                        DocumentReport { source_id, collection, chunks_inserted, error: None }
                    }
                    Err(e) => {
                        error!(source_id = %source_id, error = %e, "document ingestion failed");
                        DocumentReport { source_id, collection, chunks_inserted: 0, error: Some(e) }
                    }
                }
            }
        });

        let documents = futures::future::join_all(tasks).await;
        let report = IngestReport { documents };
        info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            chunks = report.chunks_inserted(),
            "ingestion batch completed"
        );
        report
    }

    /// Ingest one document: chunk, embed all chunks as a batch, upsert them
    /// as a single logical batch into the document's collection.
    async fn ingest_document(&self, document: &Document) -> Result<usize> {
        let mut chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            return Err(RagError::EmptyContent(document.source_id.clone()));
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let timeout = self.config.call_timeout;

        let embeddings = call_bounded(
            self.config.retry_attempts,
            timeout,
            || self.embedder.embed_batch(&texts),
            || RagError::Embedding(format!("gateway call timed out after {timeout:?}")),
        )
        .await
        .map_err(|e| match e {
            e @ RagError::Embedding(_) => e,
            other => RagError::Embedding(other.to_string()),
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::Embedding(format!(
                "gateway returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let expected = self.embedder.dimensions();
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            if embedding.len() != expected {
                return Err(RagError::Embedding(format!(
                    "gateway returned a vector of dimension {}, expected {expected}",
                    embedding.len()
                )));
            }
            chunk.embedding = embedding;
        }

        // Chunk IDs are stable, so retrying the upsert overwrites rather
        // than duplicates.
        call_bounded(
            self.config.retry_attempts,
            timeout,
            || self.store.upsert(&document.collection, &chunks),
            || RagError::Store(format!("upsert timed out after {timeout:?}")),
        )
        .await
        .map_err(|e| match e {
            e @ RagError::Store(_) => e,
            other => RagError::Store(other.to_string()),
        })?;

        info!(
            source_id = %document.source_id,
            collection = %document.collection,
            chunk_count = chunks.len(),
            "ingested document"
        );
        Ok(chunks.len())
    }
}

/// Builder for constructing an [`Ingestor`].
#[derive(Default)]
pub struct IngestorBuilder {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    config: Option<RagConfig>,
}

impl IngestorBuilder {
    /// Set the embedding gateway.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector store backend.
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the chunking strategy.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the pipeline configuration (defaults to [`RagConfig::default`]).
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the [`Ingestor`], validating that all collaborators are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if a required collaborator
    /// is missing.
    pub fn build(self) -> Result<Ingestor> {
        let embedder = self.embedder.ok_or_else(|| {
            RagError::InvalidConfiguration("embedder is required".to_string())
        })?;
        let store = self
            .store
            .ok_or_else(|| RagError::InvalidConfiguration("store is required".to_string()))?;
        let chunker = self
            .chunker
            .ok_or_else(|| RagError::InvalidConfiguration("chunker is required".to_string()))?;
        Ok(Ingestor { embedder, store, chunker, config: self.config.unwrap_or_default() })
    }
}
