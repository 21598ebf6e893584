//! # ragline
//!
//! A retrieval-augmented generation pipeline: document chunking,
//! embedding-backed indexing, top-k similarity retrieval, prompt assembly
//! under a context budget, and streamed completion consumption.
//!
//! ## Overview
//!
//! The pipeline is split along its external I/O boundaries. Three narrow
//! capability traits stand in for the external services:
//!
//! - [`EmbeddingProvider`] — maps text to fixed-dimension vectors
//! - [`VectorStore`] — named collections with nearest-neighbor search
//! - [`CompletionModel`] — token-streaming LLM backend
//!
//! and three components compose them:
//!
//! - [`Ingestor`] — chunks, embeds, and stores documents, isolating
//!   per-document failures into an [`IngestReport`]
//! - [`Retriever`] — embeds a query and returns the top-k most similar
//!   chunks
//! - [`QueryOrchestrator`] — retrieval, prompt composition, and fragment
//!   streaming as one end-to-end answer operation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragline::{
//!     Document, FixedSizeChunker, Ingestor, InMemoryVectorStore, QueryOrchestrator, RagConfig,
//! };
//! use futures::StreamExt;
//!
//! let store = Arc::new(InMemoryVectorStore::new());
//! let embedder = Arc::new(my_embedding_provider()?);
//!
//! let ingestor = Ingestor::builder()
//!     .embedder(embedder.clone())
//!     .store(store.clone())
//!     .chunker(Arc::new(FixedSizeChunker::new(1000)?))
//!     .build()?;
//!
//! let report = ingestor
//!     .ingest(vec![Document::new("departments.txt", "Department_Details", text)])
//!     .await;
//! assert_eq!(report.failed(), 0);
//!
//! let orchestrator = QueryOrchestrator::builder()
//!     .embedder(embedder)
//!     .store(store)
//!     .completion(Arc::new(my_completion_model()?))
//!     .config(RagConfig::builder().top_k(6).build()?)
//!     .build()?;
//!
//! let mut answer = orchestrator
//!     .answer("What departments do you have?", "Department_Details")
//!     .await?;
//! while let Some(fragment) = answer.next().await {
//!     print!("{}", fragment?.text);
//! }
//! ```
//!
//! ## Features
//!
//! - `cohere` — [`cohere::CohereEmbeddingProvider`] over the Cohere v2 API
//! - `groq` — [`groq::GroqCompletionModel`] over Groq's OpenAI-compatible
//!   streaming API
//! - `qdrant` — [`qdrant::QdrantVectorStore`] over gRPC
//!
//! The default build carries no network dependencies; the in-memory store
//! and the [`mock`] collaborators are always available.

pub mod chunking;
pub mod completion;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod inmemory;
pub mod mock;
pub mod orchestrator;
pub mod prompt;
pub mod retriever;
pub mod vectorstore;

mod retry;

#[cfg(feature = "cohere")]
pub mod cohere;
#[cfg(feature = "groq")]
pub mod groq;
#[cfg(feature = "qdrant")]
pub mod qdrant;

pub use chunking::{Chunker, FixedSizeChunker};
pub use completion::{CompletionFragment, CompletionModel, CompletionStream};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use ingest::{DocumentReport, IngestReport, Ingestor, IngestorBuilder};
pub use inmemory::InMemoryVectorStore;
pub use orchestrator::{AnswerStream, QueryOrchestrator, QueryOrchestratorBuilder};
pub use prompt::{PromptComposer, SYSTEM_PREAMBLE};
pub use retriever::Retriever;
pub use vectorstore::VectorStore;
