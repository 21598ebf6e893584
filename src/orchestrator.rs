//! End-to-end question answering: retrieve, compose, stream.

use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use futures::{Stream, StreamExt};
use tracing::{debug, info};

use crate::completion::{CompletionFragment, CompletionModel};
use crate::config::RagConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::prompt::PromptComposer;
use crate::retriever::Retriever;
use crate::vectorstore::VectorStore;

/// The lazy fragment sequence returned by [`QueryOrchestrator::answer`].
///
/// Dropping the stream cancels the in-flight answer: no further fragments
/// are delivered and the underlying completion stream is released.
pub type AnswerStream = Pin<Box<dyn Stream<Item = Result<CompletionFragment>> + Send>>;

/// Composes retrieval, prompt assembly, and completion streaming into one
/// "answer this question" operation.
///
/// Each call moves through retrieval, composition, and streaming in order;
/// a failure in any stage surfaces as an error and no (further) fragments
/// are emitted. Fragments are forwarded in source order, each delivered at
/// most once, and the stream ends after the fragment marked final even if
/// the backend keeps producing. Construct one via
/// [`QueryOrchestrator::builder()`].
pub struct QueryOrchestrator {
    retriever: Retriever,
    composer: PromptComposer,
    completion: Arc<dyn CompletionModel>,
    config: RagConfig,
}

impl QueryOrchestrator {
    /// Create a new [`QueryOrchestratorBuilder`].
    pub fn builder() -> QueryOrchestratorBuilder {
        QueryOrchestratorBuilder::default()
    }

    /// Answer `question` using context retrieved from `collection`.
    ///
    /// Retrieval and composition run before this method returns, so their
    /// failures surface here, before any fragment exists. The returned
    /// stream then yields completion fragments as the backend produces them.
    ///
    /// # Errors
    ///
    /// - [`RagError::QueryEmbedding`] / [`RagError::Search`] from retrieval.
    /// - [`RagError::InvalidConfiguration`] if the prompt budget cannot hold
    ///   the question.
    /// - [`RagError::Completion`] if the completion stream cannot be opened;
    ///   mid-stream failures are yielded as stream items.
    pub async fn answer(&self, question: &str, collection: &str) -> Result<AnswerStream> {
        let retrieved =
            self.retriever.retrieve(question, collection, self.config.top_k).await?;
        debug!(collection, context_chunks = retrieved.len(), "context retrieved");

        let prompt = self.composer.compose(&retrieved, question, self.config.prompt_budget)?;
        debug!(prompt_chars = prompt.chars().count(), "prompt composed");

        let model = self.completion.name().to_string();
        let mut upstream = self.completion.stream(&prompt).await.map_err(|e| match e {
            e @ RagError::Completion(_) => e,
            other => RagError::Completion(other.to_string()),
        })?;

        let timeout = self.config.call_timeout;
        let stream = try_stream! {
            let mut fragments = 0usize;
            loop {
                let next = tokio::time::timeout(timeout, upstream.next())
                    .await
                    .map_err(|_| {
                        RagError::Completion(format!(
                            "{model}: no fragment within {timeout:?}"
                        ))
                    })?;
                let Some(fragment) = next else { break };
                let fragment = fragment.map_err(|e| match e {
                    e @ RagError::Completion(_) => e,
                    other => RagError::Completion(other.to_string()),
                })?;
                let is_final = fragment.is_final;
                fragments += 1;
                yield fragment;
                if is_final {
                    break;
                }
            }
            info!(model = %model, fragments, "answer stream completed");
        };

        Ok(Box::pin(stream))
    }
}

/// Builder for constructing a [`QueryOrchestrator`].
///
/// The orchestrator shares the embedding gateway and vector store handles
/// with the retriever it builds internally; the completion model is its own.
#[derive(Default)]
pub struct QueryOrchestratorBuilder {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    completion: Option<Arc<dyn CompletionModel>>,
    composer: Option<PromptComposer>,
    config: Option<RagConfig>,
}

impl QueryOrchestratorBuilder {
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

    /// Set the completion service.
    pub fn completion(mut self, completion: Arc<dyn CompletionModel>) -> Self {
        self.completion = Some(completion);
        self
    }

    /// Set a custom prompt composer (defaults to [`PromptComposer::new`]).
    pub fn composer(mut self, composer: PromptComposer) -> Self {
        self.composer = Some(composer);
        self
    }

    /// Set the pipeline configuration (defaults to [`RagConfig::default`]).
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the [`QueryOrchestrator`], validating that all collaborators
    /// are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if a required collaborator
    /// is missing.
    pub fn build(self) -> Result<QueryOrchestrator> {
        let embedder = self.embedder.ok_or_else(|| {
            RagError::InvalidConfiguration("embedder is required".to_string())
        })?;
        let store = self
            .store
            .ok_or_else(|| RagError::InvalidConfiguration("store is required".to_string()))?;
        let completion = self.completion.ok_or_else(|| {
            RagError::InvalidConfiguration("completion model is required".to_string())
        })?;
        let config = self.config.unwrap_or_default();
        let retriever = Retriever::new(embedder, store, config.clone());
        Ok(QueryOrchestrator {
            retriever,
            composer: self.composer.unwrap_or_default(),
            completion,
            config,
        })
    }
}
