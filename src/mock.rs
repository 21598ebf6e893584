//! Test doubles for the external collaborators.
//!
//! These mocks back the crate's own tests and are exported for downstream
//! test suites: a deterministic embedder, a failure-injecting embedder, and
//! a scripted completion model that records when its stream is released.

use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::Stream;

use crate::completion::{CompletionFragment, CompletionModel, CompletionStream};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// A deterministic in-process embedder.
///
/// By default it hashes the input text into a unit vector, so identical
/// texts embed identically and distinct texts usually differ. A fixed
/// response vector can be supplied for tests that need exact similarity
/// scores.
pub struct MockEmbedder {
    dims: usize,
    fixed: Option<Vec<f32>>,
}

impl MockEmbedder {
    /// Create an embedder producing hash-derived vectors of `dims`
    /// components.
    pub fn new(dims: usize) -> Self {
        Self { dims, fixed: None }
    }

    /// Create an embedder that returns `vector` for every input.
    pub fn fixed(vector: Vec<f32>) -> Self {
        Self { dims: vector.len(), fixed: Some(vector) }
    }

    fn hash_embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dims];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % self.dims] += f32::from(byte) / 255.0;
        }
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        } else {
            vector[0] = 1.0;
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(match &self.fixed {
            Some(vector) => vector.clone(),
            None => self.hash_embed(text),
        })
    }

    fn dimensions(&self) -> usize {
        self.dims
    }
}

/// An embedder that fails whenever an input contains `marker`.
///
/// Other inputs are delegated to an inner [`MockEmbedder`]. Used to force
/// per-document embedding failures in batch tests.
pub struct FailingEmbedder {
    inner: MockEmbedder,
    marker: String,
}

impl FailingEmbedder {
    /// Fail any embed call whose text contains `marker`.
    pub fn new(dims: usize, marker: impl Into<String>) -> Self {
        Self { inner: MockEmbedder::new(dims), marker: marker.into() }
    }
}

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.contains(&self.marker) {
            return Err(RagError::Embedding("mock: forced failure".to_string()));
        }
        self.inner.embed(text).await
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains(&self.marker)) {
            return Err(RagError::Embedding("mock: forced batch failure".to_string()));
        }
        self.inner.embed_batch(texts).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// A completion model that replays a fixed fragment script.
///
/// Records every prompt it is given, and flips a shared release flag when
/// the returned stream is dropped — which is how tests observe that
/// cancellation freed the underlying handle.
pub struct MockCompletion {
    script: Vec<Result<CompletionFragment>>,
    prompts: Mutex<Vec<String>>,
    released: Arc<AtomicBool>,
}

impl MockCompletion {
    /// Script a stream from text parts; the last part is marked final.
    pub fn new(parts: &[&str]) -> Self {
        let script = parts
            .iter()
            .enumerate()
            .map(|(i, part)| {
                Ok(if i + 1 == parts.len() {
                    CompletionFragment::last(*part)
                } else {
                    CompletionFragment::delta(*part)
                })
            })
            .collect();
        Self::from_script(script)
    }

    /// Script an exact fragment sequence, including mid-stream errors and
    /// fragments after a final marker.
    pub fn from_script(script: Vec<Result<CompletionFragment>>) -> Self {
        Self { script, prompts: Mutex::new(Vec::new()), released: Arc::new(AtomicBool::new(false)) }
    }

    /// A model whose stream fails immediately.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_script(vec![Err(RagError::Completion(message.into()))])
    }

    /// Shared flag set to `true` once a returned stream has been dropped.
    pub fn release_flag(&self) -> Arc<AtomicBool> {
        self.released.clone()
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CompletionModel for MockCompletion {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stream(&self, prompt: &str) -> Result<CompletionStream> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        let script = self
            .script
            .iter()
            .map(|item| match item {
                Ok(fragment) => Ok(fragment.clone()),
                Err(e) => Err(RagError::Completion(e.to_string())),
            })
            .collect();
        Ok(Box::pin(ScriptedStream { script, released: self.released.clone() }))
    }
}

/// A stream replaying scripted items; sets the release flag on drop.
struct ScriptedStream {
    script: VecDeque<Result<CompletionFragment>>,
    released: Arc<AtomicBool>,
}

impl Stream for ScriptedStream {
    type Item = Result<CompletionFragment>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.get_mut().script.pop_front())
    }
}

impl Drop for ScriptedStream {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}
