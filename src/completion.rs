//! Completion streaming trait.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One incremental piece of generated text.
///
/// Fragments are ordered and consumed exactly once; the fragment with
/// `is_final` set marks the end of the stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionFragment {
    /// The generated text delta (may be empty on the final fragment).
    pub text: String,
    /// Whether this is the last fragment of the completion.
    pub is_final: bool,
}

impl CompletionFragment {
    /// An intermediate fragment carrying `text`.
    pub fn delta(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_final: false }
    }

    /// A final fragment carrying `text` (possibly empty).
    pub fn last(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_final: true }
    }
}

/// A lazy, cancellable sequence of completion fragments.
///
/// Dropping the stream cancels the completion and releases whatever
/// resources (connections, response bodies) back it.
pub type CompletionStream = Pin<Box<dyn Stream<Item = Result<CompletionFragment>> + Send>>;

/// A token-streaming completion service.
///
/// Implementations wrap a specific LLM backend (Groq, OpenAI-compatible
/// servers, a local model) and return fragments in generation order.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Backend or model name, used in log and error messages.
    fn name(&self) -> &str;

    /// Start a streamed completion for the assembled prompt.
    async fn stream(&self, prompt: &str) -> Result<CompletionStream>;
}
