//! Groq completion model using the OpenAI-compatible chat completions API.
//!
//! This module is only available when the `groq` feature is enabled.

use async_stream::try_stream;
use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::completion::{CompletionFragment, CompletionModel, CompletionStream};
use crate::error::{RagError, Result};

/// The Groq chat completions endpoint.
const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// The default Groq-hosted model.
const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// A [`CompletionModel`] backed by Groq's OpenAI-compatible API.
///
/// Sends the assembled prompt as a single user message with `stream: true`
/// and forwards each server-sent-event delta as a [`CompletionFragment`].
/// The fragment carrying the backend's finish reason (or the `[DONE]`
/// sentinel) is marked final. Dropping the returned stream aborts the HTTP
/// response body, which is how cancellation releases the connection.
///
/// # Example
///
/// ```rust,ignore
/// use ragline::groq::GroqCompletionModel;
///
/// let model = GroqCompletionModel::from_env()?;
/// let mut stream = model.stream("Say hello.").await?;
/// ```
pub struct GroqCompletionModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GroqCompletionModel {
    /// Create a new model with the given API key and defaults
    /// (`llama-3.3-70b-versatile`, temperature 0.5, 1024 max tokens).
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Completion(
                "Groq: API key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.5,
            max_tokens: 1024,
        })
    }

    /// Create a new model using the `GROQ_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GROQ_API_KEY").map_err(|_| {
            RagError::Completion("Groq: GROQ_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

// ── Groq API request/response types ────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 1],
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatChunk {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Delta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── CompletionModel implementation ─────────────────────────────────

#[async_trait]
impl CompletionModel for GroqCompletionModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn stream(&self, prompt: &str) -> Result<CompletionStream> {
        debug!(provider = "Groq", model = %self.model, prompt_len = prompt.len(), "opening completion stream");

        let request_body = ChatRequest {
            model: &self.model,
            messages: [Message { role: "user", content: prompt }],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: true,
        };

        let response = self
            .client
            .post(GROQ_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Groq", error = %e, "request failed");
                RagError::Completion(format!("Groq: request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = "Groq", %status, "API error");
            return Err(RagError::Completion(format!("Groq: API returned {status}: {detail}")));
        }

        let mut events = response.bytes_stream().eventsource();
        let stream = try_stream! {
            while let Some(event) = events.next().await {
                let event = event.map_err(|e| {
                    RagError::Completion(format!("Groq: stream error: {e}"))
                })?;

                if event.data == "[DONE]" {
                    yield CompletionFragment::last("");
                    break;
                }

                let chunk: ChatChunk = serde_json::from_str(&event.data).map_err(|e| {
                    RagError::Completion(format!("Groq: malformed stream chunk: {e}"))
                })?;

                let Some(choice) = chunk.choices.into_iter().next() else {
                    continue;
                };
                let text = choice.delta.content.unwrap_or_default();
                if choice.finish_reason.is_some() {
                    yield CompletionFragment::last(text);
                    break;
                }
                if !text.is_empty() {
                    yield CompletionFragment::delta(text);
                }
            }
        };

        Ok(Box::pin(stream))
    }
}
