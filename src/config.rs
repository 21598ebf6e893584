//! Configuration for the pipeline components.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters shared by the ingestor, retriever, and
/// query orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Number of top results requested from vector search.
    pub top_k: usize,
    /// Maximum assembled prompt length in characters.
    pub prompt_budget: usize,
    /// Maximum number of documents ingested concurrently.
    pub ingest_concurrency: usize,
    /// Time budget for a single external call (one embed batch, one upsert,
    /// one search, one streamed fragment). A timeout surfaces as the failure
    /// kind of the operation that timed out.
    pub call_timeout: Duration,
    /// Extra attempts for failed external calls. Embeds and searches are
    /// idempotent; upserts are too because chunk IDs are stable.
    pub retry_attempts: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 6,
            prompt_budget: 8000,
            ingest_concurrency: 4,
            call_timeout: Duration::from_secs(30),
            retry_attempts: 0,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the number of top results requested from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the maximum assembled prompt length in characters.
    pub fn prompt_budget(mut self, budget: usize) -> Self {
        self.config.prompt_budget = budget;
        self
    }

    /// Set the maximum number of documents ingested concurrently.
    pub fn ingest_concurrency(mut self, workers: usize) -> Self {
        self.config.ingest_concurrency = workers;
        self
    }

    /// Set the time budget for a single external call.
    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.config.call_timeout = timeout;
        self
    }

    /// Set the number of extra attempts for failed external calls.
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.config.retry_attempts = attempts;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if `top_k`, `prompt_budget`,
    /// or `ingest_concurrency` is zero, or if `call_timeout` is zero.
    pub fn build(self) -> Result<RagConfig> {
        if self.config.top_k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if self.config.prompt_budget == 0 {
            return Err(RagError::InvalidConfiguration(
                "prompt_budget must be greater than zero".to_string(),
            ));
        }
        if self.config.ingest_concurrency == 0 {
            return Err(RagError::InvalidConfiguration(
                "ingest_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.config.call_timeout.is_zero() {
            return Err(RagError::InvalidConfiguration(
                "call_timeout must be non-zero".to_string(),
            ));
        }
        Ok(self.config)
    }
}
