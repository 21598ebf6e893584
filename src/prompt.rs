//! Prompt assembly under a context budget.

use crate::document::SearchResult;
use crate::error::{RagError, Result};

/// The fixed system instruction placed at the top of every prompt.
pub const SYSTEM_PREAMBLE: &str =
    "You are a helpful assistant answering using only the provided context.";

/// Assembles a system/context/question prompt from retrieved chunks.
///
/// Pure: no side effects, no network access. Retrieved chunk texts are
/// joined by blank lines in the order given (highest similarity first),
/// between the system preamble and the literal question. If the assembled
/// prompt would exceed the character budget, lowest-similarity chunks are
/// dropped whole from the tail until it fits; chunks are never cut
/// mid-text.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    preamble: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self { preamble: SYSTEM_PREAMBLE.to_string() }
    }
}

impl PromptComposer {
    /// Create a composer with the default [`SYSTEM_PREAMBLE`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the system preamble.
    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = preamble.into();
        self
    }

    /// Assemble a prompt from `retrieved` context and the question, at most
    /// `budget` characters long.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if the budget is zero or
    /// cannot hold even the context-free prompt.
    pub fn compose(
        &self,
        retrieved: &[SearchResult],
        question: &str,
        budget: usize,
    ) -> Result<String> {
        if budget == 0 {
            return Err(RagError::InvalidConfiguration(
                "prompt budget must be greater than zero".to_string(),
            ));
        }

        // Drop lowest-similarity (tail) chunks until the prompt fits.
        for keep in (0..=retrieved.len()).rev() {
            let prompt = self.assemble(&retrieved[..keep], question);
            if prompt.chars().count() <= budget {
                return Ok(prompt);
            }
        }

        Err(RagError::InvalidConfiguration(format!(
            "prompt budget ({budget}) cannot hold the system preamble and question"
        )))
    }

    fn assemble(&self, retrieved: &[SearchResult], question: &str) -> String {
        let mut sections = Vec::with_capacity(retrieved.len() + 2);
        sections.push(self.preamble.as_str());
        for result in retrieved {
            sections.push(result.text.as_str());
        }
        sections.push(question);
        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn result(text: &str, score: f32) -> SearchResult {
        SearchResult { text: text.to_string(), score, metadata: HashMap::new() }
    }

    #[test]
    fn preamble_context_question_in_order() {
        let composer = PromptComposer::new();
        let retrieved = vec![result("cardiology ward", 0.9), result("visiting hours", 0.7)];
        let prompt = composer.compose(&retrieved, "What departments exist?", 1000).unwrap();
        assert_eq!(
            prompt,
            format!("{SYSTEM_PREAMBLE}\n\ncardiology ward\n\nvisiting hours\n\nWhat departments exist?")
        );
    }

    #[test]
    fn over_budget_drops_tail_chunks_first() {
        let composer = PromptComposer::new().with_preamble("ctx:");
        let retrieved = vec![result("best", 0.9), result("worse", 0.5)];
        // Budget fits preamble + first chunk + question but not both chunks.
        let full = composer.compose(&retrieved, "q", 1000).unwrap();
        let budget = full.chars().count() - 1;
        let prompt = composer.compose(&retrieved, "q", budget).unwrap();
        assert!(prompt.contains("best"));
        assert!(!prompt.contains("worse"));
        assert!(prompt.chars().count() <= budget);
    }

    #[test]
    fn never_exceeds_budget() {
        let composer = PromptComposer::new().with_preamble("p");
        let retrieved: Vec<SearchResult> =
            (0..10).map(|i| result(&"x".repeat(50), 1.0 - i as f32 * 0.05)).collect();
        for budget in [10, 60, 200, 600] {
            let prompt = composer.compose(&retrieved, "why?", budget).unwrap();
            assert!(prompt.chars().count() <= budget, "budget {budget} exceeded");
        }
    }

    #[test]
    fn budget_too_small_for_question_is_invalid() {
        let composer = PromptComposer::new();
        let err = composer.compose(&[], "a long enough question", 5).unwrap_err();
        assert!(matches!(err, RagError::InvalidConfiguration(_)));
    }

    #[test]
    fn zero_budget_is_invalid() {
        let composer = PromptComposer::new();
        let err = composer.compose(&[], "q", 0).unwrap_err();
        assert!(matches!(err, RagError::InvalidConfiguration(_)));
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        let composer = PromptComposer::new().with_preamble("序");
        // "序\n\n問" is 4 chars but 8 bytes.
        let prompt = composer.compose(&[], "問", 4).unwrap();
        assert_eq!(prompt.chars().count(), 4);
    }
}
