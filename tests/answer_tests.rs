//! End-to-end answer streaming: ordering, termination, cancellation, and
//! failure propagation.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use futures::StreamExt;
use ragline::completion::CompletionFragment;
use ragline::config::RagConfig;
use ragline::document::Chunk;
use ragline::error::RagError;
use ragline::inmemory::InMemoryVectorStore;
use ragline::mock::{FailingEmbedder, MockCompletion, MockEmbedder};
use ragline::orchestrator::QueryOrchestrator;
use ragline::vectorstore::VectorStore;

fn chunk(id: &str, text: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: id.to_string(),
        text: text.to_string(),
        embedding,
        metadata: HashMap::new(),
        source_id: "doc".to_string(),
    }
}

async fn seeded_store() -> Arc<InMemoryVectorStore> {
    let store = Arc::new(InMemoryVectorStore::new());
    store
        .upsert(
            "docs",
            &[
                chunk("a", "the cardiology ward is on floor two", vec![1.0, 0.0]),
                chunk("b", "visiting hours end at eight", vec![0.8, 0.6]),
            ],
        )
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn fragments_forwarded_in_order_exactly_once() {
    let completion = Arc::new(MockCompletion::new(&["Hello", " world", "."]));
    let orchestrator = QueryOrchestrator::builder()
        .embedder(Arc::new(MockEmbedder::fixed(vec![1.0, 0.0])))
        .store(seeded_store().await)
        .completion(completion.clone())
        .build()
        .unwrap();

    let stream = orchestrator.answer("where is cardiology?", "docs").await.unwrap();
    let fragments: Vec<CompletionFragment> =
        stream.map(|f| f.unwrap()).collect::<Vec<_>>().await;

    assert_eq!(
        fragments,
        vec![
            CompletionFragment::delta("Hello"),
            CompletionFragment::delta(" world"),
            CompletionFragment::last("."),
        ]
    );
}

#[tokio::test]
async fn prompt_contains_context_and_question() {
    let completion = Arc::new(MockCompletion::new(&["ok"]));
    let orchestrator = QueryOrchestrator::builder()
        .embedder(Arc::new(MockEmbedder::fixed(vec![1.0, 0.0])))
        .store(seeded_store().await)
        .completion(completion.clone())
        .build()
        .unwrap();

    let stream = orchestrator.answer("where is cardiology?", "docs").await.unwrap();
    let _ = stream.collect::<Vec<_>>().await;

    let prompts = completion.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].starts_with(ragline::SYSTEM_PREAMBLE));
    assert!(prompts[0].contains("the cardiology ward is on floor two"));
    assert!(prompts[0].ends_with("where is cardiology?"));
    // Highest-similarity chunk comes first in the prompt.
    let first = prompts[0].find("cardiology ward").unwrap();
    let second = prompts[0].find("visiting hours").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn stream_stops_after_final_fragment() {
    // A misbehaving backend that keeps yielding after the final marker.
    let completion = Arc::new(MockCompletion::from_script(vec![
        Ok(CompletionFragment::delta("answer")),
        Ok(CompletionFragment::last("")),
        Ok(CompletionFragment::delta("ghost")),
    ]));
    let orchestrator = QueryOrchestrator::builder()
        .embedder(Arc::new(MockEmbedder::fixed(vec![1.0, 0.0])))
        .store(seeded_store().await)
        .completion(completion)
        .build()
        .unwrap();

    let stream = orchestrator.answer("q", "docs").await.unwrap();
    let fragments: Vec<CompletionFragment> =
        stream.map(|f| f.unwrap()).collect::<Vec<_>>().await;

    assert_eq!(fragments.len(), 2);
    assert!(fragments[1].is_final);
}

#[tokio::test]
async fn cancellation_stops_delivery_and_releases_the_stream() {
    let completion = Arc::new(MockCompletion::new(&["one", "two", "three"]));
    let released = completion.release_flag();
    let orchestrator = QueryOrchestrator::builder()
        .embedder(Arc::new(MockEmbedder::fixed(vec![1.0, 0.0])))
        .store(seeded_store().await)
        .completion(completion)
        .build()
        .unwrap();

    let mut stream = orchestrator.answer("q", "docs").await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.text, "one");
    assert!(!released.load(Ordering::SeqCst));

    drop(stream);
    assert!(released.load(Ordering::SeqCst));
}

#[tokio::test]
async fn retrieval_failure_surfaces_before_any_fragment() {
    let completion = Arc::new(MockCompletion::new(&["never"]));
    let orchestrator = QueryOrchestrator::builder()
        .embedder(Arc::new(FailingEmbedder::new(2, "q")))
        .store(seeded_store().await)
        .completion(completion.clone())
        .build()
        .unwrap();

    let err = orchestrator.answer("a question", "docs").await.err().unwrap();
    assert!(matches!(err, RagError::QueryEmbedding(_)));
    assert!(completion.prompts().is_empty());
}

#[tokio::test]
async fn mid_stream_failure_is_yielded_as_completion_error() {
    let completion = Arc::new(MockCompletion::from_script(vec![
        Ok(CompletionFragment::delta("partial")),
        Err(RagError::Completion("backend hung up".to_string())),
    ]));
    let orchestrator = QueryOrchestrator::builder()
        .embedder(Arc::new(MockEmbedder::fixed(vec![1.0, 0.0])))
        .store(seeded_store().await)
        .completion(completion)
        .build()
        .unwrap();

    let mut stream = orchestrator.answer("q", "docs").await.unwrap();
    assert_eq!(stream.next().await.unwrap().unwrap().text, "partial");
    let err = stream.next().await.unwrap().unwrap_err();
    assert!(matches!(err, RagError::Completion(_)));
    // The error terminates the stream.
    assert!(stream.next().await.is_none());
}

#[tokio::test]
async fn empty_collection_still_answers_from_the_preamble_alone() {
    let completion = Arc::new(MockCompletion::new(&["no context answer"]));
    let orchestrator = QueryOrchestrator::builder()
        .embedder(Arc::new(MockEmbedder::fixed(vec![1.0, 0.0])))
        .store(Arc::new(InMemoryVectorStore::new()))
        .completion(completion.clone())
        .build()
        .unwrap();

    let stream = orchestrator.answer("anything?", "missing").await.unwrap();
    let fragments: Vec<_> = stream.collect().await;
    assert_eq!(fragments.len(), 1);

    let prompts = completion.prompts();
    assert_eq!(prompts[0], format!("{}\n\nanything?", ragline::SYSTEM_PREAMBLE));
}

#[tokio::test]
async fn budget_too_small_is_invalid_configuration() {
    let completion = Arc::new(MockCompletion::new(&["never"]));
    let orchestrator = QueryOrchestrator::builder()
        .embedder(Arc::new(MockEmbedder::fixed(vec![1.0, 0.0])))
        .store(seeded_store().await)
        .completion(completion)
        .config(RagConfig::builder().prompt_budget(5).build().unwrap())
        .build()
        .unwrap();

    let err = orchestrator.answer("a long question", "docs").await.err().unwrap();
    assert!(matches!(err, RagError::InvalidConfiguration(_)));
}
