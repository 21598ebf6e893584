//! Retrieval ordering and edge cases, plus the in-memory store's
//! search-ordering property.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use ragline::config::RagConfig;
use ragline::document::Chunk;
use ragline::error::RagError;
use ragline::inmemory::InMemoryVectorStore;
use ragline::mock::MockEmbedder;
use ragline::retriever::Retriever;
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

/// A unit vector at the given cosine similarity to [1, 0].
fn at_similarity(cos: f32) -> Vec<f32> {
    vec![cos, (1.0 - cos * cos).sqrt()]
}

#[tokio::test]
async fn returns_top_k_in_descending_order() {
    let store = Arc::new(InMemoryVectorStore::new());
    store
        .upsert(
            "docs",
            &[
                chunk("c", "half", at_similarity(0.5)),
                chunk("a", "best", at_similarity(0.9)),
                chunk("d", "worst", at_similarity(0.3)),
                chunk("b", "good", at_similarity(0.7)),
            ],
        )
        .await
        .unwrap();

    let retriever = Retriever::new(
        Arc::new(MockEmbedder::fixed(vec![1.0, 0.0])),
        store,
        RagConfig::default(),
    );

    let results = retriever.retrieve("query", "docs", 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].text, "best");
    assert_eq!(results[1].text, "good");
    assert!(results[0].score > results[1].score);
}

#[tokio::test]
async fn absent_collection_yields_empty_result() {
    let retriever = Retriever::new(
        Arc::new(MockEmbedder::new(2)),
        Arc::new(InMemoryVectorStore::new()),
        RagConfig::default(),
    );
    let results = retriever.retrieve("query", "nonexistent", 5).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn zero_k_is_invalid_configuration() {
    let retriever = Retriever::new(
        Arc::new(MockEmbedder::new(2)),
        Arc::new(InMemoryVectorStore::new()),
        RagConfig::default(),
    );
    let err = retriever.retrieve("query", "docs", 0).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidConfiguration(_)));
}

#[tokio::test]
async fn embedding_failure_surfaces_as_query_embedding() {
    let retriever = Retriever::new(
        Arc::new(ragline::mock::FailingEmbedder::new(2, "q")),
        Arc::new(InMemoryVectorStore::new()),
        RagConfig::default(),
    );
    let err = retriever.retrieve("a query", "docs", 3).await.unwrap_err();
    assert!(matches!(err, RagError::QueryEmbedding(_)));
}

/// For any stored set of chunks, search results are ordered by descending
/// cosine score and bounded by `top_k`.
mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
        proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
            "non-zero embedding",
            |mut v| {
                let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
                if norm < 1e-8 {
                    return None;
                }
                for val in &mut v {
                    *val /= norm;
                }
                Some(v)
            },
        )
    }

    fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
        ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim))
            .prop_map(|(id, text, embedding)| chunk(&id, &text, embedding))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_top_k(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            top_k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, unique_count) = rt.block_on(async {
                let store = InMemoryVectorStore::new();

                let mut deduped: HashMap<String, Chunk> = HashMap::new();
                for chunk in &chunks {
                    deduped.entry(chunk.id.clone()).or_insert_with(|| chunk.clone());
                }
                let unique: Vec<Chunk> = deduped.into_values().collect();
                let count = unique.len();

                store.upsert("test", &unique).await.unwrap();
                let results = store.search("test", &query, top_k).await.unwrap();
                (results, count)
            });

            prop_assert!(results.len() <= top_k);
            prop_assert!(results.len() <= unique_count);

            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}
