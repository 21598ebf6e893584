//! Property tests for fixed-size chunking.

use proptest::prelude::*;
use ragline::chunking::{Chunker, FixedSizeChunker};
use ragline::document::Document;

fn doc(text: &str) -> Document {
    Document::new("doc", "test", text)
}

/// For any text and positive chunk size, concatenating the chunks in
/// sequence order reconstructs the input exactly, every chunk is at most
/// the configured size, and only the last chunk may be shorter.
mod prop_reconstruction {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn chunks_reconstruct_the_input(text in ".{0,400}", size in 1usize..64) {
            let chunker = FixedSizeChunker::new(size).unwrap();
            let chunks = chunker.chunk(&doc(&text));

            let rebuilt: String = chunks.iter().map(|c| c.text.as_str()).collect();
            prop_assert_eq!(rebuilt, text.clone());

            for (i, chunk) in chunks.iter().enumerate() {
                let len = chunk.text.chars().count();
                prop_assert!(len <= size, "chunk {i} has {len} chars, max {size}");
                if i + 1 < chunks.len() {
                    prop_assert_eq!(len, size, "only the last chunk may be short");
                }
            }
        }

        #[test]
        fn chunking_is_deterministic(text in ".{0,200}", size in 1usize..32) {
            let chunker = FixedSizeChunker::new(size).unwrap();
            let first = chunker.chunk(&doc(&text));
            let second = chunker.chunk(&doc(&text));
            prop_assert_eq!(first, second);
        }

        #[test]
        fn sequence_indices_are_contiguous(text in ".{1,200}", size in 1usize..32) {
            let chunker = FixedSizeChunker::new(size).unwrap();
            let chunks = chunker.chunk(&doc(&text));
            prop_assert!(!chunks.is_empty());
            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.metadata.get("chunk_index"), Some(&i.to_string()));
                prop_assert_eq!(chunk.id.clone(), format!("doc_{i}"));
            }
        }
    }
}

#[test]
fn empty_text_yields_empty_sequence() {
    let chunker = FixedSizeChunker::new(16).unwrap();
    assert!(chunker.chunk(&doc("")).is_empty());
}
