//! Property tests for in-memory vector store search ordering.

use std::collections::HashMap;

use docrag::document::Chunk;
use docrag::inmemory::InMemoryVectorStore;
use docrag::vectorstore::VectorStore;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-8 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

/// Generate a chunk with a normalized embedding.
fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
    ("[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(|(content, embedding)| Chunk {
        content,
        metadata: HashMap::new(),
        embedding,
    })
}

/// For any set of embedded chunks, searching returns results ordered by
/// descending cosine similarity, bounded by both `k` and the record count.
mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded_by_k(
            chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, stored) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                let ids = store.add(&chunks).await.unwrap();
                let results = store.query(&query, k).await.unwrap();
                (results, ids.len())
            });

            prop_assert_eq!(stored, chunks.len());
            prop_assert!(results.len() <= k);
            prop_assert!(results.len() <= stored);

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

mod deterministic_behaviour {
    use super::*;

    fn chunk(content: &str, embedding: Vec<f32>) -> Chunk {
        Chunk { content: content.to_string(), metadata: HashMap::new(), embedding }
    }

    #[tokio::test]
    async fn empty_store_returns_empty_result() {
        let store = InMemoryVectorStore::new();
        let results = store.query(&[1.0, 0.0], 5).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn exact_ties_resolve_to_earliest_ingested() {
        let store = InMemoryVectorStore::new();
        // Identical embeddings guarantee identical scores.
        let chunks = vec![
            chunk("first", vec![1.0, 0.0]),
            chunk("second", vec![1.0, 0.0]),
            chunk("third", vec![1.0, 0.0]),
        ];
        store.add(&chunks).await.unwrap();

        let results = store.query(&[1.0, 0.0], 3).await.unwrap();
        let order: Vec<&str> = results.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn add_generates_fresh_ids_every_call() {
        let store = InMemoryVectorStore::new();
        let chunks = vec![chunk("same content", vec![0.5, 0.5])];

        let first = store.add(&chunks).await.unwrap();
        let second = store.add(&chunks).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn delete_collection_removes_all_records() {
        let store = InMemoryVectorStore::new();
        store.add(&[chunk("a", vec![1.0, 0.0]), chunk("b", vec![0.0, 1.0])]).await.unwrap();
        store.delete_collection().await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.query(&[1.0, 0.0], 5).await.unwrap().is_empty());
    }
}
