//! Integration tests for the SQLite-backed vector store.

use std::collections::HashMap;

use docrag::document::Chunk;
use docrag::sqlite::SqliteVectorStore;
use docrag::vectorstore::{Metric, VectorStore};

fn chunk(content: &str, embedding: Vec<f32>) -> Chunk {
    Chunk {
        content: content.to_string(),
        metadata: HashMap::from([("source_file".to_string(), format!("{content}.txt"))]),
        embedding,
    }
}

#[tokio::test]
async fn add_and_query_returns_closest_first() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("store.db"), "docs", 3, Metric::Cosine)
        .await
        .unwrap();

    let ids = store
        .add(&[
            chunk("x-axis", vec![1.0, 0.0, 0.0]),
            chunk("y-axis", vec![0.0, 1.0, 0.0]),
            chunk("diagonal", vec![0.7071, 0.7071, 0.0]),
        ])
        .await
        .unwrap();
    assert_eq!(ids.len(), 3);

    let results = store.query(&[1.0, 0.0, 0.0], 2).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].chunk.content, "x-axis");
    assert_eq!(results[1].chunk.content, "diagonal");
    assert!(results[0].score > results[1].score);
}

#[tokio::test]
async fn metadata_round_trips_through_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("store.db"), "docs", 2, Metric::Cosine)
        .await
        .unwrap();

    store.add(&[chunk("alpha", vec![1.0, 0.0])]).await.unwrap();
    let results = store.query(&[1.0, 0.0], 1).await.unwrap();
    assert_eq!(results[0].chunk.metadata["source_file"], "alpha.txt");
    assert_eq!(results[0].chunk.embedding, vec![1.0, 0.0]);
}

#[tokio::test]
async fn records_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    {
        let store = SqliteVectorStore::open(&path, "docs", 2, Metric::Cosine).await.unwrap();
        store.add(&[chunk("persisted", vec![1.0, 0.0])]).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }

    let reopened = SqliteVectorStore::open(&path, "docs", 2, Metric::Cosine).await.unwrap();
    assert_eq!(reopened.count().await.unwrap(), 1);
    let results = reopened.query(&[1.0, 0.0], 1).await.unwrap();
    assert_eq!(results[0].chunk.content, "persisted");
}

#[tokio::test]
async fn reopen_with_different_dimensions_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    SqliteVectorStore::open(&path, "docs", 3, Metric::Cosine).await.unwrap();
    let err = SqliteVectorStore::open(&path, "docs", 4, Metric::Cosine).await.unwrap_err();
    assert!(err.to_string().contains("dimensions"));
}

#[tokio::test]
async fn reopen_with_different_metric_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    SqliteVectorStore::open(&path, "docs", 3, Metric::Cosine).await.unwrap();
    assert!(SqliteVectorStore::open(&path, "docs", 3, Metric::L2).await.is_err());
}

#[tokio::test]
async fn mismatched_embedding_dimensions_are_rejected_on_add() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("store.db"), "docs", 3, Metric::Cosine)
        .await
        .unwrap();

    let err = store.add(&[chunk("short", vec![1.0, 0.0])]).await.unwrap_err();
    assert!(err.to_string().contains("dimensions"));
    assert_eq!(store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn exact_ties_resolve_by_insertion_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("store.db"), "docs", 2, Metric::Cosine)
        .await
        .unwrap();

    // Identical embeddings: distance ties, earliest insert wins.
    store.add(&[chunk("first", vec![1.0, 0.0])]).await.unwrap();
    store.add(&[chunk("second", vec![1.0, 0.0])]).await.unwrap();
    store.add(&[chunk("third", vec![1.0, 0.0])]).await.unwrap();

    let results = store.query(&[1.0, 0.0], 3).await.unwrap();
    let contents: Vec<_> = results.iter().map(|r| r.chunk.content.as_str()).collect();
    assert_eq!(contents, ["first", "second", "third"]);
}

#[tokio::test]
async fn duplicate_content_gets_fresh_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("store.db"), "docs", 2, Metric::Cosine)
        .await
        .unwrap();

    let same = chunk("same", vec![1.0, 0.0]);
    let first = store.add(std::slice::from_ref(&same)).await.unwrap();
    let second = store.add(std::slice::from_ref(&same)).await.unwrap();
    assert_ne!(first[0], second[0]);
    assert_eq!(store.count().await.unwrap(), 2);
}

#[tokio::test]
async fn collections_are_isolated_within_one_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    let a = SqliteVectorStore::open(&path, "alpha", 2, Metric::Cosine).await.unwrap();
    let b = SqliteVectorStore::open(&path, "beta", 2, Metric::Cosine).await.unwrap();
    a.add(&[chunk("only-in-alpha", vec![1.0, 0.0])]).await.unwrap();

    assert_eq!(a.count().await.unwrap(), 1);
    assert_eq!(b.count().await.unwrap(), 0);
    assert!(b.query(&[1.0, 0.0], 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_collection_empties_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");

    let store = SqliteVectorStore::open(&path, "docs", 2, Metric::Cosine).await.unwrap();
    store.add(&[chunk("gone", vec![1.0, 0.0])]).await.unwrap();
    store.delete_collection().await.unwrap();
    assert_eq!(store.count().await.unwrap(), 0);

    // Metadata row is gone too, so the collection can be recreated with a
    // different shape.
    let recreated = SqliteVectorStore::open(&path, "docs", 5, Metric::L2).await.unwrap();
    assert_eq!(recreated.count().await.unwrap(), 0);
}

#[tokio::test]
async fn l2_metric_orders_by_euclidean_distance() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteVectorStore::open(dir.path().join("store.db"), "docs", 2, Metric::L2)
        .await
        .unwrap();

    store
        .add(&[chunk("far", vec![10.0, 10.0]), chunk("near", vec![1.0, 1.0])])
        .await
        .unwrap();

    let results = store.query(&[0.0, 0.0], 2).await.unwrap();
    assert_eq!(results[0].chunk.content, "near");
    assert_eq!(results[1].chunk.content, "far");
}
