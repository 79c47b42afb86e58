//! In-memory vector store.
//!
//! [`InMemoryVectorStore`] keeps records in insertion order in a `Vec`
//! behind a `tokio::sync::RwLock`. Suitable for tests and small data sets;
//! nothing is persisted.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{Chunk, ScoredChunk};
use crate::error::Result;
use crate::vectorstore::{Metric, VectorStore};

struct StoredRecord {
    id: String,
    chunk: Chunk,
}

/// A single-collection vector store held entirely in memory.
///
/// Records keep their insertion order, and the similarity sort is stable,
/// so exact score ties resolve to the earliest-ingested record.
pub struct InMemoryVectorStore {
    metric: Metric,
    records: RwLock<Vec<StoredRecord>>,
}

impl InMemoryVectorStore {
    /// Create an empty store using cosine similarity.
    pub fn new() -> Self {
        Self::with_metric(Metric::Cosine)
    }

    /// Create an empty store using the given metric.
    pub fn with_metric(metric: Metric) -> Self {
        Self { metric, records: RwLock::new(Vec::new()) }
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cosine similarity of two vectors; 0.0 if either has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Negated Euclidean distance, so that higher scores are closer.
pub(crate) fn neg_l2_distance(a: &[f32], b: &[f32]) -> f32 {
    let sum: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
    -sum.sqrt()
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn add(&self, chunks: &[Chunk]) -> Result<Vec<String>> {
        let mut records = self.records.write().await;
        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            let id = Uuid::new_v4().to_string();
            records.push(StoredRecord { id: id.clone(), chunk: chunk.clone() });
            ids.push(id);
        }
        Ok(ids)
    }

    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let records = self.records.read().await;
        let mut scored: Vec<ScoredChunk> = records
            .iter()
            .map(|record| {
                let score = match self.metric {
                    Metric::Cosine => cosine_similarity(&record.chunk.embedding, embedding),
                    Metric::L2 => neg_l2_distance(&record.chunk.embedding, embedding),
                };
                ScoredChunk { chunk: record.chunk.clone(), score }
            })
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }

    async fn delete_collection(&self) -> Result<()> {
        self.records.write().await.clear();
        Ok(())
    }
}
