//! Vector store trait for persisting and searching embedded chunks.

use async_trait::async_trait;

use crate::document::{Chunk, ScoredChunk};
use crate::error::Result;

/// Similarity metric used by a collection.
///
/// The metric is fixed when the collection is created; stores that persist
/// data record it in collection metadata and refuse to reopen under a
/// different metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Cosine similarity (higher is closer). The default.
    Cosine,
    /// Euclidean distance, reported as a negated score so that higher is
    /// still closer.
    L2,
}

impl Metric {
    /// Stable name used in persisted collection metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Cosine => "cosine",
            Metric::L2 => "l2",
        }
    }

    /// Parse a persisted metric name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "cosine" => Some(Metric::Cosine),
            "l2" => Some(Metric::L2),
            _ => None,
        }
    }
}

/// A storage backend bound to a single named collection of embedded chunks.
///
/// A store is constructed with its collection name (and, for persistent
/// backends, a filesystem path) and supports adding records, k-nearest
/// search, counting, and whole-collection deletion. Records are never
/// mutated after insertion.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Add chunks (with embeddings attached) and return the generated
    /// record ids.
    ///
    /// Every call inserts fresh records with new ids: re-ingesting the same
    /// content duplicates it. There is no content-hash upsert.
    async fn add(&self, chunks: &[Chunk]) -> Result<Vec<String>>;

    /// Return the `k` records nearest to `embedding`, ordered by
    /// descending similarity. Exact ties are broken by insertion order,
    /// earliest first.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<ScoredChunk>>;

    /// Number of records in the collection.
    async fn count(&self) -> Result<usize>;

    /// Delete the collection and all its records.
    async fn delete_collection(&self) -> Result<()>;
}
