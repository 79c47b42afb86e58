//! Ingestion pipeline orchestrator.
//!
//! [`IngestionPipeline`] coordinates the load → chunk → embed → store
//! workflow by composing a [`Chunker`], an [`EmbeddingProvider`], and a
//! [`VectorStore`]. Every step is a sequential, blocking call; there is no
//! batching pipeline and no parallelism.
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag::{IngestionPipeline, InMemoryVectorStore, RecursiveChunker};
//!
//! let pipeline = IngestionPipeline::builder()
//!     .collection_name("documents")
//!     .chunker(Arc::new(RecursiveChunker::new(1000, 200)?))
//!     .embedder(Arc::new(my_embedder))
//!     .store(Arc::new(InMemoryVectorStore::new()))
//!     .build()?;
//!
//! let report = pipeline.ingest_directory("data/inputs").await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::chunking::Chunker;
use crate::document::Document;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::loader::DocumentLoader;
use crate::vectorstore::VectorStore;

/// Outcome of one ingestion run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents successfully loaded from the source directory.
    pub documents_loaded: usize,
    /// Files skipped because of an unsupported extension.
    pub files_skipped: usize,
    /// Files that failed to parse.
    pub files_failed: usize,
    /// Chunks produced by the chunker.
    pub chunks_created: usize,
    /// Records added to the vector store.
    pub records_added: usize,
}

/// Collection statistics reported after ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStats {
    /// Total records in the collection.
    pub count: usize,
    /// The collection name.
    pub collection_name: String,
}

/// The ingestion orchestrator. Construct one via
/// [`IngestionPipeline::builder()`].
pub struct IngestionPipeline {
    collection_name: String,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
}

impl IngestionPipeline {
    /// Create a new [`IngestionPipelineBuilder`].
    pub fn builder() -> IngestionPipelineBuilder {
        IngestionPipelineBuilder::default()
    }

    /// Return a reference to the vector store.
    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Ingest every supported file under `directory`.
    ///
    /// Zero loaded documents or zero chunks is not an error; the report
    /// simply records zero additions.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Loader`] if the directory is missing, or
    /// [`RagError::Pipeline`] if embedding or storage fails.
    pub async fn ingest_directory(&self, directory: impl AsRef<Path>) -> Result<IngestReport> {
        let loader = DocumentLoader::new(directory.as_ref())?;
        let load = loader.load_all()?;

        let mut report = self.ingest_documents(&load.documents).await?;
        report.files_skipped = load.skipped.len();
        report.files_failed = load.failed.len();
        Ok(report)
    }

    /// Ingest already-loaded documents: chunk → embed → store.
    pub async fn ingest_documents(&self, documents: &[Document]) -> Result<IngestReport> {
        let mut report = IngestReport { documents_loaded: documents.len(), ..Default::default() };

        let mut chunks = self.chunker.split_documents(documents);
        report.chunks_created = chunks.len();
        if chunks.is_empty() {
            info!(documents = documents.len(), "nothing to ingest");
            return Ok(report);
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await.map_err(|e| {
            error!(error = %e, "embedding failed during ingestion");
            RagError::Pipeline(format!("embedding failed: {e}"))
        })?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::Pipeline(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let ids = self.store.add(&chunks).await.map_err(|e| {
            error!(error = %e, "store add failed during ingestion");
            RagError::Pipeline(format!("vector store add failed: {e}"))
        })?;
        report.records_added = ids.len();

        info!(
            documents = report.documents_loaded,
            chunks = report.chunks_created,
            records = report.records_added,
            "ingestion complete"
        );
        Ok(report)
    }

    /// Current collection statistics.
    pub async fn stats(&self) -> Result<CollectionStats> {
        Ok(CollectionStats {
            count: self.store.count().await?,
            collection_name: self.collection_name.clone(),
        })
    }
}

/// Builder for constructing an [`IngestionPipeline`].
#[derive(Default)]
pub struct IngestionPipelineBuilder {
    collection_name: Option<String>,
    chunker: Option<Arc<dyn Chunker>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
}

impl IngestionPipelineBuilder {
    /// Set the collection name (reported in statistics).
    pub fn collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector store.
    pub fn store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the [`IngestionPipeline`], validating that all fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<IngestionPipeline> {
        Ok(IngestionPipeline {
            collection_name: self
                .collection_name
                .ok_or_else(|| RagError::Config("collection_name is required".to_string()))?,
            chunker: self
                .chunker
                .ok_or_else(|| RagError::Config("chunker is required".to_string()))?,
            embedder: self
                .embedder
                .ok_or_else(|| RagError::Config("embedder is required".to_string()))?,
            store: self.store.ok_or_else(|| RagError::Config("store is required".to_string()))?,
        })
    }
}
