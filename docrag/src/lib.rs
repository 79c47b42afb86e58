//! # docrag
//!
//! Retrieval-augmented generation over a directory of documents.
//!
//! The pipeline ingests heterogeneous files, splits them into overlapping
//! text chunks, embeds the chunks, persists them in a vector store, and
//! answers natural-language questions by retrieving the most similar chunks
//! and conditioning a language model on them.
//!
//! - [`DocumentLoader`] — directory walk with per-extension format adapters
//! - [`RecursiveChunker`] — separator-priority splitting with overlap
//! - [`GeminiEmbedder`] / [`GeminiChat`] — Gemini REST providers
//! - [`SqliteVectorStore`] / [`InMemoryVectorStore`] — similarity search
//! - [`IngestionPipeline`] — load → chunk → embed → store
//! - [`QueryEngine`] — retrieve → build context → answer
//!
//! Everything runs sequentially: one embedding call and one index query per
//! question, no caching, no retries.

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod gemini;
pub mod inmemory;
pub mod llm;
pub mod loader;
pub mod pipeline;
pub mod query;
pub mod sqlite;
pub mod vectorstore;

pub use chunking::{Chunker, RecursiveChunker};
pub use config::Settings;
pub use document::{Chunk, Document, ScoredChunk};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use gemini::{GeminiChat, GeminiEmbedder};
pub use inmemory::InMemoryVectorStore;
pub use llm::ChatModel;
pub use loader::{DocumentLoader, FileStatistics, LoadReport};
pub use pipeline::{CollectionStats, IngestReport, IngestionPipeline};
pub use query::{Answer, QueryEngine, INSUFFICIENT_CONTEXT_RESPONSE, NO_DOCUMENTS_RESPONSE};
pub use sqlite::SqliteVectorStore;
pub use vectorstore::{Metric, VectorStore};
