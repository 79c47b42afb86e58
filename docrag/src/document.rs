//! Data types for documents, chunks, and retrieval results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Metadata key holding the full path of the source file.
pub const META_SOURCE_FILE: &str = "source_file";
/// Metadata key holding the bare file name of the source file.
pub const META_FILE_NAME: &str = "file_name";
/// Metadata key holding the detected file type (e.g. `pdf`, `markdown`).
pub const META_FILE_TYPE: &str = "file_type";

/// A source document: text content plus metadata. Immutable after load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// The text content of the document.
    pub content: String,
    /// Key-value metadata (source path, file name, file type).
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document from content and metadata.
    pub fn new(content: impl Into<String>, metadata: HashMap<String, String>) -> Self {
        Self { content: content.into(), metadata }
    }

    /// A human-readable source identifier: the source path if present,
    /// falling back to the file name, then `"unknown"`.
    pub fn source(&self) -> &str {
        self.metadata
            .get(META_SOURCE_FILE)
            .or_else(|| self.metadata.get(META_FILE_NAME))
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

/// A bounded segment of a [`Document`].
///
/// Metadata is a field-for-field copy of the parent document's metadata;
/// chunk identity is positional only. The embedding is empty until the
/// ingestion pipeline attaches one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The text content of the chunk.
    pub content: String,
    /// Metadata inherited unchanged from the parent document.
    pub metadata: HashMap<String, String>,
    /// The vector embedding for this chunk's text.
    pub embedding: Vec<f32>,
}

impl Chunk {
    /// Source identifier, resolved the same way as [`Document::source`].
    pub fn source(&self) -> &str {
        self.metadata
            .get(META_SOURCE_FILE)
            .or_else(|| self.metadata.get(META_FILE_NAME))
            .map(String::as_str)
            .unwrap_or("unknown")
    }
}

/// A retrieved [`Chunk`] paired with a similarity score (higher is closer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The similarity score under the collection's metric.
    pub score: f32,
}
