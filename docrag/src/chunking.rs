//! Recursive document chunking with overlap.
//!
//! [`RecursiveChunker`] splits text on a priority-ordered separator list
//! (paragraph break, line break, space), merges adjacent fragments up to the
//! configured size, and repeats the trailing overlap of each chunk at the
//! start of the next. Text with no usable separators falls back to a hard
//! character cut. Overlap is never carried across document boundaries.

use tracing::debug;

use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};

/// Separator priority: paragraph break, line break, space. An exhausted
/// list falls back to a hard character cut, which guarantees termination.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s whose metadata is an unmodified copy
/// of the parent document's metadata and whose embedding is empty; the
/// ingestion pipeline attaches embeddings later.
pub trait Chunker: Send + Sync {
    /// Split a single document into chunks.
    ///
    /// Returns an empty `Vec` for a document with empty text.
    fn split(&self, document: &Document) -> Vec<Chunk>;

    /// Split a batch of documents, preserving document order.
    ///
    /// Each document is split independently, so chunk overlap never spans
    /// a document boundary.
    fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents.iter().flat_map(|doc| self.split(doc)).collect()
    }
}

/// Splits text recursively by separator priority with configurable overlap.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 200)?;
/// let chunks = chunker.split(&document);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Chunking`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Chunking("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Chunking(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// Split raw text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        split_and_merge(text, self.chunk_size, self.chunk_overlap, &SEPARATORS)
    }
}

impl Chunker for RecursiveChunker {
    fn split(&self, document: &Document) -> Vec<Chunk> {
        if document.content.is_empty() {
            debug!(source = document.source(), "document is empty, producing no chunks");
            return Vec::new();
        }

        self.split_text(&document.content)
            .into_iter()
            .map(|content| Chunk {
                content,
                metadata: document.metadata.clone(),
                embedding: Vec::new(),
            })
            .collect()
    }
}

/// Split text by the first separator, merging fragments up to `chunk_size`
/// and carrying the trailing `chunk_overlap` characters of each emitted
/// chunk into the next. Fragments still exceeding `chunk_size` recurse into
/// the next separator; the empty separator list means a hard character cut.
fn split_and_merge(text: &str, chunk_size: usize, chunk_overlap: usize, seps: &[&str]) -> Vec<String> {
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }
    let Some((separator, rest)) = seps.split_first() else {
        return split_by_size(text, chunk_size, chunk_overlap);
    };

    let mut chunks = Vec::new();
    let mut current = String::new();

    for segment in split_keeping_separator(text, separator) {
        if segment.len() > chunk_size {
            // No boundary fits; recurse with finer separators. Chunks from
            // the recursion already carry their own overlap.
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            chunks.extend(split_and_merge(segment, chunk_size, chunk_overlap, rest));
        } else if current.is_empty() {
            current = segment.to_string();
        } else if current.len() + segment.len() <= chunk_size {
            current.push_str(segment);
        } else {
            // Emit the full chunk; the next one starts with its trailing
            // overlap, trimmed so the size invariant holds.
            let budget = chunk_overlap.min(chunk_size - segment.len());
            let carry = overlap_tail(&current, budget);
            chunks.push(current);
            current = carry;
            current.push_str(segment);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split text at a separator while keeping the separator attached to the
/// preceding segment, so chunk contents stay contiguous with the source.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Hard character cut: stride by `chunk_size - chunk_overlap` so adjacent
/// cuts share exactly `chunk_overlap` characters at the boundary.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let step = chunk_size - chunk_overlap;
    let mut start = 0;

    while start < text.len() {
        let end = floor_boundary(text, (start + chunk_size).min(text.len()));
        chunks.push(text[start..end].to_string());
        if end == text.len() {
            break;
        }
        let mut next = floor_boundary(text, start + step);
        if next <= start {
            next = ceil_boundary(text, start + step);
        }
        start = next;
    }

    chunks
}

/// The trailing `overlap` bytes of `s`, snapped forward to a char boundary.
fn overlap_tail(s: &str, overlap: usize) -> String {
    if overlap == 0 {
        return String::new();
    }
    let start = ceil_boundary(s, s.len().saturating_sub(overlap));
    s[start..].to_string()
}

/// Largest char boundary `<= i`.
fn floor_boundary(s: &str, mut i: usize) -> usize {
    i = i.min(s.len());
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest char boundary `>= i`.
fn ceil_boundary(s: &str, mut i: usize) -> usize {
    i = i.min(s.len());
    while !s.is_char_boundary(i) {
        i += 1;
    }
    i
}
