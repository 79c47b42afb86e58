//! Environment-driven configuration.
//!
//! [`Settings`] is built once at process start and passed to each component
//! constructor. Missing required values and unparseable numbers fail fast,
//! before any I/O happens.

use std::path::PathBuf;

use crate::error::{RagError, Result};

/// Default chunk size in characters.
const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between consecutive chunks in characters.
const DEFAULT_CHUNK_OVERLAP: usize = 200;
/// Default number of neighbors retrieved per query.
const DEFAULT_TOP_K: usize = 5;
/// Default sampling temperature for the language model.
const DEFAULT_TEMPERATURE: f32 = 0.1;
/// Default collection name in the vector store.
const DEFAULT_COLLECTION_NAME: &str = "documents";
/// Default persistence path for the vector store.
const DEFAULT_VECTOR_STORE_PATH: &str = "./vector_store";

/// Application settings, read once from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// API key for the Gemini embedding and language-model endpoints.
    pub google_api_key: String,
    /// Language model name (e.g. `gemini-2.0-flash`).
    pub llm_model: String,
    /// Embedding model name (e.g. `text-embedding-004`).
    pub embedding_model: String,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Number of neighbors retrieved per query.
    pub top_k: usize,
    /// Sampling temperature for the language model.
    pub temperature: f32,
    /// Collection name in the vector store.
    pub collection_name: String,
    /// Persistence path for the vector store.
    pub vector_store_path: PathBuf,
}

impl Settings {
    /// Read settings from process environment variables.
    ///
    /// Recognized variables: `GOOGLE_API_KEY`, `LLM_MODEL`,
    /// `EMBEDDING_MODEL` (required); `CHUNK_SIZE`, `CHUNK_OVERLAP`,
    /// `TOP_K`, `TEMPERATURE`, `COLLECTION_NAME`, `VECTOR_STORE_PATH`
    /// (optional, defaulted).
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required variable is missing or
    /// empty, a numeric variable fails to parse, or the resulting values
    /// fail validation.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    ///
    /// This is the seam tests use to inject fake environments.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let settings = Self {
            google_api_key: required(&lookup, "GOOGLE_API_KEY")?,
            llm_model: required(&lookup, "LLM_MODEL")?,
            embedding_model: required(&lookup, "EMBEDDING_MODEL")?,
            chunk_size: parsed(&lookup, "CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?,
            chunk_overlap: parsed(&lookup, "CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?,
            top_k: parsed(&lookup, "TOP_K", DEFAULT_TOP_K)?,
            temperature: parsed(&lookup, "TEMPERATURE", DEFAULT_TEMPERATURE)?,
            collection_name: lookup("COLLECTION_NAME")
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string()),
            vector_store_path: lookup("VECTOR_STORE_PATH")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VECTOR_STORE_PATH)),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Validate cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `chunk_size == 0`,
    /// `chunk_overlap >= chunk_size`, or `top_k == 0`.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(())
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    lookup(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RagError::Config(format!("required environment variable {key} is not set")))
}

fn parsed<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.is_empty() => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| RagError::Config(format!("invalid value for {key}: '{raw}'"))),
    }
}
