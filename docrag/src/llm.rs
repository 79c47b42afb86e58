//! Language model trait for single-shot text generation.

use async_trait::async_trait;

use crate::error::Result;

/// A language model invoked with a fully rendered prompt.
///
/// One call per query: no retry, no streaming. Resilience, if needed,
/// belongs to the caller.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a completion for the given prompt and return the raw text.
    async fn generate(&self, prompt: &str) -> Result<String>;
}
