//! Retrieval and question answering.
//!
//! [`QueryEngine`] embeds a question, retrieves the nearest chunks from the
//! vector store, assembles them into a bounded context string, and invokes
//! the language model exactly once with a deterministic prompt. Empty
//! retrieval short-circuits to a canned response without touching the model.

use std::sync::Arc;

use tracing::{error, info};

use crate::document::ScoredChunk;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::ChatModel;
use crate::vectorstore::VectorStore;

/// Returned verbatim when retrieval produces no chunks; the language model
/// is not invoked in that case.
pub const NO_DOCUMENTS_RESPONSE: &str = "No relevant documents found to answer your question.";

/// The fallback phrase the model is instructed to emit verbatim when the
/// context is insufficient.
pub const INSUFFICIENT_CONTEXT_RESPONSE: &str =
    "I cannot answer this question based on the provided documents.";

/// An answer plus the retrieved chunks that supported it.
#[derive(Debug, Clone)]
pub struct Answer {
    /// The raw model response (or a canned response on empty retrieval).
    pub text: String,
    /// The retrieval result used to build the context, for provenance.
    pub sources: Vec<ScoredChunk>,
}

/// Answers questions against an ingested collection.
pub struct QueryEngine {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    model: Arc<dyn ChatModel>,
    top_k: usize,
}

impl QueryEngine {
    /// Create a query engine over the given components.
    ///
    /// `top_k` is the number of neighbors retrieved per question.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if `top_k` is zero.
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        model: Arc<dyn ChatModel>,
        top_k: usize,
    ) -> Result<Self> {
        if top_k == 0 {
            return Err(RagError::Config("top_k must be greater than zero".to_string()));
        }
        Ok(Self { embedder, store, model, top_k })
    }

    /// Retrieve the `k` chunks most similar to `query`, in descending
    /// similarity order.
    ///
    /// One embedding call and one index query; nothing is cached.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let embedding = self.embedder.embed(query).await.map_err(|e| {
            error!(error = %e, "query embedding failed");
            RagError::Pipeline(format!("query embedding failed: {e}"))
        })?;
        let results = self.store.query(&embedding, k).await.map_err(|e| {
            error!(error = %e, "vector store query failed");
            RagError::Pipeline(format!("retrieval failed: {e}"))
        })?;
        info!(query_len = query.len(), hits = results.len(), "retrieved chunks");
        Ok(results)
    }

    /// Render retrieved chunks into a context string.
    ///
    /// Each chunk becomes a `[Source: <identifier>]` block followed by its
    /// content; blocks are joined with a blank line, preserving the
    /// descending-similarity input order. Overlapping content is not
    /// de-duplicated, and no length cap is applied beyond the chunk count:
    /// keeping `k × chunk_size` within the model's input limit is the
    /// caller's responsibility.
    pub fn build_context(&self, results: &[ScoredChunk]) -> String {
        render_context(results)
    }

    /// Answer a question from the ingested documents.
    ///
    /// Empty retrieval returns [`NO_DOCUMENTS_RESPONSE`] with no sources and
    /// no model invocation. Otherwise the model is invoked exactly once.
    pub async fn answer(&self, question: &str) -> Result<Answer> {
        info!(question, "processing query");
        let sources = self.retrieve(question, self.top_k).await?;
        if sources.is_empty() {
            return Ok(Answer { text: NO_DOCUMENTS_RESPONSE.to_string(), sources });
        }

        let context = self.build_context(&sources);
        let prompt = default_prompt(&context, question);
        let text = self.model.generate(&prompt).await?;
        Ok(Answer { text, sources })
    }

    /// Answer with a caller-supplied prompt template.
    ///
    /// `{context}` and `{question}` placeholders are substituted verbatim;
    /// neither the question nor the context is sanitized against template
    /// injection (inputs are assumed benign).
    pub async fn answer_with_template(&self, question: &str, template: &str) -> Result<Answer> {
        let sources = self.retrieve(question, self.top_k).await?;
        if sources.is_empty() {
            return Ok(Answer { text: NO_DOCUMENTS_RESPONSE.to_string(), sources });
        }

        let context = self.build_context(&sources);
        let prompt = template.replace("{context}", &context).replace("{question}", question);
        let text = self.model.generate(&prompt).await?;
        Ok(Answer { text, sources })
    }
}

fn render_context(results: &[ScoredChunk]) -> String {
    results
        .iter()
        .map(|result| format!("[Source: {}]\n{}", result.chunk.source(), result.chunk.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The fixed prompt: answer strictly from context, emit the fallback phrase
/// verbatim when the context is insufficient.
fn default_prompt(context: &str, question: &str) -> String {
    format!(
        "Based on the following context, please answer the question.\n\
         If the context doesn't contain enough information to answer the question,\n\
         please say \"{INSUFFICIENT_CONTEXT_RESPONSE}\"\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Chunk;
    use std::collections::HashMap;

    fn scored(content: &str, source: &str, score: f32) -> ScoredChunk {
        ScoredChunk {
            chunk: Chunk {
                content: content.to_string(),
                metadata: HashMap::from([("source_file".to_string(), source.to_string())]),
                embedding: Vec::new(),
            },
            score,
        }
    }

    #[test]
    fn default_prompt_contains_fallback_phrase() {
        let prompt = default_prompt("some context", "a question");
        assert!(prompt.contains(INSUFFICIENT_CONTEXT_RESPONSE));
        assert!(prompt.contains("Context:\nsome context"));
        assert!(prompt.contains("Question: a question"));
    }

    #[test]
    fn context_blocks_keep_input_order_and_format() {
        let results =
            vec![scored("first chunk", "/docs/a.pdf", 0.9), scored("second chunk", "b.txt", 0.5)];
        assert_eq!(
            render_context(&results),
            "[Source: /docs/a.pdf]\nfirst chunk\n\n[Source: b.txt]\nsecond chunk"
        );
    }

    #[test]
    fn empty_results_render_empty_context() {
        assert_eq!(render_context(&[]), "");
    }
}
