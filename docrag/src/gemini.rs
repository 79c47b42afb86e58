//! Gemini providers for embeddings and text generation.
//!
//! Both providers call the Generative Language REST API directly with
//! `reqwest`: [`GeminiEmbedder`] wraps `embedContent` /
//! `batchEmbedContents`, [`GeminiChat`] wraps `generateContent`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::ChatModel;

/// The default Generative Language API base URL.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Known embedding-model output dimensionalities.
///
/// Unknown models fall back to 768; override with
/// [`GeminiEmbedder::with_dimensions`].
fn model_dimensions(model: &str) -> usize {
    match model {
        "gemini-embedding-001" => 3072,
        "text-embedding-004" | "text-embedding-005" => 768,
        _ => 768,
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

impl Content {
    fn text(text: &str) -> Self {
        Self { role: None, parts: vec![Part { text: text.to_string() }] }
    }

    fn user(text: &str) -> Self {
        Self { role: Some("user".to_string()), parts: vec![Part { text: text.to_string() }] }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest {
    content: Content,
    task_type: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchEmbedEntry {
    model: String,
    content: Content,
    task_type: &'static str,
}

#[derive(Serialize)]
struct BatchEmbedRequest {
    requests: Vec<BatchEmbedEntry>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// POST a JSON body to a model endpoint and decode the response,
/// extracting the API error message on non-success statuses.
async fn post_json<Req: Serialize, Res: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &Req,
    fail: impl Fn(String) -> RagError,
) -> Result<Res> {
    let response = client
        .post(url)
        .header("x-goog-api-key", api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            error!(provider = "Gemini", error = %e, "request failed");
            fail(format!("request failed: {e}"))
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail =
            serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body);
        error!(provider = "Gemini", %status, "API error");
        return Err(fail(format!("API returned {status}: {detail}")));
    }

    response.json().await.map_err(|e| {
        error!(provider = "Gemini", error = %e, "failed to parse response");
        fail(format!("failed to parse response: {e}"))
    })
}

// ── Embedding provider ─────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
///
/// Single texts are embedded with task type `RETRIEVAL_QUERY` (the query
/// path); batches use `RETRIEVAL_DOCUMENT` (the ingestion path).
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    /// Create a new embedder for the given API key and model name.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the API key is empty.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Embedding {
                provider: "Gemini".into(),
                message: "API key must not be empty".into(),
            });
        }
        let model = model.into();
        let dimensions = model_dimensions(&model);
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: GEMINI_BASE_URL.to_string(),
            dimensions,
        })
    }

    /// Override the expected output dimensionality.
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn fail(message: String) -> RagError {
        RagError::Embedding { provider: "Gemini".into(), message }
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Gemini", text_len = text.len(), "embedding single text");

        let url = format!("{}/models/{}:embedContent", self.base_url, self.model);
        let request = EmbedRequest { content: Content::text(text), task_type: "RETRIEVAL_QUERY" };
        let response: EmbedResponse =
            post_json(&self.client, &url, &self.api_key, &request, Self::fail).await?;
        Ok(response.embedding.values)
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(provider = "Gemini", batch_size = texts.len(), model = %self.model, "embedding batch");

        let url = format!("{}/models/{}:batchEmbedContents", self.base_url, self.model);
        let request = BatchEmbedRequest {
            requests: texts
                .iter()
                .map(|text| BatchEmbedEntry {
                    model: format!("models/{}", self.model),
                    content: Content::text(text),
                    task_type: "RETRIEVAL_DOCUMENT",
                })
                .collect(),
        };
        let response: BatchEmbedResponse =
            post_json(&self.client, &url, &self.api_key, &request, Self::fail).await?;

        if response.embeddings.len() != texts.len() {
            return Err(Self::fail(format!(
                "API returned {} embeddings for {} inputs",
                response.embeddings.len(),
                texts.len()
            )));
        }
        Ok(response.embeddings.into_iter().map(|e| e.values).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Chat model ─────────────────────────────────────────────────────

/// A [`ChatModel`] backed by the Gemini `generateContent` endpoint.
///
/// Issues exactly one request per call, with the configured sampling
/// temperature and no streaming.
pub struct GeminiChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
}

impl GeminiChat {
    /// Create a new chat model client.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Llm`] if the API key is empty.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Llm {
                provider: "Gemini".into(),
                message: "API key must not be empty".into(),
            });
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            temperature,
        })
    }

    /// Override the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn fail(message: String) -> RagError {
        RagError::Llm { provider: "Gemini".into(), message }
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = "Gemini", model = %self.model, prompt_len = prompt.len(), "generating");

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let request = GenerateRequest {
            contents: vec![Content::user(prompt)],
            generation_config: GenerationConfig { temperature: self.temperature },
        };
        let response: GenerateResponse =
            post_json(&self.client, &url, &self.api_key, &request, Self::fail).await?;

        let text = response
            .candidates
            .into_iter()
            .next()
            .map(|c| c.content.parts.into_iter().map(|p| p.text).collect::<String>())
            .ok_or_else(|| Self::fail("API returned no candidates".into()))?;
        Ok(text)
    }
}
