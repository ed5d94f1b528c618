//! Gemini (Google Generative AI) embeddings implementation.

use super::Embedder;
use crate::error::{C3Error, Result};
use crate::http::shared_client;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Default Generative Language API endpoint.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini-based embedder.
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

impl GeminiEmbedder {
    /// Create a new Gemini embedder for the given model (e.g. `text-embedding-004`).
    pub fn new(api_key: &str, model: &str) -> Result<Self> {
        Ok(Self {
            client: shared_client()?,
            api_key: api_key.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            model: model.strip_prefix("models/").unwrap_or(model).to_string(),
        })
    }

    /// Point the embedder at a different endpoint.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, self.model, method)
    }

    fn request<'a>(&self, text: &'a str) -> EmbedContentRequest<'a> {
        EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content {
                parts: vec![Part { text }],
            },
        }
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, method: &str, body: &B) -> Result<R> {
        let response = self
            .client
            .post(self.endpoint(method))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| C3Error::Embedding(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(C3Error::Embedding(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| C3Error::Embedding(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    #[instrument(skip(self, text), fields(model = %self.model))]
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response: EmbedContentResponse = self.post("embedContent", &self.request(text)).await?;
        if response.embedding.values.is_empty() {
            return Err(C3Error::Embedding("Empty embedding response".to_string()));
        }
        Ok(response.embedding.values)
    }
}
