//! Embedding generation for semantic search and retrieval.

mod gemini;
mod openai;

pub use gemini::{GeminiEmbedder, GEMINI_BASE_URL};
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingSettings, Provider};
use crate::error::{C3Error, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Build the configured embedder.
///
/// Fails with a configuration error when the provider's API key is not set.
pub fn from_settings(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    let api_key = settings.provider.api_key().ok_or_else(|| {
        C3Error::Config(format!(
            "{} not set. Export it before running this command.",
            settings.provider.api_key_env()
        ))
    })?;

    let embedder: Arc<dyn Embedder> = match settings.provider {
        Provider::Gemini => {
            let mut embedder = GeminiEmbedder::new(&api_key, &settings.model)?;
            if let Some(base) = &settings.base_url {
                embedder = embedder.with_base_url(base);
            }
            Arc::new(embedder)
        }
        Provider::OpenAI => Arc::new(OpenAIEmbedder::with_config(
            &settings.model,
            settings.dimensions,
            settings.base_url.as_deref(),
        )?),
    };

    Ok(embedder)
}
