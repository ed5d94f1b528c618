//! Vector store abstraction for C3.
//!
//! Provides a trait-based interface for different vector database backends.

mod chroma;
mod memory;

pub use chroma::ChromaVectorStore;
pub use memory::MemoryVectorStore;

use crate::config::{Settings, VectorStoreProvider};
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A document stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique document ID within the collection.
    pub id: String,
    /// Source text the embedding was computed from.
    pub text: String,
    /// Embedding vector. Empty when the backend does not return vectors on query.
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl Document {
    /// Create a new document.
    pub fn new(id: impl Into<String>, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            embedding,
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    /// The matched document.
    pub document: Document,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector store implementations.
///
/// A store instance is bound to a single collection.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Drop the collection and everything in it.
    async fn reset(&self) -> Result<()>;

    /// Create the collection if it does not exist yet.
    async fn ensure_collection(&self) -> Result<()>;

    /// Insert or replace documents by ID.
    async fn upsert(&self, docs: &[Document]) -> Result<usize>;

    /// Return the `limit` nearest documents, best match first.
    async fn query(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchMatch>>;

    /// Get total document count.
    async fn count(&self) -> Result<usize>;

    /// Check that the backend is reachable.
    async fn heartbeat(&self) -> Result<()>;
}

/// Build the configured vector store.
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match settings.vector_store.provider {
        VectorStoreProvider::Chroma => {
            let mut store = ChromaVectorStore::new(
                &settings.vector_store.url,
                &settings.vector_store.collection,
            )?
            .with_tenant(&settings.vector_store.tenant, &settings.vector_store.database);
            if let Some(token) = settings.chroma_api_key() {
                store = store.with_token(&token);
            }
            Arc::new(store)
        }
        VectorStoreProvider::Memory => Arc::new(MemoryVectorStore::new()),
    };
    Ok(store)
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
