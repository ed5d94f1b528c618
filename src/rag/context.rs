//! Context retrieval for RAG responses.

use crate::config::Settings;
use crate::embedding::{self, Embedder};
use crate::error::{C3Error, Result};
use crate::vector_store::{SearchMatch, VectorStore};
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

/// Delimiter placed between retrieved documents.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Retrieves career records relevant to a query.
pub struct Retriever {
    embedder: Option<Arc<dyn Embedder>>,
    vector_store: Arc<dyn VectorStore>,
    top_k: usize,
}

impl Retriever {
    /// Create a retriever. Without an embedder every lookup yields no context.
    pub fn new(
        embedder: Option<Arc<dyn Embedder>>,
        vector_store: Arc<dyn VectorStore>,
        top_k: usize,
    ) -> Self {
        Self {
            embedder,
            vector_store,
            top_k,
        }
    }

    /// Build a retriever from settings.
    ///
    /// A missing API key is not an error here: the retriever is created
    /// without an embedder and logs once.
    pub fn from_settings(settings: &Settings, vector_store: Arc<dyn VectorStore>) -> Result<Self> {
        let embedder = match settings.embedding.provider.api_key() {
            Some(_) => Some(embedding::from_settings(&settings.embedding)?),
            None => {
                error!(
                    "{} is missing; retrieval will return no context",
                    settings.embedding.provider.api_key_env()
                );
                None
            }
        };

        Ok(Self::new(embedder, vector_store, settings.rag.top_k))
    }

    /// Whether lookups can reach the embedding API at all.
    pub fn is_configured(&self) -> bool {
        self.embedder.is_some()
    }

    /// Nearest stored documents for `query`, best first.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<SearchMatch>> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or_else(|| C3Error::Config("No embedding API key configured".to_string()))?;

        let query_embedding = embedder.embed(query).await?;
        self.vector_store.query(&query_embedding, self.top_k).await
    }

    /// Context text for `query`, or an empty string.
    ///
    /// Never fails: a missing key, no matches and every error all come back
    /// as empty context.
    pub async fn retrieve_context(&self, query: &str) -> String {
        if !self.is_configured() {
            return String::new();
        }

        match self.search(query).await {
            Ok(matches) if matches.is_empty() => {
                debug!("No documents matched the query");
                String::new()
            }
            Ok(matches) => {
                debug!("Retrieved {} documents", matches.len());
                join_documents(&matches)
            }
            Err(e) => {
                warn!("Error querying knowledge base: {}", e);
                String::new()
            }
        }
    }
}

/// Concatenate the text of each match with [`CONTEXT_SEPARATOR`].
pub fn join_documents(matches: &[SearchMatch]) -> String {
    matches
        .iter()
        .map(|m| m.document.text.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR)
}
