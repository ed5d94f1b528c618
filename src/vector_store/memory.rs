//! In-memory vector store implementation.
//!
//! Useful for testing and offline runs.

use super::{cosine_similarity, Document, SearchMatch, VectorStore};
use crate::error::{C3Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store.
pub struct MemoryVectorStore {
    documents: RwLock<BTreeMap<String, Document>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Document>>> {
        self.documents
            .read()
            .map_err(|_| C3Error::VectorStore("Memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Document>>> {
        self.documents
            .write()
            .map_err(|_| C3Error::VectorStore("Memory store lock poisoned".to_string()))
    }

    /// Snapshot of every stored document, ordered by ID.
    pub fn documents(&self) -> Result<Vec<Document>> {
        Ok(self.read()?.values().cloned().collect())
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn reset(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    async fn ensure_collection(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, docs: &[Document]) -> Result<usize> {
        let mut store = self.write()?;
        for doc in docs {
            store.insert(doc.id.clone(), doc.clone());
        }
        Ok(docs.len())
    }

    async fn query(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchMatch>> {
        let docs = self.read()?;

        let mut results: Vec<SearchMatch> = docs
            .values()
            .map(|doc| SearchMatch {
                score: cosine_similarity(query_embedding, &doc.embedding),
                document: doc.clone(),
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        Ok(results)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    async fn heartbeat(&self) -> Result<()> {
        Ok(())
    }
}
