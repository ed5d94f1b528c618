//! Knowledge base seeding.
//!
//! Rebuilds the vector store collection from the static career dataset.

use crate::careers::CareerRecord;
use crate::config::Settings;
use crate::embedding::{self, Embedder};
use crate::error::{C3Error, Result};
use crate::vector_store::{self, Document, VectorStore};
use indicatif::ProgressBar;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Outcome of a seeding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedReport {
    /// Records read from the dataset.
    pub records: usize,
    /// Documents written to the store.
    pub documents_written: usize,
}

/// Embeds career records and writes them to the vector store.
pub struct Seeder {
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    progress: Option<ProgressBar>,
}

impl Seeder {
    /// Create a seeder from explicit components.
    pub fn new(embedder: Arc<dyn Embedder>, vector_store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            vector_store,
            progress: None,
        }
    }

    /// Create a seeder from settings. Fails when the embedding API key is missing.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let embedder = embedding::from_settings(&settings.embedding)?;
        let vector_store = vector_store::from_settings(settings)?;
        Ok(Self::new(embedder, vector_store))
    }

    /// Tick `progress` once per embedded record.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Replace the collection contents with `records`.
    ///
    /// The collection is dropped first; a failed drop is ignored. Every
    /// record is embedded before anything is written, so the first failed
    /// embedding leaves the store empty.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn seed(&self, records: &[CareerRecord]) -> Result<SeedReport> {
        if let Err(e) = self.vector_store.reset().await {
            debug!("Ignoring failed collection reset: {}", e);
        }
        self.vector_store.ensure_collection().await?;

        info!("Processing {} career paths", records.len());

        let mut documents = Vec::with_capacity(records.len());
        for record in records {
            let text = record.document_text();
            let vector = self.embedder.embed(&text).await.map_err(|e| {
                C3Error::Embedding(format!("Failed to embed '{}': {}", record.id, e))
            })?;

            documents.push(Document::new(record.id.clone(), text, vector));
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
        }

        let documents_written = self.vector_store.upsert(&documents).await?;
        info!("Seeded {} documents", documents_written);

        Ok(SeedReport {
            records: records.len(),
            documents_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::careers::parse_records;
    use crate::vector_store::{MemoryVectorStore, SearchMatch};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Succeeds for the first `fail_after` calls, then errors.
    struct CountingEmbedder {
        calls: AtomicUsize,
        fail_after: usize,
    }

    impl CountingEmbedder {
        fn new(fail_after: usize) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_after,
            }
        }
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n >= self.fail_after {
                return Err(C3Error::Embedding("quota exceeded".to_string()));
            }
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    /// A store whose collection cannot be dropped, as on a first seed.
    struct MissingCollectionStore {
        inner: MemoryVectorStore,
    }

    #[async_trait]
    impl VectorStore for MissingCollectionStore {
        async fn reset(&self) -> Result<()> {
            Err(C3Error::VectorStore(
                "Collection career_c3_knowledge_base does not exist".to_string(),
            ))
        }

        async fn ensure_collection(&self) -> Result<()> {
            self.inner.ensure_collection().await
        }

        async fn upsert(&self, docs: &[Document]) -> Result<usize> {
            self.inner.upsert(docs).await
        }

        async fn query(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchMatch>> {
            self.inner.query(query_embedding, limit).await
        }

        async fn count(&self) -> Result<usize> {
            self.inner.count().await
        }

        async fn heartbeat(&self) -> Result<()> {
            Ok(())
        }
    }

    fn dataset() -> Vec<CareerRecord> {
        parse_records(include_str!("../data/careers.json")).unwrap()
    }

    #[tokio::test]
    async fn test_one_document_per_record_with_title_and_exams() {
        let records = dataset();
        let store = Arc::new(MemoryVectorStore::new());
        let seeder = Seeder::new(Arc::new(CountingEmbedder::new(usize::MAX)), store.clone());

        let report = seeder.seed(&records).await.unwrap();
        assert_eq!(report.records, records.len());
        assert_eq!(report.documents_written, records.len());

        let docs = store.documents().unwrap();
        assert_eq!(docs.len(), records.len());
        for record in &records {
            let doc = docs.iter().find(|d| d.id == record.id).unwrap();
            assert!(doc.text.contains(&record.title));
            for exam in &record.exams {
                assert!(doc.text.contains(exam.as_str()), "missing {}", exam);
            }
        }
    }

    #[tokio::test]
    async fn test_reseed_replaces_previous_contents() {
        let store = Arc::new(MemoryVectorStore::new());
        store
            .upsert(&[Document::new("stale", "old record", vec![1.0, 1.0])])
            .await
            .unwrap();

        let records = dataset();
        let seeder = Seeder::new(Arc::new(CountingEmbedder::new(usize::MAX)), store.clone());
        seeder.seed(&records).await.unwrap();

        let docs = store.documents().unwrap();
        assert_eq!(docs.len(), records.len());
        assert!(docs.iter().all(|d| d.id != "stale"));
    }

    #[tokio::test]
    async fn test_embedding_failure_aborts_without_writing() {
        let store = Arc::new(MemoryVectorStore::new());
        let seeder = Seeder::new(Arc::new(CountingEmbedder::new(3)), store.clone());

        let err = seeder.seed(&dataset()).await.unwrap_err();
        assert!(matches!(err, C3Error::Embedding(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_failed_reset_is_ignored() {
        let records = dataset();
        let store = Arc::new(MissingCollectionStore {
            inner: MemoryVectorStore::new(),
        });
        let seeder = Seeder::new(Arc::new(CountingEmbedder::new(usize::MAX)), store.clone());

        let report = seeder.seed(&records).await.unwrap();
        assert_eq!(report.documents_written, records.len());
        assert_eq!(store.count().await.unwrap(), records.len());
    }
}
