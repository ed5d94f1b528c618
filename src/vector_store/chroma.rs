//! Chroma vector store over the v2 REST API.
//!
//! The collection is created with cosine distance. Query scores are reported
//! as `1 - distance` so that higher is better, matching the other backends.

use super::{Document, SearchMatch, VectorStore};
use crate::error::{C3Error, Result};
use crate::http::shared_client;
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument};
use url::Url;

/// Header Chroma uses for token authentication.
const TOKEN_HEADER: &str = "x-chroma-token";

/// Chroma-backed vector store bound to one collection.
pub struct ChromaVectorStore {
    client: reqwest::Client,
    base_url: Url,
    collection: String,
    tenant: String,
    database: String,
    token: Option<String>,
}

#[derive(Deserialize)]
struct CollectionInfo {
    id: String,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<&'a [f32]>,
    documents: Vec<&'a str>,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_embeddings: Vec<&'a [f32]>,
    n_results: usize,
    include: [&'static str; 2],
}

/// Query results are nested one level per query embedding.
#[derive(Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Option<Vec<Vec<Option<String>>>>,
    #[serde(default)]
    distances: Option<Vec<Vec<Option<f32>>>>,
}

impl ChromaVectorStore {
    /// Create a store for `collection` on the Chroma server at `base_url`.
    pub fn new(base_url: &str, collection: &str) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends with '/'
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');

        Ok(Self {
            client: shared_client()?,
            base_url: Url::parse(&base)?,
            collection: collection.to_string(),
            tenant: "default_tenant".to_string(),
            database: "default_database".to_string(),
            token: None,
        })
    }

    /// Use a non-default tenant and database.
    pub fn with_tenant(mut self, tenant: &str, database: &str) -> Self {
        self.tenant = tenant.to_string();
        self.database = database.to_string();
        self
    }

    /// Authenticate with a Chroma token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    fn collections_path(&self) -> String {
        format!(
            "api/v2/tenants/{}/databases/{}/collections",
            self.tenant, self.database
        )
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let url = self.base_url.join(path)?;
        let mut builder = self.client.request(method, url);
        if let Some(token) = &self.token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        Ok(builder)
    }

    async fn send(builder: RequestBuilder, action: &str) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| C3Error::VectorStore(format!("{} failed: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(C3Error::VectorStore(format!(
                "{} failed with {}: {}",
                action, status, body
            )));
        }
        Ok(response)
    }

    /// Resolve the collection ID, creating the collection when missing.
    async fn collection_id(&self) -> Result<String> {
        let builder = self
            .request(Method::POST, &self.collections_path())?
            .json(&json!({
                "name": self.collection,
                "metadata": { "hnsw:space": "cosine" },
                "get_or_create": true,
            }));

        let info: CollectionInfo = Self::send(builder, "Get or create collection")
            .await?
            .json()
            .await?;
        Ok(info.id)
    }

    fn collection_path(&self, id: &str, op: &str) -> String {
        format!("{}/{}/{}", self.collections_path(), id, op)
    }
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    #[instrument(skip(self), fields(collection = %self.collection))]
    async fn reset(&self) -> Result<()> {
        let path = format!("{}/{}", self.collections_path(), self.collection);
        Self::send(self.request(Method::DELETE, &path)?, "Delete collection").await?;
        info!("Deleted collection {}", self.collection);
        Ok(())
    }

    async fn ensure_collection(&self) -> Result<()> {
        let id = self.collection_id().await?;
        debug!("Collection {} has id {}", self.collection, id);
        Ok(())
    }

    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn upsert(&self, docs: &[Document]) -> Result<usize> {
        if docs.is_empty() {
            return Ok(0);
        }

        let id = self.collection_id().await?;
        let body = UpsertRequest {
            ids: docs.iter().map(|d| d.id.as_str()).collect(),
            embeddings: docs.iter().map(|d| d.embedding.as_slice()).collect(),
            documents: docs.iter().map(|d| d.text.as_str()).collect(),
        };

        let builder = self
            .request(Method::POST, &self.collection_path(&id, "upsert"))?
            .json(&body);
        Self::send(builder, "Upsert").await?;

        debug!("Upserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn query(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchMatch>> {
        let id = self.collection_id().await?;
        let body = QueryRequest {
            query_embeddings: vec![query_embedding],
            n_results: limit,
            include: ["documents", "distances"],
        };

        let builder = self
            .request(Method::POST, &self.collection_path(&id, "query"))?
            .json(&body);
        let response: QueryResponse = Self::send(builder, "Query").await?.json().await?;

        let ids = response.ids.into_iter().next().unwrap_or_default();
        let documents = response
            .documents
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();
        let distances = response
            .distances
            .and_then(|d| d.into_iter().next())
            .unwrap_or_default();

        let matches = ids
            .into_iter()
            .enumerate()
            .filter_map(|(i, id)| {
                let text = documents.get(i).cloned().flatten()?;
                let distance = distances.get(i).copied().flatten().unwrap_or(1.0);
                Some(SearchMatch {
                    document: Document::new(id, text, Vec::new()),
                    score: 1.0 - distance,
                })
            })
            .collect();

        Ok(matches)
    }

    async fn count(&self) -> Result<usize> {
        let id = self.collection_id().await?;
        let builder = self.request(Method::GET, &self.collection_path(&id, "count"))?;
        let count: usize = Self::send(builder, "Count").await?.json().await?;
        Ok(count)
    }

    async fn heartbeat(&self) -> Result<()> {
        let builder = self.request(Method::GET, "api/v2/heartbeat")?;
        Self::send(builder, "Heartbeat").await?;
        Ok(())
    }
}
