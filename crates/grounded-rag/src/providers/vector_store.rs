//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Fragment, StoredFragment};

/// Candidate returned by a vector store query
#[derive(Debug, Clone)]
pub struct VectorMatch {
    pub fragment: Fragment,
    /// Higher means more similar
    pub similarity: f32,
}

/// Trait for vector storage and similarity search
///
/// Implementations:
/// - `InMemoryVectorStore`: brute-force cosine similarity
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert or replace fragments by id
    async fn upsert(&self, fragments: Vec<StoredFragment>) -> Result<()>;

    /// Up to `top_k` candidates near `query_embedding`.
    ///
    /// Candidates come back in no particular order.
    async fn query(&self, query_embedding: &[f32], top_k: usize) -> Result<Vec<VectorMatch>>;

    /// Remove everything; returns the number of vectors removed
    async fn delete_all(&self) -> Result<usize>;

    /// Get total number of vectors stored
    async fn count(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.count().await? == 0)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
