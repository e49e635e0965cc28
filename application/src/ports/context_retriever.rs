//! Context retrieval port
//!
//! Chunking, embedding, vector search and token budgeting live behind this
//! trait. An empty artifact list is a valid, non-error result.

use async_trait::async_trait;
use parley_domain::Artifact;
use thiserror::Error;

/// Errors that can occur during context retrieval
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RetrievalError {
    #[error("Retrieval unavailable: {0}")]
    Unavailable(String),

    #[error("Retrieval failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait ContextRetriever: Send + Sync {
    /// Fetch artifacts relevant to `query`, fitting in `token_budget`.
    async fn retrieve(
        &self,
        query: &str,
        token_budget: usize,
    ) -> Result<Vec<Artifact>, RetrievalError>;
}

/// Retriever that never finds anything.
pub struct NoContext;

#[async_trait]
impl ContextRetriever for NoContext {
    async fn retrieve(
        &self,
        _query: &str,
        _token_budget: usize,
    ) -> Result<Vec<Artifact>, RetrievalError> {
        Ok(Vec::new())
    }
}
