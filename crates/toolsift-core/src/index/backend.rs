//! Vector backend and embedder seams

use async_trait::async_trait;

use super::error::{BackendError, BackendResult};
use crate::tools::ToolDocument;

/// One search hit
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub tool_name: String,
    pub score: f32,
}

/// Similarity store over tool documents
///
/// Implementations must keep their previous contents when a call fails and
/// return hits ordered from most to least similar.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Replace the whole contents with `documents`
    async fn rebuild(&self, documents: Vec<ToolDocument>) -> BackendResult<()>;

    /// Insert documents, replacing any with the same tool name
    async fn upsert(&self, documents: Vec<ToolDocument>) -> BackendResult<()>;

    /// Drop the entries for `tool_names`; unknown names are ignored
    async fn remove(&self, tool_names: &[String]) -> BackendResult<()>;

    /// Up to `k` most similar documents
    async fn search(&self, query: &str, k: usize) -> BackendResult<Vec<ScoredDocument>>;

    /// Number of stored entries
    async fn len(&self) -> usize;
}

/// Turns text into dense vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// One vector per input, in input order
    async fn embed(&self, texts: &[String]) -> BackendResult<Vec<Vec<f32>>>;

    /// Vector for a search query
    ///
    /// Must not change the embedder's state; searches run while the index
    /// is read-only.
    async fn embed_query(&self, query: &str) -> BackendResult<Vec<f32>> {
        self.embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or(BackendError::CountMismatch { expected: 1, found: 0 })
    }
}

/// Cosine similarity; the shorter vector is treated as zero-padded
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
