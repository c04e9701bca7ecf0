//! Exact-scan in-memory vector backend

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::backend::{cosine_similarity, Embedder, ScoredDocument, VectorBackend};
use super::error::{BackendError, BackendResult};
use crate::tools::ToolDocument;

#[derive(Debug, Clone)]
struct Entry {
    tool_name: String,
    vector: Vec<f32>,
}

/// Vector backend that scores every entry on each search
///
/// Entries live in an immutable `Arc<Vec<_>>` snapshot. Writers embed first
/// and swap the snapshot only on success, so a failed write leaves the
/// previous contents untouched and readers never see a partial update.
pub struct InMemoryVectorBackend<E> {
    embedder: E,
    entries: RwLock<Arc<Vec<Entry>>>,
}

impl<E: Embedder> InMemoryVectorBackend<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Arc::new(Vec::new())),
        }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    fn snapshot(&self) -> Arc<Vec<Entry>> {
        self.entries.read().clone()
    }

    async fn embed_documents(&self, documents: Vec<ToolDocument>) -> BackendResult<Vec<Entry>> {
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embedder.embed(&texts).await?;
        if vectors.len() != documents.len() {
            return Err(BackendError::CountMismatch {
                expected: documents.len(),
                found: vectors.len(),
            });
        }

        Ok(documents
            .into_iter()
            .zip(vectors)
            .map(|(doc, vector)| Entry {
                tool_name: doc.tool_name,
                vector,
            })
            .collect())
    }
}

#[async_trait]
impl<E: Embedder> VectorBackend for InMemoryVectorBackend<E> {
    async fn rebuild(&self, documents: Vec<ToolDocument>) -> BackendResult<()> {
        let entries = self.embed_documents(documents).await?;
        *self.entries.write() = Arc::new(entries);
        Ok(())
    }

    async fn upsert(&self, documents: Vec<ToolDocument>) -> BackendResult<()> {
        let incoming = self.embed_documents(documents).await?;

        let mut guard = self.entries.write();
        let mut entries: Vec<Entry> = guard.as_ref().clone();
        for entry in incoming {
            match entries.iter_mut().find(|e| e.tool_name == entry.tool_name) {
                Some(existing) => *existing = entry,
                None => entries.push(entry),
            }
        }
        *guard = Arc::new(entries);
        Ok(())
    }

    async fn remove(&self, tool_names: &[String]) -> BackendResult<()> {
        let mut guard = self.entries.write();
        let entries: Vec<Entry> = guard
            .iter()
            .filter(|e| !tool_names.contains(&e.tool_name))
            .cloned()
            .collect();
        *guard = Arc::new(entries);
        Ok(())
    }

    async fn search(&self, query: &str, k: usize) -> BackendResult<Vec<ScoredDocument>> {
        let snapshot = self.snapshot();
        if snapshot.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed_query(query).await?;

        let mut hits: Vec<ScoredDocument> = snapshot
            .iter()
            .map(|e| ScoredDocument {
                tool_name: e.tool_name.clone(),
                score: cosine_similarity(&query_vector, &e.vector),
            })
            .collect();
        // stable sort: equal scores keep insertion order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        Ok(hits)
    }

    async fn len(&self) -> usize {
        self.entries.read().len()
    }
}
