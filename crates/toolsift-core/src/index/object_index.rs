//! Object index: tools in, ranked tools out

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use super::backend::VectorBackend;
use super::error::{IndexError, IndexResult};
use crate::logging::Logger;
use crate::tools::{ObjectMapper, Tool, ToolDocument, ToolDocumentMapper, ToolRegistry};
use crate::types::CancellationToken;

#[derive(Default)]
struct IndexState {
    /// tool name -> insertion sequence, used for tie-breaking
    order: HashMap<String, u64>,
    next: u64,
}

impl IndexState {
    fn from_documents(documents: &[ToolDocument]) -> Self {
        let mut state = IndexState::default();
        for doc in documents {
            state.insert(&doc.tool_name);
        }
        state
    }

    fn insert(&mut self, name: &str) {
        if !self.order.contains_key(name) {
            self.order.insert(name.to_string(), self.next);
            self.next += 1;
        }
    }
}

/// Retrieval index over the tools of a registry
///
/// Retrievals hold the gate shared; build, add and remove hold it
/// exclusively, so a retrieval sees either the state before an update or the
/// state after it. The backend write happens under the exclusive gate, which
/// means retrievals wait for a whole rebuild, embedding included. Bound them
/// with `retrieve_within` when the backend embeds over the network.
pub struct ObjectIndex {
    registry: Arc<ToolRegistry>,
    mapper: Box<dyn ObjectMapper>,
    backend: Arc<dyn VectorBackend>,
    state: RwLock<IndexState>,
    logger: Arc<dyn Logger>,
}

impl ObjectIndex {
    /// Create an empty index using the default document mapper
    pub fn new(
        registry: Arc<ToolRegistry>,
        backend: Arc<dyn VectorBackend>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            registry,
            mapper: Box::new(ToolDocumentMapper::new()),
            backend,
            state: RwLock::new(IndexState::default()),
            logger,
        }
    }

    pub fn with_mapper(mut self, mapper: Box<dyn ObjectMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Number of indexed tools
    pub async fn len(&self) -> usize {
        self.state.read().await.order.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Index every tool currently in the registry
    pub async fn build(&self) -> IndexResult<()> {
        let tools: Vec<Tool> = self.registry.list().collect();
        self.build_from(&tools).await
    }

    /// Replace the index contents with `tools`
    ///
    /// Every tool is mapped before the backend is touched. On any failure
    /// the previous contents stay in place. Retrievals issued meanwhile wait
    /// until the new contents are in place.
    pub async fn build_from(&self, tools: &[Tool]) -> IndexResult<()> {
        let documents = tools
            .iter()
            .map(|t| self.mapper.to_document(t.spec()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                self.logger.error(&format!("[ObjectIndex] Mapping failed: {}", e));
                e
            })?;

        let mut state = self.state.write().await;
        let next_state = IndexState::from_documents(&documents);
        let count = documents.len();
        self.backend.rebuild(documents).await.map_err(|e| {
            self.logger.error(&format!("[ObjectIndex] Build failed: {}", e));
            IndexError::Build(e.to_string())
        })?;
        *state = next_state;

        self.logger.info(&format!("[ObjectIndex] Indexed {} tools", count));
        Ok(())
    }

    /// Register `tool` and index it; nothing changes if either step fails
    pub async fn add_tool(&self, tool: Tool) -> IndexResult<()> {
        let document = self.mapper.to_document(tool.spec())?;
        let name = tool.name().to_string();

        let mut state = self.state.write().await;
        self.registry.register(tool)?;
        if let Err(e) = self.backend.upsert(vec![document]).await {
            let _ = self.registry.remove(&name);
            self.logger.error(&format!(
                "[ObjectIndex] Indexing {} failed, registration rolled back: {}",
                name, e
            ));
            return Err(IndexError::Build(e.to_string()));
        }
        state.insert(&name);

        self.logger.debug(&format!("[ObjectIndex] Added tool: {}", name));
        Ok(())
    }

    /// Unregister `name` and invalidate its index entry
    pub async fn remove_tool(&self, name: &str) -> IndexResult<Tool> {
        let mut state = self.state.write().await;
        let tool = self.registry.remove(name)?;
        if let Err(e) = self.backend.remove(&[name.to_string()]).await {
            let _ = self.registry.register(tool);
            self.logger.error(&format!(
                "[ObjectIndex] Removing {} from the backend failed, restored: {}",
                name, e
            ));
            return Err(IndexError::Build(e.to_string()));
        }
        state.order.remove(name);

        self.logger.debug(&format!("[ObjectIndex] Removed tool: {}", name));
        Ok(tool)
    }

    /// The `k` tools most relevant to `query`, most relevant first
    pub async fn retrieve(&self, query: &str, k: usize) -> IndexResult<Vec<Tool>> {
        self.retrieve_within(query, k, None, &CancellationToken::new())
            .await
    }

    /// `retrieve` bounded by an optional deadline and a cancellation token
    pub async fn retrieve_within(
        &self,
        query: &str,
        k: usize,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> IndexResult<Vec<Tool>> {
        if k == 0 {
            return Err(IndexError::InvalidArgument("k must be at least 1".to_string()));
        }
        if cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }

        let search = self.ranked(query, k);
        let bounded = async {
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, search).await {
                    Ok(result) => result,
                    Err(_) => Err(IndexError::Timeout(limit)),
                },
                None => search.await,
            }
        };

        tokio::select! {
            result = bounded => {
                if let Err(IndexError::Timeout(limit)) = &result {
                    self.logger.warn(&format!(
                        "[ObjectIndex] Retrieval timed out after {:?}",
                        limit
                    ));
                }
                result
            }
            _ = cancel.cancelled() => {
                self.logger.debug("[ObjectIndex] Retrieval cancelled");
                Err(IndexError::Cancelled)
            }
        }
    }

    async fn ranked(&self, query: &str, k: usize) -> IndexResult<Vec<Tool>> {
        let state = self.state.read().await;
        if state.order.is_empty() {
            return Ok(Vec::new());
        }

        // Over-fetch so entries filtered out below do not starve the result;
        // widen the fetch while it still comes up short.
        let indexed = state.order.len();
        let mut fetch = k.saturating_mul(2).min(indexed).max(k);
        let mut ranked: Vec<(f32, u64, Tool)> = loop {
            let hits = self
                .backend
                .search(query, fetch)
                .await
                .map_err(|e| IndexError::Retrieval(e.to_string()))?;
            let exhausted = hits.len() < fetch || fetch >= indexed;

            let mut seen = HashSet::new();
            let mut ranked = Vec::with_capacity(hits.len());
            for hit in hits {
                let Some(&seq) = state.order.get(&hit.tool_name) else {
                    continue;
                };
                if !seen.insert(hit.tool_name.clone()) {
                    continue;
                }
                if let Ok(tool) = self.registry.get(&hit.tool_name) {
                    ranked.push((hit.score, seq, tool));
                }
            }

            if ranked.len() >= k || exhausted {
                break ranked;
            }
            fetch = fetch.saturating_mul(2).min(indexed);
        };

        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        ranked.truncate(k);

        self.logger.debug(&format!(
            "[ObjectIndex] Retrieved {:?} for query '{}'",
            ranked.iter().map(|(_, _, t)| t.name()).collect::<Vec<_>>(),
            query
        ));
        Ok(ranked.into_iter().map(|(_, _, tool)| tool).collect())
    }
}
