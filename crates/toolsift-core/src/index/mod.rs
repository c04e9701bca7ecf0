//! Tool retrieval
//!
//! `ObjectIndex` maps each registered tool to a `ToolDocument`, stores the
//! documents in a `VectorBackend` and answers "which K tools fit this
//! query?" with tools fetched back from the registry.
//!
//! ```rust,ignore
//! let backend = Arc::new(InMemoryVectorBackend::new(LexicalEmbedder::new()));
//! let index = ObjectIndex::new(registry.clone(), backend, logger);
//! index.build().await?;
//!
//! let tools = index.retrieve("What's 212 multiplied by 122?", 3).await?;
//! ```

mod backend;
mod error;
mod http_embedder;
mod lexical;
mod memory_backend;
mod object_index;

use std::sync::Arc;

pub use backend::{cosine_similarity, Embedder, ScoredDocument, VectorBackend};
pub use error::{BackendError, BackendResult, IndexError, IndexResult};
pub use http_embedder::{HttpEmbedder, DEFAULT_EMBEDDING_API_BASE, EMBEDDING_SECRET_KEY};
pub use lexical::{tokenize, LexicalEmbedder};
pub use memory_backend::InMemoryVectorBackend;
pub use object_index::ObjectIndex;

use crate::config::EmbeddingSettings;
use crate::logging::Logger;
use crate::secrets::SecretStore;

/// Build the in-memory backend described by `settings`
pub fn create_backend(
    settings: &EmbeddingSettings,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
) -> Arc<dyn VectorBackend> {
    match settings {
        EmbeddingSettings::Lexical => {
            logger.debug("[index] Using lexical embedder");
            Arc::new(InMemoryVectorBackend::new(LexicalEmbedder::new()))
        }
        EmbeddingSettings::Http { model, api_base } => {
            logger.debug(&format!("[index] Using HTTP embedder: {}", model));
            let mut embedder = HttpEmbedder::new(model.clone(), secrets, logger);
            if let Some(base) = api_base {
                embedder = embedder.with_api_base(base.clone());
            }
            Arc::new(InMemoryVectorBackend::new(embedder))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;
    use crate::tools::ToolDocument;

    #[tokio::test]
    async fn test_create_lexical_backend() {
        let backend = create_backend(
            &EmbeddingSettings::Lexical,
            Arc::new(MemorySecretStore::new()),
            NoOpLogger::shared(),
        );
        backend
            .rebuild(vec![ToolDocument {
                tool_name: "add".to_string(),
                text: "add two integers".to_string(),
            }])
            .await
            .unwrap();
        assert_eq!(backend.len().await, 1);
    }
}
