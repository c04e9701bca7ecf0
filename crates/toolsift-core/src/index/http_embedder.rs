//! OpenAI-compatible HTTP embedder

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::backend::Embedder;
use super::error::{BackendError, BackendResult};
use crate::logging::Logger;
use crate::secrets::SecretStore;

pub const DEFAULT_EMBEDDING_API_BASE: &str = "https://api.openai.com/v1";

/// Secret key under which the embedding API key is looked up
pub const EMBEDDING_SECRET_KEY: &str = "embedding";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Embedder calling `POST {api_base}/embeddings`
pub struct HttpEmbedder {
    client: reqwest::Client,
    api_base: String,
    model: String,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
}

impl HttpEmbedder {
    pub fn new(
        model: impl Into<String>,
        secrets: Arc<dyn SecretStore>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: DEFAULT_EMBEDDING_API_BASE.to_string(),
            model: model.into(),
            secrets,
            logger,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn endpoint(&self) -> String {
        format!("{}/embeddings", self.api_base)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed(&self, texts: &[String]) -> BackendResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        self.logger.debug(&format!(
            "[HttpEmbedder] Embedding {} texts with {}",
            texts.len(),
            self.model
        ));

        let mut request = self.client.post(self.endpoint()).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        match self.secrets.get(EMBEDDING_SECRET_KEY) {
            Some(key) => request = request.bearer_auth(key),
            None => self
                .logger
                .warn("[HttpEmbedder] No embedding API key found, sending unauthenticated request"),
        }

        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Embedding(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            self.logger.error(&format!("[HttpEmbedder] HTTP {}: {}", status, body));
            return Err(BackendError::Embedding(format!("HTTP {}: {}", status, body)));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| BackendError::Embedding(format!("invalid response: {}", e)))?;

        let mut data = parsed.data;
        if data.len() != texts.len() {
            return Err(BackendError::CountMismatch {
                expected: texts.len(),
                found: data.len(),
            });
        }
        data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;

    #[test]
    fn test_endpoint() {
        let embedder = HttpEmbedder::new(
            "text-embedding-3-small",
            Arc::new(MemorySecretStore::new()),
            NoOpLogger::shared(),
        )
        .with_api_base("http://localhost:8080/v1/");
        assert_eq!(embedder.endpoint(), "http://localhost:8080/v1/embeddings");
        assert_eq!(embedder.name(), "text-embedding-3-small");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"data":[{"index":1,"embedding":[0.5]},{"index":0,"embedding":[0.25,1.0]}]}"#;
        let mut parsed: EmbeddingResponse = serde_json::from_str(body).unwrap();
        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));
        assert_eq!(parsed.data[0].embedding, vec![0.25, 1.0]);
    }

    #[tokio::test]
    async fn test_empty_input_skips_request() {
        let embedder = HttpEmbedder::new(
            "m",
            Arc::new(MemorySecretStore::new()),
            NoOpLogger::shared(),
        )
        .with_api_base("http://127.0.0.1:1");
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }
}
