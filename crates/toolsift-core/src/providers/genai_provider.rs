//! GenaiProvider - unified provider using the genai crate
//!
//! Handles the genai-native providers (OpenAI, Anthropic, Gemini, Ollama, ...)
//! as well as OpenAI-compatible endpoints (Azure, OpenRouter, Mistral, any
//! `openai_compat` base URL) through the ServiceTargetResolver.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use genai::chat::{ChatRequest, ChatStreamEvent};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_tool_call, is_genai_supported, provider_secret_key,
    requires_api_key, to_genai_messages, to_genai_options, to_genai_tools,
};
use super::traits::{ChatOptions, ModelResponse, Provider, ProviderModelConfig};
use crate::logging::Logger;
use crate::secrets::SecretStore;
use crate::types::{CancellationToken, ChatMessage, ToolCall};

/// Unified provider using genai for all supported LLM APIs
pub struct GenaiProvider {
    config: ProviderModelConfig,
    secrets: Arc<dyn SecretStore>,
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    pub fn new(
        config: ProviderModelConfig,
        secrets: Arc<dyn SecretStore>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            config,
            secrets,
            logger,
        }
    }

    /// Check if this provider can handle the given provider ID
    pub fn supports(provider_id: &str) -> bool {
        is_genai_supported(provider_id)
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn check_api_key(&self) -> ProviderResult<()> {
        let has_key = self.config.api_key.is_some()
            || self.secrets.has(&provider_secret_key(&self.config.provider));
        if requires_api_key(&self.config.provider) && !has_key {
            return Err(ProviderError::missing_api_key(&self.config.provider));
        }
        Ok(())
    }

    async fn run_stream(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
    ) -> ProviderResult<ModelResponse> {
        let client = create_client(&self.config, Arc::clone(&self.secrets))?;

        let mut chat_req = ChatRequest::new(to_genai_messages(messages));
        if !options.tools.is_empty() {
            chat_req = chat_req.with_tools(to_genai_tools(&options.tools));
        }
        let genai_options = to_genai_options(&options);

        let chat_stream = client
            .exec_chat_stream(self.config.model.as_str(), chat_req, Some(&genai_options))
            .await
            .map_err(|e| ProviderError::api_error(&self.config.provider, 500, e.to_string()))?;

        self.logger.debug("[GenaiProvider] Stream started");

        let mut text = String::new();
        let mut calls: Vec<ToolCall> = Vec::new();
        let stream = chat_stream.stream;
        futures::pin_mut!(stream);

        while let Some(event) = stream.next().await {
            let event = event.map_err(|e| {
                self.logger.error(&format!("[GenaiProvider] Stream error: {}", e));
                ProviderError::api_error(&self.config.provider, 500, e.to_string())
            })?;

            match event {
                ChatStreamEvent::Start => {
                    self.logger.debug("[GenaiProvider] Stream event: Start");
                }
                ChatStreamEvent::Chunk(chunk) => text.push_str(&chunk.content),
                ChatStreamEvent::ToolCallChunk(_) => {
                    self.logger.debug("[GenaiProvider] Stream event: ToolCallChunk");
                }
                ChatStreamEvent::End(end) => {
                    if let Some(captured) = end.captured_tool_calls() {
                        calls.extend(captured.iter().map(|tc| from_genai_tool_call(tc)));
                    }
                    self.logger.debug(&format!(
                        "[GenaiProvider] Stream event: End ({} tool calls)",
                        calls.len()
                    ));
                }
                _ => {}
            }
        }

        if text.is_empty() && calls.is_empty() {
            return Err(ProviderError::invalid_response(
                &self.config.provider,
                "empty response",
            ));
        }
        Ok(ModelResponse::from_parts(text, calls))
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        &self.config.provider
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
        cancel: CancellationToken,
    ) -> ProviderResult<ModelResponse> {
        self.logger.info(&format!(
            "[GenaiProvider] chat: provider={}, model={}, tools={}",
            self.config.provider,
            self.config.model,
            options.tools.len()
        ));
        self.check_api_key()?;
        if cancel.is_cancelled() {
            return Err(ProviderError::Cancelled);
        }

        tokio::select! {
            result = self.run_stream(messages, options) => result,
            _ = cancel.cancelled() => {
                self.logger.info("[GenaiProvider] Request cancelled");
                Err(ProviderError::Cancelled)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::secrets::MemorySecretStore;

    #[test]
    fn test_supports() {
        assert!(GenaiProvider::supports("openai"));
        assert!(GenaiProvider::supports("anthropic"));
        assert!(GenaiProvider::supports("azure"));
        assert!(!GenaiProvider::supports("unknown_provider"));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_fast() {
        let provider = GenaiProvider::new(
            ProviderModelConfig::new("openai", "gpt-4o-mini"),
            Arc::new(MemorySecretStore::new()),
            NoOpLogger::shared(),
        );
        let err = provider
            .chat(vec![ChatMessage::user("hi")], ChatOptions::new(), CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingApiKey { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_request() {
        let provider = GenaiProvider::new(
            ProviderModelConfig::new("ollama", "llama3.2")
                .with_api_base("http://127.0.0.1:9/v1/"),
            Arc::new(MemorySecretStore::new()),
            NoOpLogger::shared(),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = provider
            .chat(vec![ChatMessage::user("hi")], ChatOptions::new(), cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Cancelled));
    }
}
