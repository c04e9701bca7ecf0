//! Provider trait definition

use async_trait::async_trait;

use super::error::ProviderResult;
use crate::types::{CancellationToken, ChatMessage, ToolCall, ToolChoice, ToolDefinition};

/// Model configuration for provider requests
#[derive(Debug, Clone)]
pub struct ProviderModelConfig {
    /// Provider identifier (e.g. "openai", "anthropic", "ollama")
    pub provider: String,
    /// Model identifier as used by the provider's API
    pub model: String,
    /// Explicit API key; the secret store is consulted when unset
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

impl ProviderModelConfig {
    /// Create a new model config
    ///
    /// A `provider/model` string is split into its two halves.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        let provider = provider.into();
        let model = model.into();
        let model = match model.split_once('/') {
            Some((prefix, name)) if prefix.eq_ignore_ascii_case(&provider) => name.to_string(),
            _ => model,
        };
        Self {
            provider: provider.to_lowercase(),
            model,
            api_key: None,
            api_base: None,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }
}

/// Options for one chat request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    /// Tools the model may call
    pub tools: Vec<ToolDefinition>,
    /// Tool choice behavior
    pub tool_choice: ToolChoice,
    /// Temperature for response generation (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl ChatOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = choice;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    /// Names of the offered tools
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name.as_str()).collect()
    }
}

/// What the model answered
#[derive(Debug, Clone, PartialEq)]
pub enum ModelResponse {
    /// A final text answer
    Text(String),
    /// One or more structured tool calls, possibly with accompanying text
    ToolCalls {
        text: Option<String>,
        calls: Vec<ToolCall>,
    },
}

impl ModelResponse {
    /// Collapse accumulated text and calls into a response
    pub fn from_parts(text: String, calls: Vec<ToolCall>) -> Self {
        if calls.is_empty() {
            ModelResponse::Text(text)
        } else {
            ModelResponse::ToolCalls {
                text: Some(text).filter(|t| !t.is_empty()),
                calls,
            }
        }
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            ModelResponse::Text(_) => &[],
            ModelResponse::ToolCalls { calls, .. } => calls,
        }
    }
}

/// Provider trait for LLM implementations
///
/// Implementations must return promptly with `ProviderError::Cancelled` once
/// `cancel` fires.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name (e.g., "openai", "anthropic")
    fn name(&self) -> &str;

    /// Run one chat completion with the given tools offered
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
        cancel: CancellationToken,
    ) -> ProviderResult<ModelResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_model_config_strips_provider_prefix() {
        let config = ProviderModelConfig::new("OpenAI", "openai/gpt-4o-mini");
        assert_eq!(config.provider, "openai");
        assert_eq!(config.model, "gpt-4o-mini");

        let config = ProviderModelConfig::new("openrouter", "meta-llama/llama-3-8b");
        assert_eq!(config.model, "meta-llama/llama-3-8b");
    }

    #[test]
    fn test_model_response_from_parts() {
        assert_eq!(
            ModelResponse::from_parts("done".to_string(), Vec::new()),
            ModelResponse::Text("done".to_string())
        );

        let calls = vec![ToolCall::new("c1", "add", json!({ "a": 1, "b": 2 }))];
        let response = ModelResponse::from_parts(String::new(), calls.clone());
        assert_eq!(response, ModelResponse::ToolCalls { text: None, calls });
        assert_eq!(response.tool_calls().len(), 1);
    }
}
