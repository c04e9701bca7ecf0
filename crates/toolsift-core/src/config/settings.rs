//! Configuration types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};

/// Top-level configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsiftConfig {
    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub model: ModelSettings,

    #[serde(default)]
    pub embedding: EmbeddingSettings,
}

impl ToolsiftConfig {
    /// Check every section
    pub fn validate(&self) -> ConfigResult<()> {
        self.agent.validate()
    }
}

/// Agent loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Number of tools retrieved and offered to the model per turn
    pub top_k: usize,
    /// Maximum number of tool-execution rounds per turn
    pub max_rounds: usize,
    /// Deadline for one retrieval, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieval_timeout_ms: Option<u64>,
    /// Deadline for one model call, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_timeout_ms: Option<u64>,
    /// Number of past turns replayed to the model
    pub history_window: usize,
    /// Optional system prompt prepended to every request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Response used when the round limit is hit
    pub fallback_response: String,
    /// Run the calls of one model response concurrently
    pub parallel_tool_calls: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_rounds: 5,
            retrieval_timeout_ms: None,
            model_timeout_ms: None,
            history_window: 10,
            system_prompt: None,
            fallback_response: "I was unable to complete this request.".to_string(),
            parallel_tool_calls: true,
        }
    }
}

impl AgentConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_retrieval_timeout(mut self, timeout: Duration) -> Self {
        self.retrieval_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_fallback_response(mut self, response: impl Into<String>) -> Self {
        self.fallback_response = response.into();
        self
    }

    pub fn with_history_window(mut self, turns: usize) -> Self {
        self.history_window = turns;
        self
    }

    pub fn retrieval_timeout(&self) -> Option<Duration> {
        self.retrieval_timeout_ms.map(Duration::from_millis)
    }

    pub fn model_timeout(&self) -> Option<Duration> {
        self.model_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.top_k == 0 {
            return Err(ConfigError::invalid("agent.top_k", "must be at least 1"));
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::invalid("agent.max_rounds", "must be at least 1"));
        }
        Ok(())
    }
}

/// Which chat model the agent talks to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Provider id (`openai`, `anthropic`, `ollama`, `mock`, ...)
    pub provider: String,
    /// Model identifier as used by the provider's API
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// How tool documents are embedded for retrieval
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmbeddingSettings {
    /// Local deterministic bag-of-words embedder
    #[default]
    Lexical,
    /// OpenAI-compatible `/embeddings` endpoint
    Http {
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_base: Option<String>,
    },
}
