//! Toolsift Core
//!
//! Tool retrieval for function-calling agents. Registered tools are indexed
//! by their descriptions, and each user message is answered with only the
//! few tools most relevant to it offered to the model.
//!
//! ## Agent Loop
//!
//! ```rust,ignore
//! use toolsift_core::{
//!     AgentConfig, ConversationHistory, FunctionCallingAgent, InMemoryVectorBackend,
//!     LexicalEmbedder, ObjectIndex, ParamSpec, Tool, ToolRegistry, ToolSpec,
//! };
//!
//! let registry = Arc::new(ToolRegistry::new(logger.clone()));
//! registry.register(Tool::from_sync(
//!     ToolSpec::new("multiply", "Multiply two integers and return the result")
//!         .with_param(ParamSpec::integer("a"))
//!         .with_param(ParamSpec::integer("b")),
//!     |args| Ok(json!(args.get_i64("a").unwrap_or(0) * args.get_i64("b").unwrap_or(0))),
//! ))?;
//!
//! let backend = Arc::new(InMemoryVectorBackend::new(LexicalEmbedder::new()));
//! let index = Arc::new(ObjectIndex::new(registry, backend, logger.clone()));
//! index.build().await?;
//!
//! let agent = FunctionCallingAgent::new(index, provider, AgentConfig::default(), logger);
//! let output = agent.chat(&ConversationHistory::new(), "What's 212 multiplied by 122?").await?;
//! ```
//!
//! ## MCP Tools
//!
//! Tools exposed by an MCP server can be imported into the same registry
//! with [`McpToolSource`].

pub mod types;
pub mod secrets;
pub mod logging;
pub mod config;
pub mod providers;
pub mod tools;
pub mod index;
pub mod mcp;
pub mod agent;

// Re-export commonly used types
pub use types::{
    ChatMessage, ContentPart, MessageRole, MessageContent,
    ToolCall, ToolDefinition, ToolResult, ToolChoice,
    CancellationToken,
};

pub use secrets::{
    SecretStore, SecretStoreError, SecretStoreResult,
    EnvSecretStore, MemorySecretStore, ChainSecretStore, KeychainSecretStore,
    default_secret_store,
};

pub use logging::{Logger, LogLevel, NoOpLogger, ConsoleLogger, MemoryLogger};

pub use config::{
    AgentConfig, ConfigError, ConfigResult, EmbeddingSettings, ModelSettings, ToolsiftConfig,
    FileConfigProvider, load_effective,
};

pub use providers::{
    ChatOptions, ModelResponse, Provider, ProviderError, ProviderResult, ProviderModelConfig,
    GenaiProvider, MockProvider, MockStep, create_provider,
};

pub use tools::{
    ParamSpec, ParamType, Tool, ToolArgs, ToolError, ToolHandler, ToolRegistry, ToolSpec,
    ObjectMapper, ToolDocument, ToolDocumentMapper,
};

pub use index::{
    Embedder, HttpEmbedder, InMemoryVectorBackend, IndexError, IndexResult, LexicalEmbedder,
    ObjectIndex, VectorBackend, create_backend,
};

// MCP client using official rmcp SDK
pub use mcp::{McpClient, McpEndpoint, McpError, McpResult, McpTool, McpToolResult, McpToolSource};

pub use agent::{
    AgentError, AgentResult, ConversationHistory, ConversationTurn, ExecutionRecord,
    FunctionCallingAgent, ToolOutcome, TurnOutcome, TurnOutput,
};
