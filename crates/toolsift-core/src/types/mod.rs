//! Core types shared by providers and the agent loop

mod message;
mod tool;
mod cancellation;

pub use message::{ChatMessage, ContentPart, MessageContent, MessageRole};
pub use tool::{ToolCall, ToolChoice, ToolDefinition, ToolResult};
pub use cancellation::CancellationToken;
