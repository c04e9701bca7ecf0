//! MCP (Model Context Protocol) tool source
//!
//! Uses the official rmcp SDK to connect to MCP servers over a Unix socket
//! or streamable HTTP and exposes their tools as registry tools.
//!
//! # Example
//!
//! ```rust,ignore
//! let endpoint = McpEndpoint::parse("http://localhost:8000/mcp")?;
//! let client = Arc::new(McpClient::connect(endpoint, logger.clone()).await?);
//! let source = McpToolSource::new(client, logger);
//!
//! source.register_into(&registry).await?;
//! index.build().await?;
//! ```

mod client;
mod source;

pub use client::{result_text, McpClient, McpEndpoint, McpError, McpResult};
pub use source::{spec_from_schema, McpToolSource};

// Re-export rmcp types that consumers might need
pub use rmcp::model::{CallToolResult as McpToolResult, Tool as McpTool};
