//! Connection to one MCP server, built on the rmcp SDK

use std::fmt;
#[cfg(unix)]
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool,
    },
    service::RunningService,
    RoleClient, ServiceExt,
};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::logging::Logger;

#[derive(Error, Debug)]
pub enum McpError {
    #[error("Invalid MCP endpoint '{0}': expected unix:<path> or an http(s) URL")]
    InvalidEndpoint(String),

    #[error("Connection to {endpoint} failed: {message}")]
    ConnectionFailed { endpoint: String, message: String },

    #[error("MCP handshake with {endpoint} failed: {message}")]
    InitializationFailed { endpoint: String, message: String },

    #[error("MCP tool '{tool}' failed: {message}")]
    ToolCallFailed { tool: String, message: String },

    #[error("MCP protocol error: {0}")]
    Protocol(String),
}

pub type McpResult<T> = Result<T, McpError>;

/// Where an MCP server listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpEndpoint {
    /// Streamable HTTP transport
    Http(String),
    #[cfg(unix)]
    Unix(PathBuf),
}

impl McpEndpoint {
    /// Parse `unix:/path/to/socket` or an `http://` / `https://` URL
    pub fn parse(raw: &str) -> McpResult<Self> {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(McpEndpoint::Http(raw.to_string()));
        }
        unix_endpoint(raw).ok_or_else(|| McpError::InvalidEndpoint(raw.to_string()))
    }
}

#[cfg(unix)]
fn unix_endpoint(raw: &str) -> Option<McpEndpoint> {
    raw.strip_prefix("unix:")
        .filter(|path| !path.is_empty())
        .map(|path| McpEndpoint::Unix(PathBuf::from(path)))
}

#[cfg(not(unix))]
fn unix_endpoint(_raw: &str) -> Option<McpEndpoint> {
    None
}

impl fmt::Display for McpEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            McpEndpoint::Http(url) => write!(f, "{}", url),
            #[cfg(unix)]
            McpEndpoint::Unix(path) => write!(f, "unix:{}", path.display()),
        }
    }
}

fn handshake_failed(endpoint: &McpEndpoint, e: impl fmt::Display) -> McpError {
    McpError::InitializationFailed {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            title: Some("toolsift tool source".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// An initialized session with one MCP server
pub struct McpClient {
    endpoint: McpEndpoint,
    session: RunningService<RoleClient, ClientInfo>,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Open a session and run the MCP handshake
    pub async fn connect(endpoint: McpEndpoint, logger: Arc<dyn Logger>) -> McpResult<Self> {
        logger.info(&format!("[McpClient] Connecting to {}", endpoint));

        let session = match &endpoint {
            McpEndpoint::Http(url) => {
                let transport =
                    rmcp::transport::StreamableHttpClientTransport::from_uri(url.as_str());
                client_info()
                    .serve(transport)
                    .await
                    .map_err(|e| handshake_failed(&endpoint, e))?
            }
            #[cfg(unix)]
            McpEndpoint::Unix(path) => {
                let stream = tokio::net::UnixStream::connect(path).await.map_err(|e| {
                    McpError::ConnectionFailed {
                        endpoint: endpoint.to_string(),
                        message: e.to_string(),
                    }
                })?;
                client_info()
                    .serve(stream)
                    .await
                    .map_err(|e| handshake_failed(&endpoint, e))?
            }
        };

        let server = session
            .peer_info()
            .map(|info| info.server_info.name.clone())
            .unwrap_or_else(|| "unknown".to_string());
        logger.info(&format!("[McpClient] Session open with server '{}'", server));

        Ok(Self {
            endpoint,
            session,
            logger,
        })
    }

    pub fn endpoint(&self) -> &McpEndpoint {
        &self.endpoint
    }

    /// Every tool the server exposes, following pagination
    pub async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let tools = self
            .session
            .list_all_tools()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        self.logger.debug(&format!(
            "[McpClient] {} exposes {} tools",
            self.endpoint,
            tools.len()
        ));
        Ok(tools)
    }

    /// Invoke `name` with an already validated argument object
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> McpResult<CallToolResult> {
        self.logger.debug(&format!("[McpClient] tools/call {}", name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        };

        self.session
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed {
                tool: name.to_string(),
                message: e.to_string(),
            })
    }

    pub fn server_info(&self) -> Option<&Implementation> {
        self.session.peer_info().map(|info| &info.server_info)
    }

    /// End the session
    pub async fn close(self) -> McpResult<()> {
        self.logger
            .info(&format!("[McpClient] Closing session with {}", self.endpoint));
        self.session
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

/// Text blocks of a tool result joined by newlines; other content is dropped
pub fn result_text(result: &CallToolResult) -> String {
    result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
