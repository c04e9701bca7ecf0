//! Import MCP server tools into a `ToolRegistry`

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::client::{result_text, McpClient, McpResult};
use crate::logging::Logger;
use crate::tools::{ParamSpec, ParamType, Tool, ToolArgs, ToolError, ToolHandler, ToolOutput, ToolRegistry, ToolSpec};

/// Build a `ToolSpec` from an MCP tool's JSON Schema
///
/// Properties without a single string `type` become `ParamType::Other`.
pub fn spec_from_schema(name: &str, description: Option<&str>, schema: &Map<String, Value>) -> ToolSpec {
    let required: Vec<&str> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    let mut spec = ToolSpec::new(name, description.unwrap_or_default());
    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (param_name, property) in properties {
            let param_type = match property.get("type") {
                Some(Value::String(t)) => ParamType::from_json_type(t),
                Some(other) => ParamType::Other(other.to_string()),
                None => ParamType::Other("any".to_string()),
            };
            let mut param = ParamSpec::new(param_name.clone(), param_type);
            if let Some(text) = property.get("description").and_then(Value::as_str) {
                param = param.with_description(text);
            }
            if !required.contains(&param_name.as_str()) {
                param = param.optional();
            }
            spec = spec.with_param(param);
        }
    }
    spec
}

/// Forwards calls to the MCP server that owns the tool
struct McpToolHandler {
    client: Arc<McpClient>,
    name: String,
}

#[async_trait]
impl ToolHandler for McpToolHandler {
    async fn call(&self, args: ToolArgs) -> ToolOutput {
        let result = self
            .client
            .call_tool(&self.name, args.into_map())
            .await
            .map_err(|e| ToolError::Remote(e.to_string()))?;

        let text = result_text(&result);
        if result.is_error.unwrap_or(false) {
            return Err(ToolError::Remote(text));
        }
        if text.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}

/// Tool source backed by one MCP server
pub struct McpToolSource {
    client: Arc<McpClient>,
    logger: Arc<dyn Logger>,
}

impl McpToolSource {
    pub fn new(client: Arc<McpClient>, logger: Arc<dyn Logger>) -> Self {
        Self { client, logger }
    }

    /// Every server tool with only primitive parameters, ready to register
    ///
    /// Tools the index could not map are skipped with a warning.
    pub async fn tools(&self) -> McpResult<Vec<Tool>> {
        let mut tools = Vec::new();
        for mcp_tool in self.client.list_tools().await? {
            let spec = spec_from_schema(
                &mcp_tool.name,
                mcp_tool.description.as_deref(),
                &mcp_tool.input_schema,
            );

            if let Some(param) = spec.parameters.iter().find(|p| !p.param_type.is_primitive()) {
                self.logger.warn(&format!(
                    "[McpToolSource] Skipping {}: parameter '{}' has type {}",
                    spec.name, param.name, param.param_type
                ));
                continue;
            }

            let handler = McpToolHandler {
                client: Arc::clone(&self.client),
                name: spec.name.clone(),
            };
            tools.push(Tool::new(spec, Arc::new(handler)));
        }
        Ok(tools)
    }

    /// Register the server's tools, skipping names already taken
    ///
    /// Returns the names that were registered.
    pub async fn register_into(&self, registry: &ToolRegistry) -> McpResult<Vec<String>> {
        let mut registered = Vec::new();
        for tool in self.tools().await? {
            let name = tool.name().to_string();
            match registry.register(tool) {
                Ok(()) => registered.push(name),
                Err(e) => self.logger.warn(&format!("[McpToolSource] {}", e)),
            }
        }
        self.logger.info(&format!(
            "[McpToolSource] Registered {} MCP tools",
            registered.len()
        ));
        Ok(registered)
    }
}
