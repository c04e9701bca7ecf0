//! Callable tools

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use super::spec::{ToolArgs, ToolSpec};

/// Error raised by a tool handler
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("{0}")]
    Execution(String),

    #[error("remote tool failed: {0}")]
    Remote(String),
}

impl ToolError {
    pub fn execution(message: impl Into<String>) -> Self {
        ToolError::Execution(message.into())
    }
}

pub type ToolOutput = Result<Value, ToolError>;

/// Executes a tool with already validated arguments
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, args: ToolArgs) -> ToolOutput;
}

type BoxedFn = dyn Fn(ToolArgs) -> Pin<Box<dyn Future<Output = ToolOutput> + Send>> + Send + Sync;

/// Handler backed by an async closure
pub struct FnHandler {
    f: Box<BoxedFn>,
}

impl FnHandler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolOutput> + Send + 'static,
    {
        Self {
            f: Box::new(move |args| Box::pin(f(args))),
        }
    }
}

#[async_trait]
impl ToolHandler for FnHandler {
    async fn call(&self, args: ToolArgs) -> ToolOutput {
        (self.f)(args).await
    }
}

/// A registered tool: its spec plus the handler that runs it
///
/// Clones share the handler.
#[derive(Clone)]
pub struct Tool {
    spec: Arc<ToolSpec>,
    handler: Arc<dyn ToolHandler>,
}

impl Tool {
    pub fn new(spec: ToolSpec, handler: Arc<dyn ToolHandler>) -> Self {
        Self {
            spec: Arc::new(spec),
            handler,
        }
    }

    /// Build a tool from an async closure
    ///
    /// ```rust,ignore
    /// let add = Tool::from_fn(
    ///     ToolSpec::new("add", "Add two integers")
    ///         .with_param(ParamSpec::integer("a"))
    ///         .with_param(ParamSpec::integer("b")),
    ///     |args| async move {
    ///         let a = args.get_i64("a").unwrap_or_default();
    ///         let b = args.get_i64("b").unwrap_or_default();
    ///         Ok(json!(a + b))
    ///     },
    /// );
    /// ```
    pub fn from_fn<F, Fut>(spec: ToolSpec, f: F) -> Self
    where
        F: Fn(ToolArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolOutput> + Send + 'static,
    {
        Self::new(spec, Arc::new(FnHandler::new(f)))
    }

    /// Build a tool whose handler is a plain synchronous function
    pub fn from_sync<F>(spec: ToolSpec, f: F) -> Self
    where
        F: Fn(ToolArgs) -> ToolOutput + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::from_fn(spec, move |args| {
            let f = f.clone();
            async move { (*f)(args) }
        })
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn description(&self) -> &str {
        &self.spec.description
    }

    pub fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    /// Run the handler on arguments that already passed validation
    pub async fn invoke(&self, args: ToolArgs) -> ToolOutput {
        self.handler.call(args).await
    }

    /// Validate raw JSON input, then run the handler
    pub async fn call_json(&self, input: &Value) -> ToolOutput {
        let args = self
            .spec
            .validate_args(input)
            .map_err(|e| ToolError::execution(e.to_string()))?;
        self.invoke(args).await
    }
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool").field("spec", &self.spec).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ParamSpec;
    use serde_json::json;

    fn add_tool() -> Tool {
        Tool::from_fn(
            ToolSpec::new("add", "Add two integers")
                .with_param(ParamSpec::integer("a"))
                .with_param(ParamSpec::integer("b")),
            |args| async move {
                let a = args.get_i64("a").unwrap_or_default();
                let b = args.get_i64("b").unwrap_or_default();
                Ok(json!(a + b))
            },
        )
    }

    #[tokio::test]
    async fn test_from_fn_invokes_closure() {
        let tool = add_tool();
        assert_eq!(tool.name(), "add");
        assert_eq!(tool.call_json(&json!({ "a": 212, "b": 122 })).await.unwrap(), json!(334));
    }

    #[tokio::test]
    async fn test_call_json_rejects_bad_args() {
        let err = add_tool().call_json(&json!({ "a": 1 })).await.unwrap_err();
        assert!(err.to_string().contains("missing required argument 'b'"));
    }

    #[tokio::test]
    async fn test_from_sync_and_clone_share_handler() {
        let tool = Tool::from_sync(ToolSpec::new("fail", "Always fails"), |_| {
            Err(ToolError::execution("boom"))
        });
        let copy = tool.clone();
        let err = copy.invoke(ToolArgs::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(format!("{:?}", tool).contains("fail"));
    }
}
