//! Tool call execution

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use serde_json::Value;

use super::turn::{ExecutionRecord, FailureKind, ToolFailure, ToolOutcome};
use crate::logging::Logger;
use crate::tools::{Tool, ToolRegistry};
use crate::types::ToolCall;

/// Runs the calls of one model response against the tools offered this turn
pub(crate) struct ToolExecutor {
    registry: Arc<ToolRegistry>,
    logger: Arc<dyn Logger>,
}

impl ToolExecutor {
    pub(crate) fn new(registry: Arc<ToolRegistry>, logger: Arc<dyn Logger>) -> Self {
        Self { registry, logger }
    }

    /// Execute `calls`, returning one record per call in request order
    pub(crate) async fn execute_all(
        &self,
        calls: &[ToolCall],
        offered: &HashMap<String, Tool>,
        round: usize,
        parallel: bool,
    ) -> Vec<ExecutionRecord> {
        if parallel {
            join_all(calls.iter().map(|c| self.execute(c, offered, round))).await
        } else {
            let mut records = Vec::with_capacity(calls.len());
            for call in calls {
                records.push(self.execute(call, offered, round).await);
            }
            records
        }
    }

    async fn execute(
        &self,
        call: &ToolCall,
        offered: &HashMap<String, Tool>,
        round: usize,
    ) -> ExecutionRecord {
        let outcome = match self.resolve(&call.name, offered) {
            Ok(tool) => self.run(&tool, call).await,
            Err(failure) => ToolOutcome::Failure(failure),
        };

        if let ToolOutcome::Failure(failure) = &outcome {
            self.logger.warn(&format!(
                "[Agent] Tool {} failed ({:?}): {}",
                call.name, failure.kind, failure.message
            ));
        } else {
            self.logger.debug(&format!("[Agent] Tool {} succeeded", call.name));
        }

        ExecutionRecord {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            arguments: call.input.clone(),
            round,
            outcome,
        }
    }

    /// A call may only name a tool offered this turn that is still registered
    fn resolve(&self, name: &str, offered: &HashMap<String, Tool>) -> Result<Tool, ToolFailure> {
        if !offered.contains_key(name) {
            let message = if self.registry.contains(name) {
                format!("tool '{}' was not offered for this request", name)
            } else {
                format!("unknown tool '{}'", name)
            };
            return Err(ToolFailure::new(FailureKind::UnknownTool, message));
        }

        self.registry.get(name).map_err(|e| {
            ToolFailure::new(FailureKind::UnknownTool, e.to_string())
        })
    }

    async fn run(&self, tool: &Tool, call: &ToolCall) -> ToolOutcome {
        let args = match tool.spec().validate_args(&call.input) {
            Ok(args) => args,
            Err(e) => {
                return ToolOutcome::Failure(ToolFailure::new(
                    FailureKind::InvalidArguments,
                    e.to_string(),
                ))
            }
        };

        match AssertUnwindSafe(tool.invoke(args)).catch_unwind().await {
            Ok(Ok(Value::Null)) => ToolOutcome::Failure(ToolFailure::new(
                FailureKind::EmptyResult,
                format!("tool '{}' returned no result", call.name),
            )),
            Ok(Ok(value)) => ToolOutcome::Success(value),
            Ok(Err(e)) => ToolOutcome::Failure(ToolFailure::new(FailureKind::Execution, e.to_string())),
            Err(_) => ToolOutcome::Failure(ToolFailure::new(
                FailureKind::Execution,
                format!("tool '{}' panicked", call.name),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::tools::{ParamSpec, ToolError, ToolSpec};
    use serde_json::json;
    use std::time::Duration;

    fn setup() -> (ToolExecutor, HashMap<String, Tool>) {
        let registry = Arc::new(ToolRegistry::new(NoOpLogger::shared()));
        let tools = vec![
            Tool::from_sync(
                ToolSpec::new("add", "Add")
                    .with_param(ParamSpec::integer("a"))
                    .with_param(ParamSpec::integer("b")),
                |args| {
                    Ok(json!(args.get_i64("a").unwrap_or_default() + args.get_i64("b").unwrap_or_default()))
                },
            ),
            Tool::from_sync(ToolSpec::new("nothing", "Returns nothing"), |_| Ok(Value::Null)),
            Tool::from_sync(ToolSpec::new("broken", "Always fails"), |_| {
                Err(ToolError::execution("disk on fire"))
            }),
            Tool::from_sync(ToolSpec::new("panics", "Panics"), |_| panic!("bad tool")),
            Tool::from_fn(ToolSpec::new("slow", "Sleeps"), |_| async {
                tokio::time::sleep(Duration::from_millis(30)).await;
                Ok(json!("slept"))
            }),
        ];
        registry.register_all(tools.clone()).unwrap();
        // "hidden" is registered but never offered
        registry
            .register(Tool::from_sync(ToolSpec::new("hidden", "Hidden"), |_| Ok(json!(1))))
            .unwrap();

        let offered = tools.into_iter().map(|t| (t.name().to_string(), t)).collect();
        (ToolExecutor::new(registry, NoOpLogger::shared()), offered)
    }

    fn kind(record: &ExecutionRecord) -> Option<FailureKind> {
        record.outcome.failure().map(|f| f.kind)
    }

    #[tokio::test]
    async fn test_outcomes() {
        let (executor, offered) = setup();
        let calls = vec![
            ToolCall::new("1", "add", json!({ "a": 212, "b": 122 })),
            ToolCall::new("2", "add", json!({ "a": "x", "b": 1 })),
            ToolCall::new("3", "nothing", json!({})),
            ToolCall::new("4", "broken", Value::Null),
            ToolCall::new("5", "panics", json!({})),
            ToolCall::new("6", "hidden", json!({})),
            ToolCall::new("7", "missing", json!({})),
        ];

        let records = executor.execute_all(&calls, &offered, 1, true).await;
        assert_eq!(records.len(), 7);
        assert_eq!(records[0].outcome, ToolOutcome::Success(json!(334)));
        assert_eq!(kind(&records[1]), Some(FailureKind::InvalidArguments));
        assert_eq!(kind(&records[2]), Some(FailureKind::EmptyResult));
        assert_eq!(kind(&records[3]), Some(FailureKind::Execution));
        assert_eq!(kind(&records[4]), Some(FailureKind::Execution));
        assert_eq!(kind(&records[5]), Some(FailureKind::UnknownTool));
        assert!(records[5].outcome.failure().unwrap().message.contains("not offered"));
        assert_eq!(kind(&records[6]), Some(FailureKind::UnknownTool));

        let ids: Vec<&str> = records.iter().map(|r| r.call_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5", "6", "7"]);
    }

    #[tokio::test]
    async fn test_parallel_calls_overlap() {
        let (executor, offered) = setup();
        let calls: Vec<ToolCall> = (0..4)
            .map(|i| ToolCall::new(i.to_string(), "slow", json!({})))
            .collect();

        let started = std::time::Instant::now();
        let records = executor.execute_all(&calls, &offered, 2, true).await;
        assert!(started.elapsed() < Duration::from_millis(110));
        assert!(records.iter().all(|r| r.outcome.is_success() && r.round == 2));

        let sequential = executor.execute_all(&calls, &offered, 2, false).await;
        assert_eq!(sequential.len(), 4);
    }
}
