//! Records of a conversation turn

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::ToolResult;

/// Why a tool call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The call named a tool that was not offered this turn
    UnknownTool,
    /// Arguments did not match the tool's parameters
    InvalidArguments,
    /// The handler returned an error or panicked
    Execution,
    /// The handler returned nothing
    EmptyResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl ToolFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success(Value),
    Failure(ToolFailure),
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ToolOutcome::Success(_))
    }

    pub fn failure(&self) -> Option<&ToolFailure> {
        match self {
            ToolOutcome::Success(_) => None,
            ToolOutcome::Failure(f) => Some(f),
        }
    }
}

/// One executed tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRecord {
    pub call_id: String,
    pub tool_name: String,
    pub arguments: Value,
    /// 1-based round the call was executed in
    pub round: usize,
    pub outcome: ToolOutcome,
}

impl ExecutionRecord {
    /// The result message fed back to the model for this call
    pub fn to_tool_result(&self) -> ToolResult {
        match &self.outcome {
            ToolOutcome::Success(Value::String(text)) => ToolResult::success(&self.call_id, text),
            ToolOutcome::Success(value) => ToolResult::success(&self.call_id, value.to_string()),
            ToolOutcome::Failure(failure) => {
                ToolResult::error(&self.call_id, format!("Error: {}", failure.message))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnOutcome {
    /// The model produced a final answer
    Answered,
    /// The round limit was hit and the fallback response returned
    RoundLimitReached,
}

/// Everything that happened while answering one user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub user_message: String,
    /// Names of the tools offered to the model, most relevant first
    pub offered_tools: Vec<String>,
    pub records: Vec<ExecutionRecord>,
    pub response: String,
    pub outcome: TurnOutcome,
    /// Number of tool-execution rounds that ran
    pub rounds: usize,
}

impl ConversationTurn {
    /// Records of the calls that failed
    pub fn failures(&self) -> impl Iterator<Item = &ExecutionRecord> {
        self.records.iter().filter(|r| !r.outcome.is_success())
    }

    pub fn called_tools(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.tool_name.as_str()).collect()
    }
}
