//! Function-calling agent
//!
//! ```rust,ignore
//! let agent = FunctionCallingAgent::new(index, provider, AgentConfig::default(), logger);
//!
//! let output = agent.chat(&ConversationHistory::new(), "What's 212 multiplied by 122?").await?;
//! println!("{}", output.response());
//! let history = output.history;
//! ```

mod error;
mod executor;
mod history;
mod runner;
mod turn;

#[cfg(test)]
mod scenarios;

pub use error::{AgentError, AgentResult, Stage};
pub use history::ConversationHistory;
pub use runner::{FunctionCallingAgent, TurnOutput};
pub use turn::{
    ConversationTurn, ExecutionRecord, FailureKind, ToolFailure, ToolOutcome, TurnOutcome,
};
