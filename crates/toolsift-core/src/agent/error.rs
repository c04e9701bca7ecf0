//! Agent error types

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;
use crate::index::IndexError;
use crate::providers::ProviderError;

/// Turn stage that can time out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Retrieval,
    Model,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Retrieval => write!(f, "retrieval"),
            Stage::Model => write!(f, "model call"),
        }
    }
}

/// Errors that abort a turn
///
/// Tool failures never appear here; they are recorded on the turn and fed
/// back to the model.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Tool retrieval failed: {0}")]
    Retrieval(IndexError),

    #[error("Model call failed: {0}")]
    Model(ProviderError),

    #[error("{stage} timed out after {after:?}")]
    Timeout { stage: Stage, after: Duration },

    #[error("Turn cancelled")]
    Cancelled,

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<IndexError> for AgentError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Timeout(after) => AgentError::Timeout {
                stage: Stage::Retrieval,
                after,
            },
            IndexError::Cancelled => AgentError::Cancelled,
            other => AgentError::Retrieval(other),
        }
    }
}

impl From<ProviderError> for AgentError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Timeout(after) => AgentError::Timeout {
                stage: Stage::Model,
                after,
            },
            ProviderError::Cancelled => AgentError::Cancelled,
            other => AgentError::Model(other),
        }
    }
}

pub type AgentResult<T> = Result<T, AgentError>;
