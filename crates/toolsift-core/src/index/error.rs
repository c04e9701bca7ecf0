//! Index error types

use std::time::Duration;

use thiserror::Error;

use crate::tools::{MappingError, RegistryError};

/// Errors raised by a vector backend or embedder
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("Embedding failed: {0}")]
    Embedding(String),

    #[error("Embedder returned {found} vectors for {expected} inputs")]
    CountMismatch { expected: usize, found: usize },

    #[error("Backend error: {0}")]
    Other(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised by the object index
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index build failed: {0}")]
    Build(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Retrieval timed out after {0:?}")]
    Timeout(Duration),

    #[error("Retrieval cancelled")]
    Cancelled,
}

pub type IndexResult<T> = Result<T, IndexError>;
