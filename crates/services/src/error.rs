//! Shared error types for the services crate.

use std::time::Duration;

use thiserror::Error;

use quiz_core::model::{TaskId, TokenError};
use storage::repository::StorageError;

/// Errors emitted by `ProgressCoordinator`.
///
/// Either way the cache was not marked with the attempted change.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("progress store unavailable: {0}")]
    Store(#[from] StorageError),
    #[error("progress store did not answer within {0:?}")]
    Timeout(Duration),
}

/// A choice selection that cannot be matched to a catalog task.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InteractionError {
    #[error(transparent)]
    Malformed(#[from] TokenError),
    #[error("choice refers to unknown task {0}")]
    UnknownTask(TaskId),
}

/// Errors reported by a `Transport` implementation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
}
