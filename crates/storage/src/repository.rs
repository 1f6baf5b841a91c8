use async_trait::async_trait;
use quiz_core::model::{ProgressSnapshot, TaskId, UserId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Durable record of which tasks each user has solved.
///
/// Both calls may be retried: `upsert_progress` is keyed on (user, task) and
/// must behave as insert-or-update. A stored `true` is never overwritten by
/// `false`.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Load every stored flag for a user. Users without history get an empty snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn load_progress(&self, user: UserId) -> Result<ProgressSnapshot, StorageError>;

    /// Insert or update one (user, task) flag.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write is not acknowledged by the store.
    async fn upsert_progress(
        &self,
        user: UserId,
        task: TaskId,
        solved: bool,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    progress: Arc<Mutex<HashMap<(UserId, TaskId), bool>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            progress: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of stored (user, task) rows.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn row_count(&self) -> Result<usize, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn load_progress(&self, user: UserId) -> Result<ProgressSnapshot, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .iter()
            .filter(|((owner, _), _)| *owner == user)
            .map(|((_, task), &solved)| (*task, solved))
            .collect())
    }

    async fn upsert_progress(
        &self,
        user: UserId,
        task: TaskId,
        solved: bool,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let flag = guard.entry((user, task)).or_insert(false);
        *flag = *flag || solved;
        Ok(())
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let progress: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
        Self { progress }
    }
}
