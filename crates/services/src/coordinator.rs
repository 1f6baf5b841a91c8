use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{ProgressSnapshot, TaskId, UserId};
use storage::repository::{ProgressRepository, StorageError};
use tracing::{debug, warn};

use crate::cache::ProgressCache;
use crate::error::ProgressError;

/// Default bound on a single store round-trip.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(3);

//
// ─── DURABILITY ────────────────────────────────────────────────────────────────
//

/// Where solved flags are recorded.
#[derive(Clone)]
pub enum Durability {
    /// The store is the system of record; the cache is a perishable accelerator.
    Reconciled(Arc<dyn ProgressRepository>),
    /// No store. The cache is the only record and progress is lost on restart.
    CacheOnly,
}

impl Durability {
    #[must_use]
    pub fn is_durable(&self) -> bool {
        matches!(self, Durability::Reconciled(_))
    }
}

impl fmt::Debug for Durability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Durability::Reconciled(_) => f.write_str("Reconciled"),
            Durability::CacheOnly => f.write_str("CacheOnly"),
        }
    }
}

//
// ─── COORDINATOR ───────────────────────────────────────────────────────────────
//

/// Cache-aside access to user progress.
///
/// Reads are served from the cache and populated from the store on a miss.
/// Writes go to the store first and reach the cache only after the store has
/// acknowledged them, so the cache never shows a flag the store may not have.
#[derive(Clone)]
pub struct ProgressCoordinator {
    cache: Arc<ProgressCache>,
    durability: Durability,
    store_timeout: Duration,
}

impl ProgressCoordinator {
    #[must_use]
    pub fn new(cache: Arc<ProgressCache>, durability: Durability) -> Self {
        Self {
            cache,
            durability,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_store_timeout(mut self, store_timeout: Duration) -> Self {
        self.store_timeout = store_timeout;
        self
    }

    #[must_use]
    pub fn durability(&self) -> &Durability {
        &self.durability
    }

    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    /// Current snapshot of a user's progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the store cannot be read in time. A failed
    /// read is never reported as "no progress".
    pub async fn get_progress(&self, user: UserId) -> Result<ProgressSnapshot, ProgressError> {
        let store = match &self.durability {
            Durability::Reconciled(store) => store,
            Durability::CacheOnly => return Ok(self.cache.get_or_insert_empty(user)),
        };

        let ticket = match self.cache.lookup(user) {
            Ok(snapshot) => return Ok(snapshot),
            Err(ticket) => ticket,
        };
        let snapshot = self
            .bounded(store.load_progress(user))
            .await
            .inspect_err(|e| {
                warn!(user = %user, error = %e, "failed to load progress");
            })?;

        if !self.cache.fill(ticket, snapshot.clone()) {
            debug!(user = %user, "progress changed during load; not caching");
        }
        Ok(snapshot)
    }

    /// Record that a user solved a task. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the store rejects the write or does not
    /// answer in time. The cache is then left without the new flag.
    pub async fn record_solved(&self, user: UserId, task: TaskId) -> Result<(), ProgressError> {
        let store = match &self.durability {
            Durability::Reconciled(store) => store,
            Durability::CacheOnly => {
                self.cache.mark_solved(user, task);
                debug!(user = %user, task = %task, "recorded solved task in cache only");
                return Ok(());
            }
        };

        match self.bounded(store.upsert_progress(user, task, true)).await {
            Ok(()) => {
                let merged = self.cache.mark_solved_if_cached(user, task);
                debug!(user = %user, task = %task, merged, "recorded solved task");
                Ok(())
            }
            Err(err @ ProgressError::Timeout(_)) => {
                // The write may still commit; force the next read to ask the store.
                self.cache.invalidate(user);
                warn!(user = %user, task = %task, error = %err, "progress write timed out");
                Err(err)
            }
            Err(err) => {
                warn!(user = %user, task = %task, error = %err, "progress write failed");
                Err(err)
            }
        }
    }

    async fn bounded<T>(
        &self,
        op: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, ProgressError> {
        match tokio::time::timeout(self.store_timeout, op).await {
            Ok(result) => result.map_err(ProgressError::from),
            Err(_) => Err(ProgressError::Timeout(self.store_timeout)),
        }
    }
}
