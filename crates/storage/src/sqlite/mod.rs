use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use thiserror::Error;

use crate::repository::{ProgressRepository, Storage};

mod mapping;
mod migrate;
mod progress_repo;

/// `ProgressRepository` over a `SQLite` pool.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SqliteInitError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl SqliteRepository {
    /// Open a pool for `database_url`, creating the file if needed.
    ///
    /// In-memory databases keep one connection open for the life of the pool
    /// so their contents survive idle periods.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if the URL is invalid or no connection can be
    /// established.
    pub async fn connect(database_url: &str) -> Result<Self, SqliteInitError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let mut pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(5));
        if database_url.contains(":memory:") || database_url.contains("mode=memory") {
            pool = pool.min_connections(1).idle_timeout(None).max_lifetime(None);
        }

        let pool = pool.connect_with(options).await?;
        Ok(Self { pool })
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if a migration statement fails.
    pub async fn migrate(&self) -> Result<(), SqliteInitError> {
        migrate::run_migrations(&self.pool).await
    }
}

impl Storage {
    /// Connect, migrate, and wrap the pool as the progress store.
    ///
    /// # Errors
    ///
    /// Returns `SqliteInitError` if connecting or migrating fails.
    pub async fn sqlite(database_url: &str) -> Result<Self, SqliteInitError> {
        let repo = SqliteRepository::connect(database_url).await?;
        repo.migrate().await?;
        tracing::info!(url = database_url, "sqlite progress store ready");
        Ok(Self {
            progress: Arc::new(repo) as Arc<dyn ProgressRepository>,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plain_memory_url_survives_across_pool_connections() {
        let repo = SqliteRepository::connect("sqlite::memory:").await.unwrap();
        repo.migrate().await.unwrap();

        let mut conns = Vec::new();
        for _ in 0..3 {
            conns.push(repo.pool().acquire().await.unwrap());
        }
        for mut conn in conns {
            let row: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'user_progress'",
            )
            .fetch_one(&mut *conn)
            .await
            .unwrap();
            assert_eq!(row.0, 1);
        }
    }
}
