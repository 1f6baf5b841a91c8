use sqlx::SqlitePool;

use super::SqliteInitError;

/// Runs the versioned migrations for the progress schema.
///
/// Version 1 creates `user_progress`, keyed by (user, task).
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: progress table.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS user_progress (
                    user_id INTEGER NOT NULL,
                    task_id INTEGER NOT NULL CHECK (task_id >= 0),
                    solved INTEGER NOT NULL CHECK (solved IN (0, 1)),
                    PRIMARY KEY (user_id, task_id)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r"
                INSERT INTO schema_migrations (version)
                VALUES (?1)
                ON CONFLICT(version) DO NOTHING
            ",
        )
        .bind(1_i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(version = 1, "applied progress schema migration");
    }

    Ok(())
}
