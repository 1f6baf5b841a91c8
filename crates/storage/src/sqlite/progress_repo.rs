use quiz_core::model::{ProgressSnapshot, TaskId, UserId};

use super::SqliteRepository;
use super::mapping::{map_progress_row, task_id_to_i64, user_id_to_i64};
use crate::repository::{ProgressRepository, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self, user: UserId) -> Result<ProgressSnapshot, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT task_id, solved
            FROM user_progress
            WHERE user_id = ?1
            ",
        )
        .bind(user_id_to_i64(user))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(map_progress_row(&row)?);
        }
        Ok(entries.into_iter().collect())
    }

    async fn upsert_progress(
        &self,
        user: UserId,
        task: TaskId,
        solved: bool,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO user_progress (user_id, task_id, solved)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id, task_id) DO UPDATE SET
                -- a solved row stays solved
                solved = MAX(user_progress.solved, excluded.solved)
            ",
        )
        .bind(user_id_to_i64(user))
        .bind(task_id_to_i64(task))
        .bind(i64::from(solved))
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }
}
