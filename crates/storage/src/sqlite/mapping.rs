use quiz_core::model::{TaskId, UserId};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn task_id_from_i64(v: i64) -> Result<TaskId, StorageError> {
    u32::try_from(v)
        .map(TaskId::new)
        .map_err(|_| StorageError::Serialization(format!("task_id out of range: {v}")))
}

pub(crate) fn task_id_to_i64(id: TaskId) -> i64 {
    i64::from(id.value())
}

pub(crate) fn user_id_to_i64(id: UserId) -> i64 {
    id.value()
}

pub(crate) fn solved_from_i64(v: i64) -> Result<bool, StorageError> {
    match v {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StorageError::Serialization(format!(
            "invalid solved flag: {other}"
        ))),
    }
}

/// Maps a `(task_id, solved)` row.
pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(TaskId, bool), StorageError> {
    let task = task_id_from_i64(row.try_get::<i64, _>("task_id").map_err(ser)?)?;
    let solved = solved_from_i64(row.try_get::<i64, _>("solved").map_err(ser)?)?;
    Ok((task, solved))
}
