use quiz_core::model::{TaskId, UserId};
use storage::repository::{ProgressRepository, Storage};
use storage::sqlite::SqliteRepository;

#[tokio::test]
async fn sqlite_roundtrip_persists_solved_flags() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::new(1001);
    repo.upsert_progress(user, TaskId::new(1), true).await.unwrap();
    repo.upsert_progress(user, TaskId::new(3), false).await.unwrap();

    let fetched = repo.load_progress(user).await.expect("load");
    assert_eq!(fetched.len(), 2);
    assert!(fetched.is_solved(TaskId::new(1)));
    assert!(!fetched.is_solved(TaskId::new(3)));
}

#[tokio::test]
async fn sqlite_upsert_is_idempotent_and_never_unsolves() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_upsert?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let user = UserId::new(-42);
    let task = TaskId::new(2);
    repo.upsert_progress(user, task, true).await.unwrap();
    repo.upsert_progress(user, task, true).await.unwrap();
    repo.upsert_progress(user, task, false).await.unwrap();

    let fetched = repo.load_progress(user).await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert!(fetched.is_solved(task));
}

#[tokio::test]
async fn sqlite_keeps_users_apart() {
    let storage = Storage::sqlite("sqlite:file:memdb_progress_users?mode=memory&cache=shared")
        .await
        .expect("storage");

    storage
        .progress
        .upsert_progress(UserId::new(1), TaskId::new(1), true)
        .await
        .unwrap();
    storage
        .progress
        .upsert_progress(UserId::new(2), TaskId::new(5), true)
        .await
        .unwrap();

    let first = storage.progress.load_progress(UserId::new(1)).await.unwrap();
    assert!(first.is_solved(TaskId::new(1)));
    assert!(!first.is_solved(TaskId::new(5)));

    let stranger = storage.progress.load_progress(UserId::new(3)).await.unwrap();
    assert!(stranger.is_empty());
}

#[tokio::test]
async fn sqlite_migrations_are_rerunnable() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_progress_migrate?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.upsert_progress(UserId::new(9), TaskId::new(4), true)
        .await
        .unwrap();
    repo.migrate().await.expect("second migrate");

    let fetched = repo.load_progress(UserId::new(9)).await.unwrap();
    assert!(fetched.is_solved(TaskId::new(4)));
}
