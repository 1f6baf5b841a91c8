use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{ProgressSnapshot, TaskId, UserId};
use services::{Durability, ProgressCache, ProgressCoordinator, ProgressError};
use storage::repository::{InMemoryRepository, ProgressRepository, StorageError};
use tokio::sync::Notify;

/// In-memory store with an outage switch and a slow-write switch.
#[derive(Default)]
struct FlakyRepository {
    inner: InMemoryRepository,
    down: AtomicBool,
    slow_writes: AtomicBool,
}

impl FlakyRepository {
    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    fn set_slow_writes(&self, slow: bool) {
        self.slow_writes.store(slow, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StorageError::Connection("simulated outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for FlakyRepository {
    async fn load_progress(&self, user: UserId) -> Result<ProgressSnapshot, StorageError> {
        self.check()?;
        self.inner.load_progress(user).await
    }

    async fn upsert_progress(
        &self,
        user: UserId,
        task: TaskId,
        solved: bool,
    ) -> Result<(), StorageError> {
        self.check()?;
        if self.slow_writes.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        self.inner.upsert_progress(user, task, solved).await
    }
}

/// Store whose loads read first and then wait for a signal before returning,
/// so a write can land in between.
#[derive(Default)]
struct GatedRepository {
    inner: InMemoryRepository,
    loaded: Notify,
    release: Notify,
    gate_loads: AtomicBool,
}

#[async_trait]
impl ProgressRepository for GatedRepository {
    async fn load_progress(&self, user: UserId) -> Result<ProgressSnapshot, StorageError> {
        let snapshot = self.inner.load_progress(user).await?;
        if self.gate_loads.swap(false, Ordering::SeqCst) {
            self.loaded.notify_one();
            self.release.notified().await;
        }
        Ok(snapshot)
    }

    async fn upsert_progress(
        &self,
        user: UserId,
        task: TaskId,
        solved: bool,
    ) -> Result<(), StorageError> {
        self.inner.upsert_progress(user, task, solved).await
    }
}

fn reconciled(repo: Arc<dyn ProgressRepository>) -> (Arc<ProgressCache>, ProgressCoordinator) {
    let cache = Arc::new(ProgressCache::new());
    let coordinator = ProgressCoordinator::new(Arc::clone(&cache), Durability::Reconciled(repo))
        .with_store_timeout(Duration::from_millis(200));
    (cache, coordinator)
}

#[tokio::test]
async fn record_solved_twice_matches_once() {
    let repo = Arc::new(InMemoryRepository::new());
    let (_cache, coordinator) = reconciled(Arc::clone(&repo) as Arc<dyn ProgressRepository>);
    let user = UserId::new(1);

    coordinator.record_solved(user, TaskId::new(3)).await.unwrap();
    let once = coordinator.get_progress(user).await.unwrap();
    coordinator.record_solved(user, TaskId::new(3)).await.unwrap();
    let twice = coordinator.get_progress(user).await.unwrap();

    assert_eq!(once, twice);
    assert_eq!(twice.len(), 1);
    assert!(twice.is_solved(TaskId::new(3)));
    assert_eq!(repo.row_count().unwrap(), 1);
}

#[tokio::test]
async fn solved_task_never_regresses_across_reloads() {
    let repo: Arc<dyn ProgressRepository> = Arc::new(InMemoryRepository::new());
    let (cache, coordinator) = reconciled(repo);
    let user = UserId::new(2);

    coordinator.get_progress(user).await.unwrap();
    coordinator.record_solved(user, TaskId::new(1)).await.unwrap();

    for round in 0..5 {
        if round % 2 == 1 {
            cache.invalidate(user);
        }
        let snapshot = coordinator.get_progress(user).await.unwrap();
        assert!(snapshot.is_solved(TaskId::new(1)), "regressed in round {round}");
    }
}

#[tokio::test]
async fn failed_write_is_not_visible_in_cache() {
    let repo = Arc::new(FlakyRepository::default());
    let (_cache, coordinator) = reconciled(Arc::clone(&repo) as Arc<dyn ProgressRepository>);
    let user = UserId::new(3);

    // warm the cache, then lose the store
    coordinator.get_progress(user).await.unwrap();
    repo.set_down(true);

    let err = coordinator.record_solved(user, TaskId::new(1)).await.unwrap_err();
    assert!(matches!(err, ProgressError::Store(_)));

    let snapshot = coordinator.get_progress(user).await.unwrap();
    assert!(!snapshot.is_solved(TaskId::new(1)));

    repo.set_down(false);
    let snapshot = coordinator.get_progress(user).await.unwrap();
    assert!(!snapshot.is_solved(TaskId::new(1)));
}

#[tokio::test]
async fn failed_write_on_cold_cache_is_not_reported_after_recovery() {
    let repo = Arc::new(FlakyRepository::default());
    let (cache, coordinator) = reconciled(Arc::clone(&repo) as Arc<dyn ProgressRepository>);
    let user = UserId::new(4);

    repo.set_down(true);
    assert!(coordinator.record_solved(user, TaskId::new(2)).await.is_err());
    assert!(cache.get(user).is_none());

    repo.set_down(false);
    assert!(!coordinator.get_progress(user).await.unwrap().is_solved(TaskId::new(2)));
}

#[tokio::test]
async fn failed_read_is_an_error_not_empty_progress() {
    let repo = Arc::new(FlakyRepository::default());
    let (cache, coordinator) = reconciled(Arc::clone(&repo) as Arc<dyn ProgressRepository>);
    let user = UserId::new(5);
    repo.inner.upsert_progress(user, TaskId::new(1), true).await.unwrap();

    repo.set_down(true);
    assert!(matches!(
        coordinator.get_progress(user).await,
        Err(ProgressError::Store(_))
    ));
    assert!(cache.get(user).is_none());

    repo.set_down(false);
    assert!(coordinator.get_progress(user).await.unwrap().is_solved(TaskId::new(1)));
}

#[tokio::test]
async fn write_timeout_fails_and_drops_cached_view() {
    let repo = Arc::new(FlakyRepository::default());
    let (cache, coordinator) = reconciled(Arc::clone(&repo) as Arc<dyn ProgressRepository>);
    let user = UserId::new(6);

    coordinator.get_progress(user).await.unwrap();
    assert!(cache.get(user).is_some());

    repo.set_slow_writes(true);
    let err = coordinator.record_solved(user, TaskId::new(1)).await.unwrap_err();
    assert!(matches!(err, ProgressError::Timeout(d) if d == Duration::from_millis(200)));
    assert!(cache.get(user).is_none());

    repo.set_slow_writes(false);
    // the abandoned write never reached the store, so nothing is solved
    assert!(!coordinator.get_progress(user).await.unwrap().is_solved(TaskId::new(1)));
}

#[tokio::test]
async fn load_overtaken_by_write_is_not_cached() {
    let repo = Arc::new(GatedRepository::default());
    let (cache, coordinator) = reconciled(Arc::clone(&repo) as Arc<dyn ProgressRepository>);
    let coordinator = Arc::new(coordinator.with_store_timeout(Duration::from_secs(5)));
    let user = UserId::new(7);

    repo.gate_loads.store(true, Ordering::SeqCst);
    let reader = {
        let coordinator = Arc::clone(&coordinator);
        tokio::spawn(async move { coordinator.get_progress(user).await })
    };

    // the reader has read the store but not yet filled the cache
    repo.loaded.notified().await;
    coordinator.record_solved(user, TaskId::new(1)).await.unwrap();
    repo.release.notify_one();

    let stale = reader.await.unwrap().unwrap();
    assert!(!stale.is_solved(TaskId::new(1)));
    assert!(cache.get(user).is_none());

    assert!(coordinator.get_progress(user).await.unwrap().is_solved(TaskId::new(1)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_are_not_lost() {
    let repo = Arc::new(InMemoryRepository::new());
    let (_cache, coordinator) = reconciled(Arc::clone(&repo) as Arc<dyn ProgressRepository>);
    let coordinator = Arc::new(coordinator);

    let mut handles = Vec::new();
    for user in 1..=10 {
        let user = UserId::new(user);
        // seed some cached snapshots so both merge paths are exercised
        if user.value() % 2 == 0 {
            coordinator.get_progress(user).await.unwrap();
        }
        for task in 1..=5 {
            // every answer is "tapped" twice
            for _ in 0..2 {
                let coordinator = Arc::clone(&coordinator);
                handles.push(tokio::spawn(async move {
                    coordinator.record_solved(user, TaskId::new(task)).await
                }));
            }
            let reader = Arc::clone(&coordinator);
            handles.push(tokio::spawn(async move {
                reader.get_progress(user).await.map(|_| ())
            }));
        }
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for user in 1..=10 {
        let user = UserId::new(user);
        let snapshot = coordinator.get_progress(user).await.unwrap();
        for task in 1..=5 {
            assert!(snapshot.is_solved(TaskId::new(task)), "{user:?} lost task {task}");
        }
        assert_eq!(snapshot.len(), 5);
    }
    assert_eq!(repo.row_count().unwrap(), 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cache_only_mode_survives_concurrent_writes() {
    let cache = Arc::new(ProgressCache::new());
    let coordinator = Arc::new(ProgressCoordinator::new(
        Arc::clone(&cache),
        Durability::CacheOnly,
    ));
    let user = UserId::new(11);

    let mut handles = Vec::new();
    for task in 1..=20 {
        let coordinator = Arc::clone(&coordinator);
        handles.push(tokio::spawn(async move {
            coordinator.record_solved(user, TaskId::new(task)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = coordinator.get_progress(user).await.unwrap();
    assert_eq!(snapshot.len(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cache_only_reads_racing_first_write_keep_the_flag() {
    let coordinator = Arc::new(ProgressCoordinator::new(
        Arc::new(ProgressCache::new()),
        Durability::CacheOnly,
    ));

    let mut handles = Vec::new();
    for user in 100..400 {
        let user = UserId::new(user);
        let reader = Arc::clone(&coordinator);
        handles.push(tokio::spawn(async move {
            reader.get_progress(user).await.map(|_| ())
        }));
        let writer = Arc::clone(&coordinator);
        handles.push(tokio::spawn(async move {
            writer.record_solved(user, TaskId::new(1)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for user in 100..400 {
        let snapshot = coordinator.get_progress(UserId::new(user)).await.unwrap();
        assert!(snapshot.is_solved(TaskId::new(1)), "user {user} lost its flag");
    }
}
