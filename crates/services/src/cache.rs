//! Per-user progress cache shared by every session.
//!
//! All state lives behind one mutex with short critical sections; no caller
//! ever holds the lock across store I/O. Every mutation stamps the user's slot
//! with a fresh generation number, which lets a slow loader detect that its
//! result was overtaken by a write and must not be cached.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use quiz_core::model::{ProgressSnapshot, TaskId, UserId};

#[derive(Debug, Default)]
struct Slot {
    generation: u64,
    snapshot: Option<ProgressSnapshot>,
}

#[derive(Debug, Default)]
struct CacheState {
    // Unbounded. An eviction policy (LRU, idle timeout) plugs in here and
    // must clear `Slot::snapshot` while keeping the generation; dropping the
    // whole slot would let an outstanding fill cache data older than the
    // evicted write.
    slots: HashMap<UserId, Slot>,
    next_generation: u64,
}

impl CacheState {
    fn stamp(&mut self, user: UserId) -> &mut Slot {
        self.next_generation += 1;
        let generation = self.next_generation;
        let slot = self.slots.entry(user).or_default();
        slot.generation = generation;
        slot
    }
}

/// Proof that a cache miss was observed at a given point.
///
/// Returned by [`ProgressCache::lookup`] on a miss and consumed by [`ProgressCache::fill`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct FillTicket {
    user: UserId,
    issued_at: u64,
}

/// In-memory map of user → snapshot.
///
/// Reads hand out clones, so a snapshot never changes under a caller.
#[derive(Debug, Default)]
pub struct ProgressCache {
    state: Mutex<CacheState>,
}

impl ProgressCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        // The state is a plain map; a panic mid-update cannot leave it torn.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cached snapshot for `user`, if any.
    #[must_use]
    pub fn get(&self, user: UserId) -> Option<ProgressSnapshot> {
        self.lock()
            .slots
            .get(&user)
            .and_then(|slot| slot.snapshot.clone())
    }

    /// Replace the snapshot for `user` unconditionally.
    pub fn put(&self, user: UserId, snapshot: ProgressSnapshot) {
        self.lock().stamp(user).snapshot = Some(snapshot);
    }

    /// Drop the snapshot for `user`; the next read reloads it.
    pub fn invalidate(&self, user: UserId) {
        self.lock().stamp(user).snapshot = None;
    }

    /// Cached snapshot for `user`, or a ticket for loading it.
    ///
    /// The hit check and the ticket share one critical section, so a write
    /// landing right after the miss still invalidates the ticket.
    pub fn lookup(&self, user: UserId) -> Result<ProgressSnapshot, FillTicket> {
        let state = self.lock();
        match state.slots.get(&user).and_then(|slot| slot.snapshot.clone()) {
            Some(snapshot) => Ok(snapshot),
            None => Err(FillTicket {
                user,
                issued_at: state.next_generation,
            }),
        }
    }

    /// Cached snapshot for `user`, caching an empty one on a miss.
    ///
    /// Used when the cache is the system of record: a present snapshot is
    /// never replaced.
    pub fn get_or_insert_empty(&self, user: UserId) -> ProgressSnapshot {
        let mut state = self.lock();
        if let Some(snapshot) = state.slots.get(&user).and_then(|slot| slot.snapshot.clone()) {
            return snapshot;
        }
        state
            .stamp(user)
            .snapshot
            .get_or_insert_with(ProgressSnapshot::new)
            .clone()
    }

    /// Cache a freshly loaded snapshot unless the user's slot changed after
    /// the ticket was issued. Returns whether the snapshot was stored.
    pub fn fill(&self, ticket: FillTicket, snapshot: ProgressSnapshot) -> bool {
        let mut state = self.lock();
        let overtaken = state
            .slots
            .get(&ticket.user)
            .is_some_and(|slot| slot.generation > ticket.issued_at);
        if overtaken {
            return false;
        }
        state.stamp(ticket.user).snapshot = Some(snapshot);
        true
    }

    /// Merge a solved flag into the cached snapshot, creating an empty one if
    /// the user has none. Used when the cache is the system of record.
    pub fn mark_solved(&self, user: UserId, task: TaskId) {
        self.lock()
            .stamp(user)
            .snapshot
            .get_or_insert_with(ProgressSnapshot::new)
            .mark_solved(task);
    }

    /// Merge a solved flag only if a snapshot is cached. Returns whether it was.
    ///
    /// The slot's generation moves forward either way, so a concurrent load
    /// that started before the durable write cannot cache its stale result.
    pub fn mark_solved_if_cached(&self, user: UserId, task: TaskId) -> bool {
        match self.lock().stamp(user).snapshot.as_mut() {
            Some(snapshot) => {
                snapshot.mark_solved(task);
                true
            }
            None => false,
        }
    }

    /// Number of users with a cached snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock()
            .slots
            .values()
            .filter(|slot| slot.snapshot.is_some())
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
