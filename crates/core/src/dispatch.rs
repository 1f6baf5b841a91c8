//! Task selection and answer checking.
//!
//! Both functions are pure and synchronous; they never touch the cache or
//! the store.

use crate::model::{Catalog, ProgressSnapshot, Task};

/// Outcome of checking a submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Verdict::Correct)
    }
}

/// First task in curriculum order that the snapshot does not mark solved.
///
/// Returns `None` once every catalog task is solved. Snapshot entries for ids
/// outside the catalog have no effect.
#[must_use]
pub fn next_task<'a>(catalog: &'a Catalog, snapshot: &ProgressSnapshot) -> Option<&'a Task> {
    catalog.tasks().find(|task| !snapshot.is_solved(task.id()))
}

/// Exact, case-sensitive comparison with the task's answer. No trimming.
#[must_use]
pub fn evaluate(task: &Task, submitted: &str) -> Verdict {
    if submitted == task.answer() {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}
