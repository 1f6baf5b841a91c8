use std::collections::BTreeMap;
use std::fmt;

use crate::model::catalog::Catalog;
use crate::model::ids::TaskId;

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Point-in-time copy of one user's solved flags.
///
/// This is an owned value: mutating the cache after a snapshot was handed out
/// never changes the snapshot. Entries for ids that are not in the catalog are
/// kept but ignored by dispatch and reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    entries: BTreeMap<TaskId, bool>,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True only for an entry present with `solved = true`.
    #[must_use]
    pub fn is_solved(&self, id: TaskId) -> bool {
        self.entries.get(&id).copied().unwrap_or(false)
    }

    /// Sets the flag to solved. Returns `true` if this changed the snapshot.
    ///
    /// There is no inverse; flags never go back to unsolved.
    pub fn mark_solved(&mut self, id: TaskId) -> bool {
        let previous = self.entries.insert(id, true);
        previous != Some(true)
    }

    /// Raw entries, including ones stored as unsolved.
    pub fn entries(&self) -> impl Iterator<Item = (TaskId, bool)> + '_ {
        self.entries.iter().map(|(&id, &solved)| (id, solved))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(TaskId, bool)> for ProgressSnapshot {
    fn from_iter<I: IntoIterator<Item = (TaskId, bool)>>(iter: I) -> Self {
        let mut entries = BTreeMap::new();
        for (id, solved) in iter {
            // a true flag is never downgraded by a later row
            let slot = entries.entry(id).or_insert(false);
            *slot = *slot || solved;
        }
        Self { entries }
    }
}

//
// ─── REPORT ────────────────────────────────────────────────────────────────────
//

/// Solved-count summary of a snapshot against a catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressReport {
    pub solved: usize,
    pub total: usize,
}

impl ProgressReport {
    /// Counts solved tasks that exist in `catalog`.
    #[must_use]
    pub fn compute(catalog: &Catalog, snapshot: &ProgressSnapshot) -> Self {
        let solved = catalog
            .tasks()
            .filter(|task| snapshot.is_solved(task.id()))
            .count();
        Self {
            solved,
            total: catalog.len(),
        }
    }

    /// Share of solved tasks in percent. Zero for an empty catalog.
    #[must_use]
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        // NOTE: counts are bounded by catalog size, far below f64's exact range.
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.solved as f64 / self.total as f64;
        ratio * 100.0
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.solved == self.total
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}, {:.1}%", self.solved, self.total, self.percentage())
    }
}
