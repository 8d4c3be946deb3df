//! Per-root bookkeeping of transition runs currently in flight.

use std::collections::HashMap;
use std::rc::Rc;

use crate::transition::{Transition, TransitionHandle};
use crate::types::ViewId;

/// In-flight transition runs, keyed by root container.
///
/// The orchestrator owns one registry per execution context and shares it
/// with end listeners behind `Rc<RefCell<…>>`. An entry spans the window
/// from "registered at the frame boundary" to "end event observed"; removal
/// is by instance identity and idempotent.
#[derive(Default)]
pub struct RunningRegistry {
    running: HashMap<ViewId, Vec<TransitionHandle>>,
}

impl RunningRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defensive copy of the runs currently registered for `root`.
    ///
    /// Callers iterate the copy so that removals triggered mid-iteration
    /// (end listeners) cannot corrupt the walk.
    pub fn snapshot(&self, root: ViewId) -> Vec<TransitionHandle> {
        self.running.get(&root).cloned().unwrap_or_default()
    }

    /// Register a new run for `root`.
    pub fn insert(&mut self, root: ViewId, run: TransitionHandle) {
        self.running.entry(root).or_default().push(run);
    }

    /// Remove a run by instance identity. Returns whether an entry was
    /// removed; removing the same instance twice is a no-op.
    pub fn remove(&mut self, root: ViewId, run: &TransitionHandle) -> bool {
        let Some(runs) = self.running.get_mut(&root) else {
            return false;
        };
        let before = runs.len();
        runs.retain(|candidate| !Rc::ptr_eq(candidate, run));
        let removed = runs.len() != before;
        if runs.is_empty() {
            self.running.remove(&root);
        }
        removed
    }

    /// Pause every run registered for `root`. Returns how many were paused.
    pub fn pause_all(&mut self, root: ViewId) -> usize {
        let Some(runs) = self.running.get(&root) else {
            return 0;
        };
        for run in runs {
            run.borrow_mut().pause();
        }
        runs.len()
    }

    /// Number of runs in flight for `root`.
    pub fn count(&self, root: ViewId) -> usize {
        self.running.get(&root).map_or(0, Vec::len)
    }

    /// True if no run is in flight anywhere.
    pub fn is_empty(&self) -> bool {
        self.running.is_empty()
    }

    /// Drop all entries for `root` without waiting for their end events.
    /// Returns how many were dropped.
    pub fn clear_root(&mut self, root: ViewId) -> usize {
        self.running.remove(&root).map_or(0, |runs| runs.len())
    }
}
