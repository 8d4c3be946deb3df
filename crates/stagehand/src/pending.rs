//! The set of roots with a queued-but-unexecuted implicit transition.

use crate::types::ViewId;

/// Roots whose deferred transition request has been queued but has not yet
/// run at a frame boundary.
///
/// A root appears at most once. A second request for the same root before
/// the frame boundary fires is dropped by the caller, which is what
/// coalesces all implicit-transition requests within one frame window into
/// a single capture/play pair.
#[derive(Debug, Default)]
pub struct PendingSet {
    roots: Vec<ViewId>,
}

impl PendingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `root` if absent. Returns false when it was already pending.
    pub fn insert(&mut self, root: ViewId) -> bool {
        if self.roots.contains(&root) {
            return false;
        }
        self.roots.push(root);
        true
    }

    /// Remove `root`. Returns whether it was present.
    pub fn remove(&mut self, root: ViewId) -> bool {
        let before = self.roots.len();
        self.roots.retain(|candidate| *candidate != root);
        self.roots.len() != before
    }

    /// Whether `root` has a queued request.
    pub fn contains(&self, root: ViewId) -> bool {
        self.roots.contains(&root)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
