//! Explicit next-frame task queue.
//!
//! Deferred transition work is modeled as data tasks the host drains at its
//! render-frame boundary through
//! [`TransitionManager::run_frame`](crate::manager::TransitionManager::run_frame),
//! rather than a listener hung off a pre-draw signal. Every task is one-shot
//! and individually cancellable, which makes cancellation on root teardown a
//! first-class operation instead of an accepted leak.

use crate::transition::TransitionHandle;
use crate::types::{FrameToken, ViewId};

/// A deferred capture-end + play request for one root.
pub struct FrameTask {
    pub(crate) token: FrameToken,
    pub(crate) root: ViewId,
    pub(crate) transition: TransitionHandle,
}

impl FrameTask {
    /// The cancel handle this task was queued under.
    pub fn token(&self) -> FrameToken {
        self.token
    }

    /// The root the deferred run targets.
    pub fn root(&self) -> ViewId {
        self.root
    }
}

/// FIFO queue of one-shot frame tasks with cancellation.
#[derive(Default)]
pub struct FrameQueue {
    tasks: Vec<FrameTask>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a deferred run for the next frame; the returned token cancels
    /// it.
    pub fn enqueue(&mut self, root: ViewId, transition: TransitionHandle) -> FrameToken {
        let token = FrameToken::new();
        self.tasks.push(FrameTask {
            token,
            root,
            transition,
        });
        token
    }

    /// Cancel a queued task. Returns false when it already ran or was
    /// cancelled.
    pub fn cancel(&mut self, token: FrameToken) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.token != token);
        self.tasks.len() != before
    }

    /// Cancel every queued task for `root`. Returns how many were dropped.
    pub fn cancel_root(&mut self, root: ViewId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.root != root);
        before - self.tasks.len()
    }

    /// Drain everything queued so far, in FIFO order.
    ///
    /// Tasks enqueued while the drained batch executes land in the next
    /// batch, so a single request can never run twice in one frame.
    pub fn take_due(&mut self) -> Vec<FrameTask> {
        std::mem::take(&mut self.tasks)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
