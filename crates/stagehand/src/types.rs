//! Identity and lifecycle types shared across the engine.
//!
//! - `ViewId`: identity of a root container in the host view tree
//! - `SceneId`: identity of a scene descriptor
//! - `FrameToken`: cancel handle for a queued frame task
//! - `RunState`: lifecycle of a single transition run

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a root container in the host's view tree.
///
/// The engine never walks the tree itself; all per-root bookkeeping (current
/// scene, running transitions, pending requests) is keyed off this id. Hosts
/// allocate one per container with [`ViewId::new`] and keep the mapping to
/// their own node type on their side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub u64);

impl ViewId {
    /// Allocate a fresh, process-unique id.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ViewId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a scene descriptor.
///
/// Used as the key in the transition override maps and for current-scene
/// comparisons; two handles to the same [`Scene`](crate::scene::Scene) share
/// one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SceneId(pub u64);

impl SceneId {
    /// Allocate a fresh, process-unique id.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SceneId {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancel handle for a task queued on the frame queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameToken(pub u64);

impl FrameToken {
    /// Allocate a fresh, process-unique token.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for FrameToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle of a single transition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Instance created from a template; nothing captured yet.
    Created,
    /// Start values captured; waiting for the frame boundary.
    Armed,
    /// Playback started.
    Running,
    /// Clock stopped by a newer run's setup on the same root.
    Paused,
    /// End event fired.
    Finished,
}

impl Default for RunState {
    fn default() -> Self {
        Self::Created
    }
}

static_assertions::assert_impl_all!(ViewId: Send, Sync, Copy);
static_assertions::assert_impl_all!(SceneId: Send, Sync, Copy);
static_assertions::assert_impl_all!(FrameToken: Send, Sync, Copy);
