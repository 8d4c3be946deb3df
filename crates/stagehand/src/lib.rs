//! Scene-change orchestration for retained view hierarchies.
//!
//! Stagehand animates the change between declarative "scenes" of a view
//! hierarchy: given a root container and a target arrangement of children,
//! it determines what changed, defers the visual diff to the next render
//! frame, and drives a transition from the old arrangement to the new one.
//!
//! The crate is the orchestration layer only. It decides *when* a transition
//! runs, *which* definition applies to a given scene pair, how overlapping
//! runs on the same root are paused, resumed, and superseded, and how the
//! capture → exit → enter → capture → play sequence lines up with the host's
//! render-frame boundary. The actual animation engine stays on the host
//! side: property capture and playback are reached only through the
//! [`Transition`] trait, structural tree edits only through [`Scene`]
//! enter/exit actions, and the engine never walks a view tree itself.
//!
//! # Integration
//!
//! - Allocate a [`ViewId`] per root container and keep the mapping to your
//!   own node type.
//! - Describe arrangements as [`Scene`]s with enter/exit actions, or skip
//!   scenes entirely and use
//!   [`begin_delayed_transition`](TransitionManager::begin_delayed_transition)
//!   before editing the tree directly.
//! - Call [`run_frame`](TransitionManager::run_frame) once per render frame,
//!   immediately before drawing.
//! - Implement [`Transition`] on top of your animation engine; the bundled
//!   [`AutoTransition`] is a structurally correct but visually inert
//!   default.
//!
//! One [`TransitionManager`] serves one execution context; contexts never
//! observe each other's in-flight state.

#![forbid(unsafe_code)]

pub mod error;
pub mod frame;
pub mod manager;
pub mod pending;
pub mod registry;
pub mod scene;
pub mod transition;
pub mod types;

pub use error::{StagehandError, StagehandResult};
pub use frame::{FrameQueue, FrameTask};
pub use manager::TransitionManager;
pub use pending::PendingSet;
pub use registry::RunningRegistry;
pub use scene::{Scene, SceneAction, SceneHandle};
pub use transition::{AutoTransition, EndListener, EndListeners, Transition, TransitionHandle};
pub use types::{FrameToken, RunState, SceneId, ViewId};
