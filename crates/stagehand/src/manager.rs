//! The scene-change orchestrator.
//!
//! [`TransitionManager`] is the central coordinator: it decides when a
//! transition runs, which transition definition applies to a given scene
//! pair, how overlapping runs on the same root are paused, resumed, and
//! superseded, and how the capture → exit → enter → capture → play sequence
//! lines up with the host's render-frame boundary.
//!
//! One manager serves one execution context (its handles are `Rc`); mutation
//! happens either synchronously inside a call or inside [`run_frame`], and
//! the two never overlap on a cooperative host loop.
//!
//! [`run_frame`]: TransitionManager::run_frame
//!
//! # Usage
//!
//! ```
//! use stagehand::{Scene, TransitionManager, ViewId};
//!
//! let root = ViewId::new();
//! let mut manager = TransitionManager::new();
//!
//! let detail = Scene::new(root)
//!     .with_name("detail")
//!     .with_enter_action(|| { /* attach the detail subtree */ })
//!     .into_handle();
//!
//! manager.transition_to(&detail).unwrap();
//! // …and at the next render-frame boundary:
//! manager.run_frame().unwrap();
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::error::{StagehandError, StagehandResult};
use crate::frame::{FrameQueue, FrameTask};
use crate::pending::PendingSet;
use crate::registry::RunningRegistry;
use crate::scene::SceneHandle;
use crate::transition::{AutoTransition, Transition, TransitionHandle};
use crate::types::{SceneId, ViewId};

/// Orchestrates animated transitions between scenes of a view hierarchy.
pub struct TransitionManager {
    /// Fallback template when no override resolves. `None` means unresolved
    /// scene changes apply without animation.
    default_transition: Option<TransitionHandle>,
    /// Entering a scene, regardless of where from.
    scene_overrides: HashMap<SceneId, TransitionHandle>,
    /// to-scene → (from-scene → transition); dominates scene overrides.
    pair_overrides: HashMap<SceneId, HashMap<SceneId, TransitionHandle>>,
    /// Current scene per root. `Some(None)` is the "no scene" sentinel set
    /// before an implicit change; a missing key means the root has never
    /// had a scene applied.
    current_scenes: HashMap<ViewId, Option<SceneHandle>>,
    /// Shared with end listeners, which self-remove their run.
    registry: Rc<RefCell<RunningRegistry>>,
    pending: PendingSet,
    frame_queue: FrameQueue,
}

impl TransitionManager {
    /// Create a manager whose default transition is [`AutoTransition`].
    pub fn new() -> Self {
        Self::with_default_transition(Some(AutoTransition::template()))
    }

    /// Create a manager with an explicit default transition.
    pub fn with_default_transition(default: Option<TransitionHandle>) -> Self {
        Self {
            default_transition: default,
            scene_overrides: HashMap::new(),
            pair_overrides: HashMap::new(),
            current_scenes: HashMap::new(),
            registry: Rc::new(RefCell::new(RunningRegistry::new())),
            pending: PendingSet::new(),
            frame_queue: FrameQueue::new(),
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Replace the default transition. `None` makes unresolved scene
    /// changes apply without animation.
    pub fn set_default_transition(&mut self, transition: Option<TransitionHandle>) {
        self.default_transition = transition;
    }

    /// The current default transition template.
    pub fn default_transition(&self) -> Option<TransitionHandle> {
        self.default_transition.clone()
    }

    /// Set the transition used when entering `scene`, regardless of which
    /// scene the root is currently in. `None` clears the override.
    pub fn set_scene_transition(
        &mut self,
        scene: &SceneHandle,
        transition: Option<TransitionHandle>,
    ) {
        match transition {
            Some(t) => {
                self.scene_overrides.insert(scene.id(), t);
            }
            None => {
                self.scene_overrides.remove(&scene.id());
            }
        }
    }

    /// Set the transition used when moving from `from` to `to`. Pair
    /// overrides dominate scene-level ones and apply only while the root's
    /// current scene is known. `None` clears the override.
    pub fn set_pair_transition(
        &mut self,
        from: &SceneHandle,
        to: &SceneHandle,
        transition: Option<TransitionHandle>,
    ) {
        match transition {
            Some(t) => {
                self.pair_overrides
                    .entry(to.id())
                    .or_default()
                    .insert(from.id(), t);
            }
            None => {
                if let Some(by_from) = self.pair_overrides.get_mut(&to.id()) {
                    by_from.remove(&from.id());
                    if by_from.is_empty() {
                        self.pair_overrides.remove(&to.id());
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Scene changes
    // ------------------------------------------------------------------

    /// Change to `scene` using the transition resolved from the override
    /// maps: pair override first, then scene override, then the default.
    pub fn transition_to(&mut self, scene: &SceneHandle) -> StagehandResult<()> {
        let resolved = self.resolve_transition(scene);
        trace!(
            scene = scene.id().0,
            name = scene.name().unwrap_or(""),
            animated = resolved.is_some(),
            "transition_to"
        );
        self.change_scene(scene, resolved)
    }

    /// Change to `scene` using the default transition, bypassing the
    /// override maps entirely.
    pub fn go(&mut self, scene: &SceneHandle) -> StagehandResult<()> {
        let default = self.default_transition.clone();
        self.change_scene(scene, default)
    }

    /// Change to `scene` using exactly `transition`; `None` applies the
    /// scene without animating. The override maps are never consulted —
    /// only [`transition_to`](Self::transition_to) resolves.
    pub fn go_with(
        &mut self,
        scene: &SceneHandle,
        transition: Option<TransitionHandle>,
    ) -> StagehandResult<()> {
        self.change_scene(scene, transition)
    }

    /// Animate whatever the caller changes under `root` between this call
    /// and the next frame, using the default transition.
    ///
    /// Current property values are captured immediately; the caller then
    /// mutates the hierarchy directly, and those mutations are exactly what
    /// gets diffed at the frame boundary. Returns false when a request for
    /// `root` was already pending, in which case this call is dropped.
    pub fn begin_delayed_transition(&mut self, root: ViewId) -> StagehandResult<bool> {
        self.begin_delayed_transition_with(root, None)
    }

    /// As [`begin_delayed_transition`](Self::begin_delayed_transition) with
    /// an explicit transition; `None` selects the default.
    pub fn begin_delayed_transition_with(
        &mut self,
        root: ViewId,
        transition: Option<TransitionHandle>,
    ) -> StagehandResult<bool> {
        if self.pending.contains(root) {
            debug!(root = root.0, "delayed transition already pending; dropping request");
            return Ok(false);
        }
        self.pending.insert(root);

        let template = transition.or_else(|| self.default_transition.clone());
        let run = template.map(|t| {
            let run = t.borrow().instantiate();
            run.borrow_mut().set_target_root(root);
            run
        });

        // Capture the hierarchy as it is right now, before the caller edits.
        self.scene_change_setup(root, run.as_ref())?;

        // The change is implicit: not associated with any declared scene.
        self.current_scenes.insert(root, None);

        match run {
            Some(run) => {
                self.frame_queue.enqueue(root, run);
            }
            None => {
                // No default configured: the change is unanimated and no
                // frame task will ever clear the pending entry.
                self.pending.remove(root);
            }
        }
        Ok(true)
    }

    // ------------------------------------------------------------------
    // Frame boundary
    // ------------------------------------------------------------------

    /// Host hook: call once per render frame, immediately before drawing.
    ///
    /// Drains every deferred run queued so far, in order. For each run this
    /// clears the root's pending entry, registers the run, captures end
    /// values, resumes the runs paused during setup, and starts playback.
    /// Returns how many deferred runs were started.
    ///
    /// Every drained task executes even when an earlier one fails; roots are
    /// independent and one root's broken transition must not starve the
    /// others. The first error is reported after the batch completes.
    pub fn run_frame(&mut self) -> StagehandResult<usize> {
        let due = self.frame_queue.take_due();
        if !due.is_empty() {
            trace!(count = due.len(), "running deferred transitions");
        }
        let mut started = 0;
        let mut first_error = None;
        for task in due {
            let root = task.root();
            match self.execute_deferred(task) {
                Ok(()) => started += 1,
                Err(err) => {
                    debug!(root = root.0, error = %err, "deferred transition failed");
                    if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(started),
        }
    }

    /// Cancel any transition queued for `root` but not yet run — the
    /// teardown path for roots about to be discarded. Returns true if
    /// something was cancelled.
    pub fn cancel_pending(&mut self, root: ViewId) -> bool {
        let cancelled = self.frame_queue.cancel_root(root);
        let was_pending = self.pending.remove(root);
        if cancelled > 0 || was_pending {
            debug!(root = root.0, cancelled, "cancelled pending transition");
            return true;
        }
        false
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    /// The scene currently associated with `root`. Returns `None` both when
    /// no scene was ever applied and after an implicit change set the
    /// "no scene" sentinel.
    pub fn current_scene(&self, root: ViewId) -> Option<SceneHandle> {
        self.current_scenes.get(&root).and_then(Clone::clone)
    }

    /// Whether `root` has a deferred request waiting for the frame boundary.
    pub fn is_pending(&self, root: ViewId) -> bool {
        self.pending.contains(root)
    }

    /// Number of transition runs currently in flight for `root`.
    pub fn running_count(&self, root: ViewId) -> usize {
        self.registry.borrow().count(root)
    }

    /// Handles of the runs currently in flight for `root` (a copy).
    pub fn running_transitions(&self, root: ViewId) -> Vec<TransitionHandle> {
        self.registry.borrow().snapshot(root)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Resolution order: pair override (requires a known current scene),
    /// then scene override, then the default.
    fn resolve_transition(&self, scene: &SceneHandle) -> Option<TransitionHandle> {
        let root = scene.root();
        if let Some(current) = self.current_scene(root) {
            if let Some(by_from) = self.pair_overrides.get(&scene.id()) {
                if let Some(t) = by_from.get(&current.id()) {
                    return Some(t.clone());
                }
            }
        }
        self.scene_overrides
            .get(&scene.id())
            .cloned()
            .or_else(|| self.default_transition.clone())
    }

    /// One explicit scene change: clone and bind the template, run setup,
    /// enter the new scene, then defer capture-end + play to the next frame.
    fn change_scene(
        &mut self,
        scene: &SceneHandle,
        template: Option<TransitionHandle>,
    ) -> StagehandResult<()> {
        let root = scene.root();

        let run = template.map(|t| {
            let run = t.borrow().instantiate();
            run.borrow_mut().set_target_root(root);
            run
        });

        if let (Some(run), Some(old)) = (run.as_ref(), self.current_scene(root)) {
            if old.is_from_template() {
                // Leaving a template-built scene: the run may drop views it
                // does not recognize.
                run.borrow_mut().set_can_remove_views(true);
            }
        }

        self.scene_change_setup(root, run.as_ref())?;

        scene.enter();
        self.current_scenes.insert(root, Some(scene.clone()));

        if let Some(run) = run {
            self.frame_queue.enqueue(root, run);
        }
        Ok(())
    }

    /// Shared setup for explicit and implicit changes: pause in-flight runs
    /// on `root`, capture start values, notify the outgoing scene.
    ///
    /// Pausing rather than cancelling lets the new run capture the current
    /// mid-animation values as its start state; the paused runs are resumed
    /// at the frame boundary, right before the new run plays.
    fn scene_change_setup(
        &mut self,
        root: ViewId,
        run: Option<&TransitionHandle>,
    ) -> StagehandResult<()> {
        let paused = self.registry.borrow_mut().pause_all(root);
        if paused > 0 {
            trace!(root = root.0, paused, "paused in-flight transitions");
        }

        if let Some(run) = run {
            run.borrow_mut()
                .capture_values(root, true)
                .map_err(StagehandError::CaptureStart)?;
        }

        if let Some(previous) = self.current_scene(root) {
            previous.exit();
        }
        Ok(())
    }

    /// One deferred run at the frame boundary, strictly ordered: clear the
    /// pending entry, snapshot previously running transitions, register the
    /// run, hook its end event, capture end values, resume the snapshot,
    /// play.
    fn execute_deferred(&mut self, task: FrameTask) -> StagehandResult<()> {
        let FrameTask {
            root, transition: run, ..
        } = task;

        self.pending.remove(root);

        let previously_running = self.registry.borrow().snapshot(root);
        self.registry.borrow_mut().insert(root, run.clone());

        // Self-removal on the end event; identity by handle pointer. Weak
        // captures keep a straggling listener from outliving the manager.
        let registry = Rc::downgrade(&self.registry);
        let instance = Rc::downgrade(&run);
        run.borrow_mut().add_end_listener(Box::new(move || {
            if let (Some(registry), Some(instance)) = (registry.upgrade(), instance.upgrade()) {
                registry.borrow_mut().remove(root, &instance);
            }
        }));

        if let Err(err) = run.borrow_mut().capture_values(root, false) {
            // A run that never plays has no end event; unregister it here or
            // it would pin the registry entry forever.
            self.registry.borrow_mut().remove(root, &run);
            return Err(StagehandError::CaptureEnd(err));
        }

        // Resume before starting playback so the clocks line up.
        for paused in &previously_running {
            paused.borrow_mut().resume();
        }

        if let Err(err) = run.borrow_mut().play(root) {
            self.registry.borrow_mut().remove(root, &run);
            return Err(StagehandError::Playback(err));
        }

        trace!(
            root = root.0,
            resumed = previously_running.len(),
            "deferred transition started"
        );
        Ok(())
    }
}

impl Default for TransitionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use crate::transition::Transition;

    fn template(name: &str) -> TransitionHandle {
        AutoTransition::named(name).into_handle()
    }

    fn scene(root: ViewId, name: &str) -> SceneHandle {
        Scene::new(root).with_name(name).into_handle()
    }

    #[test]
    fn test_resolution_falls_back_to_default() {
        let root = ViewId::new();
        let manager = TransitionManager::new();
        let b = scene(root, "b");

        let resolved = manager.resolve_transition(&b).unwrap();
        let default = manager.default_transition().unwrap();
        assert!(Rc::ptr_eq(&resolved, &default));
    }

    #[test]
    fn test_resolution_precedence_pair_over_scene() {
        let root = ViewId::new();
        let mut manager = TransitionManager::new();
        let a = scene(root, "a");
        let b = scene(root, "b");

        let pair = template("pair");
        let scene_level = template("scene");
        manager.set_pair_transition(&a, &b, Some(pair.clone()));
        manager.set_scene_transition(&b, Some(scene_level.clone()));

        // No current scene: pair overrides never apply.
        let resolved = manager.resolve_transition(&b).unwrap();
        assert!(Rc::ptr_eq(&resolved, &scene_level));

        // Known current scene a: the pair override dominates.
        manager.go_with(&a, None).unwrap();
        let resolved = manager.resolve_transition(&b).unwrap();
        assert!(Rc::ptr_eq(&resolved, &pair));
    }

    #[test]
    fn test_pair_override_skipped_after_implicit_change() {
        let root = ViewId::new();
        let mut manager = TransitionManager::new();
        let a = scene(root, "a");
        let b = scene(root, "b");

        let pair = template("pair");
        manager.set_pair_transition(&a, &b, Some(pair.clone()));
        manager.go_with(&a, None).unwrap();

        // The implicit change resets the association to the sentinel.
        manager.begin_delayed_transition(root).unwrap();
        assert!(manager.current_scene(root).is_none());

        let resolved = manager.resolve_transition(&b).unwrap();
        assert!(!Rc::ptr_eq(&resolved, &pair));
    }

    #[test]
    fn test_clearing_overrides() {
        let root = ViewId::new();
        let mut manager = TransitionManager::new();
        let a = scene(root, "a");
        let b = scene(root, "b");

        manager.set_scene_transition(&b, Some(template("scene")));
        manager.set_pair_transition(&a, &b, Some(template("pair")));
        manager.set_scene_transition(&b, None);
        manager.set_pair_transition(&a, &b, None);

        manager.go_with(&a, None).unwrap();
        let resolved = manager.resolve_transition(&b).unwrap();
        let default = manager.default_transition().unwrap();
        assert!(Rc::ptr_eq(&resolved, &default));
    }

    #[test]
    fn test_unanimated_change_updates_current_scene_only() {
        let root = ViewId::new();
        let mut manager = TransitionManager::new();
        let a = scene(root, "a");

        manager.go_with(&a, None).unwrap();
        assert_eq!(
            manager.current_scene(root).unwrap().id(),
            a.id()
        );
        assert_eq!(manager.run_frame().unwrap(), 0);
        assert_eq!(manager.running_count(root), 0);
    }

    #[test]
    fn test_delayed_request_coalesces() {
        let root = ViewId::new();
        let mut manager = TransitionManager::new();

        assert!(manager.begin_delayed_transition(root).unwrap());
        assert!(!manager.begin_delayed_transition(root).unwrap());
        assert!(manager.is_pending(root));

        assert_eq!(manager.run_frame().unwrap(), 1);
        assert!(!manager.is_pending(root));

        // After the frame boundary the root can be requested again.
        assert!(manager.begin_delayed_transition(root).unwrap());
    }

    #[test]
    fn test_delayed_without_default_is_released_immediately() {
        let root = ViewId::new();
        let mut manager = TransitionManager::with_default_transition(None);

        assert!(manager.begin_delayed_transition(root).unwrap());
        assert!(!manager.is_pending(root));
        assert_eq!(manager.run_frame().unwrap(), 0);
    }

    #[test]
    fn test_cancel_pending_drops_the_deferred_run() {
        let root = ViewId::new();
        let mut manager = TransitionManager::new();

        manager.begin_delayed_transition(root).unwrap();
        assert!(manager.cancel_pending(root));
        assert!(!manager.cancel_pending(root));
        assert!(!manager.is_pending(root));
        assert_eq!(manager.run_frame().unwrap(), 0);
        assert_eq!(manager.running_count(root), 0);
    }

    #[test]
    fn test_run_registered_at_frame_boundary_and_retired_on_end() {
        let root = ViewId::new();
        let mut manager = TransitionManager::new();
        let a = scene(root, "a");

        // Install a concrete default so the run can be finished explicitly.
        let instances: Rc<RefCell<Vec<Rc<RefCell<AutoTransition>>>>> =
            Rc::new(RefCell::new(Vec::new()));
        struct Spawning {
            instances: Rc<RefCell<Vec<Rc<RefCell<AutoTransition>>>>>,
        }
        impl Transition for Spawning {
            fn instantiate(&self) -> TransitionHandle {
                let run = Rc::new(RefCell::new(AutoTransition::new()));
                self.instances.borrow_mut().push(run.clone());
                run
            }
            fn set_target_root(&mut self, _root: ViewId) {}
            fn set_can_remove_views(&mut self, _allowed: bool) {}
            fn capture_values(&mut self, _root: ViewId, _start: bool) -> anyhow::Result<()> {
                Ok(())
            }
            fn play(&mut self, _root: ViewId) -> anyhow::Result<()> {
                Ok(())
            }
            fn pause(&mut self) {}
            fn resume(&mut self) {}
            fn add_end_listener(&mut self, _listener: crate::transition::EndListener) {}
        }
        manager.set_default_transition(Some(Rc::new(RefCell::new(Spawning {
            instances: instances.clone(),
        }))));

        manager.transition_to(&a).unwrap();
        // Before the frame boundary nothing is registered.
        assert_eq!(manager.running_count(root), 0);

        manager.run_frame().unwrap();
        assert_eq!(manager.running_count(root), 1);

        // The end event retires the run from the registry.
        instances.borrow()[0].borrow_mut().finish();
        assert_eq!(manager.running_count(root), 0);
    }
}
