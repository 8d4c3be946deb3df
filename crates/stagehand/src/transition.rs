//! The transition collaborator contract and the built-in default.
//!
//! A transition is an animatable change owned by the host's animation
//! engine. Templates are long-lived and reusable; every orchestration run
//! calls [`Transition::instantiate`] to obtain an independent instance so
//! concurrent runs never share mutable state. The orchestrator drives each
//! instance through capture-start → capture-end → play, pausing and resuming
//! it around competing runs on the same root, and observes its end event to
//! retire it from the running registry.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use anyhow::Result;

use crate::types::{RunState, ViewId};

/// Shared handle to a transition template or run instance.
pub type TransitionHandle = Rc<RefCell<dyn Transition>>;

/// One-shot callback fired when a transition run ends.
pub type EndListener = Box<dyn FnOnce()>;

/// An animatable change over a root container's subtree.
///
/// What gets sampled and animated (position, size, opacity, …) is entirely
/// the implementation's business; the engine only sequences the calls below.
pub trait Transition {
    /// Short name used in logging.
    fn name(&self) -> &str {
        "transition"
    }

    /// Clone this template into an independent run instance.
    ///
    /// The instance is used for exactly one orchestration run and becomes
    /// eligible for release once its end event has fired.
    fn instantiate(&self) -> TransitionHandle;

    /// Bind the run to the root container it will play on.
    fn set_target_root(&mut self, root: ViewId);

    /// Permit the run to remove views it does not recognize.
    ///
    /// Granted only when transitioning away from a template-built scene;
    /// the conservative default preserves unmatched views.
    fn set_can_remove_views(&mut self, allowed: bool);

    /// Scan the root's subtree and record property values.
    ///
    /// `start` is true for the pre-change capture and false for the
    /// post-change capture at the frame boundary.
    fn capture_values(&mut self, root: ViewId, start: bool) -> Result<()>;

    /// Begin playback against the captured value pair.
    fn play(&mut self, root: ViewId) -> Result<()>;

    /// Stop the animation clock, retaining all run state.
    fn pause(&mut self);

    /// Restart the clock of a paused run.
    fn resume(&mut self);

    /// Register a one-shot listener fired when the run ends.
    fn add_end_listener(&mut self, listener: EndListener);
}

/// One-shot end-listener list for [`Transition`] implementations to embed.
///
/// Firing is idempotent; a listener registered after the end event has
/// already fired runs immediately.
#[derive(Default)]
pub struct EndListeners {
    listeners: Vec<EndListener>,
    fired: bool,
}

impl EndListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener, or run it now if the end event already fired.
    pub fn push(&mut self, listener: EndListener) {
        if self.fired {
            listener();
        } else {
            self.listeners.push(listener);
        }
    }

    /// Fire all registered listeners. Subsequent calls are no-ops.
    pub fn fire(&mut self) {
        if self.fired {
            return;
        }
        self.fired = true;
        for listener in self.listeners.drain(..) {
            listener();
        }
    }

    /// Whether the end event has fired.
    pub fn has_fired(&self) -> bool {
        self.fired
    }
}

impl fmt::Debug for EndListeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndListeners")
            .field("pending", &self.listeners.len())
            .field("fired", &self.fired)
            .finish()
    }
}

/// The built-in default transition template.
///
/// `AutoTransition` sequences correctly but animates nothing: it records the
/// captures and state changes the orchestrator drives it through and leaves
/// actual property sampling to host implementations. It serves as the
/// process default required when no override is configured, and as a
/// deterministic stand-in under test. The host signals completion of a run
/// with [`AutoTransition::finish`].
pub struct AutoTransition {
    name: String,
    state: RunState,
    paused_from: Option<RunState>,
    target_root: Option<ViewId>,
    can_remove_views: bool,
    captured_start: bool,
    captured_end: bool,
    end_listeners: EndListeners,
}

impl AutoTransition {
    pub fn new() -> Self {
        Self::named("auto")
    }

    /// Create a template with a custom logging name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: RunState::Created,
            paused_from: None,
            target_root: None,
            can_remove_views: false,
            captured_start: false,
            captured_end: false,
            end_listeners: EndListeners::new(),
        }
    }

    /// Wrap into a shareable handle.
    pub fn into_handle(self) -> TransitionHandle {
        Rc::new(RefCell::new(self))
    }

    /// Template handle with the default name.
    pub fn template() -> TransitionHandle {
        Self::new().into_handle()
    }

    /// Current run lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The root this run was bound to, if any.
    pub fn target_root(&self) -> Option<ViewId> {
        self.target_root
    }

    /// Whether this run may remove unmatched views.
    pub fn can_remove_views(&self) -> bool {
        self.can_remove_views
    }

    /// Whether the pre-change capture has happened.
    pub fn captured_start(&self) -> bool {
        self.captured_start
    }

    /// Whether the post-change capture has happened.
    pub fn captured_end(&self) -> bool {
        self.captured_end
    }

    /// Mark the run complete and fire its end listeners.
    pub fn finish(&mut self) {
        self.state = RunState::Finished;
        self.end_listeners.fire();
    }
}

impl Default for AutoTransition {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AutoTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoTransition")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("target_root", &self.target_root)
            .field("can_remove_views", &self.can_remove_views)
            .field("captured_start", &self.captured_start)
            .field("captured_end", &self.captured_end)
            .finish_non_exhaustive()
    }
}

impl Transition for AutoTransition {
    fn name(&self) -> &str {
        &self.name
    }

    fn instantiate(&self) -> TransitionHandle {
        Self::named(self.name.clone()).into_handle()
    }

    fn set_target_root(&mut self, root: ViewId) {
        self.target_root = Some(root);
    }

    fn set_can_remove_views(&mut self, allowed: bool) {
        self.can_remove_views = allowed;
    }

    fn capture_values(&mut self, _root: ViewId, start: bool) -> Result<()> {
        if start {
            self.captured_start = true;
            self.state = RunState::Armed;
        } else {
            self.captured_end = true;
        }
        Ok(())
    }

    fn play(&mut self, _root: ViewId) -> Result<()> {
        self.state = RunState::Running;
        Ok(())
    }

    fn pause(&mut self) {
        if matches!(self.state, RunState::Armed | RunState::Running) {
            self.paused_from = Some(self.state);
            self.state = RunState::Paused;
        }
    }

    fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.state = self.paused_from.take().unwrap_or(RunState::Running);
        }
    }

    fn add_end_listener(&mut self, listener: EndListener) {
        self.end_listeners.push(listener);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_instantiate_is_independent_of_template() {
        let template = AutoTransition::named("fade");
        let run = template.instantiate();

        run.borrow_mut().set_target_root(ViewId::new());
        run.borrow_mut().capture_values(ViewId::new(), true).unwrap();

        // The template saw none of it.
        assert_eq!(template.state(), RunState::Created);
        assert_eq!(template.target_root(), None);
        assert_eq!(run.borrow().name(), "fade");
    }

    #[test]
    fn test_capture_and_play_advance_state() {
        let root = ViewId::new();
        let mut run = AutoTransition::new();

        run.capture_values(root, true).unwrap();
        assert_eq!(run.state(), RunState::Armed);
        assert!(run.captured_start());
        assert!(!run.captured_end());

        run.capture_values(root, false).unwrap();
        assert!(run.captured_end());

        run.play(root).unwrap();
        assert_eq!(run.state(), RunState::Running);
    }

    #[test]
    fn test_pause_resume_restores_prior_state() {
        let root = ViewId::new();
        let mut run = AutoTransition::new();
        run.capture_values(root, true).unwrap();

        // Paused before playback resumes to Armed.
        run.pause();
        assert_eq!(run.state(), RunState::Paused);
        run.resume();
        assert_eq!(run.state(), RunState::Armed);

        // Paused mid-playback resumes to Running.
        run.play(root).unwrap();
        run.pause();
        run.resume();
        assert_eq!(run.state(), RunState::Running);

        // Resuming a non-paused run is a no-op.
        run.resume();
        assert_eq!(run.state(), RunState::Running);
    }

    #[test]
    fn test_finish_fires_listeners_exactly_once() {
        let fired = Rc::new(Cell::new(0));
        let mut run = AutoTransition::new();

        let f = fired.clone();
        run.add_end_listener(Box::new(move || f.set(f.get() + 1)));

        run.finish();
        run.finish();
        assert_eq!(fired.get(), 1);
        assert_eq!(run.state(), RunState::Finished);
    }

    #[test]
    fn test_listener_added_after_end_runs_immediately() {
        let fired = Rc::new(Cell::new(false));
        let mut run = AutoTransition::new();
        run.finish();

        let f = fired.clone();
        run.add_end_listener(Box::new(move || f.set(true)));
        assert!(fired.get());
    }
}
