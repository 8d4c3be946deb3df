//! Scene descriptors: what a root container should contain.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::types::{SceneId, ViewId};

/// Shared handle to a scene descriptor.
pub type SceneHandle = Rc<Scene>;

/// Side-effecting action run when a scene is entered or exited.
///
/// `FnMut` rather than `FnOnce`: a scene may be entered any number of times.
pub type SceneAction = Box<dyn FnMut()>;

/// A declarative description of what a root container should contain.
///
/// A scene is read-only once built. [`Scene::enter`] applies the target
/// arrangement — the host closure performs the actual structural mutation of
/// its view tree — and [`Scene::exit`] lets the departing arrangement tear
/// down. Scenes built from a static template ([`Scene::with_template_origin`])
/// additionally permit transitions leaving them to remove views they do not
/// recognize.
///
/// The current-scene association for a root lives on
/// [`TransitionManager`](crate::manager::TransitionManager) and is mutated
/// only by the orchestrator: on enter, or set to the "no scene" sentinel
/// before an implicit change.
pub struct Scene {
    id: SceneId,
    root: ViewId,
    name: Option<String>,
    from_template: bool,
    enter_action: RefCell<Option<SceneAction>>,
    exit_action: RefCell<Option<SceneAction>>,
}

impl Scene {
    /// Create an empty scene bound to `root`.
    pub fn new(root: ViewId) -> Self {
        Self {
            id: SceneId::new(),
            root,
            name: None,
            from_template: false,
            enter_action: RefCell::new(None),
            exit_action: RefCell::new(None),
        }
    }

    /// Attach a debug name used in logging.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the action that applies this scene's arrangement to the root.
    pub fn with_enter_action(self, action: impl FnMut() + 'static) -> Self {
        *self.enter_action.borrow_mut() = Some(Box::new(action));
        self
    }

    /// Set the action notified when the scene is exited.
    pub fn with_exit_action(self, action: impl FnMut() + 'static) -> Self {
        *self.exit_action.borrow_mut() = Some(Box::new(action));
        self
    }

    /// Mark this scene as built from a static declarative template.
    ///
    /// Transitions leaving such a scene are granted
    /// [`set_can_remove_views`](crate::transition::Transition::set_can_remove_views).
    pub fn with_template_origin(mut self, from_template: bool) -> Self {
        self.from_template = from_template;
        self
    }

    /// Wrap into a shareable handle.
    pub fn into_handle(self) -> SceneHandle {
        Rc::new(self)
    }

    /// This scene's identity.
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// The root container this scene is bound to.
    pub fn root(&self) -> ViewId {
        self.root
    }

    /// Debug name, if one was set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Whether this scene was built from a static declarative template.
    pub fn is_from_template(&self) -> bool {
        self.from_template
    }

    /// Apply the scene to its root by running the enter action.
    ///
    /// The orchestrator records the scene as current for its root right
    /// after this returns.
    pub fn enter(&self) {
        if let Some(action) = self.enter_action.borrow_mut().as_mut() {
            action();
        }
    }

    /// Notify the scene that its root is moving to a different arrangement.
    pub fn exit(&self) {
        if let Some(action) = self.exit_action.borrow_mut().as_mut() {
            action();
        }
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("root", &self.root)
            .field("name", &self.name)
            .field("from_template", &self.from_template)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_enter_and_exit_run_actions() {
        let entered = Rc::new(Cell::new(0));
        let exited = Rc::new(Cell::new(0));

        let e = entered.clone();
        let x = exited.clone();
        let scene = Scene::new(ViewId::new())
            .with_enter_action(move || e.set(e.get() + 1))
            .with_exit_action(move || x.set(x.get() + 1));

        scene.enter();
        scene.exit();
        // Scenes are re-enterable.
        scene.enter();

        assert_eq!(entered.get(), 2);
        assert_eq!(exited.get(), 1);
    }

    #[test]
    fn test_actionless_scene_is_a_no_op() {
        let scene = Scene::new(ViewId::new());
        scene.enter();
        scene.exit();
    }

    #[test]
    fn test_builder_flags() {
        let root = ViewId::new();
        let scene = Scene::new(root).with_name("detail").with_template_origin(true);

        assert_eq!(scene.root(), root);
        assert_eq!(scene.name(), Some("detail"));
        assert!(scene.is_from_template());

        let plain = Scene::new(root);
        assert!(!plain.is_from_template());
        assert_ne!(plain.id(), scene.id());
    }
}
