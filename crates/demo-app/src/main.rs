//! Console walkthrough of scene orchestration against a fake view tree.
//!
//! The "host UI" here is a `HashMap<ViewId, Vec<String>>` of child labels per
//! root. A console transition captures the child list before and after each
//! scene change and prints the diff when it plays, completing instantly.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use anyhow::Result;
use stagehand::{
    EndListener, EndListeners, Scene, Transition, TransitionHandle, TransitionManager, ViewId,
};
use tracing::info;

type ViewTree = Rc<RefCell<HashMap<ViewId, Vec<String>>>>;

/// Instant-completion transition that prints which children appeared and
/// disappeared between its two captures.
struct ConsoleFade {
    tree: ViewTree,
    start: Vec<String>,
    end: Vec<String>,
    end_listeners: EndListeners,
}

impl ConsoleFade {
    fn template(tree: &ViewTree) -> TransitionHandle {
        Rc::new(RefCell::new(ConsoleFade {
            tree: tree.clone(),
            start: Vec::new(),
            end: Vec::new(),
            end_listeners: EndListeners::new(),
        }))
    }
}

impl Transition for ConsoleFade {
    fn name(&self) -> &str {
        "console_fade"
    }

    fn instantiate(&self) -> TransitionHandle {
        ConsoleFade::template(&self.tree)
    }

    fn set_target_root(&mut self, _root: ViewId) {}

    fn set_can_remove_views(&mut self, _allowed: bool) {}

    fn capture_values(&mut self, root: ViewId, start: bool) -> Result<()> {
        let snapshot = self.tree.borrow().get(&root).cloned().unwrap_or_default();
        if start {
            self.start = snapshot;
        } else {
            self.end = snapshot;
        }
        Ok(())
    }

    fn play(&mut self, root: ViewId) -> Result<()> {
        for gone in self.start.iter().filter(|c| !self.end.contains(c)) {
            println!("  [{}] fade out: {gone}", root.0);
        }
        for new in self.end.iter().filter(|c| !self.start.contains(c)) {
            println!("  [{}] fade in:  {new}", root.0);
        }
        // Console frames are instantaneous, so the run ends right away.
        self.end_listeners.fire();
        Ok(())
    }

    fn pause(&mut self) {
        println!("  (pausing an in-flight fade)");
    }

    fn resume(&mut self) {
        println!("  (resuming the paused fade)");
    }

    fn add_end_listener(&mut self, listener: EndListener) {
        self.end_listeners.push(listener);
    }
}

/// A scene whose enter action swaps the root's children wholesale.
fn layout_scene(root: ViewId, name: &'static str, children: &[&str], tree: &ViewTree) -> Rc<Scene> {
    let children: Vec<String> = children.iter().map(|c| c.to_string()).collect();
    let tree = tree.clone();
    Scene::new(root)
        .with_name(name)
        .with_enter_action(move || {
            tree.borrow_mut().insert(root, children.clone());
        })
        .into_handle()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let tree: ViewTree = Rc::new(RefCell::new(HashMap::new()));
    let root = ViewId::new();
    tree.borrow_mut()
        .insert(root, vec!["splash".to_string()]);

    let mut manager = TransitionManager::with_default_transition(Some(ConsoleFade::template(&tree)));

    let list = layout_scene(root, "list", &["toolbar", "item_a", "item_b"], &tree);
    let detail = layout_scene(root, "detail", &["toolbar", "hero", "body"], &tree);

    // list -> detail gets its own transition; everything else uses the default.
    manager.set_pair_transition(&list, &detail, Some(ConsoleFade::template(&tree)));

    info!("explicit change to the list scene");
    manager.transition_to(&list)?;
    manager.run_frame()?;

    info!("explicit change to the detail scene (pair override applies)");
    manager.transition_to(&detail)?;
    manager.run_frame()?;

    info!("delayed change: edit the tree directly, diffed at the frame");
    manager.begin_delayed_transition(root)?;
    if let Some(children) = tree.borrow_mut().get_mut(&root) {
        children.retain(|c| c != "body");
        children.push("comments".to_string());
    }
    // A second request before the frame coalesces into the first.
    let accepted = manager.begin_delayed_transition(root)?;
    info!(accepted, "second delayed request");
    manager.run_frame()?;

    info!("back to the list scene");
    manager.transition_to(&list)?;
    manager.run_frame()?;

    info!(running = manager.running_count(root), "all runs completed");
    Ok(())
}
