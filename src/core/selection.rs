use std::collections::HashSet;

use tokio::sync::watch;

use super::tree::{NodeId, ROOT_ID, Tree};

/// What focusing a node should do, decided by [`SelectionController::focus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusEffect {
    /// Selection mode was active and the node's membership flipped.
    Toggled { id: NodeId, selected: bool },
    /// A file was focused outside selection mode; its content should be loaded.
    OpenFile { path: String },
    /// A folder was focused outside selection mode and is now the target
    /// for new files and folders.
    TargetDirectory(NodeId),
    Ignored,
}

/// Multi-select state for bulk operations, kept apart from focus.
///
/// The selected set is published on a `watch` channel so a view can redraw
/// whenever it changes.
pub struct SelectionController {
    selected: watch::Sender<HashSet<NodeId>>,
    focused: Option<NodeId>,
    target_dir: NodeId,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController {
    pub fn new() -> Self {
        let (selected, _) = watch::channel(HashSet::new());
        Self {
            selected,
            focused: None,
            target_dir: ROOT_ID.to_string(),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<HashSet<NodeId>> {
        self.selected.subscribe()
    }

    /// Flip membership of `id`. Returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if id == ROOT_ID {
            return false;
        }
        let mut now_selected = false;
        self.selected.send_modify(|set| {
            if !set.remove(id) {
                set.insert(id.to_string());
                now_selected = true;
            }
        });
        now_selected
    }

    /// Replace the selection with exactly `ids` (the root is dropped).
    pub fn select_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        let set: HashSet<NodeId> = ids
            .into_iter()
            .map(Into::into)
            .filter(|id: &NodeId| id != ROOT_ID)
            .collect();
        self.selected.send_replace(set);
    }

    pub fn clear(&mut self) {
        self.selected.send_if_modified(|set| {
            let changed = !set.is_empty();
            set.clear();
            changed
        });
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.borrow().contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.borrow().is_empty()
    }

    pub fn selected(&self) -> HashSet<NodeId> {
        self.selected.borrow().clone()
    }

    /// Store paths of the selected nodes, in tree order. Ids without a path
    /// (or missing from `tree`) are skipped.
    pub fn selected_paths(&self, tree: &Tree) -> Vec<String> {
        let set = self.selected.borrow();
        tree.flatten()
            .into_iter()
            .filter(|n| set.contains(&n.id))
            .filter_map(|n| n.path.clone())
            .collect()
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn target_dir(&self) -> &str {
        &self.target_dir
    }

    /// Focus `id`. In selection mode this toggles the node instead; outside
    /// it, a file asks to be opened and a folder becomes the target directory.
    pub fn focus(&mut self, tree: &Tree, id: &str, selection_mode: bool) -> FocusEffect {
        let Some(node) = tree.get(id) else {
            return FocusEffect::Ignored;
        };

        if selection_mode {
            if node.is_root() {
                return FocusEffect::Ignored;
            }
            let selected = self.toggle(id);
            return FocusEffect::Toggled {
                id: id.to_string(),
                selected,
            };
        }

        self.focused = Some(id.to_string());
        if node.is_folder {
            self.target_dir = id.to_string();
            FocusEffect::TargetDirectory(id.to_string())
        } else {
            match &node.path {
                Some(path) => FocusEffect::OpenFile { path: path.clone() },
                None => FocusEffect::Ignored,
            }
        }
    }

    /// Clicking empty space drops focus and sends new items to the root.
    pub fn blur(&mut self) {
        self.focused = None;
        self.target_dir = ROOT_ID.to_string();
    }

    /// Bring the controller in line with a freshly loaded tree: a selection
    /// referencing a vanished id is reset, as are a stale focus and target.
    pub fn retain_valid(&mut self, tree: &Tree) {
        let stale = self.selected.borrow().iter().any(|id| !tree.contains(id));
        if stale {
            log::debug!("selection reset: tree no longer holds every selected id");
            self.clear();
        }
        if self.focused.as_deref().is_some_and(|id| !tree.contains(id)) {
            self.focused = None;
        }
        if !tree.contains(&self.target_dir) {
            self.target_dir = ROOT_ID.to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::tests::sample;
    use crate::core::tree::TreeNode;

    #[test]
    fn root_is_never_selected() {
        let mut sel = SelectionController::new();
        assert!(!sel.toggle(ROOT_ID));
        sel.select_all(["root", "notes", "todo"]);
        assert!(!sel.is_selected(ROOT_ID));
        assert_eq!(sel.len(), 2);
        sel.toggle("notes");
        sel.toggle(ROOT_ID);
        assert!(!sel.is_selected(ROOT_ID));
        assert_eq!(sel.selected(), HashSet::from(["todo".to_string()]));
    }

    #[test]
    fn select_all_replaces_membership() {
        let mut sel = SelectionController::new();
        sel.toggle("a");
        sel.select_all(["b"]);
        assert!(!sel.is_selected("a"));
        assert!(sel.is_selected("b"));
        sel.clear();
        assert!(sel.is_empty());
    }

    #[test]
    fn focus_outside_selection_mode_opens_or_targets() {
        let tree = sample();
        let mut sel = SelectionController::new();

        assert_eq!(
            sel.focus(&tree, "notes", false),
            FocusEffect::OpenFile { path: "/Math/notes.md".into() }
        );
        assert!(sel.is_empty());
        assert_eq!(sel.focused(), Some("notes"));

        assert_eq!(sel.focus(&tree, "math", false), FocusEffect::TargetDirectory("math".into()));
        assert_eq!(sel.target_dir(), "math");
    }

    #[test]
    fn focus_in_selection_mode_toggles_without_moving_focus() {
        let tree = sample();
        let mut sel = SelectionController::new();
        assert_eq!(
            sel.focus(&tree, "todo", true),
            FocusEffect::Toggled { id: "todo".into(), selected: true }
        );
        assert_eq!(sel.focused(), None);
        assert_eq!(sel.focus(&tree, ROOT_ID, true), FocusEffect::Ignored);
        assert!(!sel.is_selected(ROOT_ID));
    }

    #[test]
    fn stale_selection_is_reset_on_new_tree() {
        let tree = sample();
        let mut sel = SelectionController::new();
        sel.focus(&tree, "math", false);
        sel.select_all(["notes", "todo"]);

        let mut next = Tree::new(TreeNode::root("Notebooks"));
        next.insert(ROOT_ID, TreeNode::file("todo", "todo.md", "/todo.md"));
        sel.retain_valid(&next);

        assert!(sel.is_empty());
        assert_eq!(sel.target_dir(), ROOT_ID);
        assert_eq!(sel.focused(), None);
    }

    #[test]
    fn selected_paths_follow_tree_order() {
        let tree = sample();
        let mut sel = SelectionController::new();
        sel.select_all(["todo", "notes"]);
        assert_eq!(sel.selected_paths(&tree), vec!["/Math/notes.md", "/todo.md"]);
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let mut sel = SelectionController::new();
        let mut rx = sel.subscribe();
        sel.toggle("notes");
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().contains("notes"));
    }
}
