use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const ROOT_ID: &str = "root";

/// Node ids are opaque strings; the root is always [`ROOT_ID`].
pub type NodeId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub label: String,
    /// Key in the backing store. `None` only for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub is_folder: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn root(label: impl Into<String>) -> Self {
        Self {
            id: ROOT_ID.to_string(),
            label: label.into(),
            path: None,
            is_folder: true,
            children: Vec::new(),
        }
    }

    pub fn file(id: impl Into<NodeId>, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            path: Some(path.into()),
            is_folder: false,
            children: Vec::new(),
        }
    }

    pub fn folder(id: impl Into<NodeId>, label: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            path: Some(path.into()),
            is_folder: true,
            children: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }
}

/// A notebook hierarchy keyed by node id.
///
/// Trees are built once and then shared behind an `Arc`; a refresh replaces
/// the whole value instead of patching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TreeWire")]
pub struct Tree {
    nodes: HashMap<NodeId, TreeNode>,
}

/// Deserialization shape. A payload without a root still yields a usable
/// tree; `validate` reports whatever else is wrong with it.
#[derive(Deserialize)]
struct TreeWire {
    nodes: HashMap<NodeId, TreeNode>,
}

impl From<TreeWire> for Tree {
    fn from(wire: TreeWire) -> Self {
        let mut nodes = wire.nodes;
        nodes
            .entry(ROOT_ID.to_string())
            .or_insert_with(|| TreeNode::root(""));
        Self { nodes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeDefect {
    MissingRoot,
    RootHasPath,
    DanglingChild { parent: NodeId, child: NodeId },
    ChildOfLeaf { parent: NodeId },
    MultipleParents(NodeId),
    Unreachable(NodeId),
}

impl Default for Tree {
    fn default() -> Self {
        Self::new(TreeNode::root(""))
    }
}

impl Tree {
    pub fn new(root: TreeNode) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(ROOT_ID.to_string(), TreeNode { id: ROOT_ID.to_string(), ..root });
        Self { nodes }
    }

    /// Insert `node` under `parent`, appending to the parent's child list.
    /// Returns false if the parent is missing, not a folder, or the id is taken.
    pub fn insert(&mut self, parent: &str, node: TreeNode) -> bool {
        if node.is_root() || self.nodes.contains_key(&node.id) {
            return false;
        }
        match self.nodes.get_mut(parent) {
            Some(p) if p.is_folder => p.children.push(node.id.clone()),
            _ => return false,
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    pub fn root(&self) -> &TreeNode {
        // `new` always inserts the root and nothing removes it.
        &self.nodes[ROOT_ID]
    }

    pub fn get(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the tree holds nothing but its root.
    pub fn is_empty(&self) -> bool {
        self.root().children.is_empty()
    }

    pub fn children(&self, id: &str) -> impl Iterator<Item = &TreeNode> {
        self.nodes
            .get(id)
            .into_iter()
            .flat_map(|n| n.children.iter())
            .filter_map(|c| self.nodes.get(c))
    }

    /// Every id except the root, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys().filter(|id| id.as_str() != ROOT_ID)
    }

    /// Non-root nodes in depth-first order starting at the root.
    pub fn flatten(&self) -> Vec<&TreeNode> {
        let mut out = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        let mut stack: Vec<&NodeId> = self.root().children.iter().rev().collect();
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else { continue };
            if !seen.insert(id) {
                continue;
            }
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    pub fn find_by_path(&self, path: &str) -> Option<&TreeNode> {
        self.nodes.values().find(|n| n.path.as_deref() == Some(path))
    }

    pub fn parent_of(&self, id: &str) -> Option<&TreeNode> {
        self.nodes.values().find(|n| n.children.iter().any(|c| c == id))
    }

    /// Case-sensitive label lookup among the direct children of `parent`.
    pub fn child_named(&self, parent: &str, label: &str) -> Option<&TreeNode> {
        self.children(parent).find(|c| c.label == label)
    }

    /// Check the structural invariants: a path-less root, no dangling or
    /// shared children, no children under files, everything reachable.
    pub fn validate(&self) -> Result<(), TreeDefect> {
        let Some(root) = self.nodes.get(ROOT_ID) else {
            return Err(TreeDefect::MissingRoot);
        };
        if root.path.is_some() {
            return Err(TreeDefect::RootHasPath);
        }

        let mut parent_seen: HashSet<&str> = HashSet::new();
        for node in self.nodes.values() {
            if !node.is_folder && !node.children.is_empty() {
                return Err(TreeDefect::ChildOfLeaf { parent: node.id.clone() });
            }
            for child in &node.children {
                if !self.nodes.contains_key(child) || child == ROOT_ID {
                    return Err(TreeDefect::DanglingChild {
                        parent: node.id.clone(),
                        child: child.clone(),
                    });
                }
                if !parent_seen.insert(child.as_str()) {
                    return Err(TreeDefect::MultipleParents(child.clone()));
                }
            }
        }

        // With a single parent per node, anything unreachable sits on a cycle
        // or hangs off one.
        let reachable = self.flatten();
        if reachable.len() + 1 != self.nodes.len() {
            let seen: HashSet<&str> = reachable.into_iter().map(|n| n.id.as_str()).collect();
            let orphan = self
                .ids()
                .find(|id| !seen.contains(id.as_str()))
                .cloned()
                .unwrap_or_default();
            return Err(TreeDefect::Unreachable(orphan));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// root ─ Math/ ─ notes.md
    ///      └ todo.md
    pub(crate) fn sample() -> Tree {
        let mut tree = Tree::new(TreeNode::root("Notebooks"));
        tree.insert(ROOT_ID, TreeNode::folder("math", "Math", "/Math"));
        tree.insert("math", TreeNode::file("notes", "notes.md", "/Math/notes.md"));
        tree.insert(ROOT_ID, TreeNode::file("todo", "todo.md", "/todo.md"));
        tree
    }

    #[test]
    fn flatten_is_depth_first() {
        let tree = sample();
        let labels: Vec<_> = tree.flatten().iter().map(|n| n.label.as_str()).collect();
        assert_eq!(labels, vec!["Math", "notes.md", "todo.md"]);
    }

    #[test]
    fn insert_rejects_leaf_parent_and_duplicates() {
        let mut tree = sample();
        assert!(!tree.insert("todo", TreeNode::file("x", "x", "/todo.md/x")));
        assert!(!tree.insert(ROOT_ID, TreeNode::file("todo", "again", "/again")));
        assert!(!tree.insert("missing", TreeNode::file("y", "y", "/y")));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn child_named_is_case_sensitive() {
        let tree = sample();
        assert!(tree.child_named("math", "notes.md").is_some());
        assert!(tree.child_named("math", "Notes.md").is_none());
        assert_eq!(tree.parent_of("notes").map(|n| n.id.as_str()), Some("math"));
    }

    #[test]
    fn validate_catches_cycles_and_shared_children() {
        let mut nodes = sample().nodes;
        nodes.get_mut("math").unwrap().children.push("todo".into());
        let shared = Tree { nodes };
        assert_eq!(shared.validate(), Err(TreeDefect::MultipleParents("todo".into())));

        let mut nodes = HashMap::new();
        nodes.insert(ROOT_ID.to_string(), TreeNode::root(""));
        let mut a = TreeNode::folder("a", "a", "/a");
        a.children.push("b".into());
        let mut b = TreeNode::folder("b", "b", "/b");
        b.children.push("a".into());
        nodes.insert("a".into(), a);
        nodes.insert("b".into(), b);
        let cyclic = Tree { nodes };
        assert!(matches!(cyclic.validate(), Err(TreeDefect::Unreachable(_))));
    }

    #[test]
    fn serializes_through_json() {
        let tree = sample();
        let json = serde_json::to_string(&tree).unwrap();
        let back: Tree = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tree);
        assert!(back.root().path.is_none());
    }
}
