#![forbid(unsafe_code)]

//! The game-record tree.
//!
//! [`GameTree`] is the sole owner of every [`Node`]. Nodes live in an arena
//! addressed by [`NodeId`]; parent links are plain indices, so there are no
//! reference cycles to manage.
//!
//! # Invariants
//!
//! 1. Every live node except the root has exactly one parent, and appears in
//!    that parent's child list exactly once.
//! 2. `current` always refers to a live node.
//! 3. `len()` equals the number of nodes reachable from the root.
//! 4. `structure_revision()` changes whenever the set of live nodes or any
//!    child ordering changes.
//!
//! # Detached subtrees
//!
//! [`GameTree::remove_subtree`] unlinks a subtree from its parent but keeps
//! its nodes in the arena, so that an undone edit can be redone with the
//! same node identities via [`GameTree::reinsert_subtree`].
//!
//! # Failure Modes
//!
//! Structural misuse (removing the root, reinserting under a detached
//! parent, selecting a detached node) means the caller's bookkeeping is
//! already inconsistent. These are contract violations and panic.

use crate::geometry::Point;
use crate::node::{Annotation, Node, NodeData, NodeId, NodeKind, StoneDelta};
use std::collections::VecDeque;

/// Default board size.
pub const DEFAULT_BOARD_SIZE: u16 = 19;

/// Structural-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    NodeAdded { node: NodeId, parent: NodeId },
    SubtreeRemoved { node: NodeId, parent: NodeId },
    SubtreeRestored { node: NodeId, parent: NodeId },
    ChildrenReordered { parent: NodeId },
}

/// A subtree unlinked by [`GameTree::remove_subtree`].
///
/// Holds everything needed to put it back where it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detached {
    /// Root of the detached subtree.
    pub node: NodeId,
    /// Parent the subtree was unlinked from.
    pub parent: NodeId,
    /// Position in the parent's child list.
    pub index: usize,
}

/// Maximum number of undrained events kept; older ones are dropped.
const EVENT_QUEUE_CAP: usize = 1024;

/// Arena-backed game-record tree.
#[derive(Debug, Clone)]
pub struct GameTree {
    nodes: Vec<Node>,
    root: NodeId,
    current: NodeId,
    len: usize,
    board_size: u16,
    revision: u64,
    events: VecDeque<TreeEvent>,
}

impl Default for GameTree {
    fn default() -> Self {
        Self::new(DEFAULT_BOARD_SIZE)
    }
}

impl GameTree {
    /// Create a tree holding a single empty ROOT node.
    #[must_use]
    pub fn new(board_size: u16) -> Self {
        let root = NodeId::from_raw(0);
        Self {
            nodes: vec![Node::from_data(root, None, NodeData::new(NodeKind::Root))],
            root,
            current: root,
            len: 1,
            board_size,
            revision: 0,
            events: VecDeque::new(),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[must_use]
    pub fn current(&self) -> NodeId {
        self.current
    }

    #[must_use]
    pub fn board_size(&self) -> u16 {
        self.board_size
    }

    /// Number of nodes reachable from the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// A tree always has its root, so this is never true.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Counter bumped on every structural change.
    #[must_use]
    pub fn structure_revision(&self) -> u64 {
        self.revision
    }

    /// Look up a node, live or detached.
    ///
    /// # Panics
    ///
    /// Panics if the id was not issued by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Look up a node without panicking.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    #[must_use]
    pub fn current_node(&self) -> &Node {
        self.node(self.current)
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent()
    }

    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).children()
    }

    /// Whether `id` is reachable from the root.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        let mut at = id;
        while at != self.root {
            let Some(parent) = self.node(at).parent() else {
                return false;
            };
            if !self.node(parent).children().contains(&at) {
                return false;
            }
            at = parent;
        }
        true
    }

    /// Number of ancestors of `id` (root has depth 0).
    #[must_use]
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut at = id;
        while let Some(parent) = self.node(at).parent() {
            depth += 1;
            at = parent;
        }
        depth
    }

    /// Nodes from the root down to `id`, inclusive.
    #[must_use]
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = vec![id];
        let mut at = id;
        while let Some(parent) = self.node(at).parent() {
            path.push(parent);
            at = parent;
        }
        path.reverse();
        path
    }

    /// Whether `ancestor` lies on the path from the root to `node`
    /// (a node is its own ancestor).
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut at = Some(node);
        while let Some(id) = at {
            if id == ancestor {
                return true;
            }
            at = self.node(id).parent();
        }
        false
    }

    /// Depth-first traversal from the root, children in branch order.
    #[must_use]
    pub fn preorder(&self) -> Preorder<'_> {
        self.preorder_from(self.root)
    }

    /// Depth-first traversal of the subtree rooted at `id`.
    #[must_use]
    pub fn preorder_from(&self, id: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![id],
        }
    }

    /// Drain pending structural-change notifications.
    pub fn take_events(&mut self) -> Vec<TreeEvent> {
        self.events.drain(..).collect()
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Append a new child under `parent` and return its id.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not live.
    pub fn create_child(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        assert!(
            self.contains(parent),
            "create_child: parent {parent} is not part of the tree"
        );
        let raw = u32::try_from(self.nodes.len()).expect("node arena exceeds u32 ids");
        let id = NodeId::from_raw(raw);
        self.nodes.push(Node::from_data(id, Some(parent), data));
        self.nodes[parent.index()].children_mut().push(id);
        self.len += 1;
        tracing::debug!(target: "kifu.tree", node = %id, parent = %parent, "node added");
        self.notify(TreeEvent::NodeAdded { node: id, parent });
        id
    }

    /// Unlink the subtree rooted at `id` from its parent.
    ///
    /// The nodes stay in the arena. If `current` was inside the subtree it
    /// moves to the detached node's parent.
    ///
    /// # Panics
    ///
    /// Panics if `id` is the root or is not live.
    pub fn remove_subtree(&mut self, id: NodeId) -> Detached {
        assert!(id != self.root, "remove_subtree: the root cannot be removed");
        assert!(
            self.contains(id),
            "remove_subtree: node {id} is not part of the tree"
        );
        let parent = self
            .node(id)
            .parent()
            .expect("non-root live node has a parent");
        let siblings = self.nodes[parent.index()].children_mut();
        let index = siblings
            .iter()
            .position(|&c| c == id)
            .expect("live node is listed by its parent");
        siblings.remove(index);

        let removed = self.subtree_size(id);
        self.len -= removed;
        if self.is_ancestor(id, self.current) {
            self.current = parent;
        }
        tracing::debug!(
            target: "kifu.tree",
            node = %id,
            parent = %parent,
            removed,
            "subtree removed"
        );
        self.notify(TreeEvent::SubtreeRemoved { node: id, parent });
        Detached {
            node: id,
            parent,
            index,
        }
    }

    /// Put a previously detached subtree back under its original parent.
    ///
    /// # Panics
    ///
    /// Panics if the original parent is no longer part of the tree, or if the
    /// subtree is already attached.
    pub fn reinsert_subtree(&mut self, detached: &Detached) {
        let Detached {
            node,
            parent,
            index,
        } = *detached;
        assert!(
            self.contains(parent),
            "reinsert_subtree: parent {parent} of {node} is no longer part of the tree"
        );
        assert!(
            !self.contains(node),
            "reinsert_subtree: node {node} is already attached"
        );
        assert_eq!(
            self.node(node).parent(),
            Some(parent),
            "reinsert_subtree: {node} was not detached from {parent}"
        );
        let siblings = self.nodes[parent.index()].children_mut();
        let index = index.min(siblings.len());
        siblings.insert(index, node);

        let restored = self.subtree_size(node);
        self.len += restored;
        tracing::debug!(
            target: "kifu.tree",
            node = %node,
            parent = %parent,
            restored,
            "subtree restored"
        );
        self.notify(TreeEvent::SubtreeRestored { node, parent });
    }

    /// Move `id` to the front of its parent's child list, making it the main
    /// branch. Returns its previous index.
    ///
    /// # Panics
    ///
    /// Panics if `id` is the root or is not live.
    pub fn promote_to_main(&mut self, id: NodeId) -> usize {
        assert!(id != self.root, "promote_to_main: the root has no siblings");
        assert!(
            self.contains(id),
            "promote_to_main: node {id} is not part of the tree"
        );
        let parent = self
            .node(id)
            .parent()
            .expect("non-root live node has a parent");
        let siblings = self.nodes[parent.index()].children_mut();
        let index = siblings
            .iter()
            .position(|&c| c == id)
            .expect("live node is listed by its parent");
        if index != 0 {
            siblings.remove(index);
            siblings.insert(0, id);
            self.notify(TreeEvent::ChildrenReordered { parent });
        }
        index
    }

    /// Select the node the user is looking at.
    ///
    /// # Panics
    ///
    /// Panics if `id` is not live.
    pub fn set_current(&mut self, id: NodeId) {
        assert!(
            self.contains(id),
            "set_current: node {id} is not part of the tree"
        );
        self.current = id;
    }

    // ========================================================================
    // Node content
    // ========================================================================

    /// Append a stone delta to `node`'s edit list, replacing any delta at the
    /// same point. Returns the replaced delta with its index.
    pub fn push_stone_delta(
        &mut self,
        node: NodeId,
        delta: StoneDelta,
    ) -> Option<(usize, StoneDelta)> {
        let replaced = self.remove_stone_delta(node, delta.point);
        self.nodes[node.index()].stone_edits_mut().push(delta);
        replaced
    }

    /// Insert a stone delta at a specific index of `node`'s edit list.
    pub fn insert_stone_delta(&mut self, node: NodeId, index: usize, delta: StoneDelta) {
        let edits = self.nodes[node.index()].stone_edits_mut();
        edits.retain(|d| d.point != delta.point);
        let index = index.min(edits.len());
        edits.insert(index, delta);
    }

    /// Remove the delta recorded at `point` on `node`.
    pub fn remove_stone_delta(&mut self, node: NodeId, point: Point) -> Option<(usize, StoneDelta)> {
        let edits = self.nodes[node.index()].stone_edits_mut();
        let index = edits.iter().position(|d| d.point == point)?;
        Some((index, edits.remove(index)))
    }

    /// Add a mark to `node`. Returns false if it was already present.
    pub fn insert_annotation(&mut self, node: NodeId, annotation: Annotation) -> bool {
        self.nodes[node.index()].annotations_mut().insert(annotation)
    }

    /// Remove a mark from `node`. Returns false if it was absent.
    pub fn remove_annotation(&mut self, node: NodeId, annotation: &Annotation) -> bool {
        self.nodes[node.index()].annotations_mut().remove(annotation)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn subtree_size(&self, id: NodeId) -> usize {
        self.preorder_from(id).count()
    }

    fn notify(&mut self, event: TreeEvent) {
        self.revision = self.revision.wrapping_add(1);
        if self.events.len() >= EVENT_QUEUE_CAP {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }
}

/// Depth-first iterator over a subtree; see [`GameTree::preorder`].
#[derive(Debug, Clone)]
pub struct Preorder<'a> {
    tree: &'a GameTree,
    stack: Vec<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

// ============================================================================
// Tests
// ============================================================================
