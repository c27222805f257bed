#![forbid(unsafe_code)]

//! Reversible edits against a [`GameTree`].
//!
//! # Invariants
//!
//! - `perform()` followed by `rollback()` restores the prior tree exactly:
//!   node content, child ordering, and the current node.
//! - `rollback()` followed by `perform()` restores the performed state with
//!   the *same* node ids; redo reattaches detached nodes instead of creating
//!   new ones.
//! - A failed `perform()` leaves the tree untouched.
//!
//! # Failure Modes
//!
//! - `rollback()` when [`Edit::can_rollback`] is false panics.
//! - Removing the root panics.
//! - Reinserting under a parent that left the tree panics (in
//!   [`GameTree::reinsert_subtree`]).

use kifu_core::{
    Annotation, Color, Detached, GameTree, Move, NodeData, NodeId, NodeKind, Point, Position,
    Rules, StoneDelta,
};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Context and sessions
// ============================================================================

/// Collaborators an edit may consult while performing.
#[derive(Clone, Copy)]
pub struct EditContext<'a> {
    rules: &'a dyn Rules,
}

impl<'a> EditContext<'a> {
    #[must_use]
    pub fn new(rules: &'a dyn Rules) -> Self {
        Self { rules }
    }

    #[must_use]
    pub fn rules(&self) -> &'a dyn Rules {
        self.rules
    }
}

impl fmt::Debug for EditContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditContext").finish_non_exhaustive()
    }
}

/// Token shared by all edits of one continuous gesture.
///
/// Only used to decide whether two annotation edits may merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Monotonic session id source.
#[derive(Debug, Clone, Default)]
pub struct SessionIds {
    next: u64,
}

impl SessionIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out a fresh id.
    pub fn issue(&mut self) -> SessionId {
        let id = SessionId(self.next);
        self.next += 1;
        id
    }
}

// ============================================================================
// PlayMoveEdit
// ============================================================================

/// What a [`PlayMoveEdit`] plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    Point(Point),
    Pass,
}

/// Play a move (or pass) at the current node.
#[derive(Debug, Clone)]
pub struct PlayMoveEdit {
    target: MoveTarget,
    created: Option<NodeId>,
    parent: Option<NodeId>,
    detached: Option<Detached>,
    performed: bool,
}

impl PlayMoveEdit {
    /// Play a stone at `point`.
    #[must_use]
    pub fn new(point: Point) -> Self {
        Self::with_target(MoveTarget::Point(point))
    }

    /// Pass.
    #[must_use]
    pub fn pass() -> Self {
        Self::with_target(MoveTarget::Pass)
    }

    fn with_target(target: MoveTarget) -> Self {
        Self {
            target,
            created: None,
            parent: None,
            detached: None,
            performed: false,
        }
    }

    #[must_use]
    pub fn target(&self) -> MoveTarget {
        self.target
    }

    /// The node this edit created, once performed.
    #[must_use]
    pub fn created_node(&self) -> Option<NodeId> {
        self.created
    }

    fn perform(&mut self, tree: &mut GameTree, ctx: &EditContext<'_>) -> bool {
        if self.performed {
            return false;
        }
        if let Some(detached) = self.detached.take() {
            tree.reinsert_subtree(&detached);
            tree.set_current(detached.node);
            self.performed = true;
            return true;
        }

        let parent = tree.current();
        let mv = match self.target {
            MoveTarget::Point(point) => {
                let proposal = ctx.rules().propose_move(tree, point);
                if !proposal.is_legal() {
                    tracing::debug!(
                        target: "kifu.edit",
                        point = %point,
                        reason = %proposal.validation,
                        "move rejected"
                    );
                    return false;
                }
                Move::play(proposal.color, point).with_captured(proposal.captured)
            }
            MoveTarget::Pass => Move::pass(ctx.rules().next_to_play(tree)),
        };
        let node = tree.create_child(parent, NodeData::play(mv));
        tree.set_current(node);
        self.created = Some(node);
        self.parent = Some(parent);
        self.performed = true;
        true
    }

    fn can_rollback(&self) -> bool {
        self.performed && self.created.is_some()
    }

    fn rollback(&mut self, tree: &mut GameTree) -> bool {
        let (true, Some(node), Some(parent)) = (self.performed, self.created, self.parent) else {
            panic!("PlayMoveEdit::rollback called but no node was created by perform");
        };
        self.detached = Some(tree.remove_subtree(node));
        tree.set_current(parent);
        self.performed = false;
        true
    }
}

// ============================================================================
// StoneEdit
// ============================================================================

/// Requested stone operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoneOp {
    /// Toggle a stone of this color (see the placement policy on
    /// [`StoneEdit`]).
    Add(Color),
    /// Erase whatever stone is there.
    Remove,
}

/// The delta-level change a stone edit made to its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoneChange {
    /// A new delta was appended.
    Recorded(StoneDelta),
    /// An existing delta was taken back out of the list.
    Withdrawn { index: usize, delta: StoneDelta },
}

impl StoneChange {
    fn apply(self, tree: &mut GameTree, node: NodeId) {
        match self {
            Self::Recorded(delta) => {
                tree.push_stone_delta(node, delta);
            }
            Self::Withdrawn { delta, .. } => {
                tree.remove_stone_delta(node, delta.point);
            }
        }
    }

    fn revert(self, tree: &mut GameTree, node: NodeId) {
        match self {
            Self::Recorded(delta) => {
                tree.remove_stone_delta(node, delta.point);
            }
            Self::Withdrawn { index, delta } => tree.insert_stone_delta(node, index, delta),
        }
    }
}

/// Add or erase a setup stone.
///
/// With no explicit node, the edit targets the current node when it is the
/// root or a STONE_EDIT node, and otherwise creates a fresh STONE_EDIT child
/// of the current node.
///
/// Placement policy, evaluated against the board at the edited node:
///
/// 1. a stone is there and this node's own delta put it there: withdraw the
///    delta;
/// 2. a stone is there from elsewhere (a move, an ancestor's edit): record an
///    erase delta;
/// 3. the point is empty because this node erased it: withdraw the erase
///    (`Add` only);
/// 4. the point is genuinely empty: record the requested color (`Add` only).
///
/// `Remove` on an empty point does nothing and reports failure.
#[derive(Debug, Clone)]
pub struct StoneEdit {
    node: Option<NodeId>,
    point: Point,
    op: StoneOp,
    target: Option<NodeId>,
    created: Option<NodeId>,
    previous_current: Option<NodeId>,
    detached: Option<Detached>,
    change: Option<StoneChange>,
    performed: bool,
}

impl StoneEdit {
    /// Toggle a `color` stone at `point`.
    #[must_use]
    pub fn add(node: Option<NodeId>, point: Point, color: Color) -> Self {
        Self::new(node, point, StoneOp::Add(color))
    }

    /// Erase the stone at `point`.
    #[must_use]
    pub fn remove(node: Option<NodeId>, point: Point) -> Self {
        Self::new(node, point, StoneOp::Remove)
    }

    #[must_use]
    pub fn new(node: Option<NodeId>, point: Point, op: StoneOp) -> Self {
        Self {
            node,
            point,
            op,
            target: None,
            created: None,
            previous_current: None,
            detached: None,
            change: None,
            performed: false,
        }
    }

    #[must_use]
    pub fn point(&self) -> Point {
        self.point
    }

    #[must_use]
    pub fn op(&self) -> StoneOp {
        self.op
    }

    /// The node whose delta list this edit changed, once performed.
    #[must_use]
    pub fn edited_node(&self) -> Option<NodeId> {
        self.target
    }

    /// The STONE_EDIT node this edit created, if it created one.
    #[must_use]
    pub fn created_node(&self) -> Option<NodeId> {
        self.created
    }

    fn perform(&mut self, tree: &mut GameTree) -> bool {
        if self.performed {
            return false;
        }
        if let (Some(target), Some(change)) = (self.target, self.change) {
            if let Some(detached) = self.detached.take() {
                tree.reinsert_subtree(&detached);
                tree.set_current(detached.node);
            }
            change.apply(tree, target);
            self.performed = true;
            return true;
        }

        let point = self.point;
        if !point.in_bounds(tree.board_size()) {
            return false;
        }
        let current = tree.current();
        let (target, create) = match self.node {
            Some(node) => (node, false),
            None => {
                let kind = tree.node(current).kind();
                (current, !matches!(kind, NodeKind::Root | NodeKind::StoneEdit))
            }
        };

        // A node about to be created starts from its parent's board with no
        // deltas of its own.
        let own = if create {
            None
        } else {
            tree.node(target).stone_delta_at(point)
        };
        let stone = Position::at(tree, target).stone_at(point);
        let change = match (stone, own, self.op) {
            (Some(_), Some((index, delta)), _) if delta.color.is_some() => {
                StoneChange::Withdrawn { index, delta }
            }
            (Some(_), _, _) => StoneChange::Recorded(StoneDelta::erase(point)),
            (None, Some((index, delta)), StoneOp::Add(_)) if delta.color.is_none() => {
                StoneChange::Withdrawn { index, delta }
            }
            (None, _, StoneOp::Add(color)) => StoneChange::Recorded(StoneDelta::place(point, color)),
            (None, _, StoneOp::Remove) => {
                tracing::debug!(target: "kifu.edit", point = %point, "nothing to erase");
                return false;
            }
        };

        let target = if create {
            let node = tree.create_child(current, NodeData::stone_edit());
            tree.set_current(node);
            self.created = Some(node);
            self.previous_current = Some(current);
            node
        } else {
            target
        };
        change.apply(tree, target);
        self.target = Some(target);
        self.change = Some(change);
        self.performed = true;
        true
    }

    fn can_rollback(&self) -> bool {
        self.performed && self.change.is_some()
    }

    fn rollback(&mut self, tree: &mut GameTree) -> bool {
        let (true, Some(target), Some(change)) = (self.performed, self.target, self.change) else {
            panic!("StoneEdit::rollback called on an edit that was not performed");
        };
        change.revert(tree, target);
        if let Some(node) = self.created {
            self.detached = Some(tree.remove_subtree(node));
            if let Some(previous) = self.previous_current {
                tree.set_current(previous);
            }
        }
        self.performed = false;
        true
    }
}

// ============================================================================
// AnnotationEdit
// ============================================================================

/// Add and remove marks on one node.
///
/// Perform removes `to_remove`, then adds `to_add`, dropping entries that
/// turned out to be no-ops; rollback does the exact inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationEdit {
    node: NodeId,
    to_add: BTreeSet<Annotation>,
    to_remove: BTreeSet<Annotation>,
    session: SessionId,
    performed: bool,
}

impl AnnotationEdit {
    #[must_use]
    pub fn new(
        node: NodeId,
        to_add: impl IntoIterator<Item = Annotation>,
        to_remove: impl IntoIterator<Item = Annotation>,
        session: SessionId,
    ) -> Self {
        Self {
            node,
            to_add: to_add.into_iter().collect(),
            to_remove: to_remove.into_iter().collect(),
            session,
            performed: false,
        }
    }

    /// Add a single mark.
    #[must_use]
    pub fn add(node: NodeId, annotation: Annotation, session: SessionId) -> Self {
        Self::new(node, [annotation], [], session)
    }

    /// Remove a single mark.
    #[must_use]
    pub fn remove(node: NodeId, annotation: Annotation, session: SessionId) -> Self {
        Self::new(node, [], [annotation], session)
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    #[must_use]
    pub fn session(&self) -> SessionId {
        self.session
    }

    #[must_use]
    pub fn to_add(&self) -> &BTreeSet<Annotation> {
        &self.to_add
    }

    #[must_use]
    pub fn to_remove(&self) -> &BTreeSet<Annotation> {
        &self.to_remove
    }

    /// True when the edit changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Whether `other` belongs to the same gesture on the same node.
    #[must_use]
    pub fn can_merge(&self, other: &Self) -> bool {
        self.session == other.session && self.node == other.node
    }

    /// Fold `other` into this edit so that this edit alone has the combined
    /// effect of both. Returns false (and changes nothing) when the two edits
    /// cannot merge.
    pub fn merge(&mut self, other: &Self) -> bool {
        if !self.can_merge(other) {
            return false;
        }
        // Same order as perform: removals first.
        for annotation in &other.to_remove {
            if !self.to_add.remove(annotation) {
                self.to_remove.insert(annotation.clone());
            }
        }
        for annotation in &other.to_add {
            if !self.to_remove.remove(annotation) {
                self.to_add.insert(annotation.clone());
            }
        }
        true
    }

    fn perform(&mut self, tree: &mut GameTree) -> bool {
        if self.performed {
            return false;
        }
        // Keep only what actually changed so rollback restores the exact
        // prior set and merged gestures stay exact.
        let node = self.node;
        self.to_remove.retain(|annotation| tree.remove_annotation(node, annotation));
        self.to_add
            .retain(|annotation| tree.insert_annotation(node, annotation.clone()));
        self.performed = true;
        true
    }

    fn can_rollback(&self) -> bool {
        self.performed
    }

    fn rollback(&mut self, tree: &mut GameTree) -> bool {
        assert!(
            self.performed,
            "AnnotationEdit::rollback called on an edit that was not performed"
        );
        for annotation in &self.to_add {
            tree.remove_annotation(self.node, annotation);
        }
        for annotation in &self.to_remove {
            tree.insert_annotation(self.node, annotation.clone());
        }
        self.performed = false;
        true
    }
}

// ============================================================================
// RemoveNodeEdit
// ============================================================================

/// Delete a node and its whole subtree.
#[derive(Debug, Clone)]
pub struct RemoveNodeEdit {
    node: NodeId,
    previous_current: Option<NodeId>,
    detached: Option<Detached>,
    performed: bool,
}

impl RemoveNodeEdit {
    #[must_use]
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            previous_current: None,
            detached: None,
            performed: false,
        }
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    fn perform(&mut self, tree: &mut GameTree) -> bool {
        if self.performed {
            return false;
        }
        assert!(
            self.node != tree.root(),
            "RemoveNodeEdit: the root cannot be removed"
        );
        if !tree.contains(self.node) {
            tracing::debug!(target: "kifu.edit", node = %self.node, "node already detached");
            return false;
        }
        self.previous_current = Some(tree.current());
        self.detached = Some(tree.remove_subtree(self.node));
        self.performed = true;
        true
    }

    fn can_rollback(&self) -> bool {
        self.performed && self.detached.is_some()
    }

    fn rollback(&mut self, tree: &mut GameTree) -> bool {
        let (true, Some(detached)) = (self.performed, self.detached) else {
            panic!("RemoveNodeEdit::rollback called on an edit that was not performed");
        };
        tree.reinsert_subtree(&detached);
        if let Some(previous) = self.previous_current.filter(|&id| tree.contains(id)) {
            tree.set_current(previous);
        }
        self.performed = false;
        true
    }
}

// ============================================================================
// Edit
// ============================================================================

/// A reversible mutation of the game tree.
#[derive(Debug, Clone)]
pub enum Edit {
    PlayMove(PlayMoveEdit),
    Stone(StoneEdit),
    Annotation(AnnotationEdit),
    RemoveNode(RemoveNodeEdit),
}

impl Edit {
    /// Apply the edit. Returns false, leaving the tree untouched, when the
    /// edit is rejected.
    pub fn perform(&mut self, tree: &mut GameTree, ctx: &EditContext<'_>) -> bool {
        let ok = match self {
            Self::PlayMove(edit) => edit.perform(tree, ctx),
            Self::Stone(edit) => edit.perform(tree),
            Self::Annotation(edit) => edit.perform(tree),
            Self::RemoveNode(edit) => edit.perform(tree),
        };
        tracing::debug!(
            target: "kifu.edit",
            edit = self.description(),
            ok,
            current = %tree.current(),
            "edit performed"
        );
        ok
    }

    /// Revert a performed edit.
    ///
    /// # Panics
    ///
    /// Panics if [`can_rollback`](Self::can_rollback) is false.
    pub fn rollback(&mut self, tree: &mut GameTree, _ctx: &EditContext<'_>) -> bool {
        let ok = match self {
            Self::PlayMove(edit) => edit.rollback(tree),
            Self::Stone(edit) => edit.rollback(tree),
            Self::Annotation(edit) => edit.rollback(tree),
            Self::RemoveNode(edit) => edit.rollback(tree),
        };
        tracing::debug!(
            target: "kifu.edit",
            edit = self.description(),
            ok,
            current = %tree.current(),
            "edit rolled back"
        );
        ok
    }

    /// Whether [`rollback`](Self::rollback) may be called.
    #[must_use]
    pub fn can_rollback(&self) -> bool {
        match self {
            Self::PlayMove(edit) => edit.can_rollback(),
            Self::Stone(edit) => edit.can_rollback(),
            Self::Annotation(edit) => edit.can_rollback(),
            Self::RemoveNode(edit) => edit.can_rollback(),
        }
    }

    /// Human-readable description for UI display.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::PlayMove(edit) => match edit.target {
                MoveTarget::Point(_) => "Play move",
                MoveTarget::Pass => "Pass",
            },
            Self::Stone(edit) => match edit.op {
                StoneOp::Add(_) => "Edit stone",
                StoneOp::Remove => "Erase stone",
            },
            Self::Annotation(_) => "Edit annotations",
            Self::RemoveNode(_) => "Remove node",
        }
    }

    /// Merge session, for annotation edits.
    #[must_use]
    pub fn session(&self) -> Option<SessionId> {
        match self {
            Self::Annotation(edit) => Some(edit.session),
            _ => None,
        }
    }

    /// Try to fold `other` into this edit. Only annotation edits of the same
    /// session on the same node merge.
    pub fn try_merge(&mut self, other: &Edit) -> bool {
        match (self, other) {
            (Self::Annotation(top), Self::Annotation(next)) => top.merge(next),
            _ => false,
        }
    }
}

impl From<PlayMoveEdit> for Edit {
    fn from(edit: PlayMoveEdit) -> Self {
        Self::PlayMove(edit)
    }
}

impl From<StoneEdit> for Edit {
    fn from(edit: StoneEdit) -> Self {
        Self::Stone(edit)
    }
}

impl From<AnnotationEdit> for Edit {
    fn from(edit: AnnotationEdit) -> Self {
        Self::Annotation(edit)
    }
}

impl From<RemoveNodeEdit> for Edit {
    fn from(edit: RemoveNodeEdit) -> Self {
        Self::RemoveNode(edit)
    }
}

// ============================================================================
// Tests
// ============================================================================
