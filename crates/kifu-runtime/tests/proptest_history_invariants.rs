#![forbid(unsafe_code)]

//! Property tests for [`History`] invariants.
//!
//! Validates:
//! - The history keeps exactly the last `min(N, K)` recorded edits, in order.
//! - Undoing then redoing any number of steps restores the exact tree.
//! - Undoing everything leaves the bare root.
//! - A new edit after `u` undos truncates the redo branch.
//! - Edits of one session merge into one entry with the combined effect.
//! - Stone edit perform/rollback restores the exact board and tree shape.

use std::collections::BTreeSet;

use kifu_core::{
    Annotation, BasicRules, Color, GameTree, Move, NodeId, NodeKind, Point, Position, StoneDelta,
};
use kifu_runtime::undo::{
    AnnotationEdit, Edit, EditContext, History, HistoryConfig, PlayMoveEdit, RemoveNodeEdit,
    SessionId, SessionIds, StoneEdit,
};
use proptest::prelude::*;

const SIZE: u16 = 5;

// ============================================================================
// Strategy helpers
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Play(u16, u16),
    Pass,
    StoneAdd(u16, u16, bool),
    StoneRemove(u16, u16),
    Mark(u16, u16),
    /// Remove the n-th live non-root node.
    Remove(usize),
    /// Navigate to the n-th live node (not an edit).
    Select(usize),
}

fn coord() -> impl Strategy<Value = u16> {
    0..SIZE
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (coord(), coord()).prop_map(|(x, y)| Op::Play(x, y)),
        1 => Just(Op::Pass),
        3 => (coord(), coord(), any::<bool>()).prop_map(|(x, y, b)| Op::StoneAdd(x, y, b)),
        1 => (coord(), coord()).prop_map(|(x, y)| Op::StoneRemove(x, y)),
        2 => (coord(), coord()).prop_map(|(x, y)| Op::Mark(x, y)),
        1 => any::<usize>().prop_map(Op::Remove),
        2 => any::<usize>().prop_map(Op::Select),
    ]
}

fn edit_strategy() -> impl Strategy<Value = Op> {
    op_strategy().prop_filter("navigation is not an edit", |op| !matches!(op, Op::Select(_)))
}

/// Build the edit an op stands for, or navigate. Returns `None` for
/// navigation and for removals with nothing to remove.
fn to_edit(op: &Op, tree: &mut GameTree, sessions: &mut SessionIds) -> Option<Edit> {
    let live: Vec<NodeId> = tree.preorder().collect();
    match *op {
        Op::Play(x, y) => Some(PlayMoveEdit::new(Point::new(x, y)).into()),
        Op::Pass => Some(PlayMoveEdit::pass().into()),
        Op::StoneAdd(x, y, black) => {
            let color = if black { Color::Black } else { Color::White };
            Some(StoneEdit::add(None, Point::new(x, y), color).into())
        }
        Op::StoneRemove(x, y) => Some(StoneEdit::remove(None, Point::new(x, y)).into()),
        Op::Mark(x, y) => Some(
            AnnotationEdit::add(
                tree.current(),
                Annotation::Triangle(Point::new(x, y)),
                sessions.issue(),
            )
            .into(),
        ),
        Op::Remove(n) => {
            let candidates = &live[1..];
            if candidates.is_empty() {
                None
            } else {
                Some(RemoveNodeEdit::new(candidates[n % candidates.len()]).into())
            }
        }
        Op::Select(n) => {
            tree.set_current(live[n % live.len()]);
            None
        }
    }
}

/// An edit's kind plus the node it created or acted on. Played moves and
/// stone edits each get a distinct node, so this tells edits apart.
type Identity = (&'static str, Option<NodeId>);

fn identity(edit: &Edit) -> Identity {
    let node = match edit {
        Edit::PlayMove(e) => e.created_node(),
        Edit::Stone(e) => e.edited_node(),
        Edit::Annotation(e) => Some(e.node()),
        Edit::RemoveNode(e) => Some(e.node()),
    };
    (edit.description(), node)
}

/// Record every op; returns the identities of the edits that applied.
fn run(ops: &[Op], history: &mut History, tree: &mut GameTree) -> Vec<Identity> {
    let rules = BasicRules;
    let ctx = EditContext::new(&rules);
    let mut sessions = SessionIds::new();
    let mut applied = Vec::new();
    for op in ops {
        if let Some(edit) = to_edit(op, tree, &mut sessions) {
            let description = edit.description();
            if history.record_and_apply(edit, tree, &ctx) {
                // Every op gets its own session, so a recorded edit is on top.
                let top = history.len().checked_sub(1).and_then(|i| history.get(i));
                applied.push(top.map_or((description, None), identity));
            }
        }
    }
    applied
}

#[derive(Debug, PartialEq, Eq)]
struct NodeSnapshot {
    id: NodeId,
    kind: NodeKind,
    mv: Option<Move>,
    stones: Vec<StoneDelta>,
    annotations: BTreeSet<Annotation>,
    children: Vec<NodeId>,
}

fn snapshot(tree: &GameTree) -> (NodeId, Vec<NodeSnapshot>) {
    let nodes = tree
        .preorder()
        .map(|id| {
            let node = tree.node(id);
            NodeSnapshot {
                id,
                kind: node.kind(),
                mv: node.mv().cloned(),
                stones: node.stone_edits().to_vec(),
                annotations: node.annotations().clone(),
                children: node.children().to_vec(),
            }
        })
        .collect();
    (tree.current(), nodes)
}

// ============================================================================
// Invariant 1: size is min(N, K) and the last K edits are kept
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn keeps_last_k_edits(
        ops in prop::collection::vec(op_strategy(), 1..60),
        max_size in 0usize..12,
    ) {
        let mut tree = GameTree::new(SIZE);
        let mut history = History::new(HistoryConfig::new(max_size));
        let applied = run(&ops, &mut history, &mut tree);

        prop_assert_eq!(history.len(), applied.len().min(max_size));
        let kept: Vec<Identity> = history.iter().map(identity).collect();
        let expected = &applied[applied.len() - history.len()..];
        prop_assert_eq!(kept.as_slice(), expected);
        prop_assert_eq!(history.can_undo(), !history.is_empty());
        prop_assert!(!history.can_redo());
    }
}

// ============================================================================
// Invariant 2: undo/redo round trip
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn undo_then_redo_restores_tree(
        ops in prop::collection::vec(edit_strategy(), 1..50),
        undo_count in 0usize..50,
    ) {
        let rules = BasicRules;
        let ctx = EditContext::new(&rules);
        let mut tree = GameTree::new(SIZE);
        let mut history = History::new(HistoryConfig::unlimited());
        let applied = run(&ops, &mut history, &mut tree);
        let before = snapshot(&tree);

        let undos = undo_count.min(applied.len());
        for _ in 0..undos {
            prop_assert!(history.perform_undo(&mut tree, &ctx));
        }
        for _ in 0..undos {
            prop_assert!(history.perform_redo(&mut tree, &ctx));
        }
        prop_assert_eq!(snapshot(&tree), before);
    }

    #[test]
    fn undo_everything_leaves_bare_root(
        ops in prop::collection::vec(op_strategy(), 1..50),
    ) {
        let rules = BasicRules;
        let ctx = EditContext::new(&rules);
        let mut tree = GameTree::new(SIZE);
        let mut history = History::new(HistoryConfig::unlimited());
        run(&ops, &mut history, &mut tree);

        while history.can_undo() {
            prop_assert!(history.perform_undo(&mut tree, &ctx));
        }
        let root = tree.node(tree.root());
        prop_assert_eq!(tree.len(), 1);
        prop_assert!(root.stone_edits().is_empty());
        prop_assert!(root.annotations().is_empty());
        prop_assert!(!history.perform_undo(&mut tree, &ctx));
    }
}

// ============================================================================
// Invariant 3: branch truncation
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn new_edit_truncates_redo_branch(
        ops in prop::collection::vec(edit_strategy(), 1..40),
        undo_count in 0usize..40,
    ) {
        let rules = BasicRules;
        let ctx = EditContext::new(&rules);
        let mut tree = GameTree::new(SIZE);
        let mut history = History::new(HistoryConfig::unlimited());
        run(&ops, &mut history, &mut tree);

        let applied_before = history.len();
        let undos = undo_count.min(applied_before);
        for _ in 0..undos {
            history.perform_undo(&mut tree, &ctx);
        }

        // A session no recorded edit uses, so nothing merges.
        let mark = AnnotationEdit::add(
            tree.current(),
            Annotation::Selected(Point::new(0, 0)),
            SessionId::new(u64::MAX),
        );
        prop_assert!(history.record_and_apply(mark, &mut tree, &ctx));
        prop_assert_eq!(history.len(), applied_before - undos + 1);
        prop_assert!(!history.can_redo());
    }
}

// ============================================================================
// Invariant 4: session merge
// ============================================================================

fn triangles(points: &[(u16, u16)]) -> Vec<Annotation> {
    points
        .iter()
        .map(|&(x, y)| Annotation::Triangle(Point::new(x, y)))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn session_edits_merge_into_one_entry(
        first in prop::collection::vec((coord(), coord()), 0..6),
        second_add in prop::collection::vec((coord(), coord()), 0..6),
        second_remove in prop::collection::vec((coord(), coord()), 0..6),
    ) {
        let rules = BasicRules;
        let ctx = EditContext::new(&rules);
        let session = SessionIds::new().issue();

        // Reference: the two edits applied independently.
        let mut reference = GameTree::new(SIZE);
        let root = reference.root();
        let mut a = Edit::from(AnnotationEdit::new(root, triangles(&first), [], session));
        let mut b = Edit::from(AnnotationEdit::new(
            root,
            triangles(&second_add),
            triangles(&second_remove),
            session,
        ));
        a.perform(&mut reference, &ctx);
        b.perform(&mut reference, &ctx);

        let mut tree = GameTree::new(SIZE);
        let mut history = History::default();
        history.record_and_apply(
            AnnotationEdit::new(root, triangles(&first), [], session),
            &mut tree,
            &ctx,
        );
        history.record_and_apply(
            AnnotationEdit::new(root, triangles(&second_add), triangles(&second_remove), session),
            &mut tree,
            &ctx,
        );

        prop_assert_eq!(history.len(), 1);
        prop_assert_eq!(
            tree.node(root).annotations(),
            reference.node(root).annotations()
        );

        // One undo takes the whole gesture back.
        prop_assert!(history.perform_undo(&mut tree, &ctx));
        prop_assert!(tree.node(root).annotations().is_empty());
    }
}

// ============================================================================
// Invariant 5: stone edit idempotence
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn stone_edit_rollback_restores_board(
        setup in prop::collection::vec(edit_strategy(), 0..30),
        x in coord(),
        y in coord(),
        op in 0u8..3,
    ) {
        let rules = BasicRules;
        let ctx = EditContext::new(&rules);
        let mut tree = GameTree::new(SIZE);
        let mut history = History::new(HistoryConfig::unlimited());
        run(&setup, &mut history, &mut tree);

        let before = snapshot(&tree);
        let board = Position::at(&tree, tree.current());
        let point = Point::new(x, y);
        let mut edit = Edit::from(match op {
            0 => StoneEdit::add(None, point, Color::Black),
            1 => StoneEdit::add(None, point, Color::White),
            _ => StoneEdit::remove(None, point),
        });

        if edit.perform(&mut tree, &ctx) {
            prop_assert!(edit.can_rollback());
            prop_assert!(edit.rollback(&mut tree, &ctx));
        }
        prop_assert_eq!(snapshot(&tree), before);
        prop_assert_eq!(Position::at(&tree, tree.current()), board);
    }
}
