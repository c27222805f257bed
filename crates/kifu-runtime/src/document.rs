#![forbid(unsafe_code)]

//! The editable game record.
//!
//! A [`Document`] bundles the tree with everything that has to stay in step
//! with it: the undo history, the rules collaborator edits validate against,
//! the gesture session counter and the tree layout. It is the single writer
//! for all of them; edit modes and hosts go through it.
//!
//! After every mutation the document drains the tree's structural events and
//! brings the layout up to date, so [`Document::layout`] never lags behind
//! [`Document::tree`].

use std::fmt;

use kifu_core::{GameTree, NodeId, Position, Rules, TreeEvent};
use kifu_layout::TreeLayout;

use crate::config::{EditorConfig, MAX_BOARD_SIZE};
use crate::undo::{Edit, EditContext, History, SessionId, SessionIds};

/// A game record plus its edit history and layout.
pub struct Document {
    tree: GameTree,
    history: History,
    layout: TreeLayout,
    rules: Box<dyn Rules + Send>,
    sessions: SessionIds,
    events: Vec<TreeEvent>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.tree.len())
            .field("current", &self.tree.current())
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Start an empty record.
    ///
    /// A board size outside `1..=MAX_BOARD_SIZE` is clamped into range;
    /// [`EditorConfig::load`] rejects such configs up front.
    #[must_use]
    pub fn new(config: &EditorConfig, rules: Box<dyn Rules + Send>) -> Self {
        let board_size = config.board_size.clamp(1, MAX_BOARD_SIZE);
        if board_size != config.board_size {
            tracing::warn!(
                target: "kifu.config",
                requested = config.board_size,
                board_size,
                "board size out of range, clamped"
            );
        }
        Self::from_tree(GameTree::new(board_size), config, rules)
    }

    /// Wrap an existing tree (for example one built by a record loader).
    #[must_use]
    pub fn from_tree(
        mut tree: GameTree,
        config: &EditorConfig,
        rules: Box<dyn Rules + Send>,
    ) -> Self {
        // Loading is not an edit; whoever built the tree saw its events.
        tree.take_events();
        let layout = TreeLayout::for_tree(&tree, config.layout);
        Self {
            tree,
            history: History::new(config.history.clone()),
            layout,
            rules,
            sessions: SessionIds::new(),
            events: Vec::new(),
        }
    }

    #[must_use]
    pub fn tree(&self) -> &GameTree {
        &self.tree
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    #[must_use]
    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    #[must_use]
    pub fn rules(&self) -> &dyn Rules {
        self.rules.as_ref()
    }

    #[must_use]
    pub fn current(&self) -> NodeId {
        self.tree.current()
    }

    /// Board at the current node.
    #[must_use]
    pub fn position(&self) -> Position {
        Position::at(&self.tree, self.tree.current())
    }

    // ========================================================================
    // Editing
    // ========================================================================

    /// Perform `edit` and record it in the history.
    ///
    /// Returns false if the edit was rejected. The tree is untouched in
    /// that case, but any redo branch has been discarded.
    pub fn apply(&mut self, edit: impl Into<Edit>) -> bool {
        let ctx = EditContext::new(self.rules.as_ref());
        let applied = self.history.record_and_apply(edit, &mut self.tree, &ctx);
        self.sync();
        applied
    }

    pub fn undo(&mut self) -> bool {
        let ctx = EditContext::new(self.rules.as_ref());
        let undone = self.history.perform_undo(&mut self.tree, &ctx);
        self.sync();
        undone
    }

    pub fn redo(&mut self) -> bool {
        let ctx = EditContext::new(self.rules.as_ref());
        let redone = self.history.perform_redo(&mut self.tree, &ctx);
        self.sync();
        redone
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Issue a fresh merge session for one continuous gesture.
    pub fn begin_session(&mut self) -> SessionId {
        self.sessions.issue()
    }

    pub fn set_max_history_size(&mut self, max_size: usize) {
        self.history.set_max_history_size(max_size);
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    /// Make `node` the current node. Navigation is not an edit and is not
    /// recorded.
    ///
    /// # Panics
    ///
    /// Panics if `node` is not part of the tree.
    pub fn select(&mut self, node: NodeId) {
        self.tree.set_current(node);
    }

    /// Move `node` to the front of its parent's children.
    ///
    /// Reordering is not recorded in the history.
    pub fn promote_to_main(&mut self, node: NodeId) -> usize {
        let previous = self.tree.promote_to_main(node);
        self.sync();
        previous
    }

    /// Structural events since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<TreeEvent> {
        std::mem::take(&mut self.events)
    }

    fn sync(&mut self) {
        let events = self.tree.take_events();
        if events.is_empty() {
            return;
        }
        self.events.extend(events);
        self.layout.sync(&self.tree);
    }
}
