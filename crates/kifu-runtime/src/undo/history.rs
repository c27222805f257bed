#![forbid(unsafe_code)]

//! Cursor-addressed history of performed edits.
//!
//! [`History`] keeps a single list of edits plus a cursor. Entries at or
//! below the cursor are applied; entries above it form the redo branch.
//! Undo only moves the cursor down (after rolling the edit back), so a
//! later redo can perform the very same edit again.
//!
//! # Invariants
//!
//! 1. `len() <= max_size()` after any operation.
//! 2. `cursor()` is `None` or a valid index; `can_redo()` iff entries exist
//!    above it.
//! 3. Any `record_and_apply` leaves `can_redo() == false`, even when the
//!    edit is rejected.
//! 4. A rejected edit is never recorded.
//!
//! # Memory Model
//!
//! Edits are stored in a `VecDeque` for O(1) eviction from the front.
//!
//! ```text
//! record(e0..e4)      [e0 e1 e2 e3 e4]      cursor = 4
//! undo() x2           [e0 e1 e2 e3 e4]      cursor = 2
//! record(e5)          [e0 e1 e2 e5]         cursor = 3
//! max_size = 3        [e1 e2 e5]            cursor = 2
//! ```

use std::collections::VecDeque;
use std::fmt;

use kifu_core::GameTree;
use serde::{Deserialize, Serialize};

use super::edit::{Edit, EditContext};

/// Configuration for the history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum number of edits kept.
    pub max_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { max_size: 100 }
    }
}

impl HistoryConfig {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self { max_size }
    }

    /// Create unlimited configuration (for testing).
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_size: usize::MAX,
        }
    }
}

/// Bounded undo/redo history.
pub struct History {
    /// Edits, oldest at the front.
    entries: VecDeque<Edit>,
    /// Number of applied entries (cursor + 1).
    applied: usize,
    config: HistoryConfig,
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("len", &self.entries.len())
            .field("cursor", &self.cursor())
            .field("config", &self.config)
            .finish()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl History {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: VecDeque::new(),
            applied: 0,
            config,
        }
    }

    // ========================================================================
    // Core Operations
    // ========================================================================

    /// Discard the redo branch, then perform `edit` and record it.
    ///
    /// An annotation edit whose session matches the edit on top of the
    /// history is merged into it instead of being appended. A rejected edit
    /// records nothing, but the redo branch is gone either way.
    pub fn record_and_apply(
        &mut self,
        edit: impl Into<Edit>,
        tree: &mut GameTree,
        ctx: &EditContext<'_>,
    ) -> bool {
        let dropped = self.entries.len() - self.applied;
        self.entries.truncate(self.applied);
        if dropped > 0 {
            tracing::debug!(target: "kifu.history", dropped, "redo branch discarded");
        }

        let mut edit = edit.into();
        if !edit.perform(tree, ctx) {
            tracing::debug!(
                target: "kifu.history",
                edit = edit.description(),
                "edit rejected, nothing recorded"
            );
            return false;
        }

        if self.try_merge(&edit) {
            tracing::debug!(
                target: "kifu.history",
                edit = edit.description(),
                len = self.entries.len(),
                "edit merged into top of history"
            );
            return true;
        }

        self.entries.push_back(edit);
        self.applied += 1;
        self.enforce_limit(self.config.max_size);
        tracing::debug!(
            target: "kifu.history",
            len = self.entries.len(),
            cursor = ?self.cursor(),
            "edit recorded"
        );
        true
    }

    /// Roll back the edit at the cursor and move the cursor down.
    ///
    /// Returns false (and does nothing) when there is nothing to undo.
    pub fn perform_undo(&mut self, tree: &mut GameTree, ctx: &EditContext<'_>) -> bool {
        if self.applied == 0 {
            tracing::warn!(target: "kifu.history", "undo requested with nothing to undo");
            return false;
        }
        let edit = &mut self.entries[self.applied - 1];
        if !edit.rollback(tree, ctx) {
            return false;
        }
        self.applied -= 1;
        tracing::debug!(target: "kifu.history", cursor = ?self.cursor(), "undo");
        true
    }

    /// Move the cursor up and perform the edit found there again.
    ///
    /// Returns false (and does nothing) when there is nothing to redo.
    pub fn perform_redo(&mut self, tree: &mut GameTree, ctx: &EditContext<'_>) -> bool {
        if self.applied >= self.entries.len() {
            tracing::warn!(target: "kifu.history", "redo requested with nothing to redo");
            return false;
        }
        let edit = &mut self.entries[self.applied];
        if !edit.perform(tree, ctx) {
            return false;
        }
        self.applied += 1;
        tracing::debug!(target: "kifu.history", cursor = ?self.cursor(), "redo");
        true
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    /// Change the size bound, evicting as needed.
    ///
    /// Applied entries are evicted oldest first; entries of the redo branch
    /// go last, from its far end.
    pub fn set_max_history_size(&mut self, max_size: usize) {
        self.config.max_size = max_size;
        self.enforce_limit(max_size);
    }

    // ========================================================================
    // Info
    // ========================================================================

    /// Number of retained edits, applied or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the most recently applied edit.
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    #[must_use]
    pub fn max_size(&self) -> usize {
        self.config.max_size
    }

    #[must_use]
    pub fn config(&self) -> &HistoryConfig {
        &self.config
    }

    /// Retained edits, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Edit> {
        self.entries.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Edit> {
        self.entries.get(index)
    }

    /// Descriptions of undoable edits (most recent first).
    pub fn undo_descriptions(&self, limit: usize) -> Vec<&'static str> {
        self.entries
            .iter()
            .take(self.applied)
            .rev()
            .take(limit)
            .map(Edit::description)
            .collect()
    }

    /// Descriptions of redoable edits (next redo first).
    pub fn redo_descriptions(&self, limit: usize) -> Vec<&'static str> {
        self.entries
            .iter()
            .skip(self.applied)
            .take(limit)
            .map(Edit::description)
            .collect()
    }

    #[must_use]
    pub fn next_undo_description(&self) -> Option<&'static str> {
        self.cursor()
            .and_then(|i| self.entries.get(i))
            .map(Edit::description)
    }

    #[must_use]
    pub fn next_redo_description(&self) -> Option<&'static str> {
        self.entries.get(self.applied).map(Edit::description)
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Forget every edit. The tree is left as it is.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.applied = 0;
    }

    fn enforce_limit(&mut self, max_size: usize) {
        let mut evicted = 0usize;
        while self.entries.len() > max_size {
            if self.applied > 0 {
                self.entries.pop_front();
                self.applied -= 1;
            } else {
                self.entries.pop_back();
            }
            evicted += 1;
        }
        if evicted > 0 {
            tracing::debug!(target: "kifu.history", evicted, max_size, "history trimmed");
        }
    }

    /// Merge `edit` into the applied top entry if their sessions match.
    fn try_merge(&mut self, edit: &Edit) -> bool {
        edit.session().is_some()
            && self.applied > 0
            && self
                .entries
                .get_mut(self.applied - 1)
                .is_some_and(|top| top.try_merge(edit))
    }
}

// ============================================================================
// Tests
// ============================================================================
