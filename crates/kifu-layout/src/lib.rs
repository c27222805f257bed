#![forbid(unsafe_code)]

//! Grid layout for game-record trees.
//!
//! [`TreeLayout`] assigns every live node a logical `(column, row)` cell so
//! that a renderer can draw the record as a graph without branches crossing.
//!
//! # Algorithm
//!
//! - The row of a node is its depth (root is row 0).
//! - A *chain* is a node plus all of its main-branch descendants. A chain
//!   occupies a single column: main-branch children inherit their parent's
//!   column.
//! - The chain starting at the root is placed in column 0. Every other chain
//!   starts at a variation child and is placed in the smallest column to the
//!   right of its branching node whose reserved row intervals do not overlap
//!   `[branch_row, deepest_row_of_chain]`.
//! - Chains are placed depth-first in branch order, so earlier variations sit
//!   closer to the main line.
//!
//! Because a chain reserves its full extent before any of its own variations
//! are placed, two nodes that are not ancestor-related never share a column
//! over overlapping rows.
//!
//! # Invalidation
//!
//! The layout is rebuilt from scratch whenever the tree's structural revision
//! changes; [`TreeLayout::sync`] is cheap when nothing changed.
//!
//! # Viewport queries
//!
//! [`TreeLayout::elements_within`] answers "which nodes fall in these rows"
//! from a per-row index, without scanning the tree. The layout stores only
//! ids and cells; node data is always read from the tree.

use kifu_core::{GameTree, NodeId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Config and cells
// ============================================================================

/// Layout parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Edge length of one grid cell in pixels.
    pub cell_size: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { cell_size: 24 }
    }
}

impl LayoutConfig {
    #[must_use]
    pub fn new(cell_size: u32) -> Self {
        Self { cell_size }
    }
}

/// A logical cell in the layout grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GridPos {
    pub column: u32,
    pub row: u32,
}

impl GridPos {
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }
}

// ============================================================================
// Column reservations
// ============================================================================

/// Disjoint inclusive row intervals reserved in one column, keyed by start.
#[derive(Debug, Clone, Default)]
struct ColumnSpans {
    spans: BTreeMap<u32, u32>,
}

impl ColumnSpans {
    fn is_free(&self, start: u32, end: u32) -> bool {
        // Spans are disjoint, so the one starting last at or before `end`
        // reaches furthest down among all candidates.
        match self.spans.range(..=end).next_back() {
            Some((_, &span_end)) => span_end < start,
            None => true,
        }
    }

    fn reserve(&mut self, start: u32, end: u32) {
        debug_assert!(self.is_free(start, end));
        self.spans.insert(start, end);
    }
}

/// A chain waiting to be placed.
#[derive(Debug, Clone, Copy)]
struct PendingChain {
    start: NodeId,
    /// Row of the node the chain branches from.
    branch_row: u32,
    /// Column of the node the chain branches from.
    branch_column: u32,
}

// ============================================================================
// TreeLayout
// ============================================================================

/// Grid positions for every live node of a [`GameTree`].
#[derive(Debug, Clone, Default)]
pub struct TreeLayout {
    config: LayoutConfig,
    positions: FxHashMap<NodeId, GridPos>,
    /// Node ids per row, sorted by column.
    rows: Vec<Vec<NodeId>>,
    columns: u32,
    revision: Option<u64>,
}

impl TreeLayout {
    /// Create an empty layout; call [`sync`](Self::sync) to populate it.
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Build a layout for `tree` immediately.
    #[must_use]
    pub fn for_tree(tree: &GameTree, config: LayoutConfig) -> Self {
        let mut layout = Self::new(config);
        layout.rebuild(tree);
        layout
    }

    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Rebuild if the tree changed structurally since the last build.
    ///
    /// Returns true if a rebuild happened.
    pub fn sync(&mut self, tree: &GameTree) -> bool {
        if self.revision == Some(tree.structure_revision()) {
            return false;
        }
        self.rebuild(tree);
        true
    }

    /// Forget the cached revision so the next [`sync`](Self::sync) rebuilds.
    pub fn invalidate(&mut self) {
        self.revision = None;
    }

    /// Recompute every position from scratch.
    pub fn rebuild(&mut self, tree: &GameTree) {
        let _span = tracing::debug_span!(
            "layout.rebuild",
            nodes = tree.len(),
            columns = tracing::field::Empty,
        )
        .entered();

        self.positions.clear();
        self.positions.reserve(tree.len());
        self.rows.clear();
        self.columns = 0;

        let mut reserved: Vec<ColumnSpans> = Vec::new();
        let mut pending = vec![PendingChain {
            start: tree.root(),
            branch_row: 0,
            branch_column: 0,
        }];
        let mut chain = Vec::new();

        while let Some(next) = pending.pop() {
            chain.clear();
            let mut at = Some(next.start);
            while let Some(id) = at {
                chain.push(id);
                at = tree.node(id).main_child();
            }

            let is_root = next.start == tree.root();
            let first_row = if is_root { 0 } else { next.branch_row + 1 };
            let last_row = first_row + chain_len(&chain) - 1;
            let column = if is_root {
                0
            } else {
                free_column(&reserved, next.branch_column + 1, next.branch_row, last_row)
            };

            let col_index = column as usize;
            if reserved.len() <= col_index {
                reserved.resize_with(col_index + 1, ColumnSpans::default);
            }
            let span_start = if is_root { 0 } else { next.branch_row };
            reserved[col_index].reserve(span_start, last_row);
            self.columns = self.columns.max(column + 1);

            for (offset, &id) in chain.iter().enumerate() {
                let row = first_row + offset as u32;
                self.place(id, GridPos::new(column, row));
            }

            // Push variations bottom-up and in reverse child order so that
            // popping visits them top-down in branch order.
            for (offset, &id) in chain.iter().enumerate().rev() {
                let row = first_row + offset as u32;
                for &variation in tree.children(id).iter().skip(1).rev() {
                    pending.push(PendingChain {
                        start: variation,
                        branch_row: row,
                        branch_column: column,
                    });
                }
            }
        }

        let positions = &self.positions;
        for row in &mut self.rows {
            row.sort_by_key(|id| positions[id].column);
        }
        self.revision = Some(tree.structure_revision());

        tracing::Span::current().record("columns", self.columns);
        tracing::debug!(
            target: "kifu.layout",
            nodes = self.positions.len(),
            rows = self.rows.len(),
            columns = self.columns,
            "layout rebuilt"
        );
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Grid cell of `node`, if it is live in the laid-out tree.
    #[must_use]
    pub fn position_of(&self, node: NodeId) -> Option<GridPos> {
        self.positions.get(&node).copied()
    }

    /// Top-left pixel of `node`'s cell. `None` when the node is not laid
    /// out or its origin does not fit in `u32`.
    #[must_use]
    pub fn pixel_origin(&self, node: NodeId) -> Option<(u32, u32)> {
        let cell = self.config.cell_size;
        let pos = self.position_of(node)?;
        Some((pos.column.checked_mul(cell)?, pos.row.checked_mul(cell)?))
    }

    /// Nodes whose row lies in `row_start..=row_end`, row by row, left to
    /// right.
    pub fn elements_within(
        &self,
        row_start: u32,
        row_end: u32,
    ) -> impl Iterator<Item = (NodeId, GridPos)> + '_ {
        let len = self.rows.len();
        let start = (row_start as usize).min(len);
        let end = if row_end < row_start {
            start
        } else {
            (row_end as usize).saturating_add(1).min(len)
        };
        self.rows[start..end]
            .iter()
            .flatten()
            .map(move |id| (*id, self.positions[id]))
    }

    /// Nodes whose cells intersect the vertical pixel span `[top, bottom)`.
    pub fn elements_in_pixels(
        &self,
        top: u32,
        bottom: u32,
    ) -> impl Iterator<Item = (NodeId, GridPos)> + '_ {
        let cell = self.config.cell_size.max(1);
        let (start, end) = if bottom <= top {
            (1, 0)
        } else {
            (top / cell, (bottom - 1) / cell)
        };
        self.elements_within(start, end)
    }

    /// Number of columns in use.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in use.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Number of laid-out nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Tree revision this layout was built from.
    #[must_use]
    pub fn revision(&self) -> Option<u64> {
        self.revision
    }

    fn place(&mut self, id: NodeId, pos: GridPos) {
        let row = pos.row as usize;
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        self.rows[row].push(id);
        self.positions.insert(id, pos);
    }
}

fn chain_len(chain: &[NodeId]) -> u32 {
    u32::try_from(chain.len()).unwrap_or(u32::MAX)
}

fn free_column(reserved: &[ColumnSpans], from: u32, start: u32, end: u32) -> u32 {
    let mut column = from;
    while let Some(spans) = reserved.get(column as usize) {
        if spans.is_free(start, end) {
            break;
        }
        column += 1;
    }
    column
}

// ============================================================================
// Tests
// ============================================================================
