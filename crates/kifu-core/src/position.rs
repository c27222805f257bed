#![forbid(unsafe_code)]

//! Board contents replayed from recorded tree data.
//!
//! A [`Position`] is what the board looks like at a node: every move along
//! the path from the root, minus the captures the rules engine recorded on
//! those moves, with each node's stone deltas applied last. No rules are
//! evaluated here.

use crate::geometry::{Color, Point};
use crate::node::NodeId;
use crate::tree::GameTree;

/// Snapshot of stones on a square board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    size: u16,
    stones: Vec<Option<Color>>,
}

impl Position {
    /// An empty board.
    #[must_use]
    pub fn empty(size: u16) -> Self {
        let cells = usize::from(size) * usize::from(size);
        Self {
            size,
            stones: vec![None; cells],
        }
    }

    /// Replay the path from the root to `node`.
    #[must_use]
    pub fn at(tree: &GameTree, node: NodeId) -> Self {
        let mut position = Self::empty(tree.board_size());
        for id in tree.path_to(node) {
            let node = tree.node(id);
            if let Some(mv) = node.mv() {
                if let Some(point) = mv.point {
                    position.set(point, Some(mv.color));
                }
                for &captured in &mv.captured {
                    position.set(captured, None);
                }
            }
            for delta in node.stone_edits() {
                position.set(delta.point, delta.color);
            }
        }
        position
    }

    #[must_use]
    pub fn size(&self) -> u16 {
        self.size
    }

    #[must_use]
    pub fn in_bounds(&self, point: Point) -> bool {
        point.in_bounds(self.size)
    }

    /// Stone at `point`; `None` when empty or off the board.
    #[must_use]
    pub fn stone_at(&self, point: Point) -> Option<Color> {
        self.offset(point).and_then(|i| self.stones[i])
    }

    /// All occupied intersections in row-major order.
    pub fn stones(&self) -> impl Iterator<Item = (Point, Color)> + '_ {
        let size = self.size;
        self.stones.iter().enumerate().filter_map(move |(i, stone)| {
            let color = (*stone)?;
            let i = u16::try_from(i).ok()?;
            Some((Point::new(i % size, i / size), color))
        })
    }

    /// Write (or clear) an intersection. Off-board points are ignored.
    pub fn set(&mut self, point: Point, stone: Option<Color>) {
        if let Some(i) = self.offset(point) {
            self.stones[i] = stone;
        }
    }

    fn offset(&self, point: Point) -> Option<usize> {
        self.in_bounds(point)
            .then(|| usize::from(point.y) * usize::from(self.size) + usize::from(point.x))
    }
}
