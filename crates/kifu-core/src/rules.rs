#![forbid(unsafe_code)]

//! The rules-engine seam.
//!
//! Move legality and capture detection belong to an external engine. The
//! edit layer only asks it one question: "may the player to move play
//! here, and what would that capture?". The engine must be deterministic for
//! a given tree state and must never mutate the tree.

use crate::geometry::{Color, Point};
use crate::node::NodeKind;
use crate::position::Position;
use crate::tree::GameTree;
use std::fmt;

/// Outcome of validating a move proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveValidation {
    Legal,
    OutOfBounds,
    Occupied,
    Suicide,
    Ko,
    /// The game already ended at the current node.
    GameOver,
}

impl MoveValidation {
    #[must_use]
    pub const fn is_legal(self) -> bool {
        matches!(self, Self::Legal)
    }
}

impl fmt::Display for MoveValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Legal => "legal",
            Self::OutOfBounds => "point is off the board",
            Self::Occupied => "point is occupied",
            Self::Suicide => "move is suicide",
            Self::Ko => "move retakes a ko",
            Self::GameOver => "game is over",
        };
        f.write_str(text)
    }
}

/// What the rules engine says about a proposed move at the current node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveProposal {
    pub validation: MoveValidation,
    /// The player who would make the move.
    pub color: Color,
    /// Stones the move would capture.
    pub captured: Vec<Point>,
}

impl MoveProposal {
    #[must_use]
    pub fn legal(color: Color, captured: Vec<Point>) -> Self {
        Self {
            validation: MoveValidation::Legal,
            color,
            captured,
        }
    }

    #[must_use]
    pub fn rejected(color: Color, validation: MoveValidation) -> Self {
        Self {
            validation,
            color,
            captured: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_legal(&self) -> bool {
        self.validation.is_legal()
    }
}

/// Rules-engine collaborator.
pub trait Rules {
    /// Validate playing `point` at `tree.current()`.
    fn propose_move(&self, tree: &GameTree, point: Point) -> MoveProposal;

    /// The player to move at `tree.current()`.
    ///
    /// Defaults to the opponent of the most recent mover on the path from
    /// the root, or black when nobody has moved yet.
    fn next_to_play(&self, tree: &GameTree) -> Color {
        last_mover(tree).map_or(Color::Black, Color::opponent)
    }
}

/// Color of the most recent move, pass or resignation above (and including)
/// the current node.
#[must_use]
pub fn last_mover(tree: &GameTree) -> Option<Color> {
    let mut at = Some(tree.current());
    while let Some(id) = at {
        let node = tree.node(id);
        if let Some(mv) = node.mv() {
            return Some(mv.color);
        }
        at = node.parent();
    }
    None
}

/// Occupancy-only reference rules.
///
/// Rejects off-board and occupied points and moves after a resignation;
/// never captures. Useful for tests and for driving the editor without a
/// real engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRules;

impl Rules for BasicRules {
    fn propose_move(&self, tree: &GameTree, point: Point) -> MoveProposal {
        let color = self.next_to_play(tree);
        if tree.current_node().kind() == NodeKind::Resign {
            return MoveProposal::rejected(color, MoveValidation::GameOver);
        }
        if !point.in_bounds(tree.board_size()) {
            return MoveProposal::rejected(color, MoveValidation::OutOfBounds);
        }
        if Position::at(tree, tree.current()).stone_at(point).is_some() {
            return MoveProposal::rejected(color, MoveValidation::Occupied);
        }
        MoveProposal::legal(color, Vec::new())
    }
}
