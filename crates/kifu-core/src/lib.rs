#![forbid(unsafe_code)]

//! Core: the game-record tree, node data, input events and position replay.
//!
//! # Role in kifu
//! `kifu-core` is the document layer. It owns the node arena ([`GameTree`]),
//! the data each node carries ([`Node`]), the normalized pointer/key events
//! the edit modes consume, and the [`Rules`] seam through which move legality
//! is delegated to an external engine.
//!
//! # How it fits in the system
//! The runtime (`kifu-runtime`) mutates the tree exclusively through
//! reversible edits and records them in its history. The layout crate
//! (`kifu-layout`) reads the tree to assign grid coordinates. Nothing in this
//! crate validates game rules; [`BasicRules`] is an occupancy-only reference
//! collaborator.

pub mod geometry;
pub mod input;
pub mod node;
pub mod position;
pub mod rules;
pub mod tree;

pub use geometry::{Color, Point};
pub use input::{KeyCode, KeyEvent, Modifiers, PointerButton};
pub use node::{
    Annotation, AnnotationKind, LabelKind, Move, Node, NodeData, NodeId, NodeKind, StoneDelta,
};
pub use position::Position;
pub use rules::{BasicRules, MoveProposal, MoveValidation, Rules};
pub use tree::{Detached, GameTree, Preorder, TreeEvent};
