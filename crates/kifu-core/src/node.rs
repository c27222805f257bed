#![forbid(unsafe_code)]

//! Nodes of the game-record tree.
//!
//! A [`Node`] is one state in the record: the root, a played move, a pass or
//! resignation, or a batch of stone edits. Every node can carry annotations
//! and a comment. Structural links (`parent`, `children`) are plain
//! [`NodeId`] indices into the owning [`GameTree`](crate::GameTree) arena;
//! the parent link is a back-reference and never owns anything.

use crate::geometry::{Color, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// NodeId
// ============================================================================

/// Stable handle into the tree arena.
///
/// Ids are never reused: a detached subtree keeps its ids so that redo can
/// reattach the very same nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a NodeId from a raw u32 index.
    #[must_use]
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw u32 index.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

// ============================================================================
// Kinds and payloads
// ============================================================================

/// What a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Move,
    Pass,
    Resign,
    StoneEdit,
}

/// A move (or pass) by one player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// Player who moved.
    pub color: Color,
    /// Intersection played; `None` for a pass.
    pub point: Option<Point>,
    /// Stones removed from the board by this move, as reported by the rules
    /// engine when the move was played.
    pub captured: Vec<Point>,
}

impl Move {
    /// A stone placed at `point`.
    #[must_use]
    pub fn play(color: Color, point: Point) -> Self {
        Self {
            color,
            point: Some(point),
            captured: Vec::new(),
        }
    }

    /// A pass.
    #[must_use]
    pub fn pass(color: Color) -> Self {
        Self {
            color,
            point: None,
            captured: Vec::new(),
        }
    }

    /// Attach the captured stones.
    #[must_use]
    pub fn with_captured(mut self, captured: Vec<Point>) -> Self {
        self.captured = captured;
        self
    }
}

/// One stone-edit delta. `color == None` erases whatever stone is there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoneDelta {
    pub point: Point,
    pub color: Option<Color>,
}

impl StoneDelta {
    #[must_use]
    pub const fn place(point: Point, color: Color) -> Self {
        Self {
            point,
            color: Some(color),
        }
    }

    #[must_use]
    pub const fn erase(point: Point) -> Self {
        Self { point, color: None }
    }
}

/// Flavour of label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LabelKind {
    /// `A`, `B`, `C`, ...
    Letter,
    /// `1`, `2`, `3`, ...
    Number,
}

/// A mark drawn on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Annotation {
    Triangle(Point),
    Square(Point),
    Circle(Point),
    Cross(Point),
    Selected(Point),
    Label { point: Point, text: String },
    Line { from: Point, to: Point },
    Arrow { from: Point, to: Point },
}

impl Annotation {
    /// The kind of this mark. Labels report their flavour from the text.
    #[must_use]
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Self::Triangle(_) => AnnotationKind::Triangle,
            Self::Square(_) => AnnotationKind::Square,
            Self::Circle(_) => AnnotationKind::Circle,
            Self::Cross(_) => AnnotationKind::Cross,
            Self::Selected(_) => AnnotationKind::Selected,
            Self::Label { text, .. } => {
                if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
                    AnnotationKind::Label(LabelKind::Number)
                } else {
                    AnnotationKind::Label(LabelKind::Letter)
                }
            }
            Self::Line { .. } => AnnotationKind::Line,
            Self::Arrow { .. } => AnnotationKind::Arrow,
        }
    }

    /// The intersection this mark sits on (the start point for directional
    /// marks).
    #[must_use]
    pub fn anchor(&self) -> Point {
        match self {
            Self::Triangle(p) | Self::Square(p) | Self::Circle(p) | Self::Cross(p) => *p,
            Self::Selected(p) => *p,
            Self::Label { point, .. } => *point,
            Self::Line { from, .. } | Self::Arrow { from, .. } => *from,
        }
    }

    /// Whether the mark occupies `point` as a single-intersection mark.
    ///
    /// Directional marks never occupy an intersection.
    #[must_use]
    pub fn occupies(&self, point: Point) -> bool {
        !self.kind().is_directional() && self.anchor() == point
    }

    /// Label text, if this is a label.
    #[must_use]
    pub fn label_text(&self) -> Option<&str> {
        match self {
            Self::Label { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// The type of a mark, without its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnnotationKind {
    Triangle,
    Square,
    Circle,
    Cross,
    Selected,
    Label(LabelKind),
    Line,
    Arrow,
}

impl AnnotationKind {
    /// Kinds that need two endpoints.
    #[must_use]
    pub const fn is_directional(self) -> bool {
        matches!(self, Self::Line | Self::Arrow)
    }

    #[must_use]
    pub const fn is_label(self) -> bool {
        matches!(self, Self::Label(_))
    }

    /// Whether `annotation` is of this kind. All labels match any label kind
    /// so that letters and numbers replace each other on an intersection.
    #[must_use]
    pub fn matches(self, annotation: &Annotation) -> bool {
        match (self, annotation.kind()) {
            (Self::Label(_), AnnotationKind::Label(_)) => true,
            (a, b) => a == b,
        }
    }

    /// Build a single-intersection mark of this kind.
    ///
    /// Returns `None` for labels (which need text) and directional kinds.
    #[must_use]
    pub fn at(self, point: Point) -> Option<Annotation> {
        match self {
            Self::Triangle => Some(Annotation::Triangle(point)),
            Self::Square => Some(Annotation::Square(point)),
            Self::Circle => Some(Annotation::Circle(point)),
            Self::Cross => Some(Annotation::Cross(point)),
            Self::Selected => Some(Annotation::Selected(point)),
            Self::Label(_) | Self::Line | Self::Arrow => None,
        }
    }

    /// Build a directional mark of this kind.
    #[must_use]
    pub fn between(self, from: Point, to: Point) -> Option<Annotation> {
        match self {
            Self::Line => Some(Annotation::Line { from, to }),
            Self::Arrow => Some(Annotation::Arrow { from, to }),
            _ => None,
        }
    }
}

// ============================================================================
// NodeData / Node
// ============================================================================

/// Payload used to create a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    pub kind: NodeKind,
    pub mv: Option<Move>,
    pub stone_edits: Vec<StoneDelta>,
    pub annotations: BTreeSet<Annotation>,
    pub comment: String,
}

impl NodeData {
    /// An empty payload of the given kind.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            mv: None,
            stone_edits: Vec::new(),
            annotations: BTreeSet::new(),
            comment: String::new(),
        }
    }

    /// A MOVE node, or a PASS node when the move has no point.
    #[must_use]
    pub fn play(mv: Move) -> Self {
        let kind = if mv.point.is_some() {
            NodeKind::Move
        } else {
            NodeKind::Pass
        };
        Self {
            mv: Some(mv),
            ..Self::new(kind)
        }
    }

    #[must_use]
    pub fn resign(color: Color) -> Self {
        Self {
            mv: Some(Move::pass(color)),
            ..Self::new(NodeKind::Resign)
        }
    }

    #[must_use]
    pub fn stone_edit() -> Self {
        Self::new(NodeKind::StoneEdit)
    }

    #[must_use]
    pub fn with_stone(mut self, delta: StoneDelta) -> Self {
        self.stone_edits.retain(|d| d.point != delta.point);
        self.stone_edits.push(delta);
        self
    }

    #[must_use]
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.insert(annotation);
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }
}

/// A node stored in the tree arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    mv: Option<Move>,
    stone_edits: Vec<StoneDelta>,
    annotations: BTreeSet<Annotation>,
    comment: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn from_data(id: NodeId, parent: Option<NodeId>, data: NodeData) -> Self {
        Self {
            id,
            kind: data.kind,
            mv: data.mv,
            stone_edits: data.stone_edits,
            annotations: data.annotations,
            comment: data.comment,
            parent,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Move data for MOVE, PASS and RESIGN nodes.
    #[must_use]
    pub fn mv(&self) -> Option<&Move> {
        self.mv.as_ref()
    }

    /// Stone deltas in the order they were recorded.
    #[must_use]
    pub fn stone_edits(&self) -> &[StoneDelta] {
        &self.stone_edits
    }

    /// The delta recorded at `point`, with its index in the edit list.
    #[must_use]
    pub fn stone_delta_at(&self, point: Point) -> Option<(usize, StoneDelta)> {
        self.stone_edits
            .iter()
            .enumerate()
            .find(|(_, d)| d.point == point)
            .map(|(i, d)| (i, *d))
    }

    #[must_use]
    pub fn annotations(&self) -> &BTreeSet<Annotation> {
        &self.annotations
    }

    /// Single-intersection marks sitting on `point`.
    pub fn annotations_at(&self, point: Point) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.occupies(point))
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Parent back-reference. `None` only for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in branch order; index 0 is the main branch.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The main-branch child, if any.
    #[must_use]
    pub fn main_child(&self) -> Option<NodeId> {
        self.children.first().copied()
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<NodeId> {
        &mut self.children
    }

    pub(crate) fn stone_edits_mut(&mut self) -> &mut Vec<StoneDelta> {
        &mut self.stone_edits
    }

    pub(crate) fn annotations_mut(&mut self) -> &mut BTreeSet<Annotation> {
        &mut self.annotations
    }
}
