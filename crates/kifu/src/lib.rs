#![forbid(unsafe_code)]

//! kifu public facade crate.
//!
//! Re-exports the common types of the internal crates and offers a prelude
//! for day-to-day usage.
//!
//! ```rust,ignore
//! use kifu::prelude::*;
//!
//! let mut doc = Document::new(&EditorConfig::default(), Box::new(BasicRules));
//! let mut mode = PlayMoveMode;
//! mode.on_press(&mut doc, Point::new(3, 3), PointerButton::Primary);
//! doc.undo();
//! ```

// --- Core re-exports -------------------------------------------------------

pub use kifu_core::{
    Annotation, AnnotationKind, BasicRules, Color, GameTree, KeyCode, KeyEvent, LabelKind,
    Modifiers, Move, MoveProposal, MoveValidation, Node, NodeData, NodeId, NodeKind, Point,
    PointerButton, Position, Rules, StoneDelta, TreeEvent,
};

// --- Layout re-exports -----------------------------------------------------

pub use kifu_layout::{GridPos, LayoutConfig, TreeLayout};

// --- Runtime re-exports ----------------------------------------------------

pub use kifu_runtime::{
    AnnotationEdit, AnnotationMode, ConfigError, CursorHint, Document, Edit, EditMode,
    EditorConfig, History, HistoryConfig, PlayMoveEdit, PlayMoveMode, RemoveNodeEdit, StoneEdit,
    StoneEditMode,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Annotation, AnnotationKind, AnnotationMode, BasicRules, Color, CursorHint, Document,
        EditMode, EditorConfig, GameTree, KeyCode, KeyEvent, NodeId, PlayMoveEdit, PlayMoveMode,
        Point, PointerButton, StoneEdit, StoneEditMode,
    };

    pub use crate::{core, layout, runtime};
}

pub use kifu_core as core;
pub use kifu_layout as layout;
pub use kifu_runtime as runtime;
