#![forbid(unsafe_code)]

//! Edit modes: turning pointer and key input into edits.
//!
//! An [`EditMode`] decides *which* edit a gesture means and submits it to the
//! [`Document`]. It never mutates the tree directly, so everything a mode
//! does is undoable.
//!
//! | Mode               | Primary press             | Secondary press   |
//! |--------------------|---------------------------|-------------------|
//! | [`PlayMoveMode`]   | play at the point         | pass              |
//! | [`StoneEditMode`]  | add/withdraw a stone      | erase a stone     |
//! | [`AnnotationMode`] | start a create/delete drag | same             |
//!
//! Points reaching a mode are already board intersections; hit testing
//! belongs to the host.

mod annotate;
mod play;
mod stone;

pub use annotate::{AnnotationMode, GestureAction, next_letter_label, next_number_label};
pub use play::PlayMoveMode;
pub use stone::StoneEditMode;

use kifu_core::{AnnotationKind, Color, KeyEvent, Point, PointerButton};

use crate::document::Document;

/// What the host should show under the pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorHint {
    /// Nothing would happen here.
    Default,
    /// A stone of this color would be placed.
    Stone(Color),
    /// Something would be removed.
    Eraser,
    /// A mark of this kind would be drawn.
    Mark(AnnotationKind),
    /// A label with this text would be drawn.
    Label(String),
}

/// Interaction strategy for the board.
///
/// The `on_*` handlers return true when the document changed (for
/// [`on_key`](Self::on_key): when the key was consumed).
pub trait EditMode {
    /// Short name for logs and status bars.
    fn name(&self) -> &'static str;

    /// A pointer button went down on `point`.
    fn on_press(&mut self, doc: &mut Document, point: Point, button: PointerButton) -> bool;

    /// The pointer moved to `point` with a button held.
    fn on_drag(&mut self, _doc: &mut Document, _point: Point) -> bool {
        false
    }

    /// The held button was released.
    fn on_release(&mut self, _doc: &mut Document) -> bool {
        false
    }

    fn on_key(&mut self, _doc: &mut Document, _key: KeyEvent) -> bool {
        false
    }

    /// What pressing the primary button at `point` would do.
    fn cursor_hint(&self, doc: &Document, point: Point) -> CursorHint;
}
