#![forbid(unsafe_code)]

use kifu_core::{Point, PointerButton};

use super::{CursorHint, EditMode};
use crate::document::Document;
use crate::undo::PlayMoveEdit;

/// Play moves: primary press plays at the point, any other button passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayMoveMode;

impl EditMode for PlayMoveMode {
    fn name(&self) -> &'static str {
        "play"
    }

    fn on_press(&mut self, doc: &mut Document, point: Point, button: PointerButton) -> bool {
        let applied = match button {
            PointerButton::Primary => doc.apply(PlayMoveEdit::new(point)),
            PointerButton::Secondary | PointerButton::Middle => doc.apply(PlayMoveEdit::pass()),
        };
        tracing::debug!(target: "kifu.mode", mode = self.name(), %point, ?button, applied);
        applied
    }

    fn cursor_hint(&self, doc: &Document, point: Point) -> CursorHint {
        if doc.rules().propose_move(doc.tree(), point).is_legal() {
            CursorHint::Stone(doc.rules().next_to_play(doc.tree()))
        } else {
            CursorHint::Default
        }
    }
}
