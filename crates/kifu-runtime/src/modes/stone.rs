#![forbid(unsafe_code)]

use kifu_core::{Color, Point, PointerButton};

use super::{CursorHint, EditMode};
use crate::document::Document;
use crate::undo::StoneEdit;

/// Set up stones of one color.
///
/// A primary press toggles a stone of `color` at the point following the
/// stone-edit placement policy; a secondary press erases whatever stone is
/// there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoneEditMode {
    color: Color,
}

impl StoneEditMode {
    #[must_use]
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }
}

impl EditMode for StoneEditMode {
    fn name(&self) -> &'static str {
        match self.color {
            Color::Black => "stone.black",
            Color::White => "stone.white",
        }
    }

    fn on_press(&mut self, doc: &mut Document, point: Point, button: PointerButton) -> bool {
        let applied = match button {
            PointerButton::Primary => doc.apply(StoneEdit::add(None, point, self.color)),
            PointerButton::Secondary => doc.apply(StoneEdit::remove(None, point)),
            PointerButton::Middle => false,
        };
        tracing::debug!(target: "kifu.mode", mode = self.name(), %point, ?button, applied);
        applied
    }

    fn cursor_hint(&self, doc: &Document, point: Point) -> CursorHint {
        let position = doc.position();
        if !position.in_bounds(point) {
            CursorHint::Default
        } else if position.stone_at(point).is_some() {
            CursorHint::Eraser
        } else {
            CursorHint::Stone(self.color)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::modes::PlayMoveMode;
    use kifu_core::{BasicRules, NodeKind, StoneDelta};

    fn doc() -> Document {
        Document::new(&EditorConfig::default(), Box::new(BasicRules))
    }

    #[test]
    fn setup_stones_go_on_the_root() {
        let mut doc = doc();
        let mut mode = StoneEditMode::new(Color::Black);
        let p = Point::new(3, 3);

        assert!(mode.on_press(&mut doc, p, PointerButton::Primary));
        assert_eq!(doc.current(), doc.tree().root());
        assert_eq!(
            doc.tree().current_node().stone_edits(),
            &[StoneDelta::place(p, Color::Black)]
        );

        // Pressing again withdraws the stone this node placed.
        assert!(mode.on_press(&mut doc, p, PointerButton::Primary));
        assert!(doc.tree().current_node().stone_edits().is_empty());
        assert_eq!(doc.history().len(), 2);
    }

    #[test]
    fn edits_after_a_move_get_their_own_node() {
        let mut doc = doc();
        PlayMoveMode.on_press(&mut doc, Point::new(0, 0), PointerButton::Primary);
        let moved = doc.current();

        let mut mode = StoneEditMode::new(Color::White);
        assert!(mode.on_press(&mut doc, Point::new(1, 1), PointerButton::Primary));
        let edited = doc.current();
        assert_ne!(edited, moved);
        assert_eq!(doc.tree().node(edited).kind(), NodeKind::StoneEdit);

        // The next edit reuses the same node.
        assert!(mode.on_press(&mut doc, Point::new(2, 2), PointerButton::Primary));
        assert_eq!(doc.current(), edited);
        assert_eq!(doc.tree().node(edited).stone_edits().len(), 2);
    }

    #[test]
    fn secondary_erases() {
        let mut doc = doc();
        PlayMoveMode.on_press(&mut doc, Point::new(0, 0), PointerButton::Primary);
        let mut mode = StoneEditMode::new(Color::White);

        assert!(mode.on_press(&mut doc, Point::new(0, 0), PointerButton::Secondary));
        assert_eq!(doc.position().stone_at(Point::new(0, 0)), None);
        assert!(!mode.on_press(&mut doc, Point::new(5, 5), PointerButton::Secondary));
        assert!(!mode.on_press(&mut doc, Point::new(5, 5), PointerButton::Middle));
    }

    #[test]
    fn hint_reflects_board() {
        let mut doc = doc();
        let mut mode = StoneEditMode::new(Color::White);
        let p = Point::new(4, 4);
        assert_eq!(mode.cursor_hint(&doc, p), CursorHint::Stone(Color::White));
        mode.on_press(&mut doc, p, PointerButton::Primary);
        assert_eq!(mode.cursor_hint(&doc, p), CursorHint::Eraser);
        assert_eq!(mode.cursor_hint(&doc, Point::new(30, 0)), CursorHint::Default);
        assert_eq!(mode.name(), "stone.white");
    }
}
