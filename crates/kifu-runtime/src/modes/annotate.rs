#![forbid(unsafe_code)]

//! Drawing marks, labels and lines.
//!
//! A press on an intersection starts a gesture. If the point already carries
//! a mark of the mode's kind the gesture *deletes* such marks, otherwise it
//! *creates* them; dragging applies the same action to every intersection
//! the pointer enters. All edits of one gesture share a session, so the
//! history merges them into a single undo step.
//!
//! Lines and arrows need two endpoints: the first press is remembered and the
//! second press at a different point draws (or erases) the mark. `Escape`
//! forgets a pending first endpoint.

use std::collections::BTreeSet;

use kifu_core::{Annotation, AnnotationKind, KeyCode, KeyEvent, LabelKind, NodeId, Point, PointerButton};

use super::{CursorHint, EditMode};
use crate::document::Document;
use crate::undo::{AnnotationEdit, SessionId};

/// What a gesture does to the intersections it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureAction {
    Create,
    Delete,
}

#[derive(Debug, Clone, Copy)]
struct Gesture {
    session: SessionId,
    action: GestureAction,
    node: NodeId,
    last: Point,
}

/// Annotate the current node with marks of one kind.
#[derive(Debug, Clone)]
pub struct AnnotationMode {
    kind: AnnotationKind,
    gesture: Option<Gesture>,
    pending: Option<Point>,
    next_label: Option<String>,
}

impl AnnotationMode {
    #[must_use]
    pub fn new(kind: AnnotationKind) -> Self {
        Self {
            kind,
            gesture: None,
            pending: None,
            next_label: None,
        }
    }

    #[must_use]
    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    /// Action of the gesture in progress.
    #[must_use]
    pub fn gesture(&self) -> Option<GestureAction> {
        self.gesture.map(|g| g.action)
    }

    /// First endpoint of a line or arrow awaiting its second press.
    #[must_use]
    pub fn pending_endpoint(&self) -> Option<Point> {
        self.pending
    }

    fn press_directional(&mut self, doc: &mut Document, point: Point) -> bool {
        let from = match self.pending {
            Some(from) if from != point => from,
            _ => {
                self.pending = Some(point);
                return false;
            }
        };
        self.pending = None;
        let Some(mark) = self.kind.between(from, point) else {
            return false;
        };
        let node = doc.current();
        let session = doc.begin_session();
        let edit = if doc.tree().node(node).annotations().contains(&mark) {
            AnnotationEdit::remove(node, mark, session)
        } else {
            AnnotationEdit::add(node, mark, session)
        };
        doc.apply(edit)
    }

    /// Apply the gesture's action at `point`.
    fn touch(&mut self, doc: &mut Document, gesture: Gesture, point: Point) -> bool {
        if !point.in_bounds(doc.tree().board_size()) {
            return false;
        }
        let node = doc.tree().node(gesture.node);
        let existing: Vec<Annotation> = node.annotations_at(point).cloned().collect();
        let has_kind = existing.iter().any(|a| self.kind.matches(a));

        let edit = match gesture.action {
            GestureAction::Delete => {
                if !has_kind {
                    return false;
                }
                let kind = self.kind;
                let marks = existing.into_iter().filter(|a| kind.matches(a));
                AnnotationEdit::new(gesture.node, [], marks, gesture.session)
            }
            GestureAction::Create => {
                if has_kind {
                    return false;
                }
                let mark = match self.kind {
                    AnnotationKind::Label(flavour) => Annotation::Label {
                        point,
                        text: self.take_label_text(node.annotations(), flavour),
                    },
                    kind => match kind.at(point) {
                        Some(mark) => mark,
                        None => return false,
                    },
                };
                // One mark per intersection: whatever sits there is replaced.
                AnnotationEdit::new(gesture.node, [mark], existing, gesture.session)
            }
        };
        doc.apply(edit)
    }

    /// Text for the label about to be placed: the one computed at the end of
    /// the previous gesture if it is still free, a fresh one otherwise.
    fn take_label_text(&mut self, annotations: &BTreeSet<Annotation>, flavour: LabelKind) -> String {
        match self.next_label.take() {
            Some(text) if !label_in_use(annotations, &text) => text,
            _ => next_label(annotations, flavour),
        }
    }
}

impl EditMode for AnnotationMode {
    fn name(&self) -> &'static str {
        match self.kind {
            AnnotationKind::Triangle => "mark.triangle",
            AnnotationKind::Square => "mark.square",
            AnnotationKind::Circle => "mark.circle",
            AnnotationKind::Cross => "mark.cross",
            AnnotationKind::Selected => "mark.selected",
            AnnotationKind::Label(LabelKind::Letter) => "label.letter",
            AnnotationKind::Label(LabelKind::Number) => "label.number",
            AnnotationKind::Line => "line",
            AnnotationKind::Arrow => "arrow",
        }
    }

    fn on_press(&mut self, doc: &mut Document, point: Point, button: PointerButton) -> bool {
        if button == PointerButton::Middle {
            return false;
        }
        if self.kind.is_directional() {
            return self.press_directional(doc, point);
        }

        let node = doc.current();
        let action = if doc
            .tree()
            .node(node)
            .annotations_at(point)
            .any(|a| self.kind.matches(a))
        {
            GestureAction::Delete
        } else {
            GestureAction::Create
        };
        let gesture = Gesture {
            session: doc.begin_session(),
            action,
            node,
            last: point,
        };
        self.gesture = Some(gesture);
        tracing::debug!(
            target: "kifu.mode",
            mode = self.name(),
            session = %gesture.session,
            ?action,
            %point,
            "gesture started"
        );
        self.touch(doc, gesture, point)
    }

    fn on_drag(&mut self, doc: &mut Document, point: Point) -> bool {
        let Some(mut gesture) = self.gesture else {
            return false;
        };
        if gesture.last == point {
            return false;
        }
        gesture.last = point;
        self.gesture = Some(gesture);
        self.touch(doc, gesture, point)
    }

    fn on_release(&mut self, doc: &mut Document) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        if let AnnotationKind::Label(flavour) = self.kind {
            let annotations = doc.tree().current_node().annotations();
            self.next_label = Some(next_label(annotations, flavour));
        }
        tracing::debug!(
            target: "kifu.mode",
            mode = self.name(),
            session = %gesture.session,
            "gesture finished"
        );
        false
    }

    fn on_key(&mut self, _doc: &mut Document, key: KeyEvent) -> bool {
        if key.code == KeyCode::Escape && self.pending.take().is_some() {
            tracing::debug!(target: "kifu.mode", mode = self.name(), "pending endpoint cleared");
            return true;
        }
        false
    }

    fn cursor_hint(&self, doc: &Document, point: Point) -> CursorHint {
        if !point.in_bounds(doc.tree().board_size()) {
            return CursorHint::Default;
        }
        let node = doc.tree().current_node();
        if !self.kind.is_directional() && node.annotations_at(point).any(|a| self.kind.matches(a)) {
            return CursorHint::Eraser;
        }
        match self.kind {
            AnnotationKind::Label(flavour) => {
                let text = match &self.next_label {
                    Some(text) if !label_in_use(node.annotations(), text) => text.clone(),
                    _ => next_label(node.annotations(), flavour),
                };
                CursorHint::Label(text)
            }
            kind => CursorHint::Mark(kind),
        }
    }
}

// ============================================================================
// Label progression
// ============================================================================

fn next_label(annotations: &BTreeSet<Annotation>, flavour: LabelKind) -> String {
    match flavour {
        LabelKind::Letter => next_letter_label(annotations),
        LabelKind::Number => next_number_label(annotations),
    }
}

fn label_in_use(annotations: &BTreeSet<Annotation>, text: &str) -> bool {
    annotations.iter().any(|a| a.label_text() == Some(text))
}

/// The first letter `A..=Z` not used by a letter label; `A` when all are
/// taken.
#[must_use]
pub fn next_letter_label(annotations: &BTreeSet<Annotation>) -> String {
    let used: BTreeSet<&str> = annotations
        .iter()
        .filter(|a| a.kind() == AnnotationKind::Label(LabelKind::Letter))
        .filter_map(Annotation::label_text)
        .collect();
    ('A'..='Z')
        .map(String::from)
        .find(|letter| !used.contains(letter.as_str()))
        .unwrap_or_else(|| "A".to_owned())
}

/// One more than the largest numeric label, starting at `1`.
#[must_use]
pub fn next_number_label(annotations: &BTreeSet<Annotation>) -> String {
    let max = annotations
        .iter()
        .filter_map(Annotation::label_text)
        .filter_map(|text| text.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    max.saturating_add(1).to_string()
}
