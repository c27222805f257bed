#![forbid(unsafe_code)]

//! Structured log output of the editing engine.
//!
//! Installs a capturing `tracing-subscriber` layer and checks that edits,
//! history moves, gestures and layout rebuilds are reported under their
//! targets.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use kifu_core::{AnnotationKind, BasicRules, Point, PointerButton};
use kifu_runtime::{AnnotationMode, Document, EditMode, EditorConfig, PlayMoveEdit};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    target: String,
    fields: HashMap<String, String>,
}

impl CapturedEvent {
    fn message(&self) -> &str {
        self.fields.get("message").map_or("", String::as_str)
    }
}

struct SpanCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl SpanCapture {
    fn new() -> (Self, CaptureHandle) {
        let spans = Arc::new(Mutex::new(Vec::new()));
        let events = Arc::new(Mutex::new(Vec::new()));
        let handle = CaptureHandle {
            spans: spans.clone(),
            events: events.clone(),
        };
        (Self { spans, events }, handle)
    }
}

struct CaptureHandle {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn spans(&self) -> Vec<CapturedSpan> {
        self.spans.lock().unwrap().clone()
    }

    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn events_for(&self, target: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.target == target)
            .collect()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }
    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        let mut fields: HashMap<String, String> = visitor.0.into_iter().collect();
        for field in attrs.metadata().fields() {
            fields.entry(field.name().to_string()).or_default();
        }
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields,
        });
    }

    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);
        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            target: event.metadata().target().to_string(),
            fields,
        });
    }
}

fn with_captured_tracing<F>(f: F) -> CaptureHandle
where
    F: FnOnce(),
{
    let (layer, handle) = SpanCapture::new();
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    handle
}

fn doc() -> Document {
    Document::new(&EditorConfig::default(), Box::new(BasicRules))
}

// =========================================================================
// History
// =========================================================================

#[test]
fn recorded_edit_is_logged() {
    let handle = with_captured_tracing(|| {
        let mut doc = doc();
        doc.apply(PlayMoveEdit::new(Point::new(3, 3)));
    });

    let history = handle.events_for("kifu.history");
    let recorded = history
        .iter()
        .find(|e| e.message() == "edit recorded")
        .expect("expected an 'edit recorded' event");
    assert_eq!(recorded.level, tracing::Level::DEBUG);
    assert_eq!(recorded.fields.get("len").map(String::as_str), Some("1"));

    let edits = handle.events_for("kifu.edit");
    assert!(edits.iter().any(|e| e.message().contains("performed")));
}

#[test]
fn empty_undo_warns() {
    let handle = with_captured_tracing(|| {
        let mut doc = doc();
        assert!(!doc.undo());
        assert!(!doc.redo());
    });

    let warnings: Vec<_> = handle
        .events_for("kifu.history")
        .into_iter()
        .filter(|e| e.level == tracing::Level::WARN)
        .collect();
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].message().contains("nothing to undo"));
    assert!(warnings[1].message().contains("nothing to redo"));
}

#[test]
fn rejected_move_is_logged_but_not_recorded() {
    let handle = with_captured_tracing(|| {
        let mut doc = doc();
        doc.apply(PlayMoveEdit::new(Point::new(0, 0)));
        doc.apply(PlayMoveEdit::new(Point::new(0, 0)));
    });

    let history = handle.events_for("kifu.history");
    assert_eq!(
        history.iter().filter(|e| e.message() == "edit recorded").count(),
        1
    );
    assert!(history.iter().any(|e| e.message().contains("rejected")));
    assert!(
        handle
            .events_for("kifu.edit")
            .iter()
            .any(|e| e.message() == "move rejected")
    );
}

// =========================================================================
// Modes and layout
// =========================================================================

#[test]
fn gesture_start_and_end_are_logged() {
    let handle = with_captured_tracing(|| {
        let mut doc = doc();
        let mut mode = AnnotationMode::new(AnnotationKind::Circle);
        mode.on_press(&mut doc, Point::new(1, 1), PointerButton::Primary);
        mode.on_drag(&mut doc, Point::new(2, 1));
        mode.on_release(&mut doc);
    });

    let modes = handle.events_for("kifu.mode");
    let started = modes
        .iter()
        .find(|e| e.message() == "gesture started")
        .expect("expected 'gesture started'");
    assert_eq!(started.fields.get("mode").map(String::as_str), Some("mark.circle"));
    assert!(started.fields.contains_key("session"));
    assert!(modes.iter().any(|e| e.message() == "gesture finished"));
    assert!(
        handle
            .events_for("kifu.history")
            .iter()
            .any(|e| e.message().contains("merged"))
    );
}

#[test]
fn structural_change_rebuilds_layout_in_span() {
    let handle = with_captured_tracing(|| {
        let mut doc = doc();
        doc.apply(PlayMoveEdit::new(Point::new(4, 4)));
        // Annotations do not touch the structure.
        let root = doc.tree().root();
        let session = doc.begin_session();
        doc.apply(kifu_runtime::AnnotationEdit::add(
            root,
            kifu_core::Annotation::Cross(Point::new(0, 0)),
            session,
        ));
    });

    let rebuilds: Vec<_> = handle
        .spans()
        .into_iter()
        .filter(|s| s.name == "layout.rebuild")
        .collect();
    // One for the initial layout, one for the move.
    assert_eq!(rebuilds.len(), 2);
    assert!(rebuilds[0].fields.contains_key("nodes"));
    assert!(
        handle
            .events_for("kifu.layout")
            .iter()
            .any(|e| e.message() == "layout rebuilt")
    );
}
