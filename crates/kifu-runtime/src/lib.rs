#![forbid(unsafe_code)]

//! kifu Runtime
//!
//! Reversible editing on top of the game-record tree.
//!
//! # Key Components
//!
//! - [`Edit`] - Closed set of reversible tree mutations
//! - [`History`] - Bounded undo/redo with session merging
//! - [`EditMode`] - Strategy turning pointer/key input into edits
//! - [`Document`] - Tree, history and layout kept in step
//! - [`EditorConfig`] - TOML/JSON-loadable settings
//!
//! # Role in kifu
//! `kifu-runtime` is the orchestrator. Edit modes translate input from
//! `kifu-core` into edits; the history performs them against the tree and
//! the document refreshes the `kifu-layout` grid afterwards.
//!
//! # Logging
//! Events are emitted through `tracing` under the targets `kifu.edit`,
//! `kifu.history`, `kifu.mode` and `kifu.config`. Nothing is printed unless
//! the host installs a subscriber.

pub mod config;
pub mod document;
pub mod modes;
pub mod undo;

pub use config::{ConfigError, EditorConfig};
pub use document::Document;
pub use modes::{AnnotationMode, CursorHint, EditMode, GestureAction, PlayMoveMode, StoneEditMode};
pub use undo::{
    AnnotationEdit, Edit, EditContext, History, HistoryConfig, MoveTarget, PlayMoveEdit,
    RemoveNodeEdit, SessionId, StoneEdit, StoneOp,
};
