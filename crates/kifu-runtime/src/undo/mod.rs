#![forbid(unsafe_code)]

//! Undo/redo for game-record edits.
//!
//! Every mutation of a [`GameTree`](kifu_core::GameTree) made on behalf of
//! the user is an [`Edit`]: a closed set of reversible operations that know
//! how to perform and roll themselves back. [`History`] records performed
//! edits behind a cursor so they can be undone and redone.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ History                                                  │
//! │                                                          │
//! │   [ e0 ][ e1 ][ e2 ][ e3 ][ e4 ]                         │
//! │                      ▲                                   │
//! │                   cursor        e3, e4 = redo branch     │
//! │                                                          │
//! │   undo():  rollback e2, cursor → e1                      │
//! │   redo():  cursor → e3, perform e3                       │
//! │   record(e5): drop e3, e4; perform e5; push              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Merge Strategy
//!
//! Annotation edits issued during one drag gesture share a [`SessionId`].
//! When a new annotation edit arrives whose session matches the edit on top
//! of the history, it is folded into that edit instead of being appended,
//! so the whole gesture undoes in one step.
//!
//! # Failure Modes
//!
//! - **Rejected edit** (illegal move, nothing to erase): `perform` returns
//!   false and nothing is recorded. The redo branch is still dropped.
//! - **Contract violation** (rollback of an edit that never performed,
//!   reinsertion under a removed parent): panics.

pub mod edit;
pub mod history;

pub use edit::{
    AnnotationEdit, Edit, EditContext, MoveTarget, PlayMoveEdit, RemoveNodeEdit, SessionId,
    SessionIds, StoneEdit, StoneOp,
};
pub use history::{History, HistoryConfig};
