//! Validation failures from tree edits.

use thiserror::Error;

use crate::outline::NodePath;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EditError {
    #[error("no entry at {0}")]
    NoSuchNode(NodePath),
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("invalid page '{input}': {reason}")]
    InvalidTarget { input: String, reason: String },
    #[error("entry is already at the edge of its level")]
    AtBoundary,
    #[error("entry has no previous sibling to nest under")]
    CannotIndent,
    #[error("entry is already at the top level")]
    CannotOutdent,
    #[error("table of contents is empty")]
    Empty,
    #[error("nothing selected")]
    NothingSelected,
}
