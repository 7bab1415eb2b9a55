//! Undo/redo stack of invertible tree edits.

use std::collections::VecDeque;

use tracing::debug;

use super::{Node, NodePath, Outline};
use crate::error::EditError;
use crate::target::Target;

/// A single recorded change. Every edit carries enough state to build its inverse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Insert { path: NodePath, node: Node },
    Remove { path: NodePath, node: Node },
    Rename { path: NodePath, old: String, new: String },
    Retarget { path: NodePath, old: Target, new: Target },
    /// Detach the subtree at `from`, then insert it at `to` (a path in the
    /// tree after the detach).
    Move { from: NodePath, to: NodePath },
    Replace { old: Outline, new: Outline },
    Batch(Vec<Edit>),
}

impl Edit {
    pub fn inverse(&self) -> Edit {
        match self {
            Edit::Insert { path, node } => Edit::Remove {
                path: path.clone(),
                node: node.clone(),
            },
            Edit::Remove { path, node } => Edit::Insert {
                path: path.clone(),
                node: node.clone(),
            },
            Edit::Rename { path, old, new } => Edit::Rename {
                path: path.clone(),
                old: new.clone(),
                new: old.clone(),
            },
            Edit::Retarget { path, old, new } => Edit::Retarget {
                path: path.clone(),
                old: *new,
                new: *old,
            },
            Edit::Move { from, to } => Edit::Move {
                from: to.clone(),
                to: from.clone(),
            },
            Edit::Replace { old, new } => Edit::Replace {
                old: new.clone(),
                new: old.clone(),
            },
            Edit::Batch(edits) => Edit::Batch(edits.iter().rev().map(Edit::inverse).collect()),
        }
    }

    /// Apply to `outline`. A failed batch leaves the outline as it was.
    pub fn apply(&self, outline: &mut Outline) -> Result<(), EditError> {
        match self {
            Edit::Insert { path, node } => outline.insert(path, node.clone()),
            Edit::Remove { path, .. } => outline.remove(path).map(|_| ()),
            Edit::Rename { path, new, .. } => {
                let node = outline
                    .get_mut(path)
                    .ok_or_else(|| EditError::NoSuchNode(path.clone()))?;
                node.title = new.clone();
                Ok(())
            }
            Edit::Retarget { path, new, .. } => {
                let node = outline
                    .get_mut(path)
                    .ok_or_else(|| EditError::NoSuchNode(path.clone()))?;
                node.target = *new;
                Ok(())
            }
            Edit::Move { from, to } => {
                let node = outline.remove(from)?;
                if let Err(e) = outline.insert(to, node.clone()) {
                    // Put it back where it came from.
                    outline.insert(from, node)?;
                    return Err(e);
                }
                Ok(())
            }
            Edit::Replace { new, .. } => {
                *outline = new.clone();
                Ok(())
            }
            Edit::Batch(edits) => {
                for (done, edit) in edits.iter().enumerate() {
                    if let Err(e) = edit.apply(outline) {
                        for applied in edits[..done].iter().rev() {
                            applied.inverse().apply(outline)?;
                        }
                        return Err(e);
                    }
                }
                Ok(())
            }
        }
    }
}

/// Linear undo history. A `limit` of zero keeps every record.
#[derive(Debug, Default)]
pub struct History {
    undo: VecDeque<Edit>,
    redo: Vec<Edit>,
    limit: usize,
}

impl History {
    pub fn new(limit: usize) -> Self {
        History {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Record an edit that has already been applied.
    pub fn push(&mut self, edit: Edit) {
        self.redo.clear();
        self.undo.push_back(edit);
        if self.limit > 0 {
            while self.undo.len() > self.limit {
                self.undo.pop_front();
            }
        }
    }

    /// Revert the latest edit. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self, outline: &mut Outline) -> Result<bool, EditError> {
        let Some(edit) = self.undo.pop_back() else {
            return Ok(false);
        };
        edit.inverse().apply(outline)?;
        debug!(?edit, "undo");
        self.redo.push(edit);
        Ok(true)
    }

    /// Re-apply the latest undone edit. Returns `false` when there is nothing to redo.
    pub fn redo(&mut self, outline: &mut Outline) -> Result<bool, EditError> {
        let Some(edit) = self.redo.pop() else {
            return Ok(false);
        };
        edit.apply(outline)?;
        debug!(?edit, "redo");
        self.undo.push_back(edit);
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Number of undoable records.
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }
}
