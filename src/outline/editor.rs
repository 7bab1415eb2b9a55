//! Validated edit operations over an [`Outline`], each recorded for undo.

use tracing::debug;

use super::history::{Edit, History};
use super::{Node, NodePath, Outline};
use crate::error::EditError;
use crate::target::Target;

#[derive(Debug, Clone)]
pub struct EditorOptions {
    pub history_limit: usize,
    pub new_title: String,
    pub new_target: Target,
}

impl Default for EditorOptions {
    fn default() -> Self {
        EditorOptions {
            history_limit: 0,
            new_title: "New Title".to_string(),
            new_target: Target::Page(1),
        }
    }
}

pub struct TocEditor {
    outline: Outline,
    history: History,
    options: EditorOptions,
    revision: u64,
    saved_revision: u64,
}

impl TocEditor {
    pub fn new(outline: Outline, options: EditorOptions) -> Self {
        TocEditor {
            outline,
            history: History::new(options.history_limit),
            options,
            revision: 0,
            saved_revision: 0,
        }
    }

    pub fn outline(&self) -> &Outline {
        &self.outline
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// True when the tree changed since it was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    pub fn mark_saved(&mut self) {
        self.saved_revision = self.revision;
    }

    fn commit(&mut self, edit: Edit) -> Result<(), EditError> {
        edit.apply(&mut self.outline)?;
        debug!(?edit, "edit");
        self.history.push(edit);
        self.revision += 1;
        Ok(())
    }

    fn node(&self, path: &NodePath) -> Result<&Node, EditError> {
        self.outline
            .get(path)
            .ok_or_else(|| EditError::NoSuchNode(path.clone()))
    }

    fn new_node(&self) -> Node {
        Node::new(self.options.new_title.clone(), self.options.new_target)
    }

    /// Insert a fresh entry right after `after`, or at the end of the top level.
    pub fn add_sibling(&mut self, after: Option<&NodePath>) -> Result<NodePath, EditError> {
        let path = match after {
            Some(p) => {
                self.node(p)?;
                p.sibling(p.index() + 1)
            }
            None => NodePath::top(self.outline.roots.len()),
        };
        let node = self.new_node();
        self.commit(Edit::Insert {
            path: path.clone(),
            node,
        })?;
        Ok(path)
    }

    /// Append a fresh entry as the last child of `parent`.
    pub fn add_child(&mut self, parent: &NodePath) -> Result<NodePath, EditError> {
        let path = parent.child(self.node(parent)?.children.len());
        let node = self.new_node();
        self.commit(Edit::Insert {
            path: path.clone(),
            node,
        })?;
        Ok(path)
    }

    pub fn rename(&mut self, path: &NodePath, title: &str) -> Result<(), EditError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EditError::EmptyTitle);
        }
        let old = self.node(path)?.title.clone();
        if old == title {
            return Ok(());
        }
        self.commit(Edit::Rename {
            path: path.clone(),
            old,
            new: title.to_string(),
        })
    }

    /// Parse `text` as a page or page range and assign it.
    pub fn set_target(&mut self, path: &NodePath, text: &str) -> Result<Target, EditError> {
        let new = Target::parse(text).map_err(|e| EditError::InvalidTarget {
            input: text.to_string(),
            reason: e.to_string(),
        })?;
        let old = self.node(path)?.target;
        if old != new {
            self.commit(Edit::Retarget {
                path: path.clone(),
                old,
                new,
            })?;
        }
        Ok(new)
    }

    /// Remove the entry at `path` together with its descendants.
    pub fn delete(&mut self, path: &NodePath) -> Result<Node, EditError> {
        let node = self.node(path)?.clone();
        self.commit(Edit::Remove {
            path: path.clone(),
            node: node.clone(),
        })?;
        Ok(node)
    }

    /// Remove several entries as one undoable step. Returns how many entries
    /// disappeared, descendants included.
    pub fn delete_many(&mut self, paths: &[NodePath]) -> Result<usize, EditError> {
        let mut targets: Vec<NodePath> = paths
            .iter()
            .filter(|p| !paths.iter().any(|other| other.is_ancestor_of(p)))
            .cloned()
            .collect();
        targets.sort();
        targets.dedup();
        if targets.is_empty() {
            return Err(EditError::NothingSelected);
        }

        // Last and deepest first so earlier paths stay valid.
        let mut removed = 0;
        let mut edits = Vec::with_capacity(targets.len());
        for path in targets.into_iter().rev() {
            let node = self.node(&path)?.clone();
            removed += 1 + node.descendant_count();
            edits.push(Edit::Remove { path, node });
        }

        self.commit(Edit::Batch(edits))?;
        Ok(removed)
    }

    /// Delete every entry.
    pub fn clear(&mut self) -> Result<usize, EditError> {
        if self.outline.is_empty() {
            return Err(EditError::Empty);
        }
        let removed = self.outline.len();
        self.commit(Edit::Replace {
            old: self.outline.clone(),
            new: Outline::default(),
        })?;
        Ok(removed)
    }

    pub fn move_up(&mut self, path: &NodePath) -> Result<NodePath, EditError> {
        self.node(path)?;
        let index = path.index();
        if index == 0 {
            return Err(EditError::AtBoundary);
        }
        let to = path.sibling(index - 1);
        self.commit(Edit::Move {
            from: path.clone(),
            to: to.clone(),
        })?;
        Ok(to)
    }

    pub fn move_down(&mut self, path: &NodePath) -> Result<NodePath, EditError> {
        self.node(path)?;
        let index = path.index();
        let count = self.outline.siblings(path).map_or(0, Vec::len);
        if index + 1 >= count {
            return Err(EditError::AtBoundary);
        }
        let to = path.sibling(index + 1);
        self.commit(Edit::Move {
            from: path.clone(),
            to: to.clone(),
        })?;
        Ok(to)
    }

    /// Nest the entry as the last child of its previous sibling.
    pub fn indent(&mut self, path: &NodePath) -> Result<NodePath, EditError> {
        self.node(path)?;
        let index = path.index();
        if index == 0 {
            return Err(EditError::CannotIndent);
        }
        let previous = path.sibling(index - 1);
        let to = previous.child(self.node(&previous)?.children.len());
        self.commit(Edit::Move {
            from: path.clone(),
            to: to.clone(),
        })?;
        Ok(to)
    }

    /// Lift the entry out of its parent, placing it right after the parent.
    pub fn outdent(&mut self, path: &NodePath) -> Result<NodePath, EditError> {
        self.node(path)?;
        let parent = path.parent().ok_or(EditError::CannotOutdent)?;
        let to = parent.sibling(parent.index() + 1);
        self.commit(Edit::Move {
            from: path.clone(),
            to: to.clone(),
        })?;
        Ok(to)
    }

    /// Swap in a whole new tree as one undoable step.
    pub fn replace(&mut self, outline: Outline) -> Result<(), EditError> {
        if outline == self.outline {
            return Ok(());
        }
        self.commit(Edit::Replace {
            old: self.outline.clone(),
            new: outline,
        })
    }

    pub fn undo(&mut self) -> Result<bool, EditError> {
        let undone = self.history.undo(&mut self.outline)?;
        if undone {
            self.revision += 1;
        }
        Ok(undone)
    }

    pub fn redo(&mut self) -> Result<bool, EditError> {
        let redone = self.history.redo(&mut self.outline)?;
        if redone {
            self.revision += 1;
        }
        Ok(redone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::TocEntry;

    fn editor() -> TocEditor {
        let outline = Outline::from_entries(vec![
            TocEntry::new(1, "Preface", Target::Page(1)),
            TocEntry::new(1, "Part I", Target::Page(3)),
            TocEntry::new(2, "Chapter 1", Target::Page(4)),
            TocEntry::new(3, "1.1", Target::Page(5)),
            TocEntry::new(2, "Chapter 2", Target::Page(9)),
            TocEntry::new(1, "Index", Target::Page(20)),
        ]);
        TocEditor::new(outline, EditorOptions::default())
    }

    fn titles(editor: &TocEditor) -> Vec<(u32, String)> {
        editor
            .outline()
            .entries()
            .into_iter()
            .map(|e| (e.level, e.title))
            .collect()
    }

    fn path(indices: &[usize]) -> NodePath {
        NodePath::new(indices.to_vec())
    }

    #[test]
    fn test_add_sibling_after_selection() {
        let mut ed = editor();
        let new = ed.add_sibling(Some(&path(&[1, 0]))).unwrap();
        assert_eq!(new, path(&[1, 1]));
        let node = ed.outline().get(&new).unwrap();
        assert_eq!(node.title, "New Title");
        assert_eq!(node.target, Target::Page(1));
        assert_eq!(ed.outline().get(&path(&[1, 2])).unwrap().title, "Chapter 2");
    }

    #[test]
    fn test_add_sibling_without_selection_appends() {
        let mut ed = editor();
        assert_eq!(ed.add_sibling(None).unwrap(), NodePath::top(3));
    }

    #[test]
    fn test_add_child_appends_last() {
        let mut ed = editor();
        let new = ed.add_child(&path(&[1])).unwrap();
        assert_eq!(new, path(&[1, 2]));
        assert!(ed.is_dirty());
    }

    #[test]
    fn test_rename_rejects_empty() {
        let mut ed = editor();
        assert_eq!(ed.rename(&path(&[0]), "   "), Err(EditError::EmptyTitle));
        assert!(!ed.history().can_undo());
        ed.rename(&path(&[0]), " Foreword ").unwrap();
        assert_eq!(ed.outline().roots[0].title, "Foreword");
    }

    #[test]
    fn test_rename_to_same_title_records_nothing() {
        let mut ed = editor();
        ed.rename(&path(&[0]), "Preface").unwrap();
        assert!(!ed.history().can_undo());
        assert!(!ed.is_dirty());
    }

    #[test]
    fn test_set_target_validates() {
        let mut ed = editor();
        let before = ed.outline().clone();
        let err = ed.set_target(&path(&[0]), "5-").unwrap_err();
        assert!(matches!(err, EditError::InvalidTarget { .. }));
        assert_eq!(ed.outline(), &before);

        let target = ed.set_target(&path(&[0]), "5-10").unwrap();
        assert_eq!(target, Target::Range { start: 5, end: 10 });
        assert_eq!(ed.outline().roots[0].target, target);
    }

    #[test]
    fn test_delete_missing_node() {
        let mut ed = editor();
        assert_eq!(
            ed.delete(&path(&[9])).unwrap_err(),
            EditError::NoSuchNode(path(&[9]))
        );
    }

    #[test]
    fn test_delete_parent_removes_descendants() {
        let mut ed = editor();
        let removed = ed.delete(&path(&[1])).unwrap();
        assert_eq!(removed.descendant_count(), 3);
        assert_eq!(
            titles(&ed),
            vec![(1, "Preface".to_string()), (1, "Index".to_string())]
        );
    }

    #[test]
    fn test_delete_many_is_one_step() {
        let mut ed = editor();
        let before = ed.outline().clone();
        // [1, 0, 0] is covered by its selected ancestor [1, 0].
        let removed = ed
            .delete_many(&[path(&[0]), path(&[1, 0]), path(&[1, 0, 0]), path(&[2])])
            .unwrap();
        assert_eq!(removed, 4);
        assert_eq!(
            titles(&ed),
            vec![(1, "Part I".to_string()), (2, "Chapter 2".to_string())]
        );
        assert!(ed.undo().unwrap());
        assert_eq!(ed.outline(), &before);
        assert!(!ed.history().can_undo());
    }

    #[test]
    fn test_delete_many_empty_selection() {
        let mut ed = editor();
        assert_eq!(ed.delete_many(&[]), Err(EditError::NothingSelected));
    }

    #[test]
    fn test_clear_and_undo() {
        let mut ed = editor();
        let before = ed.outline().clone();
        assert_eq!(ed.clear().unwrap(), 6);
        assert!(ed.outline().is_empty());
        assert_eq!(ed.clear(), Err(EditError::Empty));
        ed.undo().unwrap();
        assert_eq!(ed.outline(), &before);
    }

    #[test]
    fn test_move_up_and_down() {
        let mut ed = editor();
        assert_eq!(ed.move_up(&path(&[0])), Err(EditError::AtBoundary));
        assert_eq!(ed.move_down(&path(&[1, 1])), Err(EditError::AtBoundary));

        let moved = ed.move_down(&path(&[1, 0])).unwrap();
        assert_eq!(moved, path(&[1, 1]));
        assert_eq!(ed.outline().get(&moved).unwrap().title, "Chapter 1");
        assert_eq!(ed.outline().get(&path(&[1, 1, 0])).unwrap().title, "1.1");

        let moved = ed.move_up(&path(&[2])).unwrap();
        assert_eq!(moved, path(&[1]));
        assert_eq!(ed.outline().roots[1].title, "Index");
    }

    #[test]
    fn test_indent_and_outdent() {
        let mut ed = editor();
        assert_eq!(ed.indent(&path(&[0])), Err(EditError::CannotIndent));
        assert_eq!(ed.outdent(&path(&[0])), Err(EditError::CannotOutdent));

        let nested = ed.indent(&path(&[2])).unwrap();
        assert_eq!(nested, path(&[1, 2]));
        assert_eq!(ed.outline().roots.len(), 2);

        let lifted = ed.outdent(&path(&[1, 0, 0])).unwrap();
        assert_eq!(lifted, path(&[1, 1]));
        assert_eq!(
            titles(&ed),
            vec![
                (1, "Preface".to_string()),
                (1, "Part I".to_string()),
                (2, "Chapter 1".to_string()),
                (2, "1.1".to_string()),
                (2, "Chapter 2".to_string()),
                (2, "Index".to_string()),
            ]
        );
    }

    #[test]
    fn test_every_edit_undoes_exactly() {
        let ops: [fn(&mut TocEditor); 7] = [
            |ed: &mut TocEditor| {
                ed.add_child(&NodePath::top(0)).unwrap();
            },
            |ed: &mut TocEditor| {
                ed.rename(&NodePath::new(vec![1, 1]), "Two").unwrap();
            },
            |ed: &mut TocEditor| {
                ed.set_target(&NodePath::top(2), "20-25").unwrap();
            },
            |ed: &mut TocEditor| {
                ed.delete(&NodePath::new(vec![1, 0])).unwrap();
            },
            |ed: &mut TocEditor| {
                ed.indent(&NodePath::new(vec![1, 1])).unwrap();
            },
            |ed: &mut TocEditor| {
                ed.outdent(&NodePath::new(vec![1, 0, 0])).unwrap();
            },
            |ed: &mut TocEditor| {
                ed.replace(Outline::default()).unwrap();
            },
        ];

        for op in ops {
            let mut ed = editor();
            let before = ed.outline().clone();
            op(&mut ed);
            assert_ne!(ed.outline(), &before);
            assert!(ed.undo().unwrap());
            assert_eq!(ed.outline(), &before);
        }
    }

    #[test]
    fn test_dirty_tracking() {
        let mut ed = editor();
        assert!(!ed.is_dirty());
        ed.add_sibling(None).unwrap();
        assert!(ed.is_dirty());
        ed.mark_saved();
        assert!(!ed.is_dirty());
        ed.undo().unwrap();
        assert!(ed.is_dirty());
    }
}
