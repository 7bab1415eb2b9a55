//! In-memory table of contents tree.

pub mod editor;
pub mod history;

use std::fmt;

use crate::error::EditError;
use crate::target::Target;

/// One bookmark with its nested bookmarks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub title: String,
    pub target: Target,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new<S: Into<String>>(title: S, target: Target) -> Self {
        Node {
            title: title.into(),
            target,
            children: Vec::new(),
        }
    }

    /// Number of nodes in this subtree, not counting `self`.
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}

/// A flattened outline entry: the `[level, title, page]` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u32,
    pub title: String,
    pub target: Target,
}

impl TocEntry {
    pub fn new<S: Into<String>>(level: u32, title: S, target: Target) -> Self {
        TocEntry {
            level,
            title: title.into(),
            target,
        }
    }
}

/// Location of a node as child indices from the top level.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    #[cfg(test)]
    pub fn new(indices: Vec<usize>) -> Self {
        NodePath(indices)
    }

    pub fn top(index: usize) -> Self {
        NodePath(vec![index])
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Index within the parent's children.
    pub fn index(&self) -> usize {
        self.0.last().copied().unwrap_or(0)
    }

    pub fn parent(&self) -> Option<NodePath> {
        if self.0.len() <= 1 {
            None
        } else {
            Some(NodePath(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn child(&self, index: usize) -> NodePath {
        let mut indices = self.0.clone();
        indices.push(index);
        NodePath(indices)
    }

    /// The path of the sibling at `index` under the same parent.
    pub fn sibling(&self, index: usize) -> NodePath {
        let mut indices = self.0.clone();
        if let Some(last) = indices.last_mut() {
            *last = index;
        } else {
            indices.push(index);
        }
        NodePath(indices)
    }

    /// True when `other` lies strictly inside the subtree at `self`.
    pub fn is_ancestor_of(&self, other: &NodePath) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| (i + 1).to_string()).collect();
        write!(f, "#{}", parts.join("."))
    }
}

/// The whole table of contents as an ordered forest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Outline {
    pub roots: Vec<Node>,
}

impl Outline {
    pub fn new(roots: Vec<Node>) -> Self {
        Outline { roots }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of entries at every level.
    pub fn len(&self) -> usize {
        self.roots.iter().map(|n| 1 + n.descendant_count()).sum()
    }

    pub fn get(&self, path: &NodePath) -> Option<&Node> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.roots.get(*first)?;
        for &i in rest {
            node = node.children.get(i)?;
        }
        Some(node)
    }

    pub fn get_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        let (first, rest) = path.indices().split_first()?;
        let mut node = self.roots.get_mut(*first)?;
        for &i in rest {
            node = node.children.get_mut(i)?;
        }
        Some(node)
    }

    /// The list holding the node at `path` and its siblings.
    pub fn siblings(&self, path: &NodePath) -> Option<&Vec<Node>> {
        match path.parent() {
            None => Some(&self.roots),
            Some(parent) => self.get(&parent).map(|n| &n.children),
        }
    }

    fn siblings_mut(&mut self, path: &NodePath) -> Option<&mut Vec<Node>> {
        match path.parent() {
            None => Some(&mut self.roots),
            Some(parent) => self.get_mut(&parent).map(|n| &mut n.children),
        }
    }

    /// Insert `node` so that it ends up at `path`.
    pub fn insert(&mut self, path: &NodePath, node: Node) -> Result<(), EditError> {
        if path.depth() == 0 {
            return Err(EditError::NoSuchNode(path.clone()));
        }
        let index = path.index();
        let siblings = self
            .siblings_mut(path)
            .ok_or_else(|| EditError::NoSuchNode(path.clone()))?;
        if index > siblings.len() {
            return Err(EditError::NoSuchNode(path.clone()));
        }
        siblings.insert(index, node);
        Ok(())
    }

    /// Detach and return the subtree at `path`.
    pub fn remove(&mut self, path: &NodePath) -> Result<Node, EditError> {
        if path.depth() == 0 {
            return Err(EditError::NoSuchNode(path.clone()));
        }
        let index = path.index();
        let siblings = self
            .siblings_mut(path)
            .ok_or_else(|| EditError::NoSuchNode(path.clone()))?;
        if index >= siblings.len() {
            return Err(EditError::NoSuchNode(path.clone()));
        }
        Ok(siblings.remove(index))
    }

    /// Every node in display order together with its path.
    pub fn walk(&self) -> Vec<(NodePath, &Node)> {
        fn visit<'a>(nodes: &'a [Node], prefix: &NodePath, out: &mut Vec<(NodePath, &'a Node)>) {
            for (i, node) in nodes.iter().enumerate() {
                let path = if prefix.depth() == 0 {
                    NodePath::top(i)
                } else {
                    prefix.child(i)
                };
                out.push((path.clone(), node));
                visit(&node.children, &path, out);
            }
        }

        let mut out = Vec::with_capacity(self.len());
        visit(&self.roots, &NodePath::default(), &mut out);
        out
    }

    /// Flatten into `[level, title, target]` entries in display order.
    pub fn entries(&self) -> Vec<TocEntry> {
        self.walk()
            .into_iter()
            .map(|(path, node)| TocEntry {
                level: path.depth() as u32,
                title: node.title.clone(),
                target: node.target,
            })
            .collect()
    }

    /// Rebuild a tree from flat entries.
    ///
    /// An entry may nest at most one level below the entry before it. An entry
    /// that skips levels has no parent, so it goes to the top level and
    /// nesting restarts from it.
    pub fn from_entries<I: IntoIterator<Item = TocEntry>>(entries: I) -> Self {
        let mut outline = Outline::default();
        // Path of the most recently placed node.
        let mut open: Vec<usize> = Vec::new();

        for entry in entries {
            let level = entry.level.max(1) as usize;
            let depth = if level <= open.len() + 1 { level } else { 1 };
            open.truncate(depth - 1);

            let mut siblings = &mut outline.roots;
            for &i in &open {
                siblings = &mut siblings[i].children;
            }
            siblings.push(Node::new(entry.title, entry.target));
            open.push(siblings.len() - 1);
        }

        outline
    }
}
