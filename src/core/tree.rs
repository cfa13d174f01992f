//! The in-memory project tree.
//!
//! Nodes live in a flat arena owned by [`FileTree`]. Children are stored as
//! index lists and the parent link is an optional index, so upward traversal
//! never needs shared ownership.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Index of a node inside its [`FileTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }
}

/// One file system entry of the loaded project.
#[derive(Debug, Clone)]
pub struct FileTreeNode {
    pub name: String,
    pub full_path: PathBuf,
    pub is_directory: bool,
    /// Directories first, then files, each in ascending path order.
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    /// Outcome of the last filter pass. Defaults to `true`.
    pub is_visible: bool,
    pub is_selected: bool,
    pub is_pinned: bool,
    /// Set by name or content searches.
    pub is_search_match: bool,
    /// Byte length at walk time; always 0 for directories.
    pub file_size: u64,
}

impl FileTreeNode {
    fn new(full_path: PathBuf, is_directory: bool, file_size: u64, parent: Option<NodeId>) -> Self {
        let name = full_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| full_path.to_string_lossy().to_string());
        Self {
            name,
            full_path,
            is_directory,
            children: Vec::new(),
            parent,
            is_visible: true,
            is_selected: false,
            is_pinned: false,
            is_search_match: false,
            file_size,
        }
    }
}

/// An arena-backed, rooted, acyclic tree of [`FileTreeNode`]s.
#[derive(Debug, Clone)]
pub struct FileTree {
    nodes: Vec<FileTreeNode>,
}

impl FileTree {
    /// Creates a tree holding only its root node.
    pub fn new(root_path: impl Into<PathBuf>, is_directory: bool, file_size: u64) -> Self {
        Self {
            nodes: vec![FileTreeNode::new(root_path.into(), is_directory, file_size, None)],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Appends a child under `parent` and returns its id.
    ///
    /// Callers are responsible for adding children in display order.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        full_path: impl Into<PathBuf>,
        is_directory: bool,
        file_size: u64,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(FileTreeNode::new(
            full_path.into(),
            is_directory,
            file_size,
            Some(parent),
        ));
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> &FileTreeNode {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut FileTreeNode {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&FileTreeNode> {
        self.nodes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in arena order, which is walk (pre-)order for walker-built trees.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &FileTreeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    pub(crate) fn raw_nodes(&self) -> &[FileTreeNode] {
        &self.nodes
    }

    pub(crate) fn raw_nodes_mut(&mut self) -> &mut [FileTreeNode] {
        &mut self.nodes
    }

    /// Finds a node by its exact full path.
    pub fn find_by_path(&self, path: &Path) -> Option<NodeId> {
        self.nodes
            .iter()
            .position(|n| n.full_path == path)
            .map(NodeId)
    }

    /// Pre-order traversal of `id` and everything below it.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            stack: vec![id],
        }
    }

    /// Ancestors of `id`, nearest first, excluding `id` itself.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.node(id).parent, move |p| self.node(*p).parent)
    }
}

/// Pre-order iterator returned by [`FileTree::descendants`].
pub struct Descendants<'a> {
    tree: &'a FileTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.node(id).children.iter().rev().copied());
        Some(id)
    }
}
