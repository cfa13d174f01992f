use std::path::{Path, PathBuf};

use super::selection::refresh_ancestors;
use super::tree::{FileTree, NodeId};

/// Pinned files in the order they were pinned.
///
/// The set mirrors the `is_pinned` flags of the tree it was used with; every
/// mutation goes through both.
#[derive(Debug, Clone, Default)]
pub struct PinSet {
    pinned: Vec<NodeId>,
}

impl PinSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pins a file and clears its selection. Returns `false` for directories
    /// and files that are already pinned.
    pub fn pin(&mut self, tree: &mut FileTree, id: NodeId) -> bool {
        let node = tree.node_mut(id);
        if node.is_directory {
            tracing::debug!("Cannot pin directory: {}", node.full_path.display());
            return false;
        }
        if node.is_pinned {
            tracing::debug!("File already pinned: {}", node.full_path.display());
            return false;
        }
        node.is_pinned = true;
        node.is_selected = false;
        tracing::debug!("Pinned file: {}", node.full_path.display());
        self.pinned.push(id);
        refresh_ancestors(tree, id);
        true
    }

    /// Unpins a file. The file stays deselected.
    pub fn unpin(&mut self, tree: &mut FileTree, id: NodeId) -> bool {
        let node = tree.node_mut(id);
        if !node.is_pinned {
            tracing::debug!("File is not pinned: {}", node.full_path.display());
            return false;
        }
        node.is_pinned = false;
        tracing::debug!("Unpinned file: {}", node.full_path.display());
        self.pinned.retain(|p| *p != id);
        refresh_ancestors(tree, id);
        true
    }

    /// Pins or unpins `id`, returning whether anything changed.
    pub fn toggle_pin(&mut self, tree: &mut FileTree, id: NodeId) -> bool {
        if tree.node(id).is_directory {
            return false;
        }
        if tree.node(id).is_pinned {
            self.unpin(tree, id)
        } else {
            self.pin(tree, id)
        }
    }

    pub fn is_pinned(&self, id: NodeId) -> bool {
        self.pinned.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.pinned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty()
    }

    pub fn pinned_file_paths<'t>(&self, tree: &'t FileTree) -> Vec<&'t Path> {
        self.pinned
            .iter()
            .map(|id| tree.node(*id).full_path.as_path())
            .collect()
    }

    /// Owned variant of [`pinned_file_paths`](Self::pinned_file_paths).
    pub fn pinned_path_bufs(&self, tree: &FileTree) -> Vec<PathBuf> {
        self.pinned_file_paths(tree)
            .into_iter()
            .map(Path::to_path_buf)
            .collect()
    }

    pub fn clear_all(&mut self, tree: &mut FileTree) {
        tracing::debug!("Clearing all {} pinned files", self.pinned.len());
        for id in std::mem::take(&mut self.pinned) {
            tree.node_mut(id).is_pinned = false;
            refresh_ancestors(tree, id);
        }
    }
}
