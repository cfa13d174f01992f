//! Generates an ASCII representation of the project tree.

use super::filter::FilterEngine;
use super::tree::{FileTree, NodeId};

const HEADER: &str = "Project Structure:\n==================\n\n";
const PINNED_MARKER: &str = " 📌";
const SELECTED_MARKER: &str = " ✓";

/// Which nodes end up in the rendered structure.
#[derive(Clone, Copy)]
pub enum StructureMode<'a> {
    /// Nodes left visible by the last filter pass.
    Visible,
    /// Every path the engine's blacklists let through, whatever its extension.
    Full(&'a FilterEngine),
}

impl StructureMode<'_> {
    fn shows(&self, tree: &FileTree, id: NodeId) -> bool {
        let node = tree.node(id);
        match self {
            StructureMode::Visible => node.is_visible,
            StructureMode::Full(engine) => {
                id == tree.root() || engine.should_show_in_structure(&node.full_path)
            }
        }
    }
}

/// A utility struct for generating the ASCII project structure.
///
/// This struct is stateless and provides methods as associated functions.
pub struct TreeGenerator;

impl TreeGenerator {
    /// Renders the structure header followed by one line per shown node.
    /// Pinned files are marked with a pin, selected files with a check mark.
    pub fn generate_structure(tree: &FileTree, mode: StructureMode<'_>) -> String {
        let mut result = String::from(HEADER);
        let root = tree.root();
        if mode.shows(tree, root) {
            Self::render_node(tree, root, &mode, &mut result, "", true);
        }
        result
    }

    fn render_node(
        tree: &FileTree,
        id: NodeId,
        mode: &StructureMode<'_>,
        result: &mut String,
        prefix: &str,
        is_last: bool,
    ) {
        let node = tree.node(id);
        let connector = if is_last { "└── " } else { "├── " };
        let marker = match (node.is_directory, node.is_pinned, node.is_selected) {
            (true, _, _) => "",
            (false, true, _) => PINNED_MARKER,
            (false, false, true) => SELECTED_MARKER,
            (false, false, false) => "",
        };
        result.push_str(&format!("{prefix}{connector}{}{marker}\n", node.name));

        if !node.is_directory {
            return;
        }

        let shown: Vec<NodeId> = node
            .children
            .iter()
            .copied()
            .filter(|child| mode.shows(tree, *child))
            .collect();
        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };
        for (i, child) in shown.iter().enumerate() {
            Self::render_node(tree, *child, mode, result, &child_prefix, i == shown.len() - 1);
        }
    }
}
