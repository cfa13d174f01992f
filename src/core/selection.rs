//! Bulk and cascading selection over a [`FileTree`].
//!
//! Pinned nodes are never selected. A directory counts as selected exactly when
//! all of its visible, non-pinned children are; a directory without such
//! children is not selected.

use std::path::Path;

use super::tree::{FileTree, NodeId};

/// Selects every visible, non-pinned node.
pub fn select_all(tree: &mut FileTree) {
    let root = tree.root();
    apply_recursive(tree, root, true);
}

/// Clears the selection of every visible, non-pinned node.
pub fn deselect_all(tree: &mut FileTree) {
    let root = tree.root();
    apply_recursive(tree, root, false);
}

/// Returns the derived flag for directories, the requested one for files.
fn apply_recursive(tree: &mut FileTree, id: NodeId, value: bool) -> bool {
    let node = tree.node(id);
    if !node.is_visible || node.is_pinned {
        return node.is_selected;
    }
    if !node.is_directory {
        tree.node_mut(id).is_selected = value;
        return value;
    }
    let children = node.children.clone();
    for child in &children {
        apply_recursive(tree, *child, value);
    }
    let derived = derive_directory_flag(tree, id);
    tree.node_mut(id).is_selected = derived;
    derived
}

fn derive_directory_flag(tree: &FileTree, id: NodeId) -> bool {
    let mut candidates = tree
        .node(id)
        .children
        .iter()
        .map(|c| tree.node(*c))
        .filter(|c| c.is_visible && !c.is_pinned)
        .peekable();
    candidates.peek().is_some() && candidates.all(|c| c.is_selected)
}

/// Sets the selection of `id`, cascading down to its non-pinned descendants and
/// re-deriving the flags of its ancestor directories.
///
/// Returns every node whose flag actually changed. Selecting a pinned node is a
/// no-op.
pub fn set_selected(tree: &mut FileTree, id: NodeId, value: bool) -> Vec<NodeId> {
    let mut changed = Vec::new();
    if tree.node(id).is_pinned {
        return changed;
    }

    let subtree: Vec<NodeId> = tree.descendants(id).collect();
    for node_id in subtree {
        let node = tree.node_mut(node_id);
        if node.is_pinned || node.is_selected == value {
            continue;
        }
        node.is_selected = value;
        changed.push(node_id);
    }

    changed.extend(refresh_ancestors(tree, id));
    changed
}

/// Re-derives the directory flags above `id`, returning those that changed.
pub(crate) fn refresh_ancestors(tree: &mut FileTree, id: NodeId) -> Vec<NodeId> {
    let ancestors: Vec<NodeId> = tree.ancestors(id).collect();
    let mut changed = Vec::new();
    for ancestor in ancestors {
        let derived = derive_directory_flag(tree, ancestor);
        let node = tree.node_mut(ancestor);
        if node.is_selected != derived {
            node.is_selected = derived;
            changed.push(ancestor);
        }
    }
    changed
}

/// Lazily yields the paths of selected, visible files in pre-order.
pub fn selected_file_paths(tree: &FileTree) -> impl Iterator<Item = &Path> + '_ {
    tree.descendants(tree.root()).filter_map(move |id| {
        let node = tree.node(id);
        (!node.is_directory && node.is_selected && node.is_visible).then_some(node.full_path.as_path())
    })
}

pub fn selected_file_count(tree: &FileTree) -> usize {
    selected_file_paths(tree).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tree::test_support::{id, tree_from_paths};
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::path::PathBuf;

    #[test]
    fn select_all_skips_hidden_and_pinned() {
        let mut tree = tree_from_paths(&["src/a.cs", "src/b.cs", "docs/readme.md"]);
        tree.node_mut(id(&tree, "docs/readme.md")).is_visible = false;
        tree.node_mut(id(&tree, "docs")).is_visible = false;
        tree.node_mut(id(&tree, "src/b.cs")).is_pinned = true;

        select_all(&mut tree);

        let selected: Vec<_> = selected_file_paths(&tree).collect();
        assert_eq!(selected, vec![Path::new("/project/src/a.cs")]);
        assert!(!tree.node(id(&tree, "src/b.cs")).is_selected);
        assert!(tree.node(id(&tree, "src")).is_selected);
        assert!(!tree.node(id(&tree, "docs")).is_selected);
    }

    #[test]
    fn directory_without_candidates_is_not_selected() {
        let mut tree = tree_from_paths(&["only/pinned.cs", "empty/"]);
        tree.node_mut(id(&tree, "only/pinned.cs")).is_pinned = true;
        select_all(&mut tree);
        assert!(!tree.node(id(&tree, "only")).is_selected);
        assert!(!tree.node(id(&tree, "empty")).is_selected);
    }

    #[test]
    fn deselect_all_clears_everything_selected() {
        let mut tree = tree_from_paths(&["a/b.cs", "c.cs"]);
        select_all(&mut tree);
        assert_eq!(selected_file_count(&tree), 2);
        deselect_all(&mut tree);
        assert_eq!(selected_file_count(&tree), 0);
        assert!(!tree.node(tree.root()).is_selected);
    }

    #[test]
    fn set_selected_cascades_and_updates_ancestors() {
        let mut tree = tree_from_paths(&["src/app/a.cs", "src/app/b.cs", "src/c.cs"]);
        let app = id(&tree, "src/app");

        let changed = set_selected(&mut tree, app, true);
        assert!(changed.contains(&app));
        assert!(changed.contains(&id(&tree, "src/app/a.cs")));
        assert!(tree.node(id(&tree, "src/app/b.cs")).is_selected);
        // src still has an unselected child.
        assert!(!tree.node(id(&tree, "src")).is_selected);

        let c = id(&tree, "src/c.cs");
        let changed = set_selected(&mut tree, c, true);
        assert!(changed.contains(&id(&tree, "src")));
        assert!(changed.contains(&tree.root()));
        assert!(tree.node(tree.root()).is_selected);

        let changed = { let nid = id(&tree, "src/app/a.cs"); set_selected(&mut tree, nid, false) };
        assert_eq!(changed.len(), 4); // a.cs, app, src, root
        assert!(!tree.node(app).is_selected);
    }

    #[test]
    fn set_selected_leaves_pinned_untouched() {
        let mut tree = tree_from_paths(&["src/a.cs", "src/p.cs"]);
        let pinned = id(&tree, "src/p.cs");
        tree.node_mut(pinned).is_pinned = true;

        assert!(set_selected(&mut tree, pinned, true).is_empty());
        { let nid = id(&tree, "src"); set_selected(&mut tree, nid, true) };
        assert!(!tree.node(pinned).is_selected);
        assert!(tree.node(id(&tree, "src/a.cs")).is_selected);
    }

    #[test]
    fn hidden_selected_files_are_not_reported() {
        let mut tree = tree_from_paths(&["a.cs", "b.cs"]);
        select_all(&mut tree);
        tree.node_mut(id(&tree, "b.cs")).is_visible = false;
        let selected: Vec<_> = selected_file_paths(&tree).collect();
        assert_eq!(selected, vec![Path::new("/project/a.cs")]);
    }

    fn arbitrary_paths() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::vec(
            proptest::collection::vec("[a-d]", 1..4).prop_map(|parts| format!("{}.cs", parts.join("/"))),
            1..15,
        )
    }

    proptest! {
        #[test]
        fn select_all_round_trips_to_visible_unpinned_files(
            paths in arbitrary_paths(),
            hidden in proptest::collection::vec(any::<bool>(), 15),
            pinned in proptest::collection::vec(any::<bool>(), 15),
        ) {
            let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
            let mut tree = tree_from_paths(&refs);
            let files: Vec<NodeId> = tree
                .nodes()
                .filter(|(_, n)| !n.is_directory)
                .map(|(i, _)| i)
                .collect();
            for (k, file) in files.iter().enumerate() {
                let node = tree.node_mut(*file);
                node.is_visible = !hidden[k % hidden.len()];
                node.is_pinned = pinned[k % pinned.len()];
            }

            select_all(&mut tree);

            let selected: BTreeSet<PathBuf> =
                selected_file_paths(&tree).map(Path::to_path_buf).collect();
            let expected: BTreeSet<PathBuf> = files
                .iter()
                .map(|f| tree.node(*f))
                .filter(|n| n.is_visible && !n.is_pinned)
                .map(|n| n.full_path.clone())
                .collect();
            prop_assert_eq!(selected, expected);
        }
    }
}
