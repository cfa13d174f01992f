use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use super::error::CoreError;
use super::progress::CancellationToken;
use super::tree::{FileTree, NodeId};

/// Walks `root_path` and builds the project tree.
///
/// The walk is best-effort: entries that cannot be read are logged and left
/// out, a directory whose listing fails keeps its node without children.
/// Symbolic links are never followed and links to directories are skipped.
pub fn build_tree(root_path: &Path, cancel: &CancellationToken) -> Result<FileTree, CoreError> {
    let start = std::time::Instant::now();
    let root_meta = std::fs::metadata(root_path).map_err(|e| CoreError::from_io(e, root_path))?;

    if !root_meta.is_dir() {
        tracing::debug!("Walk target is a single file: {}", root_path.display());
        return Ok(FileTree::new(root_path, false, root_meta.len()));
    }

    let mut tree = FileTree::new(root_path, true, 0);
    // parents[d] is the most recent directory node seen at depth d.
    let mut parents: Vec<NodeId> = vec![tree.root()];
    let mut skipped = 0usize;

    let walker = WalkDir::new(root_path)
        .follow_links(false)
        .max_open(5)
        .min_depth(1)
        .sort_by(directories_first);

    for entry in walker {
        if cancel.is_cancelled() {
            tracing::info!("Tree walk cancelled after {} nodes", tree.len());
            return Err(CoreError::Cancelled);
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                skipped += 1;
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                tracing::warn!("Skipping unreadable entry {}: {}", path.display(), e);
                continue;
            }
        };

        let depth = entry.depth();
        parents.truncate(depth);
        let Some(&parent) = parents.last() else {
            continue;
        };

        let Some((is_directory, file_size)) = classify(&entry) else {
            skipped += 1;
            continue;
        };

        let id = tree.add_child(parent, entry.path(), is_directory, file_size);
        if is_directory {
            parents.push(id);
        }
    }

    tracing::info!(
        "Walked {} in {:?}: {} nodes, {} entries skipped",
        root_path.display(),
        start.elapsed(),
        tree.len(),
        skipped
    );
    Ok(tree)
}

/// Runs [`build_tree`] on the blocking thread pool.
pub async fn build_tree_async(
    root_path: PathBuf,
    cancel: CancellationToken,
) -> Result<FileTree, CoreError> {
    tokio::task::spawn_blocking(move || build_tree(&root_path, &cancel)).await?
}

fn directories_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    b.file_type()
        .is_dir()
        .cmp(&a.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Returns `(is_directory, size)` or `None` when the entry must be skipped.
fn classify(entry: &DirEntry) -> Option<(bool, u64)> {
    let file_type = entry.file_type();
    if file_type.is_dir() {
        return Some((true, 0));
    }
    if file_type.is_symlink() {
        // Resolve the target only to decide whether to keep the link.
        return match std::fs::metadata(entry.path()) {
            Ok(target) if target.is_dir() => {
                tracing::debug!("Skipping symlinked directory: {}", entry.path().display());
                None
            }
            Ok(target) => Some((false, target.len())),
            Err(e) => {
                tracing::warn!("Skipping dangling symlink {}: {}", entry.path().display(), e);
                None
            }
        };
    }
    let size = match entry.metadata() {
        Ok(meta) => meta.len(),
        Err(e) => {
            tracing::debug!("Could not read size of {}: {}", entry.path().display(), e);
            0
        }
    };
    Some((false, size))
}
