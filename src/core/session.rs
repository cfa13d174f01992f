//! The loaded project and everything the user did to it.
//!
//! A session owns the tree and the pin set. Loading another directory means
//! building a new session; [`ProjectSession::close`] consumes the old one.

use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::file_system::FileSystem;
use super::filter::{FilterEngine, FilterSummary};
use super::ignore::{read_gitignore, IgnoreFilter};
use super::packer::{GeneratedPart, PackRequest, PartPacker};
use super::pins::PinSet;
use super::progress::{CancellationToken, ProgressSink};
use super::selection;
use super::tree::{FileTree, NodeId};
use super::tree_generator::{StructureMode, TreeGenerator};
use super::walker::build_tree_async;

const GITIGNORE_FILE: &str = ".gitignore";

pub struct ProjectSession {
    root_path: PathBuf,
    tree: FileTree,
    pins: PinSet,
    gitignore_path: Option<PathBuf>,
    gitignore_patterns: Vec<String>,
}

impl ProjectSession {
    /// Validates `path`, walks it off the async runtime and picks up a
    /// `.gitignore` at its root.
    pub async fn load(
        path: impl AsRef<Path>,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Self, CoreError> {
        let root_path = path.as_ref().to_path_buf();
        let start = std::time::Instant::now();
        tracing::info!("Loading project from: {}", root_path.display());
        let report = |status: &str, percent: f64| {
            if let Some(sink) = progress {
                sink.report(status, Some(percent));
            }
        };

        report("Validating folder...", 10.0);
        let is_dir = tokio::fs::metadata(&root_path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            tracing::error!("Directory not found: {}", root_path.display());
            return Err(CoreError::ProjectLoad {
                path: root_path.clone(),
                reason: format!("Directory does not exist: {}", root_path.display()),
            });
        }

        report("Loading project structure...", 30.0);
        let cancel = progress
            .map(|p| p.cancellation().clone())
            .unwrap_or_else(CancellationToken::new);
        let tree = match build_tree_async(root_path.clone(), cancel).await {
            Ok(tree) => tree,
            Err(CoreError::Cancelled) => {
                if let Some(sink) = progress {
                    sink.clear();
                }
                return Err(CoreError::Cancelled);
            }
            Err(e) => {
                tracing::error!(
                    "Failed to load project from {} after {:?}: {}",
                    root_path.display(),
                    start.elapsed(),
                    e
                );
                if let Some(sink) = progress {
                    sink.clear();
                }
                return Err(CoreError::ProjectLoad {
                    path: root_path,
                    reason: format!("Failed to load project: {e}"),
                });
            }
        };

        report("Reading .gitignore...", 60.0);
        let candidate = root_path.join(GITIGNORE_FILE);
        let (gitignore_path, gitignore_patterns) = if tokio::fs::try_exists(&candidate)
            .await
            .unwrap_or(false)
        {
            tracing::info!("Found .gitignore at: {}", candidate.display());
            let patterns = read_gitignore(&candidate).await;
            (Some(candidate), patterns)
        } else {
            (None, Vec::new())
        };

        report("Finalizing...", 90.0);
        tracing::info!(
            "Project loaded from {} in {:?}. Files/Folders: {}",
            root_path.display(),
            start.elapsed(),
            tree.len()
        );
        report("Project loaded successfully!", 100.0);
        if let Some(sink) = progress {
            sink.clear();
        }

        Ok(Self {
            root_path,
            tree,
            pins: PinSet::new(),
            gitignore_path,
            gitignore_patterns,
        })
    }

    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut FileTree {
        &mut self.tree
    }

    pub fn pins(&self) -> &PinSet {
        &self.pins
    }

    pub fn has_local_gitignore(&self) -> bool {
        self.gitignore_path.is_some()
    }

    pub fn gitignore_patterns(&self) -> &[String] {
        &self.gitignore_patterns
    }

    pub fn node_count(&self) -> usize {
        self.tree.len()
    }

    /// Builds an engine rooted at this project. The detected `.gitignore` only
    /// takes part when `use_gitignore` is set.
    pub fn filter_engine<S: AsRef<str>>(
        &self,
        allowed_extensions: &[S],
        active_filters: &[IgnoreFilter],
        use_gitignore: bool,
    ) -> FilterEngine {
        let gitignore: &[String] = if use_gitignore {
            &self.gitignore_patterns
        } else {
            &[]
        };
        FilterEngine::new(allowed_extensions, active_filters, gitignore, &self.root_path)
    }

    pub fn apply_filters(
        &mut self,
        engine: &FilterEngine,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<FilterSummary, CoreError> {
        engine.apply_filters(&mut self.tree, progress)
    }

    /// Finds the node for an absolute path or a path relative to the root.
    pub fn resolve(&self, path: &Path) -> Option<NodeId> {
        if path.is_absolute() {
            self.tree.find_by_path(path)
        } else {
            self.tree.find_by_path(&self.root_path.join(path))
        }
    }

    fn resolve_or_err(&self, path: &Path) -> Result<NodeId, CoreError> {
        self.resolve(path)
            .ok_or_else(|| CoreError::PathNotFound(path.to_path_buf()))
    }

    /// Pins the file at `path`. Returns whether it was newly pinned.
    pub fn pin_path(&mut self, path: &Path) -> Result<bool, CoreError> {
        let id = self.resolve_or_err(path)?;
        Ok(self.pins.pin(&mut self.tree, id))
    }

    pub fn unpin_path(&mut self, path: &Path) -> Result<bool, CoreError> {
        let id = self.resolve_or_err(path)?;
        Ok(self.pins.unpin(&mut self.tree, id))
    }

    /// Selects or deselects `path` with the usual cascade.
    pub fn select_path(&mut self, path: &Path, value: bool) -> Result<Vec<NodeId>, CoreError> {
        let id = self.resolve_or_err(path)?;
        Ok(selection::set_selected(&mut self.tree, id, value))
    }

    pub fn select_all(&mut self) {
        selection::select_all(&mut self.tree);
    }

    pub fn deselect_all(&mut self) {
        selection::deselect_all(&mut self.tree);
    }

    pub fn pinned_file_paths(&self) -> Vec<PathBuf> {
        self.pins.pinned_path_bufs(&self.tree)
    }

    pub fn selected_file_paths(&self) -> Vec<PathBuf> {
        selection::selected_file_paths(&self.tree)
            .map(Path::to_path_buf)
            .collect()
    }

    /// Snapshot of the current pins and selection as a packing request.
    pub fn pack_request(
        &self,
        max_chars: usize,
        include_headers: bool,
        global_prompt: Option<String>,
    ) -> PackRequest {
        PackRequest::new(&self.root_path, max_chars)
            .pinned(self.pinned_file_paths())
            .selected(self.selected_file_paths())
            .include_headers(include_headers)
            .global_prompt(global_prompt)
    }

    pub async fn generate_parts<F: FileSystem>(
        &self,
        packer: &PartPacker<F>,
        max_chars: usize,
        include_headers: bool,
        global_prompt: Option<String>,
    ) -> Result<Vec<GeneratedPart>, CoreError> {
        let request = self.pack_request(max_chars, include_headers, global_prompt);
        packer.generate_parts(&request).await
    }

    pub fn generate_structure(&self, mode: StructureMode<'_>) -> String {
        TreeGenerator::generate_structure(&self.tree, mode)
    }

    pub fn close(self) {
        tracing::info!("Unloading project: {}", self.root_path.display());
    }
}
