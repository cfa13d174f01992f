//! Decides which files and directories of a project are visible.
//!
//! A file passes three stages in order: the extension whitelist, the active
//! ignore filters, and the project's `.gitignore` patterns. Directories skip the
//! whitelist. [`FilterEngine::apply_filters`] runs the stages over a whole
//! [`FileTree`] and propagates visibility bottom-up.

use std::collections::HashSet;
use std::path::{Path, MAIN_SEPARATOR};

use super::error::CoreError;
use super::ignore::{compile_patterns, IgnoreFilter};
use super::pattern::GitignorePattern;
use super::progress::ProgressSink;
use super::tree::{FileTree, NodeId};

const PROGRESS_UPDATE_INTERVAL: usize = 50;

/// A compiled ignore filter, keeping its name for diagnostics.
#[derive(Debug, Clone)]
struct CompiledFilter {
    name: String,
    patterns: Vec<GitignorePattern>,
}

/// Outcome counters of a completed filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterSummary {
    pub processed: usize,
    pub visible_files: usize,
    pub hidden_files: usize,
}

pub struct FilterEngine {
    allowed_extensions: HashSet<String>,
    active_filters: Vec<CompiledFilter>,
    gitignore_patterns: Vec<GitignorePattern>,
    base_path: String,
}

impl FilterEngine {
    pub fn new<S: AsRef<str>>(
        allowed_extensions: &[S],
        active_filters: &[IgnoreFilter],
        gitignore_patterns: &[String],
        base_path: impl AsRef<Path>,
    ) -> Self {
        Self {
            allowed_extensions: allowed_extensions
                .iter()
                .map(|e| normalize_extension(e.as_ref()))
                .filter(|e| e.len() > 1)
                .collect(),
            active_filters: active_filters
                .iter()
                .map(|f| CompiledFilter {
                    name: f.name.clone(),
                    patterns: f.compile(),
                })
                .collect(),
            gitignore_patterns: compile_patterns(gitignore_patterns),
            base_path: normalize_base(base_path.as_ref()),
        }
    }

    pub fn should_include_file(&self, path: &Path) -> bool {
        if !self.allowed_extensions.contains(&extension_of(path)) {
            return false;
        }
        let relative = self.relative_path(path);
        !self.is_ignored_by_filters(&relative) && !self.is_ignored_by_gitignore(&relative)
    }

    pub fn should_show_directory(&self, path: &Path) -> bool {
        let relative = self.relative_path(path);
        !self.is_ignored_by_filters(&relative) && !self.is_ignored_by_gitignore(&relative)
    }

    /// Like [`should_show_directory`](Self::should_show_directory) but for any
    /// path: the full structure view ignores the extension whitelist and only
    /// honours the blacklists.
    pub fn should_show_in_structure(&self, path: &Path) -> bool {
        self.should_show_directory(path)
    }

    /// Returns `path` relative to the base path with `/` separators.
    ///
    /// The prefix comparison ignores case. Paths outside the base path are
    /// returned whole (separator-normalized).
    pub fn relative_path(&self, path: &Path) -> String {
        let full = path.to_string_lossy();
        let base = self.base_path.as_str();
        let relative = match full.get(..base.len()) {
            Some(head)
                if !base.is_empty()
                    && head.to_lowercase() == base.to_lowercase()
                    && (base.ends_with(['/', '\\'])
                        || full[base.len()..]
                            .chars()
                            .next()
                            .is_none_or(|c| c == '/' || c == '\\' || c == MAIN_SEPARATOR)) =>
            {
                full[base.len()..].trim_start_matches(['/', '\\', MAIN_SEPARATOR])
            }
            _ => full.as_ref(),
        };
        relative.replace('\\', "/")
    }

    /// Annotates every node of `tree` with its visibility.
    ///
    /// Returns [`CoreError::Cancelled`] if the sink's cancellation fires; nodes
    /// that were not reached keep the visibility they had before the call.
    pub fn apply_filters(
        &self,
        tree: &mut FileTree,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<FilterSummary, CoreError> {
        let start = std::time::Instant::now();
        let mut pass = FilterPass {
            engine: self,
            progress,
            total: tree.len(),
            summary: FilterSummary::default(),
        };
        let root = tree.root();
        pass.visit(tree, root)?;

        if let Some(sink) = progress {
            sink.report(
                &format!("Filters applied: {} visible files", pass.summary.visible_files),
                Some(100.0),
            );
        }
        tracing::info!(
            "Applied filters to {} nodes in {:?}: {} files visible, {} hidden",
            pass.summary.processed,
            start.elapsed(),
            pass.summary.visible_files,
            pass.summary.hidden_files
        );
        Ok(pass.summary)
    }

    fn is_ignored_by_filters(&self, relative: &str) -> bool {
        self.active_filters.iter().any(|filter| {
            let hit = filter.patterns.iter().find(|p| p.is_match(relative));
            if let Some(pattern) = hit {
                tracing::trace!(
                    "'{}' ignored by filter '{}' ({})",
                    relative,
                    filter.name,
                    pattern.source()
                );
            }
            hit.is_some()
        })
    }

    fn is_ignored_by_gitignore(&self, relative: &str) -> bool {
        self.gitignore_patterns.iter().any(|p| p.is_match(relative))
    }
}

/// Mutable bookkeeping of one `apply_filters` call.
struct FilterPass<'a> {
    engine: &'a FilterEngine,
    progress: Option<&'a dyn ProgressSink>,
    total: usize,
    summary: FilterSummary,
}

impl FilterPass<'_> {
    fn visit(&mut self, tree: &mut FileTree, id: NodeId) -> Result<bool, CoreError> {
        if self.progress.is_some_and(|p| p.is_cancelled()) {
            tracing::info!(
                "Filter pass cancelled after {} of {} nodes",
                self.summary.processed,
                self.total
            );
            return Err(CoreError::Cancelled);
        }

        let node = tree.node(id);
        let visible = if !node.is_directory {
            let included = self.engine.should_include_file(&node.full_path);
            if included {
                self.summary.visible_files += 1;
            } else {
                self.summary.hidden_files += 1;
            }
            self.tick(1);
            included
        } else if !self.engine.should_show_directory(&node.full_path) {
            // Pruned: the children's own filters are never evaluated.
            let subtree: Vec<NodeId> = tree.descendants(id).collect();
            for hidden in &subtree {
                tree.node_mut(*hidden).is_visible = false;
            }
            self.tick(subtree.len());
            return Ok(false);
        } else {
            self.tick(1);
            let children = node.children.clone();
            let mut any_visible = false;
            for child in children {
                any_visible |= self.visit(tree, child)?;
            }
            any_visible
        };

        tree.node_mut(id).is_visible = visible;
        Ok(visible)
    }

    fn tick(&mut self, count: usize) {
        let before = self.summary.processed;
        self.summary.processed += count;
        let Some(sink) = self.progress else { return };
        if before / PROGRESS_UPDATE_INTERVAL != self.summary.processed / PROGRESS_UPDATE_INTERVAL {
            let percent = self.summary.processed as f64 / self.total.max(1) as f64 * 100.0;
            sink.report(
                &format!(
                    "Applying filters... {}/{}",
                    self.summary.processed, self.total
                ),
                Some(percent.min(100.0)),
            );
        }
    }
}

/// The base path without trailing separators. A filesystem root such as `/`
/// or `C:\` keeps its separator.
fn normalize_base(base: &Path) -> String {
    let raw = base.to_string_lossy();
    let trimmed = raw.trim_end_matches(['/', '\\', MAIN_SEPARATOR]);
    if trimmed.len() < raw.len() && (trimmed.is_empty() || trimmed.ends_with(':')) {
        raw[..trimmed.len() + 1].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Lower-cases an extension and gives it a leading dot.
pub fn normalize_extension(extension: &str) -> String {
    let trimmed = extension.trim().to_lowercase();
    if trimmed.starts_with('.') {
        trimmed
    } else {
        format!(".{trimmed}")
    }
}

/// The lower-cased text from the last `.` of the file name, or `""` if there is none.
/// A dotfile such as `.gitignore` is its own extension.
pub fn extension_of(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => name[idx..].to_lowercase(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::progress::{CancellationToken, ChannelProgress, ProgressEvent};
    use crate::core::tree::test_support::{id, tree_from_paths};
    use std::path::PathBuf;

    fn engine(extensions: &[&str], filters: &[IgnoreFilter], gitignore: &[&str]) -> FilterEngine {
        let gitignore: Vec<String> = gitignore.iter().map(|s| s.to_string()).collect();
        FilterEngine::new(extensions, filters, &gitignore, "/project")
    }

    fn p(relative: &str) -> PathBuf {
        Path::new("/project").join(relative)
    }

    #[test]
    fn include_file_checks_extension_case_insensitively() {
        let e = engine(&[".cs"], &[], &[]);
        assert!(e.should_include_file(&p("src/Program.cs")));
        assert!(e.should_include_file(&p("src/PROGRAM.CS")));
        assert!(!e.should_include_file(&p("src/readme.md")));
        assert!(!e.should_include_file(&p("Makefile")));
    }

    #[test]
    fn extensions_without_dot_are_normalized() {
        let e = engine(&["RS", " toml "], &[], &[]);
        assert!(e.should_include_file(&p("src/lib.rs")));
        assert!(e.should_include_file(&p("Cargo.toml")));
    }

    #[test]
    fn designer_files_are_excluded_by_active_filter() {
        let filter = IgnoreFilter::new("WinForms", ["*.Designer.cs"]);
        let e = engine(&[".cs"], &[filter], &[]);
        assert!(!e.should_include_file(&p("Form1.Designer.cs")));
        assert!(e.should_include_file(&p("Form1.cs")));
    }

    #[test]
    fn gitignore_patterns_exclude_files_and_directories() {
        let e = engine(&[".cs", ".log"], &[], &["*.log", "bin/"]);
        assert!(!e.should_include_file(&p("logs/app.log")));
        assert!(!e.should_include_file(&p("bin/Debug/test.cs")));
        assert!(!e.should_show_directory(&p("src/bin")));
        assert!(e.should_show_directory(&p("src")));
    }

    #[test]
    fn dotfile_extension_is_the_whole_name() {
        assert_eq!(extension_of(Path::new("/p/.gitignore")), ".gitignore");
        assert_eq!(extension_of(Path::new("/p/archive.tar.GZ")), ".gz");
        assert_eq!(extension_of(Path::new("/p/trailing.")), "");
        assert_eq!(extension_of(Path::new("/p/Makefile")), "");
    }

    #[test]
    fn relative_path_strips_base_case_insensitively() {
        let e = FilterEngine::new(&[".cs"], &[], &[], "/Project");
        assert_eq!(e.relative_path(Path::new("/project/src/a.cs")), "src/a.cs");
        assert_eq!(e.relative_path(Path::new("/elsewhere/a.cs")), "/elsewhere/a.cs");
        assert_eq!(e.relative_path(Path::new("/Project")), "");
        assert_eq!(e.relative_path(Path::new("/Projects/a.cs")), "/Projects/a.cs");
    }

    #[test]
    fn base_with_trailing_separator_still_relativizes() {
        let gitignore = vec!["/build".to_string()];
        let e = FilterEngine::new(&[".cs"], &[], &gitignore, "/work/proj/");
        assert_eq!(e.relative_path(Path::new("/work/proj/src/a.cs")), "src/a.cs");
        assert_eq!(e.relative_path(Path::new("/work/proj")), "");
        assert!(!e.should_include_file(Path::new("/work/proj/build/x.cs")));
        assert!(e.should_include_file(Path::new("/work/proj/src/a.cs")));

        let e = FilterEngine::new(&[".cs"], &[], &[], r"C:\work\proj\");
        assert_eq!(e.relative_path(Path::new(r"C:\work\proj\src\a.cs")), "src/a.cs");
    }

    #[test]
    fn ancestors_of_the_base_are_not_matched_by_filters() {
        let mut tree = tree_from_paths(&["a.cs", "src/b.cs"]);
        let filter = IgnoreFilter::new("Scratch", ["project"]);
        let e = FilterEngine::new(&[".cs"], &[filter], &[], "/project/");
        let summary = e.apply_filters(&mut tree, None).unwrap();
        assert_eq!(summary.visible_files, 2);
        assert!(tree.node(id(&tree, "a.cs")).is_visible);
    }

    #[test]
    fn filesystem_root_keeps_its_separator() {
        assert_eq!(normalize_base(Path::new("/")), "/");
        assert_eq!(normalize_base(Path::new("/project//")), "/project");
        let e = FilterEngine::new(&[".cs"], &[], &[], "/");
        assert_eq!(e.relative_path(Path::new("/src/a.cs")), "src/a.cs");
    }

    #[test]
    fn structure_view_ignores_whitelist_but_not_blacklist() {
        let e = engine(&[".cs"], &[], &["*.tmp"]);
        assert!(e.should_show_in_structure(&p("README.md")));
        assert!(!e.should_show_in_structure(&p("scratch.tmp")));
    }

    #[test]
    fn empty_directory_becomes_invisible() {
        let mut tree = tree_from_paths(&["empty/", "src/main.cs"]);
        let e = engine(&[".cs"], &[], &[]);
        e.apply_filters(&mut tree, None).unwrap();
        assert!(!tree.node(id(&tree, "empty")).is_visible);
        assert!(tree.node(id(&tree, "src")).is_visible);
        assert!(tree.node(tree.root()).is_visible);
    }

    #[test]
    fn directory_with_only_filtered_children_is_invisible() {
        let mut tree = tree_from_paths(&["docs/a.md", "docs/b.txt", "src/main.cs"]);
        let e = engine(&[".cs"], &[], &[]);
        let summary = e.apply_filters(&mut tree, None).unwrap();
        assert!(!tree.node(id(&tree, "docs")).is_visible);
        assert!(!tree.node(id(&tree, "docs/a.md")).is_visible);
        assert_eq!(summary.visible_files, 1);
        assert_eq!(summary.hidden_files, 2);
        assert_eq!(summary.processed, tree.len());
    }

    #[test]
    fn filtered_directory_hides_whole_subtree() {
        let mut tree = tree_from_paths(&["bin/Debug/app.cs", "src/main.cs"]);
        let filter = IgnoreFilter::new(".NET Build", ["bin/"]);
        let e = engine(&[".cs"], &[filter], &[]);
        let summary = e.apply_filters(&mut tree, None).unwrap();
        assert!(!tree.node(id(&tree, "bin")).is_visible);
        assert!(!tree.node(id(&tree, "bin/Debug")).is_visible);
        assert!(!tree.node(id(&tree, "bin/Debug/app.cs")).is_visible);
        assert!(tree.node(id(&tree, "src/main.cs")).is_visible);
        assert_eq!(summary.processed, tree.len());
        // Pruned files are not counted as evaluated.
        assert_eq!(summary.visible_files + summary.hidden_files, 1);
    }

    #[test]
    fn nested_structure_propagates_visibility() {
        let mut tree = tree_from_paths(&[
            "a/b/c/deep.cs",
            "a/b/other.txt",
            "a/x/y.txt",
            "top.txt",
        ]);
        let e = engine(&[".cs"], &[], &[]);
        e.apply_filters(&mut tree, None).unwrap();
        assert!(tree.node(id(&tree, "a")).is_visible);
        assert!(tree.node(id(&tree, "a/b")).is_visible);
        assert!(tree.node(id(&tree, "a/b/c")).is_visible);
        assert!(!tree.node(id(&tree, "a/x")).is_visible);
        assert!(!tree.node(id(&tree, "top.txt")).is_visible);
    }

    #[test]
    fn progress_is_reported_every_fifty_nodes() {
        let paths: Vec<String> = (0..120).map(|i| format!("src/file{i:03}.cs")).collect();
        let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
        let mut tree = tree_from_paths(&refs);
        let (sink, mut rx) = ChannelProgress::new(CancellationToken::new());
        let e = engine(&[".cs"], &[], &[]);
        e.apply_filters(&mut tree, Some(&sink)).unwrap();

        let mut statuses = Vec::new();
        while let Ok(ProgressEvent::Report { status, .. }) = rx.try_recv() {
            statuses.push(status);
        }
        // 122 nodes: reports at 50 and 100, then the completion message.
        assert_eq!(statuses.len(), 3);
        assert_eq!(statuses[0], "Applying filters... 50/122");
        assert_eq!(statuses[1], "Applying filters... 100/122");
        assert!(statuses[2].starts_with("Filters applied"));
    }

    #[test]
    fn cancellation_stops_the_pass_and_keeps_previous_visibility() {
        let mut tree = tree_from_paths(&["src/a.md", "src/b.md"]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let (sink, _rx) = ChannelProgress::new(cancel);
        let e = engine(&[".cs"], &[], &[]);

        let result = e.apply_filters(&mut tree, Some(&sink));
        assert!(matches!(result, Err(CoreError::Cancelled)));
        // Nothing was reached, so the default visibility survives.
        assert!(tree.node(id(&tree, "src/a.md")).is_visible);
    }

    #[test]
    fn directory_visible_iff_a_descendant_file_is_visible() {
        let mut tree = tree_from_paths(&[
            "a/one.cs",
            "a/two.md",
            "b/c/three.md",
            "b/d/",
            "e/f/g/four.cs",
        ]);
        let e = engine(&[".cs"], &[], &[]);
        e.apply_filters(&mut tree, None).unwrap();
        for (node_id, node) in tree.nodes() {
            if node.is_directory {
                let has_visible_file = tree
                    .descendants(node_id)
                    .any(|d| !tree.node(d).is_directory && tree.node(d).is_visible);
                assert_eq!(node.is_visible, has_visible_file, "{}", node.full_path.display());
            }
        }
    }
}
