//! Name and content search over the visible part of a project tree.

use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::error::CoreError;
use super::file_system::FileSystem;
use super::progress::CancellationToken;
use super::tree::{FileTree, NodeId};
use crate::utils::file_detection::{is_binary_extension, BINARY_PLACEHOLDER};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    pub term: String,
    pub case_sensitive: bool,
    /// Treat `term` as a regular expression.
    pub use_regex: bool,
    /// Require word boundaries around the match.
    pub whole_word: bool,
}

impl SearchOptions {
    pub fn new(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    /// Builds the matcher for these options.
    ///
    /// Every mode is expressed as a regex: plain terms are escaped first.
    pub fn compile(&self) -> Result<Regex, CoreError> {
        let body = if self.use_regex {
            format!("(?:{})", self.term)
        } else {
            regex::escape(&self.term)
        };
        let expression = if self.whole_word {
            format!(r"\b{body}\b")
        } else {
            body
        };
        Ok(RegexBuilder::new(&expression)
            .case_insensitive(!self.case_sensitive)
            .build()?)
    }

    /// Compiles the matcher, logging and returning `None` for an empty term or
    /// an invalid expression.
    fn matcher(&self) -> Option<Regex> {
        if self.term.is_empty() {
            return None;
        }
        match self.compile() {
            Ok(re) => Some(re),
            Err(e) => {
                tracing::warn!("Invalid search pattern '{}': {}", self.term, e);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub files_searched: usize,
    pub files_matched: usize,
    pub matched_nodes: Vec<NodeId>,
}

/// Stateless search operations; each marks its hits with `is_search_match`.
pub struct SearchEngine;

impl SearchEngine {
    /// Finds visible nodes whose name matches, files and directories alike.
    pub fn search_by_name(tree: &mut FileTree, options: &SearchOptions) -> Vec<NodeId> {
        let Some(matcher) = options.matcher() else {
            return Vec::new();
        };

        let matched: Vec<NodeId> = tree
            .raw_nodes()
            .par_iter()
            .enumerate()
            .filter(|(_, node)| node.is_visible && matcher.is_match(&node.name))
            .map(|(index, _)| NodeId::from_index(index))
            .collect();

        for id in &matched {
            tree.node_mut(*id).is_search_match = true;
        }
        tracing::debug!("Name search for '{}' matched {} nodes", options.term, matched.len());
        matched
    }

    /// Searches the content of visible files in tree order.
    ///
    /// Files with a binary extension are skipped. Read failures are logged and
    /// do not stop the search, but the file still counts as searched.
    pub async fn search_in_file_content<F: FileSystem>(
        fs: &F,
        tree: &mut FileTree,
        options: &SearchOptions,
        cancel: &CancellationToken,
    ) -> Result<SearchResult, CoreError> {
        let start = std::time::Instant::now();
        tracing::info!(
            "Starting content search: term='{}', case_sensitive={}, regex={}, whole_word={}",
            options.term,
            options.case_sensitive,
            options.use_regex,
            options.whole_word
        );

        let matcher = options.matcher();
        let mut result = SearchResult::default();
        let candidates = visible_files(tree);

        for id in candidates {
            if cancel.is_cancelled() {
                tracing::info!(
                    "Content search cancelled after {:?}: {} files searched, {} matches",
                    start.elapsed(),
                    result.files_searched,
                    result.files_matched
                );
                return Err(CoreError::Cancelled);
            }

            let path = tree.node(id).full_path.clone();
            if is_binary_extension(&path) {
                continue;
            }
            result.files_searched += 1;

            let content = match fs.read_file_content(&path).await {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!("Failed to read file for search {}: {}", path.display(), e);
                    continue;
                }
            };
            if content.is_empty() || content == BINARY_PLACEHOLDER {
                continue;
            }
            if matcher.as_ref().is_some_and(|re| re.is_match(&content)) {
                tracing::debug!("Match found in file: {}", path.display());
                tree.node_mut(id).is_search_match = true;
                result.matched_nodes.push(id);
            }
        }

        result.files_matched = result.matched_nodes.len();
        tracing::info!(
            "Search completed in {:?}: {} files searched, {} matches found",
            start.elapsed(),
            result.files_searched,
            result.files_matched
        );
        Ok(result)
    }

    pub fn clear_search_highlight(tree: &mut FileTree) {
        tracing::debug!("Clearing search highlights");
        for node in tree.raw_nodes_mut() {
            node.is_search_match = false;
        }
    }
}

/// Visible files in pre-order; hidden directories are not entered.
fn visible_files(tree: &FileTree) -> Vec<NodeId> {
    let mut files = Vec::new();
    let mut stack = vec![tree.root()];
    while let Some(id) = stack.pop() {
        let node = tree.node(id);
        if !node.is_visible {
            continue;
        }
        if node.is_directory {
            stack.extend(node.children.iter().rev().copied());
        } else {
            files.push(id);
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::file_system::test_support::MemoryFileSystem;
    use crate::core::tree::test_support::{id, tree_from_paths};
    use std::path::{Path, PathBuf};

    fn options(term: &str) -> SearchOptions {
        SearchOptions::new(term)
    }

    #[test]
    fn name_search_is_case_insensitive_by_default() {
        let mut tree = tree_from_paths(&["docs/README.md", "README.md", "src/main.rs"]);
        let hits = SearchEngine::search_by_name(&mut tree, &options("readme"));
        assert_eq!(hits.len(), 2);
        assert!(tree.node(id(&tree, "README.md")).is_search_match);
        assert!(!tree.node(id(&tree, "src/main.rs")).is_search_match);
    }

    #[test]
    fn name_search_respects_case_and_visibility() {
        let mut tree = tree_from_paths(&["Main.rs", "main.rs", "hidden/main.rs"]);
        tree.node_mut(id(&tree, "hidden/main.rs")).is_visible = false;
        let mut opts = options("main");
        opts.case_sensitive = true;
        let hits = SearchEngine::search_by_name(&mut tree, &opts);
        assert_eq!(hits, vec![id(&tree, "main.rs")]);
    }

    #[test]
    fn name_search_matches_directories_and_whole_words() {
        let mut tree = tree_from_paths(&["test/a.rs", "testing/b.rs"]);
        let mut opts = options("test");
        opts.whole_word = true;
        let hits = SearchEngine::search_by_name(&mut tree, &opts);
        assert_eq!(hits, vec![id(&tree, "test")]);
    }

    #[test]
    fn invalid_regex_yields_no_matches() {
        let mut tree = tree_from_paths(&["a.rs"]);
        let mut opts = options("([");
        opts.use_regex = true;
        assert!(SearchEngine::search_by_name(&mut tree, &opts).is_empty());
        assert!(matches!(opts.compile(), Err(CoreError::InvalidPattern(_))));
    }

    #[test]
    fn empty_term_matches_nothing() {
        let mut tree = tree_from_paths(&["a.rs"]);
        assert!(SearchEngine::search_by_name(&mut tree, &options("")).is_empty());
    }

    fn memory_fs(files: &[(&str, &str)]) -> MemoryFileSystem {
        let files: Vec<(PathBuf, &str)> = files
            .iter()
            .map(|(p, c)| (Path::new("/project").join(p), *c))
            .collect();
        MemoryFileSystem::with_files(&files)
    }

    #[tokio::test]
    async fn content_search_modes() {
        let fs = memory_fs(&[
            ("a.cs", "public class Foo {}"),
            ("b.cs", "var foobar = 1;"),
            ("c.cs", "nothing here"),
        ]);
        let mut tree = tree_from_paths(&["a.cs", "b.cs", "c.cs"]);
        let cancel = CancellationToken::new();

        let result = SearchEngine::search_in_file_content(&fs, &mut tree, &options("foo"), &cancel)
            .await
            .unwrap();
        assert_eq!(result.files_searched, 3);
        assert_eq!(result.files_matched, 2);

        let mut whole = options("foo");
        whole.whole_word = true;
        let result = SearchEngine::search_in_file_content(&fs, &mut tree, &whole, &cancel)
            .await
            .unwrap();
        assert_eq!(result.matched_nodes, vec![id(&tree, "a.cs")]);

        let mut regex = options(r"foo\w+");
        regex.use_regex = true;
        regex.case_sensitive = true;
        let result = SearchEngine::search_in_file_content(&fs, &mut tree, &regex, &cancel)
            .await
            .unwrap();
        assert_eq!(result.matched_nodes, vec![id(&tree, "b.cs")]);
    }

    #[tokio::test]
    async fn unreadable_and_binary_files_are_handled() {
        let fs = memory_fs(&[("ok.txt", "needle"), ("blob.txt", BINARY_PLACEHOLDER)]);
        // missing.txt is in the tree but not in the file system.
        let mut tree = tree_from_paths(&["ok.txt", "blob.txt", "missing.txt", "image.png"]);
        let result = SearchEngine::search_in_file_content(
            &fs,
            &mut tree,
            &options("needle"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(result.files_searched, 3);
        assert_eq!(result.matched_nodes, vec![id(&tree, "ok.txt")]);
    }

    #[tokio::test]
    async fn hidden_files_are_not_searched() {
        let fs = memory_fs(&[("src/a.cs", "x"), ("bin/b.cs", "x")]);
        let mut tree = tree_from_paths(&["src/a.cs", "bin/b.cs"]);
        tree.node_mut(id(&tree, "bin")).is_visible = false;
        let result = SearchEngine::search_in_file_content(
            &fs,
            &mut tree,
            &options("x"),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(result.files_searched, 1);
    }

    #[tokio::test]
    async fn cancelled_content_search_returns_cancelled() {
        let fs = memory_fs(&[("a.cs", "x")]);
        let mut tree = tree_from_paths(&["a.cs"]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = SearchEngine::search_in_file_content(&fs, &mut tree, &options("x"), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(fs.reads(), 0);
    }

    #[test]
    fn clear_resets_all_highlights() {
        let mut tree = tree_from_paths(&["a.rs", "b.rs"]);
        SearchEngine::search_by_name(&mut tree, &options(".rs"));
        assert!(tree.nodes().filter(|(_, n)| n.is_search_match).count() >= 2);
        SearchEngine::clear_search_highlight(&mut tree);
        assert!(tree.nodes().all(|(_, n)| !n.is_search_match));
    }
}
