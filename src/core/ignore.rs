use serde::{Deserialize, Serialize};
use std::path::Path;

use super::pattern::GitignorePattern;

/// A named group of blacklist patterns, either bundled or user-defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreFilter {
    pub name: String,
    pub patterns: Vec<String>,
}

impl IgnoreFilter {
    pub fn new(name: impl Into<String>, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Compiles every pattern of this filter for repeated matching.
    pub fn compile(&self) -> Vec<GitignorePattern> {
        compile_patterns(&self.patterns)
    }
}

/// Compiles `.gitignore`-style lines, skipping blanks and comments.
pub fn compile_patterns(patterns: &[String]) -> Vec<GitignorePattern> {
    patterns
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty() && !p.starts_with('#'))
        .map(GitignorePattern::new)
        .collect()
}

/// Splits `.gitignore` text into trimmed patterns, dropping blank and `#` comment lines.
pub fn parse_gitignore(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Reads patterns from a `.gitignore` file. A missing or unreadable file yields no patterns.
pub async fn read_gitignore(path: &Path) -> Vec<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let patterns = parse_gitignore(&content);
            tracing::info!(
                "Read {} patterns from .gitignore: {}",
                patterns.len(),
                path.display()
            );
            patterns
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(".gitignore file not found: {}", path.display());
            Vec::new()
        }
        Err(e) => {
            tracing::error!("Failed to read .gitignore file {}: {}", path.display(), e);
            Vec::new()
        }
    }
}
