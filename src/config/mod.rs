pub mod catalog;
pub mod settings;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::core::ignore::IgnoreFilter;

const MAX_RECENT_PROJECTS: usize = 10;

// Single-dot entries only: a file's extension is the text after its last dot.
const DEFAULT_EXTENSIONS: &[&str] = &[
    ".aab", ".ac", ".am", ".apk", ".asset", ".bat", ".bash", ".bib", ".cjs",
    ".class", ".cmake", ".conf", ".cpp", ".cs", ".csproj", ".css", ".csv", ".cu", ".dart", ".dll",
    ".dmg", ".el", ".env", ".erb", ".exe", ".f90", ".f95", ".fs", ".gd", ".gemfile", ".gemspec",
    ".go", ".gradle", ".groovy", ".h", ".h5", ".hx", ".html", ".iml", ".in", ".ini", ".ipynb",
    ".jar", ".java", ".jenkinsfile", ".jl", ".js", ".json", ".jsx", ".kts", ".kt", ".lnk", ".lock",
    ".lua", ".m", ".mat", ".md", ".mdx", ".meta", ".mjs", ".mo", ".mod", ".mproj", ".nix", ".pde",
    ".php", ".pickle", ".pkg", ".plist", ".po", ".pom", ".hcl", ".pkl", ".pklx", ".pp", ".pyo",
    ".pyd", ".py", ".pyc", ".r", ".rake", ".rb", ".res", ".rs", ".sass", ".scala", ".sbv", ".sbt",
    ".scss", ".service", ".settings", ".sh", ".sln", ".storyboard", ".sum",
    ".sublime-project", ".sublime-workspace", ".swift", ".tif", ".toml", ".ts", ".tscn", ".tsx",
    ".tsv", ".twig", ".unity", ".uproject", ".vb", ".vimrc", ".war", ".workspace", ".xib", ".xml",
    ".xproj", ".xcworkspace", ".xcproject", ".yaml", ".yml", ".zsh",
];

/// A reusable instruction text placed at the top of the first part.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GlobalPrompt {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub max_chars_limit: usize,
    pub include_file_headers: bool,
    pub allowed_extensions: Vec<String>,
    pub custom_ignore_filters: Vec<IgnoreFilter>,
    /// Filter name to on/off. Names resolve against custom and bundled filters.
    pub active_filters: BTreeMap<String, bool>,
    pub global_prompts: Vec<GlobalPrompt>,
    pub use_detected_gitignore: bool,
    pub case_sensitive_search: bool,
    /// Newest first, at most ten entries.
    pub recent_projects: Vec<PathBuf>,
    pub output_directory: Option<PathBuf>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        settings::load_config(None)
    }

    /// Adds a user-defined filter; it starts inactive.
    pub fn add_custom_filter(&mut self, filter: IgnoreFilter) -> Result<()> {
        if filter.name.trim().is_empty() {
            bail!("Filter name must not be empty");
        }
        let taken = self.custom_ignore_filters.iter().any(|f| f.name == filter.name)
            || catalog::default_filters().iter().any(|f| f.name == filter.name);
        if taken {
            bail!("A filter named '{}' already exists", filter.name);
        }
        self.active_filters.insert(filter.name.clone(), false);
        self.custom_ignore_filters.push(filter);
        Ok(())
    }

    /// Removes a user-defined filter. Returns whether it existed.
    pub fn remove_custom_filter(&mut self, name: &str) -> bool {
        let before = self.custom_ignore_filters.len();
        self.custom_ignore_filters.retain(|f| f.name != name);
        let removed = self.custom_ignore_filters.len() != before;
        if removed {
            self.active_filters.remove(name);
        }
        removed
    }

    pub fn set_filter_active(&mut self, name: &str, active: bool) {
        self.active_filters.insert(name.to_string(), active);
    }

    /// Resolves the names switched on in `active_filters`. Custom filters win
    /// over bundled ones; unknown names are logged and skipped.
    pub fn active_ignore_filters(&self) -> Vec<IgnoreFilter> {
        self.active_filters
            .iter()
            .filter(|(_, active)| **active)
            .filter_map(|(name, _)| {
                let found = self
                    .custom_ignore_filters
                    .iter()
                    .find(|f| &f.name == name)
                    .cloned()
                    .or_else(|| catalog::find_filter(name));
                if found.is_none() {
                    tracing::warn!("Active filter '{}' is unknown, skipping", name);
                }
                found
            })
            .collect()
    }

    /// Moves `path` to the front of the recent list, trimming it to ten entries.
    pub fn add_recent_project(&mut self, path: &Path) {
        self.recent_projects.retain(|p| p != path);
        self.recent_projects.insert(0, path.to_path_buf());
        self.recent_projects.truncate(MAX_RECENT_PROJECTS);
    }

    /// Finds a prompt by id, falling back to a case-insensitive name match.
    pub fn find_global_prompt(&self, key: &str) -> Option<&GlobalPrompt> {
        self.global_prompts
            .iter()
            .find(|p| p.id.as_deref() == Some(key))
            .or_else(|| {
                self.global_prompts
                    .iter()
                    .find(|p| p.name.to_lowercase().contains(&key.to_lowercase()))
            })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_chars_limit: 10_000,
            include_file_headers: true,
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            custom_ignore_filters: Vec::new(),
            active_filters: BTreeMap::new(),
            global_prompts: catalog::default_prompts(),
            use_detected_gitignore: true,
            case_sensitive_search: false,
            recent_projects: Vec::new(),
            output_directory: None,
        }
    }
}
