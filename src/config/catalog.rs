//! Bundled filter presets and prompt templates.
//!
//! The five built-in filter groups are defined in code. Category templates
//! and default prompts are `.gitignore`/JSON files embedded into the binary.

use rust_embed::RustEmbed;
use std::borrow::Cow;

use super::GlobalPrompt;
use crate::core::ignore::{parse_gitignore, IgnoreFilter};

/// Files under `assets/` embedded into the binary.
#[derive(RustEmbed)]
#[folder = "assets/"]
#[include = "gitignores/*.gitignore"]
#[include = "prompts.json"]
struct BundledAssets;

struct CategoryTemplate {
    name: &'static str,
    category: &'static str,
    file_name: &'static str,
}

const fn template(
    name: &'static str,
    category: &'static str,
    file_name: &'static str,
) -> CategoryTemplate {
    CategoryTemplate {
        name,
        category,
        file_name,
    }
}

const CATEGORY_TEMPLATES: &[CategoryTemplate] = &[
    template("Node.js", "Backend", "Node.gitignore"),
    template("Python", "Backend", "Python.gitignore"),
    template("Java", "Backend", "Java.gitignore"),
    template("Go", "Backend", "Go.gitignore"),
    template(".NET", "Backend", "Dotnet.gitignore"),
    template("Ruby", "Backend", "Ruby.gitignore"),
    template("Rust", "Backend", "Rust.gitignore"),
    template("Angular", "Frontend", "Angular.gitignore"),
    template("Next.js", "Frontend", "Nextjs.gitignore"),
    template("Sass", "Frontend", "Sass.gitignore"),
    template("Android", "Mobile", "Android.gitignore"),
    template("Swift", "Mobile", "Swift.gitignore"),
    template("Flutter", "Mobile", "Flutter.gitignore"),
    template("Gradle", "Mobile", "Gradle.gitignore"),
    template("Terraform", "DevOps / CI", "Terraform.gitignore"),
    template("Maven", "DevOps / CI", "Maven.gitignore"),
    template("CMake", "DevOps / CI", "CMake.gitignore"),
    template("Windows", "Operating Systems", "Windows.gitignore"),
    template("Linux", "Operating Systems", "Linux.gitignore"),
    template("macOS", "Operating Systems", "macOS.gitignore"),
    template("JetBrains", "IDEs / Editors", "JetBrains.gitignore"),
    template("VS Code", "IDEs / Editors", "VisualStudioCode.gitignore"),
    template("Vim", "IDEs / Editors", "Vim.gitignore"),
    template("Emacs", "IDEs / Editors", "Emacs.gitignore"),
    template("Sublime Text", "IDEs / Editors", "SublimeText.gitignore"),
    template("Unity", "Game Development", "Unity.gitignore"),
    template("Godot", "Game Development", "Godot.gitignore"),
    template("Unreal Engine", "Game Development", "UnrealEngine.gitignore"),
    template("R", "Data Science / ML", "R.gitignore"),
    template("Julia", "Data Science / ML", "Julia.gitignore"),
    template("TeX", "Data Science / ML", "TeX.gitignore"),
];

/// The built-in filter groups offered on every project.
pub fn default_filters() -> Vec<IgnoreFilter> {
    vec![
        IgnoreFilter::new(
            ".NET Build",
            [
                "bin/", "obj/", "*.dll", "*.exe", "*.pdb", "*.cache", ".vs/", "*.user", "*.suo",
                "packages/", "*.nupkg", "*_wpftmp.csproj",
            ],
        ),
        IgnoreFilter::new(
            "Node.js",
            [
                "node_modules/", "package-lock.json", "yarn.lock", "npm-debug.log", "*.log",
                "dist/", "build/", ".next/", ".nuxt/",
            ],
        ),
        IgnoreFilter::new(
            "Python",
            [
                "__pycache__/", "*.py[cod]", "*$py.class", "*.so", ".Python", "venv/", "env/",
                ".venv/", "pip-log.txt", "*.egg-info/", "dist/", "build/",
            ],
        ),
        IgnoreFilter::new("Git", [".git/", ".gitignore", ".gitattributes"]),
        IgnoreFilter::new(
            "IDE",
            [".vscode/", ".idea/", "*.swp", "*.swo", "*~", ".DS_Store", "Thumbs.db"],
        ),
    ]
}

/// Category names in ascending order, without duplicates.
pub fn all_categories() -> Vec<&'static str> {
    let mut categories: Vec<&'static str> =
        CATEGORY_TEMPLATES.iter().map(|t| t.category).collect();
    categories.sort_unstable();
    categories.dedup();
    categories
}

/// Filters of one category. Templates without any pattern are left out.
pub fn filters_for_category(category: &str) -> Vec<IgnoreFilter> {
    CATEGORY_TEMPLATES
        .iter()
        .filter(|t| t.category == category)
        .filter_map(|t| {
            let patterns = load_template(t.file_name);
            (!patterns.is_empty()).then(|| IgnoreFilter {
                name: t.name.to_string(),
                patterns,
            })
        })
        .collect()
}

/// Looks a filter up by name, built-in groups first, then category templates.
pub fn find_filter(name: &str) -> Option<IgnoreFilter> {
    default_filters()
        .into_iter()
        .find(|f| f.name == name)
        .or_else(|| {
            CATEGORY_TEMPLATES
                .iter()
                .find(|t| t.name == name)
                .map(|t| IgnoreFilter {
                    name: t.name.to_string(),
                    patterns: load_template(t.file_name),
                })
        })
}

/// Trimmed `.gitignore` lines without blanks or `#` comments.
pub fn parse_patterns(content: &str) -> Vec<String> {
    parse_gitignore(content)
}

/// The prompts a fresh configuration starts with.
pub fn default_prompts() -> Vec<GlobalPrompt> {
    let Some(file) = BundledAssets::get("prompts.json") else {
        tracing::error!("Bundled prompt catalog is missing");
        return Vec::new();
    };
    match serde_json::from_slice(&file.data) {
        Ok(prompts) => prompts,
        Err(e) => {
            tracing::error!("Bundled prompt catalog is malformed: {}", e);
            Vec::new()
        }
    }
}

fn load_template(file_name: &str) -> Vec<String> {
    match BundledAssets::get(&format!("gitignores/{file_name}")) {
        Some(file) => parse_patterns(&decode(file.data)),
        None => {
            tracing::warn!("Gitignore template not bundled: {}", file_name);
            Vec::new()
        }
    }
}

fn decode(data: Cow<'static, [u8]>) -> String {
    String::from_utf8_lossy(&data).into_owned()
}
