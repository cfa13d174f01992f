//! Gitignore-style pattern matching against project-relative paths.
//!
//! Supported syntax is a pragmatic subset of `.gitignore`:
//! bare names (match at any depth), rooted patterns (`/build`),
//! directory patterns (`bin/`), the wildcards `*`, `?` and `[...]`,
//! and `**` both as an any-depth prefix (`**/tmp`) and inside a pattern
//! (`src/**/gen`). Negated patterns (`!keep.txt`) are recognised but never
//! match. All comparisons ignore case.

use regex::{Regex, RegexBuilder};

/// A pattern parsed once and matched against many paths.
#[derive(Debug, Clone)]
pub struct GitignorePattern {
    source: String,
    rooted: bool,
    directory_only: bool,
    kind: PatternKind,
}

#[derive(Debug, Clone)]
enum PatternKind {
    /// Empty, negated, or degenerate patterns.
    Never,
    /// Patterns containing `**/`: the remainder may start at any depth.
    AnyDepth { glob: Option<Regex>, needle: String },
    /// Patterns containing `**` elsewhere, matched against the whole path.
    DoubleStar(Option<Regex>),
    /// Patterns with `*`, `?` or `[`, matched against the path or any segment.
    Glob(Option<Regex>),
    /// Lower-cased literal without wildcards.
    Literal(String),
}

impl GitignorePattern {
    pub fn new(pattern: &str) -> Self {
        let source = pattern.trim().to_string();
        if source.is_empty() || source.starts_with('!') {
            return Self {
                source,
                rooted: false,
                directory_only: false,
                kind: PatternKind::Never,
            };
        }

        let directory_only = source.ends_with('/');
        let mut clean = source.trim_end_matches('/');
        let rooted = clean.starts_with('/');
        if rooted {
            clean = clean.trim_start_matches('/');
        }

        let kind = if clean.contains("**/") {
            let remainder = clean.replace("**/", "");
            if remainder.is_empty() {
                PatternKind::Never
            } else {
                PatternKind::AnyDepth {
                    glob: compile(&glob_to_regex(&remainder), &source),
                    needle: format!("/{}", remainder.to_lowercase()),
                }
            }
        } else if clean.contains("**") {
            PatternKind::DoubleStar(compile(&double_star_to_regex(clean), &source))
        } else if clean.contains(['*', '?', '[']) {
            PatternKind::Glob(compile(&glob_to_regex(clean), &source))
        } else if clean.is_empty() {
            PatternKind::Never
        } else {
            PatternKind::Literal(clean.to_lowercase())
        };

        Self {
            source,
            rooted,
            directory_only,
            kind,
        }
    }

    /// The trimmed pattern text as written.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_rooted(&self) -> bool {
        self.rooted
    }

    /// `true` for patterns written with a trailing `/`. The matcher itself
    /// does not distinguish files from directories.
    pub fn is_directory_only(&self) -> bool {
        self.directory_only
    }

    pub fn is_match(&self, relative_path: &str) -> bool {
        let normalized = relative_path.replace('\\', "/");
        let path = normalized.trim_end_matches('/');

        match &self.kind {
            PatternKind::Never => false,
            PatternKind::AnyDepth { glob, needle } => {
                regex_match(glob, path) || path.to_lowercase().contains(needle.as_str())
            }
            PatternKind::DoubleStar(re) => regex_match(re, path),
            PatternKind::Glob(re) => {
                regex_match(re, path)
                    || (!self.rooted && path.split('/').any(|segment| regex_match(re, segment)))
            }
            PatternKind::Literal(literal) => {
                let path = path.to_lowercase();
                let prefix = format!("{literal}/");
                if self.rooted {
                    return path == *literal || path.starts_with(&prefix);
                }
                path == *literal
                    || path.split('/').any(|segment| segment == literal)
                    || path.contains(&format!("/{literal}/"))
                    || path.ends_with(&format!("/{literal}"))
                    || path.starts_with(&prefix)
            }
        }
    }
}

/// Evaluates a single pattern against a single relative path.
pub fn matches(relative_path: &str, pattern: &str) -> bool {
    GitignorePattern::new(pattern).is_match(relative_path)
}

fn regex_match(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

fn compile(expression: &str, source: &str) -> Option<Regex> {
    match RegexBuilder::new(expression).case_insensitive(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("Ignoring invalid pattern '{}': {}", source, e);
            None
        }
    }
}

/// `*` and `?` stop at `/`; `[...]` is handed to the regex engine unchanged.
fn glob_to_regex(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut expression = String::from("^");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => expression.push_str("[^/]*"),
            '?' => expression.push_str("[^/]"),
            '[' => match chars[i + 1..].iter().position(|&c| c == ']') {
                Some(offset) => {
                    let close = i + 1 + offset;
                    expression.extend(&chars[i..=close]);
                    i = close;
                }
                None => expression.push_str(&regex::escape("[")),
            },
            c => expression.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
        i += 1;
    }
    expression.push('$');
    expression
}

/// `**` crosses `/`, single `*` and `?` do not; everything else is literal.
fn double_star_to_regex(pattern: &str) -> String {
    let escaped = regex::escape(pattern)
        .replace(r"\*\*", ".*")
        .replace(r"\*", "[^/]*")
        .replace(r"\?", "[^/]");
    format!("^{escaped}$")
}
