use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "context-packer",
    version,
    about = "Filter a project, pick files and pack them into prompt-sized parts.",
    after_help = "EXAMPLES:\n  context-packer pack ./my-app --ext .rs,.toml --filter Git\n  context-packer structure ./my-app --full\n  context-packer search ./my-app TODO --content\n  context-packer filters --category Backend",
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Use this config file instead of the platform default.
    #[arg(long, global = true, value_name = "FILE", env = "CONTEXT_PACKER_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count, global = true, help = "Increase log verbosity (-v, -vv).")]
    pub verbose: u8,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Pack pinned and selected files into numbered part files.
    Pack(PackArgs),
    /// Print the ASCII project structure.
    Structure(StructureArgs),
    /// Search file names, or file contents with --content.
    Search(SearchArgs),
    /// List the built-in filter groups, custom filters and template categories.
    Filters(FiltersArgs),
}

/// Flags shared by every command that filters the project tree.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterOpts {
    #[arg(
        long,
        value_delimiter = ',',
        value_name = "EXT",
        help = "Allowed extensions, replacing the configured list (e.g. .cs,.ts).",
        help_heading = "Filtering"
    )]
    pub ext: Vec<String>,

    #[arg(
        long = "filter",
        value_name = "NAME",
        help = "Activate a filter group or template by name (repeatable).",
        help_heading = "Filtering"
    )]
    pub filters: Vec<String>,

    #[arg(
        long = "ignore",
        value_name = "FILE",
        help = "Extra .gitignore-style pattern file (repeatable).",
        help_heading = "Filtering"
    )]
    pub ignore_files: Vec<PathBuf>,

    #[arg(
        long,
        conflicts_with = "no_gitignore",
        help = "Apply the project's .gitignore.",
        help_heading = "Filtering"
    )]
    pub gitignore: bool,

    #[arg(
        long,
        help = "Ignore the project's .gitignore.",
        help_heading = "Filtering"
    )]
    pub no_gitignore: bool,
}

impl FilterOpts {
    /// Explicit flags win over the configured default.
    pub fn use_gitignore(&self, configured: bool) -> bool {
        if self.gitignore {
            true
        } else if self.no_gitignore {
            false
        } else {
            configured
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct PackArgs {
    /// Project directory.
    pub dir: PathBuf,

    #[command(flatten)]
    pub filter: FilterOpts,

    #[arg(long, value_name = "N", help = "Maximum characters per part.")]
    pub max_chars: Option<usize>,

    #[arg(long, help = "Omit the `// File:` header before each file.")]
    pub no_headers: bool,

    #[arg(long, value_name = "PATH", help = "Pin a file, relative to DIR or absolute (repeatable).")]
    pub pin: Vec<PathBuf>,

    #[arg(long, value_name = "PATH", help = "Select a file or directory (repeatable).")]
    pub select: Vec<PathBuf>,

    #[arg(long, value_name = "TEXT", conflicts_with = "prompt_name", help = "Prompt placed at the top of the first part.")]
    pub prompt: Option<String>,

    #[arg(long, value_name = "NAME", help = "Use a configured prompt, by id or name.")]
    pub prompt_name: Option<String>,

    #[arg(long, value_name = "DIR", help = "Where part files are written.")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StructureArgs {
    /// Project directory.
    pub dir: PathBuf,

    #[command(flatten)]
    pub filter: FilterOpts,

    #[arg(long, help = "Show every path the ignore rules let through, whatever its extension.")]
    pub full: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SearchArgs {
    /// Project directory.
    pub dir: PathBuf,

    /// Text or pattern to look for.
    pub term: String,

    #[command(flatten)]
    pub filter: FilterOpts,

    #[arg(long, help = "Search file contents instead of names.")]
    pub content: bool,

    #[arg(long)]
    pub case_sensitive: bool,

    #[arg(long, help = "Treat TERM as a regular expression.")]
    pub regex: bool,

    #[arg(long)]
    pub whole_word: bool,
}

#[derive(Args, Debug, Clone)]
pub struct FiltersArgs {
    #[arg(long, value_name = "NAME", help = "List the templates of one category.")]
    pub category: Option<String>,
}
