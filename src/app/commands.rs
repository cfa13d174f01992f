//! Handlers for the CLI subcommands.
//!
//! Each handler loads a fresh [`ProjectSession`], applies the filters built
//! from the configuration and the command line, and prints its result to stdout.

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;

use super::args::{FilterOpts, FiltersArgs, PackArgs, SearchArgs, StructureArgs};
use super::output::{self, TokenCounter};
use crate::config::{catalog, settings, AppConfig};
use crate::core::ignore::parse_gitignore;
use crate::core::packer::relative_display;
use crate::core::{
    CancellationToken, ChannelProgress, FilterEngine, IgnoreFilter, OsFileSystem, PartPacker,
    ProgressEvent, ProjectSession, SearchEngine, SearchOptions, StructureMode,
};

const DEFAULT_OUTPUT_DIR: &str = "context-parts";

/// What every handler needs besides its own arguments.
pub struct CommandContext {
    pub config: AppConfig,
    /// `None` means the platform config file.
    pub config_path: Option<PathBuf>,
    pub cancel: CancellationToken,
}

impl CommandContext {
    fn save_config(&self) {
        if let Err(e) = settings::save_config(&self.config, self.config_path.as_deref()) {
            tracing::warn!("Failed to save config: {}", e);
        }
    }
}

/// Forwards progress events to the log until the sink is dropped.
fn spawn_progress_logger(cancel: CancellationToken) -> (ChannelProgress, JoinHandle<()>) {
    let (sink, mut receiver) = ChannelProgress::new(cancel);
    let handle = tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            match event {
                ProgressEvent::Report { status, percent } => match percent {
                    Some(percent) => tracing::debug!("[{:>3.0}%] {}", percent, status),
                    None => tracing::debug!("{}", status),
                },
                ProgressEvent::Clear => tracing::trace!("Progress cleared"),
            }
        }
    });
    (sink, handle)
}

/// Loads the project and records it as the most recent one.
async fn open_project(
    ctx: &mut CommandContext,
    dir: &Path,
    sink: &ChannelProgress,
) -> Result<ProjectSession> {
    let session = ProjectSession::load(dir, Some(sink)).await?;
    let recent = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    ctx.config.add_recent_project(&recent);
    ctx.save_config();
    Ok(session)
}

/// Combines the configured filters with the ones named on the command line.
async fn build_engine(
    session: &ProjectSession,
    config: &AppConfig,
    opts: &FilterOpts,
) -> Result<FilterEngine> {
    let extensions: &[String] = if opts.ext.is_empty() {
        &config.allowed_extensions
    } else {
        &opts.ext
    };

    let mut filters = config.active_ignore_filters();
    for name in &opts.filters {
        if filters.iter().any(|f| &f.name == name) {
            continue;
        }
        let filter = config
            .custom_ignore_filters
            .iter()
            .find(|f| &f.name == name)
            .cloned()
            .or_else(|| catalog::find_filter(name))
            .ok_or_else(|| anyhow!("Unknown filter '{}'. Run `filters` to list them.", name))?;
        filters.push(filter);
    }

    for file in &opts.ignore_files {
        let content = tokio::fs::read_to_string(file)
            .await
            .with_context(|| format!("Failed to read ignore file {}", file.display()))?;
        filters.push(IgnoreFilter::new(
            file.display().to_string(),
            parse_gitignore(&content),
        ));
    }

    let use_gitignore = opts.use_gitignore(config.use_detected_gitignore);
    if use_gitignore && session.has_local_gitignore() {
        tracing::info!(
            "Using project .gitignore ({} patterns)",
            session.gitignore_patterns().len()
        );
    }
    tracing::debug!(
        "Filter setup: {} extensions, filters [{}]",
        extensions.len(),
        filters.iter().map(|f| f.name.as_str()).collect::<Vec<_>>().join(", ")
    );
    Ok(session.filter_engine(extensions, &filters, use_gitignore))
}

fn resolve_prompt(config: &AppConfig, args: &PackArgs) -> Result<Option<String>> {
    if let Some(text) = &args.prompt {
        return Ok(Some(text.clone()));
    }
    match &args.prompt_name {
        Some(key) => config
            .find_global_prompt(key)
            .map(|p| Some(p.content.clone()))
            .ok_or_else(|| anyhow!("No prompt matches '{}'", key)),
        None => Ok(None),
    }
}

pub async fn pack(ctx: &mut CommandContext, args: PackArgs) -> Result<()> {
    let (sink, logger) = spawn_progress_logger(ctx.cancel.clone());
    let mut session = open_project(ctx, &args.dir, &sink).await?;
    let engine = build_engine(&session, &ctx.config, &args.filter).await?;
    let summary = session.apply_filters(&engine, Some(&sink))?;
    tracing::info!(
        "{} visible files, {} hidden by filters",
        summary.visible_files,
        summary.hidden_files
    );

    for path in &args.pin {
        session
            .pin_path(path)
            .with_context(|| format!("Cannot pin {}", path.display()))?;
    }
    for path in &args.select {
        session
            .select_path(path, true)
            .with_context(|| format!("Cannot select {}", path.display()))?;
    }
    if args.pin.is_empty() && args.select.is_empty() {
        session.select_all();
    }

    let max_chars = args.max_chars.unwrap_or(ctx.config.max_chars_limit);
    let include_headers = ctx.config.include_file_headers && !args.no_headers;
    let prompt = resolve_prompt(&ctx.config, &args)?;
    let request = session.pack_request(max_chars, include_headers, prompt);
    if request.pinned.is_empty() && request.selected.is_empty() {
        println!("No files to pack: nothing is pinned or selected after filtering.");
        drop(sink);
        logger.await?;
        return Ok(());
    }

    let packer = PartPacker::new(OsFileSystem);
    let parts = packer.generate_parts_with_progress(&request, &sink).await?;
    drop(sink);
    logger.await?;

    let out_dir = match args.output_dir.clone().or_else(|| ctx.config.output_directory.clone()) {
        Some(dir) => dir,
        None => std::env::current_dir()?.join(DEFAULT_OUTPUT_DIR),
    };
    let written = output::write_parts(&out_dir, session.root_path(), &parts, &TokenCounter::new())?;
    print!("{}", output::render_summary(&written));
    session.close();
    Ok(())
}

pub async fn structure(ctx: &mut CommandContext, args: StructureArgs) -> Result<()> {
    let (sink, logger) = spawn_progress_logger(ctx.cancel.clone());
    let mut session = open_project(ctx, &args.dir, &sink).await?;
    let engine = build_engine(&session, &ctx.config, &args.filter).await?;
    session.apply_filters(&engine, Some(&sink))?;
    drop(sink);
    logger.await?;

    let mode = if args.full {
        StructureMode::Full(&engine)
    } else {
        StructureMode::Visible
    };
    print!("{}", session.generate_structure(mode));
    session.close();
    Ok(())
}

pub async fn search(ctx: &mut CommandContext, args: SearchArgs) -> Result<()> {
    let (sink, logger) = spawn_progress_logger(ctx.cancel.clone());
    let mut session = open_project(ctx, &args.dir, &sink).await?;
    let engine = build_engine(&session, &ctx.config, &args.filter).await?;
    session.apply_filters(&engine, Some(&sink))?;
    drop(sink);
    logger.await?;

    let options = SearchOptions {
        term: args.term.clone(),
        case_sensitive: args.case_sensitive || ctx.config.case_sensitive_search,
        use_regex: args.regex,
        whole_word: args.whole_word,
    };
    options.compile()?;

    let root = session.root_path().to_path_buf();
    let (matched, searched) = if args.content {
        let result = SearchEngine::search_in_file_content(
            &OsFileSystem,
            session.tree_mut(),
            &options,
            &ctx.cancel,
        )
        .await?;
        (result.matched_nodes, Some(result.files_searched))
    } else {
        (SearchEngine::search_by_name(session.tree_mut(), &options), None)
    };

    for id in &matched {
        let node = session.tree().node(*id);
        let suffix = if node.is_directory { "/" } else { "" };
        println!("{}{}", relative_display(&root, &node.full_path), suffix);
    }
    match searched {
        Some(searched) => println!("{} matches in {} files searched", matched.len(), searched),
        None => println!("{} matches", matched.len()),
    }
    session.close();
    Ok(())
}

pub fn filters(ctx: &CommandContext, args: FiltersArgs) -> Result<()> {
    if let Some(category) = &args.category {
        let templates = catalog::filters_for_category(category);
        if templates.is_empty() {
            return Err(anyhow!(
                "Unknown category '{}'. Known categories: {}",
                category,
                catalog::all_categories().join(", ")
            ));
        }
        println!("{category}:");
        for filter in templates {
            println!("  {:<16} {} patterns", filter.name, filter.patterns.len());
        }
        return Ok(());
    }

    let is_active = |name: &str| ctx.config.active_filters.get(name).copied().unwrap_or(false);
    let marker = |name: &str| if is_active(name) { "[x]" } else { "[ ]" };

    println!("Built-in filters:");
    for filter in catalog::default_filters() {
        println!("  {} {:<16} {}", marker(filter.name.as_str()), filter.name, filter.patterns.join(" "));
    }
    if !ctx.config.custom_ignore_filters.is_empty() {
        println!("Custom filters:");
        for filter in &ctx.config.custom_ignore_filters {
            println!("  {} {:<16} {}", marker(filter.name.as_str()), filter.name, filter.patterns.join(" "));
        }
    }
    println!("Template categories:");
    for category in catalog::all_categories() {
        println!("  {category}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn context(dir: &Path) -> CommandContext {
        CommandContext {
            config: AppConfig::default(),
            config_path: Some(dir.join("config.json")),
            cancel: CancellationToken::new(),
        }
    }

    fn pack_args(dir: &Path) -> PackArgs {
        PackArgs {
            dir: dir.to_path_buf(),
            filter: FilterOpts::default(),
            max_chars: None,
            no_headers: false,
            pin: Vec::new(),
            select: Vec::new(),
            prompt: None,
            prompt_name: None,
            output_dir: None,
        }
    }

    #[tokio::test]
    async fn cli_filters_add_to_configured_ones() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.cs"), "A").unwrap();
        fs::create_dir(dir.path().join(".vscode")).unwrap();
        fs::write(dir.path().join(".vscode").join("settings.json"), "{}").unwrap();
        let ignore = dir.path().join("extra.ignore");
        fs::write(&ignore, "# generated\n*.g.cs\n").unwrap();
        fs::write(dir.path().join("b.g.cs"), "B").unwrap();

        let ctx = context(dir.path());
        let mut session = ProjectSession::load(dir.path(), None).await.unwrap();
        let opts = FilterOpts {
            ext: vec![".cs".into(), ".json".into()],
            filters: vec!["IDE".into()],
            ignore_files: vec![ignore],
            ..FilterOpts::default()
        };
        let engine = build_engine(&session, &ctx.config, &opts).await.unwrap();
        let summary = session.apply_filters(&engine, None).unwrap();
        assert_eq!(summary.visible_files, 1);
    }

    #[tokio::test]
    async fn unknown_filter_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let session = ProjectSession::load(dir.path(), None).await.unwrap();
        let opts = FilterOpts {
            filters: vec!["Nope".into()],
            ..FilterOpts::default()
        };
        let err = build_engine(&session, &ctx.config, &opts).await.err().unwrap();
        assert!(err.to_string().contains("Unknown filter 'Nope'"));
    }

    #[test]
    fn prompt_resolution() {
        let config = AppConfig::default();
        let mut args = pack_args(Path::new("."));
        assert_eq!(resolve_prompt(&config, &args).unwrap(), None);

        args.prompt = Some("Be brief.".into());
        assert_eq!(resolve_prompt(&config, &args).unwrap().as_deref(), Some("Be brief."));

        args.prompt = None;
        args.prompt_name = Some("code-review".into());
        assert!(resolve_prompt(&config, &args).unwrap().is_some());

        args.prompt_name = Some("no such prompt".into());
        assert!(resolve_prompt(&config, &args).is_err());
    }

    #[tokio::test]
    async fn pack_writes_parts_and_records_the_project() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("proj");
        fs::create_dir_all(project.join("src")).unwrap();
        fs::write(project.join("src").join("a.cs"), "class A {}").unwrap();
        fs::write(project.join("README.md"), "# Readme").unwrap();
        let out = dir.path().join("out");

        let mut ctx = context(dir.path());
        let mut args = pack_args(&project);
        args.output_dir = Some(out.clone());
        pack(&mut ctx, args).await.unwrap();

        let part = fs::read_to_string(out.join("part-001.txt")).unwrap();
        assert!(part.contains("// File: src/a.cs"));
        assert!(part.contains("// File: README.md"));
        assert!(out.join(output::MANIFEST_FILE).exists());
        assert_eq!(ctx.config.recent_projects.len(), 1);
        assert!(dir.path().join("config.json").exists());
    }
}
