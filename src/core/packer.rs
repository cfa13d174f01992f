//! Packs pinned and selected files into numbered, size-bounded parts.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::error::CoreError;
use super::file_system::FileSystem;
use super::progress::ProgressSink;

const FILE_SEPARATOR: &str = "\n\n";

/// One chunk of packed output, ready to be pasted into a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedPart {
    /// 1-based and contiguous.
    pub part_number: usize,
    pub content: String,
    /// `content.chars().count()`.
    pub character_count: usize,
    pub max_chars: usize,
}

impl GeneratedPart {
    fn new(part_number: usize, content: String, max_chars: usize) -> Self {
        Self {
            part_number,
            character_count: content.chars().count(),
            content,
            max_chars,
        }
    }
}

/// Inputs of a packing run.
#[derive(Debug, Clone)]
pub struct PackRequest {
    pub pinned: Vec<PathBuf>,
    pub selected: Vec<PathBuf>,
    pub base_path: PathBuf,
    pub max_chars: usize,
    pub include_headers: bool,
    pub global_prompt: Option<String>,
}

impl PackRequest {
    pub fn new(base_path: impl Into<PathBuf>, max_chars: usize) -> Self {
        Self {
            pinned: Vec::new(),
            selected: Vec::new(),
            base_path: base_path.into(),
            max_chars,
            include_headers: true,
            global_prompt: None,
        }
    }

    pub fn pinned(mut self, pinned: impl IntoIterator<Item = PathBuf>) -> Self {
        self.pinned = pinned.into_iter().collect();
        self
    }

    pub fn selected(mut self, selected: impl IntoIterator<Item = PathBuf>) -> Self {
        self.selected = selected.into_iter().collect();
        self
    }

    pub fn include_headers(mut self, include: bool) -> Self {
        self.include_headers = include;
        self
    }

    pub fn global_prompt(mut self, prompt: Option<String>) -> Self {
        self.global_prompt = prompt;
        self
    }

    /// Pinned paths in order, then selected paths that are not pinned.
    fn ordered_files(&self) -> Vec<(&Path, bool)> {
        self.pinned
            .iter()
            .map(|p| (p.as_path(), true))
            .chain(
                self.selected
                    .iter()
                    .filter(|p| !self.pinned.contains(p))
                    .map(|p| (p.as_path(), false)),
            )
            .collect()
    }

    fn header_for(&self, path: &Path) -> String {
        if self.include_headers {
            format!("// File: {}{FILE_SEPARATOR}", relative_display(&self.base_path, path))
        } else {
            String::new()
        }
    }
}

/// A file read and rendered once, before packing starts.
struct RenderedFile {
    is_pinned: bool,
    text: String,
    chars: usize,
}

pub struct PartPacker<F: FileSystem> {
    fs: F,
}

impl<F: FileSystem> PartPacker<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }

    pub async fn generate_parts(&self, request: &PackRequest) -> Result<Vec<GeneratedPart>, CoreError> {
        self.generate(request, None).await
    }

    /// Like [`generate_parts`](Self::generate_parts), reporting per-file
    /// progress and honouring the sink's cancellation between files.
    pub async fn generate_parts_with_progress(
        &self,
        request: &PackRequest,
        progress: &dyn ProgressSink,
    ) -> Result<Vec<GeneratedPart>, CoreError> {
        self.generate(request, Some(progress)).await
    }

    async fn generate(
        &self,
        request: &PackRequest,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Vec<GeneratedPart>, CoreError> {
        let start = std::time::Instant::now();
        let files = self.read_and_validate(request, progress).await?;

        let mut parts = Vec::new();
        let mut buffer = String::new();
        let mut buffer_chars = 0usize;
        let mut packed_pinned = false;

        if let Some(prompt) = request.global_prompt.as_deref().filter(|p| !p.trim().is_empty()) {
            buffer.push_str(prompt);
            buffer.push_str(FILE_SEPARATOR);
            buffer_chars = buffer.chars().count();
        }

        for file in files {
            let pinned_boundary = packed_pinned && !file.is_pinned;
            let over_budget = buffer_chars + file.chars > request.max_chars;
            if (pinned_boundary || over_budget) && buffer_chars > 0 {
                let part_number = parts.len() + 1;
                parts.push(GeneratedPart::new(
                    part_number,
                    std::mem::take(&mut buffer),
                    request.max_chars,
                ));
                buffer_chars = 0;
            }
            if pinned_boundary {
                packed_pinned = false;
            }
            packed_pinned |= file.is_pinned;

            buffer.push_str(&file.text);
            buffer_chars += file.chars;
        }

        if buffer_chars > 0 {
            parts.push(GeneratedPart::new(parts.len() + 1, buffer, request.max_chars));
        }

        if let Some(sink) = progress {
            sink.report(&format!("Generated {} parts", parts.len()), Some(100.0));
        }
        tracing::info!(
            "Packed {} pinned and {} selected files into {} parts in {:?}",
            request.pinned.len(),
            request.selected.len(),
            parts.len(),
            start.elapsed()
        );
        Ok(parts)
    }

    /// Reads every file once. Fails before any part exists if one file alone
    /// cannot fit into a part.
    async fn read_and_validate(
        &self,
        request: &PackRequest,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Vec<RenderedFile>, CoreError> {
        let ordered = request.ordered_files();
        let total = ordered.len();
        let mut rendered = Vec::with_capacity(total);

        for (index, (path, is_pinned)) in ordered.into_iter().enumerate() {
            if let Some(sink) = progress {
                if sink.is_cancelled() {
                    tracing::info!("Part generation cancelled after {} of {} files", index, total);
                    return Err(CoreError::Cancelled);
                }
                sink.report(
                    &format!("Reading files... {}/{}", index + 1, total),
                    Some((index + 1) as f64 / total as f64 * 100.0),
                );
            }

            let content = self.fs.read_file_content(path).await?;
            let header = request.header_for(path);
            let size = header.chars().count() + content.chars().count();
            if size > request.max_chars {
                let relative = relative_display(&request.base_path, path);
                tracing::warn!(
                    "File '{}' has {} chars, above the limit of {}",
                    relative,
                    size,
                    request.max_chars
                );
                return Err(CoreError::FileTooLarge {
                    path: relative,
                    size,
                    limit: request.max_chars,
                });
            }

            let text = format!("{header}{content}{FILE_SEPARATOR}");
            tracing::debug!("Read {} ({} chars)", path.display(), size);
            rendered.push(RenderedFile {
                is_pinned,
                chars: text.chars().count(),
                text,
            });

            if index % 10 == 9 {
                tokio::task::yield_now().await;
            }
        }
        Ok(rendered)
    }
}

/// `path` relative to `base` with `/` separators, or the full path when it
/// lies outside `base`.
pub fn relative_display(base: &Path, path: &Path) -> String {
    match path.strip_prefix(base) {
        Ok(relative) => relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_string_lossy().replace('\\', "/"),
    }
}
