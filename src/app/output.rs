//! Writes generated parts to disk and reports their approximate token cost.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tiktoken_rs::{cl100k_base, CoreBPE};

use crate::core::GeneratedPart;

pub const MANIFEST_FILE: &str = "manifest.json";

/// Token estimates for the `cl100k_base` encoding. Falls back to
/// four characters per token when the encoding cannot be loaded.
pub struct TokenCounter {
    bpe: Option<CoreBPE>,
}

impl TokenCounter {
    pub fn new() -> Self {
        match cl100k_base() {
            Ok(bpe) => Self { bpe: Some(bpe) },
            Err(e) => {
                tracing::warn!("Failed to load cl100k_base, estimating tokens from length: {}", e);
                Self { bpe: None }
            }
        }
    }

    pub fn count(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => text.chars().count().div_ceil(4),
        }
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WrittenPart {
    pub part_number: usize,
    pub file: PathBuf,
    pub character_count: usize,
    pub max_chars: usize,
    pub estimated_tokens: usize,
}

#[derive(Debug, Serialize)]
struct Manifest<'a> {
    project: &'a Path,
    generated_at: DateTime<Local>,
    parts: &'a [WrittenPart],
}

pub fn part_file_name(part_number: usize) -> String {
    format!("part-{part_number:03}.txt")
}

fn is_part_file_name(name: &str) -> bool {
    name.strip_prefix("part-")
        .and_then(|rest| rest.strip_suffix(".txt"))
        .is_some_and(|digits| digits.len() >= 3 && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Writes every part plus a manifest into `out_dir`.
///
/// Part files left over from an earlier run are removed first so the
/// directory always holds exactly one run.
pub fn write_parts(
    out_dir: &Path,
    project: &Path,
    parts: &[GeneratedPart],
    counter: &TokenCounter,
) -> Result<Vec<WrittenPart>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    remove_stale_parts(out_dir)?;

    let mut written = Vec::with_capacity(parts.len());
    for part in parts {
        let target = out_dir.join(part_file_name(part.part_number));
        write_atomically(out_dir, &target, part.content.as_bytes())?;
        tracing::debug!("Wrote {} ({} chars)", target.display(), part.character_count);
        written.push(WrittenPart {
            part_number: part.part_number,
            file: target,
            character_count: part.character_count,
            max_chars: part.max_chars,
            estimated_tokens: counter.count(&part.content),
        });
    }

    let manifest = Manifest {
        project,
        generated_at: Local::now(),
        parts: &written,
    };
    let json = serde_json::to_string_pretty(&manifest)?;
    write_atomically(out_dir, &out_dir.join(MANIFEST_FILE), json.as_bytes())?;

    tracing::info!("Wrote {} parts to {}", written.len(), out_dir.display());
    Ok(written)
}

fn remove_stale_parts(out_dir: &Path) -> Result<()> {
    for entry in fs::read_dir(out_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_str().is_some_and(is_part_file_name) && entry.path().is_file() {
            tracing::debug!("Removing stale part {}", entry.path().display());
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

fn write_atomically(dir: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(target)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(())
}

/// One line per part, then a total.
pub fn render_summary(written: &[WrittenPart]) -> String {
    let mut out = String::new();
    for part in written {
        out.push_str(&format!(
            "Part {}: {} / {} chars, ~{} tokens -> {}\n",
            part.part_number,
            part.character_count,
            part.max_chars,
            part.estimated_tokens,
            part.file.display()
        ));
    }
    let chars: usize = written.iter().map(|p| p.character_count).sum();
    let tokens: usize = written.iter().map(|p| p.estimated_tokens).sum();
    out.push_str(&format!(
        "{} parts, {} chars, ~{} tokens\n",
        written.len(),
        chars,
        tokens
    ));
    out
}
