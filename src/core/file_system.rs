//! File access behind a trait so packing and searching can run against
//! in-memory fixtures.

use async_trait::async_trait;
use std::path::Path;

use super::error::CoreError;
use crate::utils::file_detection::{looks_like_binary, BINARY_PLACEHOLDER};

#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Reads a file as text.
    async fn read_file_content(&self, path: &Path) -> Result<String, CoreError>;

    async fn exists(&self, path: &Path) -> bool;

    async fn is_dir(&self, path: &Path) -> bool;
}

/// The real file system, accessed through `tokio::fs`.
///
/// Invalid UTF-8 is decoded lossily. Content with a NUL byte near the start is
/// replaced by [`BINARY_PLACEHOLDER`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

#[async_trait]
impl FileSystem for OsFileSystem {
    async fn read_file_content(&self, path: &Path) -> Result<String, CoreError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| CoreError::from_io(e, path))?;
        if looks_like_binary(&bytes) {
            tracing::debug!("Binary content detected, skipping: {}", path.display());
            return Ok(BINARY_PLACEHOLDER.to_string());
        }
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn is_dir(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }
}
