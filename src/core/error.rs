//! Defines the custom error type for the `core` module.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the `core` module.
///
/// This enum encapsulates all possible errors that can occur during
/// core operations like tree walking, filtering, searching and part packing.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Represents an I/O error, typically from file system operations.
    #[error("I/O error for path {1}: {0}")]
    Io(#[source] std::io::Error, PathBuf),

    /// A path vanished (or never existed) when it was inspected.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Listing a directory was refused by the operating system.
    #[error("Access denied: {0}")]
    AccessDenied(PathBuf),

    /// The project directory could not be loaded.
    #[error("Failed to load project at {path}: {reason}")]
    ProjectLoad { path: PathBuf, reason: String },

    /// A single file does not fit into one part, so nothing is packed.
    #[error(
        "File '{path}' exceeds the maximum character limit.\n\
         File size: {size} chars\n\
         Limit: {limit} chars\n\n\
         Please increase the limit or exclude this file."
    )]
    FileTooLarge {
        path: String,
        size: usize,
        limit: usize,
    },

    /// Represents an error during the compilation of a search or glob regex.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Represents an error that occurred when a Tokio task was joined.
    /// This is often due to a task panicking or being cancelled.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Represents a user-initiated cancellation of an operation.
    #[error("Operation was cancelled by the user")]
    Cancelled,
}

impl CoreError {
    /// Wraps an `io::Error`, mapping `NotFound` and `PermissionDenied` to their dedicated variants.
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match err.kind() {
            std::io::ErrorKind::NotFound => CoreError::PathNotFound(path),
            std::io::ErrorKind::PermissionDenied => CoreError::AccessDenied(path),
            _ => CoreError::Io(err, path),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CoreError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_too_large_message_names_path_and_sizes() {
        let err = CoreError::FileTooLarge {
            path: "src/big.cs".to_string(),
            size: 200,
            limit: 100,
        };
        let message = err.to_string();
        assert!(message.contains("src/big.cs"));
        assert!(message.contains("200"));
        assert!(message.contains("100"));
    }

    #[test]
    fn from_io_maps_not_found() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(
            CoreError::from_io(io, "/tmp/x"),
            CoreError::PathNotFound(p) if p == PathBuf::from("/tmp/x")
        ));
    }
}
