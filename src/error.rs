//! Error types shared by every stage of the pipeline.

use crate::config::ConfigError;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while listing, staging, archiving or removing items.
#[derive(Debug, Error)]
pub enum ShareError {
    /// The path does not exist (or the directory cannot be listed).
    #[error("Path not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// A filesystem operation failed on the given path.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The archive could not be created or finalized.
    #[error("Failed to archive into {}: {reason}", path.display())]
    Archive { path: PathBuf, reason: String },

    /// The operator supplied a folder name that cannot be used.
    #[error("Invalid folder name '{name}': {reason}")]
    InvalidFolderName { name: String, reason: String },

    /// Reading an answer from the selection prompt failed.
    #[error("Prompt failed: {source}")]
    Prompt {
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ShareError {
    /// Wraps an I/O error for `path`, mapping `NotFound` onto its own variant.
    pub fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Returns true for the missing-path variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for sharezip operations.
pub type ShareResult<T> = Result<T, ShareError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_maps_not_found_kind() {
        let err = ShareError::io(
            Path::new("/missing"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Path not found: /missing");
    }

    #[test]
    fn test_io_keeps_other_kinds() {
        let err = ShareError::io(
            Path::new("/locked"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_not_found());
        assert!(matches!(err, ShareError::Io { .. }));
        assert!(err.to_string().contains("denied"));
    }
}
