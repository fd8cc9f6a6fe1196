//! Directory enumeration.
//!
//! Lists the immediate children of a directory together with the type and
//! extension information the filters and the selection prompt need.

use crate::error::{ShareError, ShareResult};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::Path;

/// Whether an entry is a directory or anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

/// One immediate child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// The entry's file name. Unique within one listing.
    pub name: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Lowercase extension with its leading dot (`".txt"`).
    ///
    /// `None` for directories and for names without an extension.
    pub extension: Option<String>,
}

impl DirectoryEntry {
    /// Builds an entry from a name and kind, deriving the extension.
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        let name = name.into();
        let extension = match kind {
            EntryKind::Directory => None,
            EntryKind::File => extension_of(&name),
        };
        Self {
            name,
            kind,
            extension,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// `"file"` or `"directory"`, as shown next to the name in the prompt.
    pub fn type_label(&self) -> &'static str {
        match self.kind {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

/// Lowercased extension of `name` including the dot.
///
/// Follows `Path::extension`: `".bashrc"` has none, `"archive.tar.gz"` is `".gz"`.
fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
}

/// Lists the immediate children of `dir` in filesystem order.
///
/// # Errors
///
/// Returns `ShareError::NotFound` if `dir` does not exist or cannot be read,
/// and `ShareError::Io` if reading an individual entry fails.
pub fn list_entries(dir: &Path) -> ShareResult<Vec<DirectoryEntry>> {
    let read_dir = fs::read_dir(dir).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => ShareError::NotFound {
            path: dir.to_path_buf(),
        },
        _ => ShareError::io(dir, e),
    })?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| ShareError::io(dir, e))?;
        let file_type = entry
            .file_type()
            .map_err(|e| ShareError::io(&entry.path(), e))?;
        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        entries.push(DirectoryEntry::new(
            entry.file_name().to_string_lossy().into_owned(),
            kind,
        ));
    }

    tracing::debug!(dir = %dir.display(), count = entries.len(), "listed directory");
    Ok(entries)
}
