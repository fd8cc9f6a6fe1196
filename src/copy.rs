//! Recursive copy of a file or directory tree into the staging folder.

use crate::error::{ShareError, ShareResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Copies `src` to `dest`, recursing into directories.
///
/// Directories are created (with any missing ancestors) before their children
/// are copied. Existing files at the destination are overwritten. The source
/// is never modified. A failure part-way leaves `dest` partially populated.
///
/// Returns the number of bytes copied.
///
/// # Errors
///
/// Returns `ShareError::NotFound` or `ShareError::Io` naming the path that
/// failed.
///
/// # Examples
///
/// ```no_run
/// use sharezip::copy::copy_path;
/// use std::path::Path;
///
/// let bytes = copy_path(Path::new("/data/photos"), Path::new("/data/shared-folder/photos"));
/// match bytes {
///     Ok(n) => println!("copied {} bytes", n),
///     Err(e) => eprintln!("copy failed: {}", e),
/// }
/// ```
pub fn copy_path(src: &Path, dest: &Path) -> ShareResult<u64> {
    let metadata = fs::metadata(src).map_err(|e| ShareError::io(src, e))?;
    if !metadata.is_dir() {
        return copy_file(src, dest);
    }

    let mut copied = 0u64;
    let mut pending: Vec<(PathBuf, PathBuf)> = vec![(src.to_path_buf(), dest.to_path_buf())];

    while let Some((from_dir, to_dir)) = pending.pop() {
        fs::create_dir_all(&to_dir).map_err(|e| ShareError::io(&to_dir, e))?;
        tracing::debug!(dir = %to_dir.display(), "created directory");

        let children = fs::read_dir(&from_dir).map_err(|e| ShareError::io(&from_dir, e))?;
        let mut subdirs = Vec::new();
        for child in children {
            let child = child.map_err(|e| ShareError::io(&from_dir, e))?;
            let from = child.path();
            let to = to_dir.join(child.file_name());
            let file_type = child.file_type().map_err(|e| ShareError::io(&from, e))?;

            if file_type.is_dir() {
                subdirs.push((from, to));
            } else {
                copied += copy_file(&from, &to)?;
            }
        }

        // Reversed so the stack pops subdirectories in listing order.
        pending.extend(subdirs.into_iter().rev());
    }

    Ok(copied)
}

fn copy_file(src: &Path, dest: &Path) -> ShareResult<u64> {
    let bytes = fs::copy(src, dest).map_err(|e| ShareError::io(src, e))?;
    tracing::debug!(from = %src.display(), to = %dest.display(), bytes, "copied file");
    Ok(bytes)
}
