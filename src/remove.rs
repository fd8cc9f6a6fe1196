//! Strict recursive removal.
//!
//! Children are removed before their parent and the walk stops at the first
//! failure, so a directory is only ever removed once it is empty. Removing a
//! path that is already gone is an error.

use crate::error::{ShareError, ShareResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Removes `path`, depth-first when it is a directory.
///
/// Symbolic links are unlinked, never followed.
///
/// # Errors
///
/// * `ShareError::NotFound` if `path` does not exist.
/// * `ShareError::Io` for the first child (or directory) that could not be
///   removed. None of its ancestors are removed in that case.
pub fn remove_path(path: &Path) -> ShareResult<()> {
    remove_path_with(path, |_| {})
}

/// [`remove_path`], calling `on_emptied` with each directory once its files
/// are gone and its subdirectories are scheduled, before the directory itself
/// is removed.
fn remove_path_with<F>(path: &Path, mut on_emptied: F) -> ShareResult<()>
where
    F: FnMut(&Path),
{
    let metadata = fs::symlink_metadata(path).map_err(|e| ShareError::io(path, e))?;
    if !metadata.is_dir() {
        fs::remove_file(path).map_err(|e| ShareError::io(path, e))?;
        tracing::debug!(path = %path.display(), "removed file");
        return Ok(());
    }

    // (directory, children already scheduled)
    let mut stack: Vec<(PathBuf, bool)> = vec![(path.to_path_buf(), false)];

    while let Some((dir, expanded)) = stack.pop() {
        if expanded {
            fs::remove_dir(&dir).map_err(|e| ShareError::io(&dir, e))?;
            tracing::debug!(path = %dir.display(), "removed directory");
            continue;
        }

        stack.push((dir.clone(), true));
        for child in fs::read_dir(&dir).map_err(|e| ShareError::io(&dir, e))? {
            let child = child.map_err(|e| ShareError::io(&dir, e))?;
            let child_path = child.path();
            let file_type = child
                .file_type()
                .map_err(|e| ShareError::io(&child_path, e))?;

            if file_type.is_dir() {
                stack.push((child_path, false));
            } else {
                fs::remove_file(&child_path).map_err(|e| ShareError::io(&child_path, e))?;
                tracing::debug!(path = %child_path.display(), "removed file");
            }
        }
        on_emptied(&dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_remove_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file = temp_dir.path().join("gone.txt");
        fs::write(&file, "bye").unwrap();

        remove_path(&file).unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn test_remove_nested_tree() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("tree");
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("a/one.txt"), "1").unwrap();
        fs::write(root.join("a/b/two.txt"), "2").unwrap();
        fs::write(root.join("a/b/c/three.txt"), "3").unwrap();

        remove_path(&root).unwrap();

        assert!(!root.exists());
        assert!(temp_dir.path().exists());
    }

    #[test]
    fn test_remove_absent_path_is_not_found() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let err = remove_path(&temp_dir.path().join("missing")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_remove_twice_fails_second_time() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dir = temp_dir.path().join("once");
        fs::create_dir(&dir).unwrap();

        remove_path(&dir).unwrap();
        assert!(remove_path(&dir).unwrap_err().is_not_found());
    }

    #[test]
    fn test_remove_stops_when_a_directory_refills() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("root");
        let inner = root.join("inner");
        fs::create_dir_all(&inner).unwrap();
        fs::write(inner.join("first.txt"), "1").unwrap();
        fs::write(root.join("top.txt"), "t").unwrap();

        // A file written into `inner` after it was emptied keeps it non-empty.
        let result = remove_path_with(&root, |dir| {
            if dir == inner.as_path() {
                fs::write(inner.join("late.txt"), "late").unwrap();
            }
        });

        match result {
            Err(ShareError::Io { path, .. }) => assert_eq!(path, inner),
            other => panic!("Expected an Io error for the inner directory, got {:?}", other),
        }
        assert!(root.exists());
        assert!(inner.join("late.txt").exists());
        assert!(!inner.join("first.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_keeps_parent_when_child_cannot_be_removed() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().join("root");
        let locked = root.join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("pinned.txt"), "stay").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

        // Privileged users can unlink inside read-only directories.
        let canary = locked.join("canary");
        if fs::write(&canary, "").is_ok() {
            let _ = fs::remove_file(&canary);
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = remove_path(&root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(ShareError::Io { .. })));
        assert!(root.exists());
        assert!(locked.join("pinned.txt").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_unlinks_symlink_without_following() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let target = temp_dir.path().join("target");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("kept.txt"), "kept").unwrap();
        let link = temp_dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        remove_path(&link).unwrap();

        assert!(!link.exists());
        assert!(target.join("kept.txt").exists());
    }
}
