//! Packing the staging folder into a single zip archive.
//!
//! Entry names are relative to the archived directory, so the directory's own
//! name never appears as a prefix inside the archive.

use crate::error::{ShareError, ShareResult};
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Highest deflate level; used unless the configuration says otherwise.
pub const DEFAULT_COMPRESSION_LEVEL: i64 = 9;

/// Archives every file under `source_dir` into `out_file`.
///
/// Returns the size of the finished archive in bytes.
pub fn archive_directory(source_dir: &Path, out_file: &Path, level: i64) -> ShareResult<u64> {
    archive_directory_with(source_dir, out_file, level, |_| {})
}

/// Like [`archive_directory`], calling `on_entry` with each entry name once it
/// has been written.
///
/// The call returns only after the zip central directory has been written and
/// the output file has been synced to disk. Entries are written in file-name
/// order at every level of the tree.
///
/// # Errors
///
/// Returns `ShareError::Archive` if `source_dir` is missing, unreadable or not
/// a directory, and for any failure while walking, reading or writing. When
/// `source_dir` cannot be used, `out_file` is not created; on later failures it
/// may exist but is incomplete.
pub fn archive_directory_with<F>(
    source_dir: &Path,
    out_file: &Path,
    level: i64,
    mut on_entry: F,
) -> ShareResult<u64>
where
    F: FnMut(&str),
{
    let metadata = fs::metadata(source_dir).map_err(|e| {
        archive_error(out_file, format!("{}: {}", source_dir.display(), e))
    })?;
    if !metadata.is_dir() {
        return Err(archive_error(
            out_file,
            format!("{} is not a directory", source_dir.display()),
        ));
    }

    let file = File::create(out_file).map_err(|e| archive_error(out_file, e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(level));

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| archive_error(out_file, e))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| archive_error(out_file, e))?;
        let name = entry_name(relative);
        let size = entry.metadata().map_err(|e| archive_error(out_file, e))?.len();

        writer
            .start_file(name.as_str(), options.large_file(size >= u64::from(u32::MAX)))
            .map_err(|e| archive_error(out_file, e))?;
        let mut src = File::open(entry.path()).map_err(|e| {
            archive_error(out_file, format!("{}: {}", entry.path().display(), e))
        })?;
        io::copy(&mut src, &mut writer).map_err(|e| archive_error(out_file, e))?;

        tracing::debug!(entry = %name, bytes = size, "added archive entry");
        on_entry(&name);
    }

    let file = writer.finish().map_err(|e| archive_error(out_file, e))?;
    file.sync_all().map_err(|e| archive_error(out_file, e))?;
    let written = file
        .metadata()
        .map_err(|e| archive_error(out_file, e))?
        .len();

    tracing::info!(archive = %out_file.display(), bytes = written, "archive finished");
    Ok(written)
}

/// Joins the normal components of `relative` with `/`.
fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn archive_error(out_file: &Path, reason: impl ToString) -> ShareError {
    ShareError::Archive {
        path: out_file.to_path_buf(),
        reason: reason.to_string(),
    }
}
