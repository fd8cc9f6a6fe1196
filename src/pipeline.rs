//! The staging-and-archival pipeline.
//!
//! A run moves through these steps in order, never looping back:
//!
//! ```text
//! INIT → ENUMERATE → FILTER → AWAIT_SELECTION → STAGE → ARCHIVE → CLEAN_STAGING → DELETE_ORIGINALS → DONE
//! ```
//!
//! A missing source directory, or a staging path that cannot be used as a
//! directory, aborts the run with an error. An empty listing, filter result or
//! selection ends it early without touching the filesystem.
//! From `STAGE` on, every item and every step is attempted even if earlier
//! ones failed; each outcome is printed and collected in a [`RunReport`].

use crate::archive::{DEFAULT_COMPRESSION_LEVEL, archive_directory_with};
use crate::config::{ConfigError, DEFAULT_FOLDER_NAME, ListingRules, ShareConfig};
use crate::copy::copy_path;
use crate::entry::{DirectoryEntry, list_entries};
use crate::error::{ShareError, ShareResult};
use crate::filter::{FilterMode, distinct_extensions, filter_by_mode};
use crate::output::OutputFormatter;
use crate::remove::remove_path;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// The operator-facing side of a run: naming, filtering and picking items.
///
/// The pipeline asks these questions in order and acts on the answers; it
/// never talks to the terminal itself.
pub trait Selector {
    /// Name for the staging folder and archive. `default` is what an empty
    /// answer should mean.
    fn folder_name(&mut self, default: &str) -> ShareResult<String>;

    /// How to narrow the listing. `extensions` is the sorted set present in
    /// the listing; extension filtering must not be chosen when it is empty.
    fn filter_mode(&mut self, extensions: &[String]) -> ShareResult<FilterMode>;

    /// Names of the candidates to archive, in the order they should be processed.
    fn select(
        &mut self,
        candidates: &[DirectoryEntry],
        folder_name: &str,
        source_dir: &Path,
    ) -> ShareResult<Vec<String>>;
}

/// Steps of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Step {
    Init,
    Enumerate,
    Filter,
    AwaitSelection,
    Stage,
    Archive,
    CleanStaging,
    DeleteOriginals,
    Done,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::Enumerate => "ENUMERATE",
            Self::Filter => "FILTER",
            Self::AwaitSelection => "AWAIT_SELECTION",
            Self::Stage => "STAGE",
            Self::Archive => "ARCHIVE",
            Self::CleanStaging => "CLEAN_STAGING",
            Self::DeleteOriginals => "DELETE_ORIGINALS",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Everything a run needs besides the operator's answers.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory whose children are offered and where the archive is written.
    pub source_dir: PathBuf,
    /// Offered as the default staging folder name.
    pub default_folder_name: String,
    /// Deflate level for the archive.
    pub compression_level: i64,
    /// Entries hidden from the listing before filtering.
    pub listing: ListingRules,
    /// Stop after selection and print what would happen.
    pub dry_run: bool,
}

impl PipelineConfig {
    /// Built-in defaults for `source_dir`.
    pub fn new(source_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            default_folder_name: DEFAULT_FOLDER_NAME.to_string(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            listing: ListingRules::default(),
            dry_run: false,
        }
    }

    /// Settings for `source_dir` taken from a loaded configuration.
    pub fn from_config(
        source_dir: impl Into<PathBuf>,
        config: &ShareConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            source_dir: source_dir.into(),
            default_folder_name: config.archive.folder_name.clone(),
            compression_level: config.archive.compression_level,
            listing: config.listing_rules()?,
            dry_run: false,
        })
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}

/// Result of one attempted operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Succeeded,
    Failed { message: String },
}

impl Outcome {
    fn failed(message: impl ToString) -> Self {
        Self::Failed {
            message: message.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

/// Outcome for one selected item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemOutcome {
    pub name: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ItemOutcome {
    fn new(name: &str, outcome: Outcome) -> Self {
        Self {
            name: name.to_string(),
            outcome,
        }
    }
}

/// Outcome of the archive step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArchiveOutcome {
    Written { bytes: u64 },
    Failed { message: String },
}

/// Everything that happened during a run that reached `STAGE`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub source_dir: PathBuf,
    pub folder_name: String,
    pub archive_path: PathBuf,
    /// Requested names that were never staged or deleted.
    pub rejected: Vec<ItemOutcome>,
    pub staged: Vec<ItemOutcome>,
    pub archive: ArchiveOutcome,
    pub staging_cleanup: Outcome,
    pub deleted: Vec<ItemOutcome>,
}

impl RunReport {
    pub fn staged_ok(&self) -> usize {
        self.staged.iter().filter(|i| i.outcome.is_success()).count()
    }

    pub fn deleted_ok(&self) -> usize {
        self.deleted.iter().filter(|i| i.outcome.is_success()).count()
    }

    /// Size of the written archive, if the archive step succeeded.
    pub fn archive_bytes(&self) -> Option<u64> {
        match self.archive {
            ArchiveOutcome::Written { bytes } => Some(bytes),
            ArchiveOutcome::Failed { .. } => None,
        }
    }

    /// Number of failed operations across all steps.
    pub fn failure_count(&self) -> usize {
        let archive_failed = usize::from(self.archive_bytes().is_none());
        let cleanup_failed = usize::from(!self.staging_cleanup.is_success());
        (self.staged.len() - self.staged_ok())
            + (self.deleted.len() - self.deleted_ok())
            + archive_failed
            + cleanup_failed
    }
}

/// What a dry run would have done.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunPlan {
    pub folder_name: String,
    pub staging_dir: PathBuf,
    pub archive_path: PathBuf,
    pub items: Vec<String>,
    pub rejected: Vec<ItemOutcome>,
}

/// How a run ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The source directory had nothing to offer.
    EmptyListing,
    /// The chosen filter matched nothing.
    EmptyFilter,
    /// The operator picked nothing usable.
    EmptySelection,
    DryRun(DryRunPlan),
    Completed(RunReport),
}

/// Checks and trims a staging folder name.
///
/// The name becomes both a directory and a `.zip` file directly under the
/// source directory, so it must be a single non-empty path component.
pub fn validate_folder_name(name: &str) -> ShareResult<String> {
    let trimmed = name.trim();
    let reason = if trimmed.is_empty() {
        Some("name is empty")
    } else if trimmed == "." || trimmed == ".." {
        Some("name refers to a relative directory")
    } else if trimmed.contains('/') || trimmed.contains('\\') {
        Some("name contains a path separator")
    } else if trimmed.contains('\0') {
        Some("name contains a NUL byte")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(ShareError::InvalidFolderName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(trimmed.to_string()),
    }
}

/// Archive file name for a staging folder name.
pub fn archive_file_name(folder_name: &str) -> String {
    format!("{}.zip", folder_name)
}

/// Runs the pipeline once against `config.source_dir`.
///
/// # Errors
///
/// Returns `ShareError::NotFound` when the source directory is missing or
/// unreadable, and propagates selector and folder-name errors. A folder name
/// that collides with an existing file, or a staging folder that cannot be
/// created, ends the run before anything is copied or deleted. Failures while
/// staging items, archiving, cleaning up or deleting are never returned; they
/// are recorded in the [`RunReport`].
pub fn run_pipeline(
    config: &PipelineConfig,
    selector: &mut dyn Selector,
) -> ShareResult<RunOutcome> {
    let source_dir = config.source_dir.as_path();
    enter(Step::Init);
    let started_at = Local::now();

    match fs::metadata(source_dir) {
        Ok(metadata) if metadata.is_dir() => {}
        _ => {
            return Err(ShareError::NotFound {
                path: source_dir.to_path_buf(),
            });
        }
    }

    enter(Step::Enumerate);
    let entries = config.listing.apply(list_entries(source_dir)?);
    if entries.is_empty() {
        OutputFormatter::info("No files or directories found to select from.");
        return Ok(RunOutcome::EmptyListing);
    }

    let folder_name = validate_folder_name(&selector.folder_name(&config.default_folder_name)?)?;

    enter(Step::Filter);
    let extensions = distinct_extensions(&entries);
    let mode = selector.filter_mode(&extensions)?;
    tracing::debug!(mode = %mode, "filter chosen");
    let candidates = filter_by_mode(&entries, &mode);
    if candidates.is_empty() {
        OutputFormatter::info("No items match your filter criteria.");
        return Ok(RunOutcome::EmptyFilter);
    }

    enter(Step::AwaitSelection);
    let requested = selector.select(&candidates, &folder_name, source_dir)?;
    let (selected, rejected) = reconcile_selection(&candidates, requested, &folder_name);
    for item in &rejected {
        if let Outcome::Failed { message } = &item.outcome {
            OutputFormatter::warning(&format!("Skipping {}: {}", item.name, message));
        }
    }
    if selected.is_empty() {
        OutputFormatter::info("No items selected. Exiting...");
        return Ok(RunOutcome::EmptySelection);
    }

    let staging_dir = source_dir.join(&folder_name);
    let archive_path = source_dir.join(archive_file_name(&folder_name));
    check_staging_target(&staging_dir, &folder_name)?;

    if config.dry_run {
        return Ok(RunOutcome::DryRun(print_plan(DryRunPlan {
            folder_name,
            staging_dir,
            archive_path,
            items: selected,
            rejected,
        })));
    }

    enter(Step::Stage);
    prepare_staging(&staging_dir, &folder_name)?;
    let staged = stage_items(source_dir, &staging_dir, &folder_name, &selected);

    enter(Step::Archive);
    let archive = archive_staging(&staging_dir, &archive_path, &folder_name, config);

    enter(Step::CleanStaging);
    OutputFormatter::plain(&format!("Cleaning up {}...", folder_name));
    let staging_cleanup = match remove_path(&staging_dir) {
        Ok(()) => {
            OutputFormatter::success(&format!("{} cleaned up.", folder_name));
            Outcome::Succeeded
        }
        Err(e) => {
            OutputFormatter::error(&format!("Failed to clean up {}: {}", folder_name, e));
            Outcome::failed(e)
        }
    };

    enter(Step::DeleteOriginals);
    OutputFormatter::plain("Deleting original selected items...");
    let deleted = selected
        .iter()
        .map(|name| match remove_path(&source_dir.join(name)) {
            Ok(()) => {
                OutputFormatter::success(&format!("Deleted: {}", name));
                ItemOutcome::new(name, Outcome::Succeeded)
            }
            Err(e) => {
                OutputFormatter::error(&format!("Failed to delete {}: {}", name, e));
                ItemOutcome::new(name, Outcome::failed(e))
            }
        })
        .collect();

    enter(Step::Done);
    OutputFormatter::success("Done!");

    Ok(RunOutcome::Completed(RunReport {
        started_at,
        source_dir: source_dir.to_path_buf(),
        folder_name,
        archive_path,
        rejected,
        staged,
        archive,
        staging_cleanup,
        deleted,
    }))
}

fn enter(step: Step) {
    tracing::info!(step = %step, "entering step");
}

/// Splits the requested names into the ones to process and the ones to skip.
///
/// Keeps the requested order and drops repeats. Names outside the filtered
/// listing, and names that would collide with the staging folder or the
/// archive, are skipped.
fn reconcile_selection(
    candidates: &[DirectoryEntry],
    requested: Vec<String>,
    folder_name: &str,
) -> (Vec<String>, Vec<ItemOutcome>) {
    let known: HashSet<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
    let archive_name = archive_file_name(folder_name);
    let mut seen = HashSet::new();
    let mut selected = Vec::new();
    let mut rejected = Vec::new();

    for name in requested {
        if !seen.insert(name.clone()) {
            continue;
        }
        let reason = if !known.contains(name.as_str()) {
            Some("not in the filtered listing")
        } else if name == folder_name {
            Some("it is the staging folder")
        } else if name == archive_name {
            Some("it is the archive being written")
        } else {
            None
        };

        match reason {
            Some(reason) => {
                tracing::warn!(item = %name, reason, "selection rejected");
                rejected.push(ItemOutcome::new(&name, Outcome::failed(reason)));
            }
            None => selected.push(name),
        }
    }

    (selected, rejected)
}

/// Fails if something other than a directory already occupies the staging path.
///
/// Cleanup removes the staging path unconditionally, so it must never be a
/// file (or link) the run did not create.
fn check_staging_target(staging_dir: &Path, folder_name: &str) -> ShareResult<()> {
    match fs::symlink_metadata(staging_dir) {
        Ok(metadata) if !metadata.is_dir() => Err(ShareError::InvalidFolderName {
            name: folder_name.to_string(),
            reason: "a file with that name already exists in the source directory".to_string(),
        }),
        _ => Ok(()),
    }
}

/// Creates the staging folder. Nothing has been changed on disk if this fails.
fn prepare_staging(staging_dir: &Path, folder_name: &str) -> ShareResult<()> {
    check_staging_target(staging_dir, folder_name)?;

    // An existing folder is merged into, not rejected.
    if staging_dir.is_dir() {
        tracing::warn!(dir = %staging_dir.display(), "staging folder already exists");
        OutputFormatter::warning(&format!(
            "{} already exists; selected items will be merged into it.",
            folder_name
        ));
    }

    fs::create_dir_all(staging_dir).map_err(|e| ShareError::io(staging_dir, e))?;
    tracing::debug!(dir = %staging_dir.display(), "staging folder ready");
    Ok(())
}

fn stage_items(
    source_dir: &Path,
    staging_dir: &Path,
    folder_name: &str,
    selected: &[String],
) -> Vec<ItemOutcome> {
    OutputFormatter::plain(&format!("Copying selected items to {}...", folder_name));
    selected
        .iter()
        .map(|name| {
            let from = source_dir.join(name);
            let to = staging_dir.join(name);
            match copy_path(&from, &to) {
                Ok(_) => {
                    OutputFormatter::success(&format!("Copied: {}", name));
                    ItemOutcome::new(name, Outcome::Succeeded)
                }
                Err(e) => {
                    OutputFormatter::error(&format!("Failed to copy {}: {}", name, e));
                    ItemOutcome::new(name, Outcome::failed(e))
                }
            }
        })
        .collect()
}

fn archive_staging(
    staging_dir: &Path,
    archive_path: &Path,
    folder_name: &str,
    config: &PipelineConfig,
) -> ArchiveOutcome {
    OutputFormatter::plain(&format!("Zipping {}...", folder_name));
    let spinner = OutputFormatter::create_spinner("Zipping");
    let result = archive_directory_with(
        staging_dir,
        archive_path,
        config.compression_level,
        |entry| spinner.set_message(entry.to_string()),
    );
    spinner.finish_and_clear();

    match result {
        Ok(bytes) => {
            OutputFormatter::success(&format!(
                "Zipped successfully: {} ({} total bytes)",
                archive_path.display(),
                bytes
            ));
            ArchiveOutcome::Written { bytes }
        }
        Err(e) => {
            OutputFormatter::error(&format!("Failed to zip {}: {}", folder_name, e));
            ArchiveOutcome::Failed {
                message: e.to_string(),
            }
        }
    }
}

fn print_plan(plan: DryRunPlan) -> DryRunPlan {
    OutputFormatter::dry_run_notice("Selected items would be handled as follows:");
    for name in &plan.items {
        OutputFormatter::plain(&format!(
            " - {} → copied to {}/, archived, then deleted",
            name, plan.folder_name
        ));
    }
    OutputFormatter::plain(&format!("Archive: {}", plan.archive_path.display()));
    OutputFormatter::dry_run_notice("No files were modified.");
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;

    fn candidates() -> Vec<DirectoryEntry> {
        vec![
            DirectoryEntry::new("a.txt", EntryKind::File),
            DirectoryEntry::new("sub", EntryKind::Directory),
            DirectoryEntry::new("out", EntryKind::Directory),
            DirectoryEntry::new("out.zip", EntryKind::File),
        ]
    }

    #[test]
    fn test_validate_folder_name() {
        assert_eq!(validate_folder_name("  out ").unwrap(), "out");
        assert_eq!(validate_folder_name("shared-folder").unwrap(), "shared-folder");
        assert!(validate_folder_name("").is_err());
        assert!(validate_folder_name("   ").is_err());
        assert!(validate_folder_name("..").is_err());
        assert!(validate_folder_name("a/b").is_err());
        assert!(validate_folder_name("a\\b").is_err());
    }

    #[test]
    fn test_reconcile_keeps_order_and_drops_repeats() {
        let (selected, rejected) = reconcile_selection(
            &candidates(),
            vec!["sub".to_string(), "a.txt".to_string(), "sub".to_string()],
            "share",
        );
        assert_eq!(selected, vec!["sub", "a.txt"]);
        assert!(rejected.is_empty());
    }

    #[test]
    fn test_reconcile_rejects_unknown_and_colliding_names() {
        let (selected, rejected) = reconcile_selection(
            &candidates(),
            vec![
                "ghost".to_string(),
                "out".to_string(),
                "out.zip".to_string(),
                "a.txt".to_string(),
            ],
            "out",
        );
        assert_eq!(selected, vec!["a.txt"]);
        let names: Vec<_> = rejected.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ghost", "out", "out.zip"]);
        assert!(rejected.iter().all(|r| !r.outcome.is_success()));
    }

    #[test]
    fn test_staging_target_must_not_be_a_file() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let taken = temp_dir.path().join("out");
        fs::write(&taken, "not a folder").unwrap();

        let err = prepare_staging(&taken, "out").unwrap_err();
        assert!(matches!(err, ShareError::InvalidFolderName { .. }));
        assert_eq!(fs::read_to_string(&taken).unwrap(), "not a folder");

        let fresh = temp_dir.path().join("fresh");
        prepare_staging(&fresh, "fresh").unwrap();
        assert!(fresh.is_dir());
        prepare_staging(&fresh, "fresh").unwrap();
    }

    #[test]
    fn test_step_order_and_names() {
        assert!(Step::Init < Step::Enumerate);
        assert!(Step::Archive < Step::CleanStaging);
        assert!(Step::CleanStaging < Step::DeleteOriginals);
        assert_eq!(Step::AwaitSelection.to_string(), "AWAIT_SELECTION");
        assert_eq!(Step::DeleteOriginals.to_string(), "DELETE_ORIGINALS");
    }

    #[test]
    fn test_report_failure_count() {
        let report = RunReport {
            started_at: Local::now(),
            source_dir: PathBuf::from("/src"),
            folder_name: "out".to_string(),
            archive_path: PathBuf::from("/src/out.zip"),
            rejected: Vec::new(),
            staged: vec![
                ItemOutcome::new("a", Outcome::Succeeded),
                ItemOutcome::new("b", Outcome::failed("boom")),
            ],
            archive: ArchiveOutcome::Written { bytes: 42 },
            staging_cleanup: Outcome::failed("busy"),
            deleted: vec![
                ItemOutcome::new("a", Outcome::Succeeded),
                ItemOutcome::new("b", Outcome::Succeeded),
            ],
        };

        assert_eq!(report.staged_ok(), 1);
        assert_eq!(report.deleted_ok(), 2);
        assert_eq!(report.archive_bytes(), Some(42));
        assert_eq!(report.failure_count(), 2);
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let item = ItemOutcome::new("a.txt", Outcome::failed("denied"));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["name"], "a.txt");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["message"], "denied");

        let json = serde_json::to_value(RunOutcome::EmptyFilter).unwrap();
        assert_eq!(json["outcome"], "empty_filter");
    }
}
