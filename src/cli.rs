//! Command-line interface for sharezip.
//!
//! Parses arguments, resolves the source directory, loads configuration and
//! picks the selector (interactive prompt, or presets when `--select` is given)
//! before handing over to the pipeline.

use crate::config::ShareConfig;
use crate::error::{ShareError, ShareResult};
use crate::filter::FilterMode;
use crate::pipeline::{PipelineConfig, RunOutcome, Selector, run_pipeline, validate_folder_name};
use crate::prompt::{PresetSelector, PromptSelector};
use clap::{Parser, ValueEnum};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Pick items from a directory, zip them into <NAME>.zip and remove the originals.
#[derive(Debug, Parser)]
#[command(name = "sharezip", version, about)]
pub struct Cli {
    /// Directory to pick items from. Defaults to the current directory.
    pub path: Option<PathBuf>,

    /// Items to archive, skipping the interactive prompt. Repeatable.
    #[arg(short, long = "select", value_name = "NAME")]
    pub select: Vec<String>,

    /// Staging folder and archive name (with --select).
    #[arg(short, long)]
    pub name: Option<String>,

    /// Listing filter (with --select).
    #[arg(long, value_enum)]
    pub filter: Option<FilterArg>,

    /// Extension for `--filter extension`, e.g. `.txt`.
    #[arg(long, value_name = "EXT", required_if_eq("filter", "extension"))]
    pub ext: Option<String>,

    /// Show what would be archived and deleted without changing anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the run result as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Configuration file to use instead of the default lookup.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Filter choices accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    All,
    Directories,
    Extension,
}

impl Cli {
    /// The filter mode the flags ask for. `--ext` alone implies extension filtering.
    pub fn filter_mode(&self) -> FilterMode {
        match (self.filter, &self.ext) {
            (Some(FilterArg::All), _) => FilterMode::All,
            (Some(FilterArg::Directories), _) => FilterMode::Directories,
            (_, Some(ext)) => FilterMode::extension(ext),
            _ => FilterMode::All,
        }
    }

    fn preset_selector(&self) -> PresetSelector {
        let selector = PresetSelector::new(self.select.clone()).with_mode(self.filter_mode());
        match &self.name {
            Some(name) => selector.with_folder_name(name.clone()),
            None => selector,
        }
    }
}

/// Resolves `path` against `working_dir` and checks that it is a directory.
///
/// # Errors
///
/// Returns `ShareError::NotFound` if the resolved path does not exist or is
/// not a directory.
pub fn resolve_source_dir(path: Option<&Path>, working_dir: &Path) -> ShareResult<PathBuf> {
    let joined = match path {
        Some(path) => working_dir.join(path),
        None => working_dir.to_path_buf(),
    };

    match fs::canonicalize(&joined) {
        Ok(resolved) if resolved.is_dir() => Ok(resolved),
        _ => Err(ShareError::NotFound { path: joined }),
    }
}

/// Runs sharezip for parsed arguments.
///
/// `working_dir` stands in for the process's current directory: relative
/// paths and the local configuration file are resolved against it.
///
/// # Errors
///
/// A `--name` that is not a usable folder name is rejected before the source
/// directory is looked at.
pub fn run_cli(cli: &Cli, working_dir: &Path) -> ShareResult<RunOutcome> {
    if let Some(name) = &cli.name {
        validate_folder_name(name)?;
    }

    let source_dir = resolve_source_dir(cli.path.as_deref(), working_dir)?;
    let config = ShareConfig::load(cli.config.as_deref(), working_dir)?;
    let pipeline_config =
        PipelineConfig::from_config(source_dir, &config)?.with_dry_run(cli.dry_run);

    // With --json, stdout carries only the report.
    let mut selector: Box<dyn Selector> = if !cli.select.is_empty() {
        Box::new(cli.preset_selector())
    } else if cli.json {
        Box::new(PromptSelector::new(io::stdin().lock(), io::stderr()))
    } else {
        Box::new(PromptSelector::stdio())
    };

    run_pipeline(&pipeline_config, &mut *selector)
}

/// Installs the stderr log subscriber.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sharezip={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_preset_flags() {
        let cli = Cli::parse_from([
            "sharezip", "some/dir", "-s", "a.txt", "--select", "sub", "--name", "out",
            "--dry-run",
        ]);
        assert_eq!(cli.path, Some(PathBuf::from("some/dir")));
        assert_eq!(cli.select, vec!["a.txt", "sub"]);
        assert_eq!(cli.name.as_deref(), Some("out"));
        assert!(cli.dry_run);
        assert_eq!(cli.filter_mode(), FilterMode::All);
    }

    #[test]
    fn test_extension_filter_requires_ext() {
        let result = Cli::try_parse_from(["sharezip", "--filter", "extension"]);
        assert!(result.is_err());

        let cli = Cli::try_parse_from(["sharezip", "--filter", "extension", "--ext", "TXT"]).unwrap();
        assert_eq!(cli.filter_mode(), FilterMode::Extension(".txt".to_string()));
    }

    #[test]
    fn test_ext_alone_implies_extension_filter() {
        let cli = Cli::parse_from(["sharezip", "--ext", "md"]);
        assert_eq!(cli.filter_mode(), FilterMode::Extension(".md".to_string()));

        let cli = Cli::parse_from(["sharezip", "--filter", "directories"]);
        assert_eq!(cli.filter_mode(), FilterMode::Directories);
    }

    #[test]
    fn test_resolve_source_dir() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("inbox")).unwrap();
        fs::write(temp_dir.path().join("file.txt"), "x").unwrap();

        let resolved = resolve_source_dir(Some(Path::new("inbox")), temp_dir.path()).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("inbox"));

        let cwd = resolve_source_dir(None, temp_dir.path()).unwrap();
        assert_eq!(cwd, fs::canonicalize(temp_dir.path()).unwrap());

        assert!(
            resolve_source_dir(Some(Path::new("missing")), temp_dir.path())
                .unwrap_err()
                .is_not_found()
        );
        assert!(
            resolve_source_dir(Some(Path::new("file.txt")), temp_dir.path())
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn test_run_cli_with_presets() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("keep.md"), "keep").unwrap();
        fs::write(base.join("send.txt"), "send").unwrap();

        let cli = Cli::parse_from(["sharezip", "--select", "send.txt", "--name", "bundle"]);
        let outcome = run_cli(&cli, base).unwrap();

        assert!(matches!(outcome, RunOutcome::Completed(_)));
        assert!(base.join("bundle.zip").exists());
        assert!(!base.join("bundle").exists());
        assert!(!base.join("send.txt").exists());
        assert!(base.join("keep.md").exists());
    }

    #[test]
    fn test_run_cli_rejects_bad_name_before_reading_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "a").unwrap();

        // The source is missing too; the name is reported first.
        let cli = Cli::parse_from(["sharezip", "nowhere", "-s", "a.txt", "--name", "../x"]);
        let err = run_cli(&cli, temp_dir.path()).unwrap_err();
        assert!(matches!(err, ShareError::InvalidFolderName { .. }));

        let cli = Cli::parse_from(["sharezip", "-s", "a.txt", "--name", ".."]);
        assert!(matches!(
            run_cli(&cli, temp_dir.path()),
            Err(ShareError::InvalidFolderName { .. })
        ));
        assert!(temp_dir.path().join("a.txt").exists());
    }

    #[test]
    fn test_run_cli_missing_source_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let cli = Cli::parse_from(["sharezip", "nowhere", "--select", "x"]);
        assert!(run_cli(&cli, temp_dir.path()).unwrap_err().is_not_found());
    }
}
