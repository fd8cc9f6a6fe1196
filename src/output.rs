//! Output formatting and styling module.
//!
//! Every line the operator sees goes through [`OutputFormatter`], so the
//! pipeline itself never deals with colors or progress rendering.

use crate::pipeline::RunReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static OPERATOR_ON_STDERR: AtomicBool = AtomicBool::new(false);

/// Manages all CLI output with consistent styling and formatting.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗, on stderr)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - A spinner for the archive step
/// - The end-of-run summary table
pub struct OutputFormatter;

impl OutputFormatter {
    /// Routes every operator line to stderr, leaving stdout to machine output
    /// such as `--json`. Errors always go to stderr.
    pub fn use_stderr(enabled: bool) {
        OPERATOR_ON_STDERR.store(enabled, Ordering::Relaxed);
    }

    fn emit(line: fmt::Arguments<'_>) {
        if OPERATOR_ON_STDERR.load(Ordering::Relaxed) {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    /// Prints a success message in green with a checkmark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sharezip::output::OutputFormatter;
    /// OutputFormatter::success("Copied: notes.txt");
    /// ```
    pub fn success(message: &str) {
        Self::emit(format_args!("{} {}", "✓".green(), message));
    }

    /// Prints an error message in red with an X mark.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use sharezip::output::OutputFormatter;
    /// OutputFormatter::error("Failed to copy notes.txt: permission denied");
    /// ```
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        Self::emit(format_args!("{} {}", "⚠".yellow(), message));
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        Self::emit(format_args!("{}", message.cyan()));
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        Self::emit(format_args!("{}", message));
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        Self::emit(format_args!("\n{}", header.bold()));
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        Self::emit(format_args!("{}", format!("[DRY RUN] {}", message).yellow()));
    }

    /// Creates a spinner that shows the entry currently being archived.
    ///
    /// indicatif draws to stderr and stays hidden when stderr is not a terminal.
    pub fn create_spinner(prefix: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {prefix} {msg}")
        {
            spinner.set_style(style);
        }
        spinner.set_prefix(prefix.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }

    /// Prints the end-of-run summary table.
    pub fn summary_table(report: &RunReport) {
        Self::header("SUMMARY");

        let rows = [
            ("Staged", report.staged_ok(), report.staged.len()),
            ("Deleted", report.deleted_ok(), report.deleted.len()),
        ];
        let width = 8;

        Self::emit(format_args!(
            "{:<width$} | {}",
            "Step".bold(),
            "Result".bold(),
            width = width
        ));
        Self::emit(format_args!("{}", "-".repeat(width + 24)));
        for (label, ok, total) in rows {
            let counts = format!("{}/{}", ok, total);
            let counts = if ok == total {
                counts.green()
            } else {
                counts.red()
            };
            Self::emit(format_args!("{:<width$} | {} items", label, counts, width = width));
        }

        let archive = match report.archive_bytes() {
            Some(bytes) => format!("{} bytes", bytes).green(),
            None => "failed".red(),
        };
        Self::emit(format_args!("{:<width$} | {}", "Archive", archive, width = width));

        let cleanup = if report.staging_cleanup.is_success() {
            "removed".green()
        } else {
            "left behind".red()
        };
        Self::emit(format_args!("{:<width$} | {}", "Staging", cleanup, width = width));
        Self::emit(format_args!("{}", "-".repeat(width + 24)));

        if report.failure_count() == 0 {
            Self::success("All steps completed.");
        } else {
            Self::warning(&format!(
                "{} step(s) failed. Please review errors above.",
                report.failure_count()
            ));
        }
    }
}
