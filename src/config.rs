//! Configuration loading and listing exclusion rules.
//!
//! Configuration is read from TOML. Every table and key is optional; anything
//! left out falls back to the built-in default.
//!
//! ```toml
//! [archive]
//! folder_name = "shared-folder"
//! compression_level = 9
//!
//! [listing]
//! show_hidden = true
//!
//! [listing.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp"]
//! extensions = ["bak"]
//! regex = []
//! ```

use crate::archive::DEFAULT_COMPRESSION_LEVEL;
use crate::entry::DirectoryEntry;
use crate::filter::normalize_extension;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".sharezip.toml";

/// Staging folder (and archive) name used when nothing else is configured.
pub const DEFAULT_FOLDER_NAME: &str = "shared-folder";

/// Errors that can occur while loading or compiling configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Invalid TOML syntax, structure or value.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    Io(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareConfig {
    #[serde(default)]
    pub archive: ArchiveSettings,
    #[serde(default)]
    pub listing: ListingSettings,
}

/// Settings for the staging folder and the archive written from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveSettings {
    /// Default staging folder name offered to the operator.
    #[serde(default = "default_folder_name")]
    pub folder_name: String,
    /// Deflate level, 0 (store-like) to 9 (smallest).
    #[serde(default = "default_compression_level")]
    pub compression_level: i64,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            folder_name: default_folder_name(),
            compression_level: default_compression_level(),
        }
    }
}

fn default_folder_name() -> String {
    DEFAULT_FOLDER_NAME.to_string()
}

fn default_compression_level() -> i64 {
    DEFAULT_COMPRESSION_LEVEL
}

/// Which directory entries are offered for selection at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSettings {
    /// Whether entries starting with "." are listed. Defaults to true.
    #[serde(default = "default_show_hidden")]
    pub show_hidden: bool,

    #[serde(default)]
    pub exclude: ExcludeRules,
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            show_hidden: default_show_hidden(),
            exclude: ExcludeRules::default(),
        }
    }
}

fn default_show_hidden() -> bool {
    true
}

/// Rules for hiding entries from the listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact names to hide (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the entry name (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to hide, with or without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the entry name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl ShareConfig {
    /// Load configuration, falling back to defaults.
    ///
    /// Lookup order:
    /// 1. `config_path`, if provided
    /// 2. `.sharezip.toml` in `working_dir`
    /// 3. `~/.config/sharezip/config.toml`
    /// 4. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file is missing, or if any
    /// file that is found cannot be read, parsed or validated.
    pub fn load(config_path: Option<&Path>, working_dir: &Path) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = working_dir.join(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("sharezip")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Checks values that TOML typing alone cannot rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=9).contains(&self.archive.compression_level) {
            return Err(ConfigError::Invalid(format!(
                "compression_level must be between 0 and 9, got {}",
                self.archive.compression_level
            )));
        }
        if self.archive.folder_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "folder_name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Compiles the listing settings into matchable rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex pattern is invalid.
    pub fn listing_rules(&self) -> Result<ListingRules, ConfigError> {
        ListingRules::new(&self.listing)
    }
}

/// Compiled listing settings.
#[derive(Debug, Clone)]
pub struct ListingRules {
    show_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl Default for ListingRules {
    /// Lists everything.
    fn default() -> Self {
        Self {
            show_hidden: true,
            exclude_filenames: HashSet::new(),
            exclude_extensions: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }
}

impl ListingRules {
    fn new(settings: &ListingSettings) -> Result<Self, ConfigError> {
        let exclude_patterns = settings
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = settings
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            show_hidden: settings.show_hidden,
            exclude_filenames: settings.exclude.filenames.iter().cloned().collect(),
            exclude_extensions: settings
                .exclude
                .extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Whether `entry` should be offered for selection.
    pub fn should_list(&self, entry: &DirectoryEntry) -> bool {
        if !self.show_hidden && entry.name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(&entry.name) {
            return false;
        }

        if let Some(ext) = &entry.extension
            && self.exclude_extensions.contains(ext)
        {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&entry.name))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&entry.name))
    }

    /// Drops entries that should not be listed, keeping order.
    pub fn apply(&self, entries: Vec<DirectoryEntry>) -> Vec<DirectoryEntry> {
        entries
            .into_iter()
            .filter(|entry| self.should_list(entry))
            .collect()
    }
}
