//! Narrowing a directory listing down to what the operator wants to choose from.

use crate::entry::DirectoryEntry;
use std::collections::BTreeSet;
use std::fmt;

/// How the listing is narrowed before selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterMode {
    /// Every entry.
    All,
    /// Directories only.
    Directories,
    /// Files whose extension equals the given one.
    Extension(String),
}

impl FilterMode {
    /// Builds an extension filter, normalizing `"TXT"`, `"txt"` and `".txt"` alike.
    pub fn extension(ext: &str) -> Self {
        Self::Extension(normalize_extension(ext))
    }

    /// Labels of the modes a prompt may offer for the given extension set.
    ///
    /// Extension filtering is only offered when at least one extension exists.
    pub fn offered(extensions: &[String]) -> Vec<&'static str> {
        let mut modes = vec!["Show all items", "Show only directories"];
        if !extensions.is_empty() {
            modes.push("Filter by file extension");
        }
        modes
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Directories => write!(f, "directories"),
            Self::Extension(ext) => write!(f, "extension {}", ext),
        }
    }
}

/// Lowercases `ext` and makes sure it starts with a dot.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

/// Applies `mode` to `entries`, keeping listing order.
pub fn filter_by_mode(entries: &[DirectoryEntry], mode: &FilterMode) -> Vec<DirectoryEntry> {
    match mode {
        FilterMode::All => entries.to_vec(),
        FilterMode::Directories => entries
            .iter()
            .filter(|entry| entry.is_directory())
            .cloned()
            .collect(),
        FilterMode::Extension(ext) => entries
            .iter()
            .filter(|entry| entry.extension.as_deref() == Some(ext.as_str()))
            .cloned()
            .collect(),
    }
}

/// The sorted, deduplicated set of extensions present in `entries`.
pub fn distinct_extensions(entries: &[DirectoryEntry]) -> Vec<String> {
    entries
        .iter()
        .filter_map(|entry| entry.extension.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;

    fn sample() -> Vec<DirectoryEntry> {
        vec![
            DirectoryEntry::new("b.txt", EntryKind::File),
            DirectoryEntry::new("docs", EntryKind::Directory),
            DirectoryEntry::new("a.TXT", EntryKind::File),
            DirectoryEntry::new("image.png", EntryKind::File),
            DirectoryEntry::new("LICENSE", EntryKind::File),
            DirectoryEntry::new("assets", EntryKind::Directory),
        ]
    }

    fn names(entries: &[DirectoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_all_is_identity() {
        let entries = sample();
        assert_eq!(filter_by_mode(&entries, &FilterMode::All), entries);
    }

    #[test]
    fn test_directories_only() {
        let filtered = filter_by_mode(&sample(), &FilterMode::Directories);
        assert_eq!(names(&filtered), vec!["docs", "assets"]);
    }

    #[test]
    fn test_extension_matches_exactly() {
        let filtered = filter_by_mode(&sample(), &FilterMode::extension("TXT"));
        assert_eq!(names(&filtered), vec!["b.txt", "a.TXT"]);

        let filtered = filter_by_mode(&sample(), &FilterMode::extension(".png"));
        assert_eq!(names(&filtered), vec!["image.png"]);
    }

    #[test]
    fn test_extension_without_matches_is_empty() {
        let entries = vec![
            DirectoryEntry::new("README", EntryKind::File),
            DirectoryEntry::new("src", EntryKind::Directory),
        ];
        assert!(filter_by_mode(&entries, &FilterMode::extension(".txt")).is_empty());
    }

    #[test]
    fn test_distinct_extensions_sorted_and_deduplicated() {
        assert_eq!(distinct_extensions(&sample()), vec![".png", ".txt"]);
    }

    #[test]
    fn test_distinct_extensions_empty_without_files() {
        let entries = vec![DirectoryEntry::new("src", EntryKind::Directory)];
        assert!(distinct_extensions(&entries).is_empty());
    }

    #[test]
    fn test_extension_mode_offered_only_when_extensions_exist() {
        assert_eq!(FilterMode::offered(&[]).len(), 2);
        assert_eq!(FilterMode::offered(&[".txt".to_string()]).len(), 3);
    }
}
