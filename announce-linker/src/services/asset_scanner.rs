//! Announcement recording scanner
//!
//! Recursive discovery of recordings under one directory. Yields filename
//! stems (the name with the audio extension stripped) in a deterministic
//! order: entries are visited sorted by file name.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Recording scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Recording scanner
pub struct AssetScanner {
    extensions: Vec<String>,
    ignore_patterns: Vec<String>,
}

impl AssetScanner {
    /// Create scanner accepting the given extensions (without the dot)
    ///
    /// Extension matching is case-sensitive: `Foo.MP3` is not a `mp3`
    /// recording.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(Into::into)
                .map(|ext: String| ext.trim_start_matches('.').to_string())
                .filter(|ext| !ext.is_empty())
                .collect(),
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                ".git".to_string(),
            ],
        }
    }

    /// Scan directory for recordings and return their stems
    pub fn scan(&self, root_path: &Path) -> Result<Vec<String>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        let mut stems = Vec::new();
        let mut skipped = 0usize;

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        for entry in walker {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    match self.recording_stem(&entry) {
                        Some(stem) => stems.push(stem),
                        None => skipped += 1,
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    // Continue scanning, don't abort
                }
            }
        }

        tracing::debug!(
            root = %root_path.display(),
            recordings = stems.len(),
            skipped,
            "Recording scan complete"
        );

        Ok(stems)
    }

    /// Check if entry should be descended into / considered
    ///
    /// Ignore patterns match whole file names below the scan root; the root
    /// itself is always scanned.
    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let file_name = entry.file_name().to_string_lossy();
        !self
            .ignore_patterns
            .iter()
            .any(|pattern| file_name == pattern.as_str())
    }

    /// Stem of a recording file, `None` for other files
    fn recording_stem(&self, entry: &DirEntry) -> Option<String> {
        let file_name = entry.file_name().to_str()?;
        self.extensions.iter().find_map(|ext| {
            file_name
                .strip_suffix(ext.as_str())
                .and_then(|rest| rest.strip_suffix('.'))
                .filter(|stem| !stem.is_empty())
                .map(str::to_string)
        })
    }
}

impl Default for AssetScanner {
    fn default() -> Self {
        Self::new(["mp3"])
    }
}

/// Number of distinct stems in a scan result
pub fn distinct_stems(stems: &[String]) -> usize {
    stems.iter().collect::<HashSet<_>>().len()
}
