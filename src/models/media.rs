//! Media file models.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A video file considered for matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// File name without path.
    pub name: String,
    /// Lowercase extension without the leading dot.
    pub extension: String,
    /// File size in bytes.
    pub size: u64,
    /// Parent directory.
    pub directory: PathBuf,
}

impl CandidateFile {
    /// Build a candidate from an existing file on disk.
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::with_size(path, metadata.len()))
    }

    /// Build a candidate without touching the filesystem.
    pub fn with_size(path: &Path, size: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let directory = path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            path: path.to_path_buf(),
            name,
            extension,
            size,
            directory,
        }
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        if self.extension.is_empty() {
            return &self.name;
        }
        let cut = self.name.len().saturating_sub(self.extension.len() + 1);
        self.name.get(..cut).unwrap_or(&self.name)
    }
}
