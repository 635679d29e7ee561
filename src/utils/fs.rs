//! File system utilities.

use crate::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Supported video file extensions (lowercase, no dot).
pub const VIDEO_EXTENSIONS: &[&str] = &[
    // Common formats
    "mkv", "mp4", "avi", "mov", "wmv", // Additional formats
    "m4v", "ts", "m2ts", "flv", "webm", // Less common but supported
    "mpg", "mpeg", "vob", "ogv", "ogm", "divx", "xvid", "3gp", "3g2", "mts", "rm", "rmvb", "asf",
    "f4v",
];

/// Check if a path exists and is a directory.
pub fn ensure_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::PathNotFound(path.display().to_string()));
    }
    if !path.is_dir() {
        return Err(Error::NotADirectory(path.display().to_string()));
    }
    Ok(())
}

/// Get file extension in lowercase.
pub fn get_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check if a file is a video file based on extension.
pub fn is_video_file(path: &Path) -> bool {
    get_extension(path)
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Resolve `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve `path` against `root` and refuse anything that lands outside it.
pub fn ensure_within_root(root: &Path, path: &Path) -> Result<PathBuf> {
    let root = normalize_path(root);
    let absolute = if path.is_absolute() {
        normalize_path(path)
    } else {
        normalize_path(&root.join(path))
    };

    if absolute.starts_with(&root) {
        Ok(absolute)
    } else {
        Err(Error::OutsideRoot(path.display().to_string()))
    }
}

/// Whether two paths differ only by letter case of the file name.
pub fn is_case_only_rename(from: &Path, to: &Path) -> bool {
    if from == to || from.parent() != to.parent() {
        return false;
    }
    match (from.file_name(), to.file_name()) {
        (Some(a), Some(b)) => a.to_string_lossy().to_lowercase() == b.to_string_lossy().to_lowercase(),
        _ => false,
    }
}

/// Move a file from one location to another.
///
/// Refuses to overwrite an existing target. Case-only renames go through a
/// temporary name so they also work on case-insensitive filesystems.
pub fn move_file(from: &Path, to: &Path) -> Result<()> {
    if !from.exists() {
        return Err(Error::PathNotFound(from.display().to_string()));
    }

    if is_case_only_rename(from, to) {
        let temp = temp_name(from);
        std::fs::rename(from, &temp)?;
        if let Err(e) = std::fs::rename(&temp, to) {
            // Put the file back under its original name.
            let _ = std::fs::rename(&temp, from);
            return Err(e.into());
        }
        return Ok(());
    }

    if to.exists() {
        return Err(Error::FileAlreadyExists(to.display().to_string()));
    }

    // Try rename first (fast, same filesystem)
    if std::fs::rename(from, to).is_ok() {
        return Ok(());
    }

    // Fall back to copy + delete (cross filesystem)
    std::fs::copy(from, to)?;
    std::fs::remove_file(from)?;
    Ok(())
}

fn temp_name(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.renaming", name))
}

/// Check whether a directory has no entries.
pub fn is_dir_empty(path: &Path) -> Result<bool> {
    Ok(std::fs::read_dir(path)?.next().is_none())
}

/// First free path derived from `path` by adding ` (N)` before the extension.
pub fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 1;
    loop {
        let candidate = path.with_file_name(format!("{} ({}){}", stem, n, extension));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}
