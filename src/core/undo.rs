//! Undo execution module.
//!
//! Replays a restore point in reverse:
//! - Move files back to their original locations
//! - Recreate deleted directories
//! - Remove created directories that are still empty

use crate::core::journal::{latest_restore_point, load_restore_point};
use crate::models::journal::{EntryKind, JournalEntry, RestorePoint};
use crate::utils::fs::{ensure_within_root, is_dir_empty, move_file};
use crate::{Error, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};

/// Undo executor.
pub struct UndoExecutor {
    root: PathBuf,
    show_progress: bool,
}

impl UndoExecutor {
    /// Create a new undo executor for a working root.
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Undo a restore point.
    ///
    /// Every path is checked against the working root before anything is
    /// touched; a path outside it aborts the whole undo.
    pub fn execute(&self, point: &RestorePoint, dry_run: bool) -> Result<UndoReport> {
        for entry in &point.entries {
            for path in [&entry.from, &entry.to, &entry.path].into_iter().flatten() {
                ensure_within_root(&self.root, path)?;
            }
        }

        if dry_run {
            println!("{}", "🔍 Dry run - no changes will be made".bold().yellow());
        } else {
            println!("{}", "⏪ Undoing restore point...".bold().cyan());
        }
        println!();

        let mut report = UndoReport {
            journal: point.file.clone(),
            ..Default::default()
        };

        let pb = if self.show_progress && !dry_run {
            ProgressBar::new(point.entries.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );

        for entry in point.replay_order() {
            pb.set_message(describe(entry));
            pb.inc(1);

            if dry_run {
                println!("  {} {}", "[DRY RUN]".yellow(), describe(entry));
                report.success_count += 1;
                continue;
            }

            match self.undo_entry(entry) {
                Ok(true) => report.success_count += 1,
                Ok(false) => report.skip_count += 1,
                Err(e) => {
                    let error_msg = format!("{}: {}", describe(entry), e);
                    tracing::error!("Undo step failed: {}", error_msg);
                    report.errors.push(error_msg);
                    report.error_count += 1;
                }
            }
        }

        pb.finish_with_message("Done!");
        Ok(report)
    }

    /// Reverse one entry. `Ok(false)` means skipped.
    fn undo_entry(&self, entry: &JournalEntry) -> Result<bool> {
        match entry.kind {
            EntryKind::Move => {
                let (original, moved) = match (&entry.from, &entry.to) {
                    (Some(from), Some(to)) => (from, to),
                    _ => {
                        return Err(Error::InvalidJournal(
                            "move entry without from/to".to_string(),
                        ))
                    }
                };

                if !moved.exists() {
                    tracing::warn!("Source file not found, skipping: {:?}", moved);
                    return Ok(false);
                }

                // Create parent directory if needed
                if let Some(parent) = original.parent() {
                    if !parent.exists() {
                        fs::create_dir_all(parent)?;
                    }
                }

                move_file(moved, original)?;
                tracing::debug!("Moved back: {:?} -> {:?}", moved, original);
                Ok(true)
            }
            EntryKind::CreateDir => {
                let path = entry_path(entry)?;

                if !path.exists() {
                    tracing::debug!("Directory already removed, skipping: {:?}", path);
                    return Ok(false);
                }

                // Only remove if empty
                if !is_dir_empty(path)? {
                    tracing::warn!("Directory not empty, skipping: {:?}", path);
                    return Ok(false);
                }

                fs::remove_dir(path)?;
                tracing::debug!("Removed directory: {:?}", path);
                Ok(true)
            }
            EntryKind::DeleteDir => {
                let path = entry_path(entry)?;

                if path.exists() {
                    tracing::debug!("Directory already present: {:?}", path);
                    return Ok(false);
                }

                fs::create_dir_all(path)?;
                tracing::debug!("Recreated directory: {:?}", path);
                Ok(true)
            }
            EntryKind::Meta => Ok(false),
        }
    }
}

fn entry_path(entry: &JournalEntry) -> Result<&Path> {
    entry
        .path
        .as_deref()
        .ok_or_else(|| Error::InvalidJournal(format!("{:?} entry without path", entry.kind)))
}

/// One-line description of the reverse of an entry.
fn describe(entry: &JournalEntry) -> String {
    let show = |p: &Option<PathBuf>| {
        p.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "?".to_string())
    };
    match entry.kind {
        EntryKind::Move => format!("move {} -> {}", show(&entry.to), show(&entry.from)),
        EntryKind::CreateDir => format!("remove dir {}", show(&entry.path)),
        EntryKind::DeleteDir => format!("recreate dir {}", show(&entry.path)),
        EntryKind::Meta => "meta".to_string(),
    }
}

/// Result of an undo.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Journal that was replayed.
    pub journal: PathBuf,
    /// Whether the journal was consumed.
    pub journal_deleted: bool,
    /// Number of successful operations.
    pub success_count: usize,
    /// Number of skipped operations.
    pub skip_count: usize,
    /// Number of failed operations.
    pub error_count: usize,
    /// Error messages.
    pub errors: Vec<String>,
}

impl UndoReport {
    /// Check if the undo was successful.
    pub fn is_success(&self) -> bool {
        self.error_count == 0
    }

    /// Print summary.
    pub fn print_summary(&self) {
        println!();
        println!("{}", "📊 Undo Summary".bold().green());
        println!("  {} {}", "Successful:".bold(), self.success_count);
        println!("  {} {}", "Skipped:".bold(), self.skip_count);
        println!("  {} {}", "Failed:".bold(), self.error_count);
        if self.journal_deleted {
            println!("  {} {}", "Consumed:".bold(), self.journal.display());
        } else {
            println!("  {} {}", "Kept:".bold(), self.journal.display());
        }

        if !self.errors.is_empty() {
            println!();
            println!("{}", "❌ Errors:".bold().red());
            for error in &self.errors {
                println!("  - {}", error);
            }
        }
    }
}

/// Undo the most recent restore point of a working root.
///
/// The journal is deleted once every entry was replayed without error, so
/// the next-most-recent one becomes the latest.
pub fn undo_latest(root: &Path, dry_run: bool) -> Result<UndoReport> {
    let path = latest_restore_point(root)?
        .ok_or_else(|| Error::NoRestorePoint(root.display().to_string()))?;
    undo_file(root, &path, dry_run, true)
}

/// Undo a specific journal file.
pub fn undo_file(root: &Path, path: &Path, dry_run: bool, show_progress: bool) -> Result<UndoReport> {
    let point = load_restore_point(path)?;
    tracing::info!(
        "Undoing '{}' from {} ({} entries)",
        point.label,
        point.created,
        point.entries.len()
    );

    let executor = UndoExecutor::new(root).with_progress(show_progress);
    let mut report = executor.execute(&point, dry_run)?;

    if !dry_run && report.is_success() {
        fs::remove_file(path)?;
        report.journal_deleted = true;
        tracing::info!("Restore point consumed: {:?}", path);
    } else if !dry_run {
        tracing::warn!(
            "Keeping restore point {:?}: {} entries failed",
            path,
            report.error_count
        );
    }

    Ok(report)
}
