//! Restore point journal.
//!
//! Two states: idle and active. `begin` opens a new JSONL file and writes the
//! header, `record` appends one line per mutation, `end` closes the file.
//! Journals live in `<root>/cleanup/restore_points/` and are named
//! `<yyyyMMdd_HHmmss>-<label>.jsonl`, so name order is creation order.

use crate::models::journal::{EntryKind, JournalEntry, JournalHeader, RestorePoint};
use crate::utils::fs::normalize_path;
use crate::{Error, Result};
use chrono::{Duration, Local, NaiveDateTime};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Side-channel folder under the working root.
pub const CLEANUP_DIR: &str = "cleanup";
/// Journal folder inside the cleanup folder.
pub const RESTORE_POINTS_DIR: &str = "restore_points";

const FILE_TIMESTAMP: &str = "%Y%m%d_%H%M%S";

/// Folder holding the restore points of a working root.
pub fn restore_points_dir(root: &Path) -> PathBuf {
    root.join(CLEANUP_DIR).join(RESTORE_POINTS_DIR)
}

/// Current time in the format used inside journal lines.
pub fn now_timestamp() -> String {
    Local::now().to_rfc3339()
}

struct ActiveRestorePoint {
    path: PathBuf,
    file: Box<dyn Write>,
    count: usize,
}

/// Append-only mutation journal for one working root.
pub struct Journal {
    root: PathBuf,
    dir: PathBuf,
    active: Option<ActiveRestorePoint>,
}

impl Journal {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            dir: restore_points_dir(root),
            active: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Activate a restore point backed by `writer`, without a header.
    #[cfg(test)]
    pub(crate) fn begin_with_writer(&mut self, path: PathBuf, writer: Box<dyn Write>) {
        self.active = Some(ActiveRestorePoint {
            path,
            file: writer,
            count: 0,
        });
    }

    /// Entries recorded in the active restore point.
    pub fn entry_count(&self) -> usize {
        self.active.as_ref().map(|a| a.count).unwrap_or(0)
    }

    /// Path of the active journal file.
    pub fn current_file(&self) -> Option<&Path> {
        self.active.as_ref().map(|a| a.path.as_path())
    }

    /// Start a restore point and write its header.
    pub fn begin(&mut self, label: &str) -> Result<PathBuf> {
        if let Some(active) = &self.active {
            return Err(Error::ExecuteError(format!(
                "restore point already active: {}",
                active.path.display()
            )));
        }

        fs::create_dir_all(&self.dir)?;

        let now = Local::now();
        let path = self.free_file_name(now.naive_local(), label);
        let mut file: Box<dyn Write> =
            Box::new(OpenOptions::new().create_new(true).append(true).open(&path)?);

        let header = JournalHeader::new(label, now.to_rfc3339());
        write_line(&mut file, &header)?;

        tracing::info!("Restore point started: {:?}", path);
        self.active = Some(ActiveRestorePoint {
            path: path.clone(),
            file,
            count: 0,
        });
        Ok(path)
    }

    /// Append an entry. Paths are stored absolute; does nothing when idle.
    pub fn record(&mut self, mut entry: JournalEntry) -> Result<()> {
        let root = self.root.clone();
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };

        let absolute = |p: PathBuf| {
            if p.is_absolute() {
                normalize_path(&p)
            } else {
                normalize_path(&root.join(p))
            }
        };
        entry.from = entry.from.map(absolute);
        entry.to = entry.to.map(absolute);
        entry.path = entry.path.map(absolute);

        write_line(&mut active.file, &entry)?;
        active.count += 1;
        Ok(())
    }

    pub fn record_move(&mut self, from: &Path, to: &Path) -> Result<()> {
        self.record(JournalEntry::moved(
            from.to_path_buf(),
            to.to_path_buf(),
            now_timestamp(),
        ))
    }

    pub fn record_create_dir(&mut self, path: &Path) -> Result<()> {
        self.record(JournalEntry::created_dir(path.to_path_buf(), now_timestamp()))
    }

    pub fn record_delete_dir(&mut self, path: &Path) -> Result<()> {
        self.record(JournalEntry::deleted_dir(path.to_path_buf(), now_timestamp()))
    }

    /// Close the restore point. A restore point without entries is removed.
    /// Returns the kept journal file.
    pub fn end(&mut self) -> Result<Option<PathBuf>> {
        let Some(mut active) = self.active.take() else {
            return Ok(None);
        };
        active.file.flush()?;
        drop(active.file);

        if active.count == 0 {
            fs::remove_file(&active.path)?;
            tracing::debug!("Removed empty restore point {:?}", active.path);
            return Ok(None);
        }

        tracing::info!(
            "Restore point closed with {} entries: {:?}",
            active.count,
            active.path
        );
        Ok(Some(active.path))
    }

    /// File name for a new journal. The stamp is moved past the newest
    /// existing one so name order stays strictly chronological.
    fn free_file_name(&self, at: NaiveDateTime, label: &str) -> PathBuf {
        let label = sanitize_label(label);
        let latest = fs::read_dir(&self.dir)
            .into_iter()
            .flatten()
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name().to_string_lossy().to_string();
                name.get(..15)
                    .and_then(|s| NaiveDateTime::parse_from_str(s, FILE_TIMESTAMP).ok())
            })
            .max();

        let mut stamp = at.format(FILE_TIMESTAMP).to_string();
        if let Some(latest) = latest {
            if stamp <= latest.format(FILE_TIMESTAMP).to_string() {
                stamp = (latest + Duration::seconds(1))
                    .format(FILE_TIMESTAMP)
                    .to_string();
            }
        }
        self.dir.join(format!("{}-{}.jsonl", stamp, label))
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        if self.active.is_some() {
            if let Err(e) = self.end() {
                tracing::error!("Failed to close restore point: {}", e);
            }
        }
    }
}

fn write_line<T: Serialize>(file: &mut dyn Write, value: &T) -> Result<()> {
    let line = serde_json::to_string(value)?;
    writeln!(file, "{}", line)?;
    file.flush()?;
    Ok(())
}

/// Label usable in a file name.
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "operation".to_string()
    } else {
        cleaned
    }
}

/// Load a journal file.
///
/// A truncated final line (interrupted write) is skipped with a warning;
/// any other malformed line is an error.
pub fn load_restore_point(path: &Path) -> Result<RestorePoint> {
    let content = fs::read_to_string(path)?;
    let lines: Vec<(usize, &str)> = content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .collect();

    let Some((_, first)) = lines.first() else {
        return Err(Error::InvalidJournal(format!("{}: empty file", path.display())));
    };
    let header: JournalHeader = serde_json::from_str(first)
        .map_err(|e| Error::InvalidJournal(format!("{}: bad header: {}", path.display(), e)))?;
    if header.kind != EntryKind::Meta {
        return Err(Error::InvalidJournal(format!(
            "{}: first line is not a meta header",
            path.display()
        )));
    }

    let mut entries = Vec::new();
    let last = lines.len() - 1;
    for (position, (line_no, line)) in lines.iter().enumerate().skip(1) {
        match serde_json::from_str::<JournalEntry>(line) {
            Ok(entry) if entry.kind == EntryKind::Meta => {
                tracing::debug!("Ignoring extra meta line {} in {:?}", line_no + 1, path);
            }
            Ok(entry) => entries.push(entry),
            Err(e) if position == last => {
                tracing::warn!(
                    "Skipping truncated last line {} of {:?}: {}",
                    line_no + 1,
                    path,
                    e
                );
            }
            Err(e) => {
                return Err(Error::InvalidJournal(format!(
                    "{}: line {}: {}",
                    path.display(),
                    line_no + 1,
                    e
                )));
            }
        }
    }

    Ok(RestorePoint {
        file: path.to_path_buf(),
        label: header.label,
        created: header.timestamp,
        entries,
    })
}

/// Journal files of a working root, newest first.
pub fn journal_files(root: &Path) -> Result<Vec<PathBuf>> {
    let dir = restore_points_dir(root);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "jsonl"))
        .collect();
    files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));
    Ok(files)
}

/// The most recent journal file, if any.
pub fn latest_restore_point(root: &Path) -> Result<Option<PathBuf>> {
    Ok(journal_files(root)?.into_iter().next())
}

/// Summary line for a restore point listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestorePointSummary {
    pub file: PathBuf,
    pub label: String,
    pub created: String,
    pub entry_count: usize,
}

/// All restore points of a working root, newest first. Unreadable files are
/// skipped with a warning.
pub fn list_restore_points(root: &Path) -> Result<Vec<RestorePointSummary>> {
    let mut summaries = Vec::new();
    for file in journal_files(root)? {
        match load_restore_point(&file) {
            Ok(point) => summaries.push(RestorePointSummary {
                file: point.file,
                label: point.label,
                created: point.created,
                entry_count: point.entries.len(),
            }),
            Err(e) => tracing::warn!("Skipping {:?}: {}", file, e),
        }
    }
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_idle_record_is_noop() {
        let temp = TempDir::new().unwrap();
        let mut journal = Journal::new(temp.path());
        journal.record_create_dir(Path::new("Season 1")).unwrap();
        assert!(!journal.is_active());
        assert!(!restore_points_dir(temp.path()).exists());
    }

    #[test]
    fn test_begin_record_end() {
        let temp = TempDir::new().unwrap();
        let mut journal = Journal::new(temp.path());
        let path = journal.begin("organize").unwrap();
        journal.record_create_dir(Path::new("Season 1")).unwrap();
        journal
            .record_move(&temp.path().join("a.mkv"), Path::new("Season 1/a.mkv"))
            .unwrap();
        assert_eq!(journal.entry_count(), 2);
        assert_eq!(journal.end().unwrap(), Some(path.clone()));

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with("-organize.jsonl"));

        let point = load_restore_point(&path).unwrap();
        assert_eq!(point.label, "organize");
        assert_eq!(point.entries.len(), 2);
        assert_eq!(
            point.entries[0].path.as_deref(),
            Some(temp.path().join("Season 1").as_path())
        );
        assert_eq!(
            point.entries[1].to.as_deref(),
            Some(temp.path().join("Season 1/a.mkv").as_path())
        );
    }

    #[test]
    fn test_header_is_first_line() {
        let temp = TempDir::new().unwrap();
        let mut journal = Journal::new(temp.path());
        let path = journal.begin("organize").unwrap();
        journal.record_create_dir(Path::new("x")).unwrap();
        journal.end().unwrap();

        let content = fs::read_to_string(path).unwrap();
        let first: serde_json::Value =
            serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first["type"], "meta");
        assert_eq!(first["label"], "organize");
        assert!(first["timestamp"].is_string());
    }

    #[test]
    fn test_empty_restore_point_removed() {
        let temp = TempDir::new().unwrap();
        let mut journal = Journal::new(temp.path());
        let path = journal.begin("organize").unwrap();
        assert_eq!(journal.end().unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn test_begin_twice_fails() {
        let temp = TempDir::new().unwrap();
        let mut journal = Journal::new(temp.path());
        journal.begin("a").unwrap();
        assert!(journal.begin("b").is_err());
    }

    #[test]
    fn test_names_sort_chronologically() {
        let temp = TempDir::new().unwrap();
        let mut journal = Journal::new(temp.path());
        let mut paths = Vec::new();
        for label in ["first", "second", "third"] {
            journal.begin(label).unwrap();
            journal.record_create_dir(Path::new(label)).unwrap();
            paths.push(journal.end().unwrap().unwrap());
        }

        let files = journal_files(temp.path()).unwrap();
        let newest_first: Vec<PathBuf> = paths.into_iter().rev().collect();
        assert_eq!(files, newest_first);
        assert_eq!(
            latest_restore_point(temp.path()).unwrap(),
            Some(files[0].clone())
        );
    }

    #[test]
    fn test_list_restore_points() {
        let temp = TempDir::new().unwrap();
        let mut journal = Journal::new(temp.path());
        journal.begin("organize run").unwrap();
        journal.record_create_dir(Path::new("a")).unwrap();
        journal.record_create_dir(Path::new("a/b")).unwrap();
        journal.end().unwrap();

        let list = list_restore_points(temp.path()).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].label, "organize run");
        assert_eq!(list[0].entry_count, 2);
        assert!(list[0]
            .file
            .to_string_lossy()
            .ends_with("-organize_run.jsonl"));
    }

    #[test]
    fn test_truncated_last_line_is_skipped() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("20240101_000000-x.jsonl");
        fs::write(
            &path,
            concat!(
                r#"{"type":"meta","timestamp":"t","label":"x"}"#,
                "\n",
                r#"{"type":"create_dir","path":"/r/a","timestamp":"t"}"#,
                "\n",
                r#"{"type":"move","from":"/r/a"#,
            ),
        )
        .unwrap();

        let point = load_restore_point(&path).unwrap();
        assert_eq!(point.entries.len(), 1);
    }

    #[test]
    fn test_missing_header_is_invalid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("20240101_000000-x.jsonl");
        fs::write(
            &path,
            r#"{"type":"create_dir","path":"/r/a","timestamp":"t"}"#,
        )
        .unwrap();
        assert!(matches!(
            load_restore_point(&path),
            Err(Error::InvalidJournal(_))
        ));
    }
}
