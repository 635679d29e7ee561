//! Restore point journal data model.
//!
//! A restore point is a JSONL file: one `meta` header line, then one line per
//! filesystem mutation in the order it was performed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Type tag of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Meta,
    Move,
    CreateDir,
    DeleteDir,
}

/// Header line of a restore point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalHeader {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub timestamp: String,
    pub label: String,
}

impl JournalHeader {
    pub fn new(label: &str, timestamp: String) -> Self {
        Self {
            kind: EntryKind::Meta,
            timestamp,
            label: label.to_string(),
        }
    }
}

/// One recorded mutation. Only the fields relevant to the kind are set:
/// `from`/`to` for moves, `path` for directory entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub from: Option<PathBuf>,
    #[serde(default)]
    pub to: Option<PathBuf>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub timestamp: String,
}

impl JournalEntry {
    pub fn moved(from: PathBuf, to: PathBuf, timestamp: String) -> Self {
        Self {
            kind: EntryKind::Move,
            from: Some(from),
            to: Some(to),
            path: None,
            timestamp,
        }
    }

    pub fn created_dir(path: PathBuf, timestamp: String) -> Self {
        Self {
            kind: EntryKind::CreateDir,
            from: None,
            to: None,
            path: Some(path),
            timestamp,
        }
    }

    pub fn deleted_dir(path: PathBuf, timestamp: String) -> Self {
        Self {
            kind: EntryKind::DeleteDir,
            from: None,
            to: None,
            path: Some(path),
            timestamp,
        }
    }
}

/// A loaded restore point.
#[derive(Debug, Clone, Default)]
pub struct RestorePoint {
    /// Journal file on disk.
    pub file: PathBuf,
    /// Label given at creation.
    pub label: String,
    /// Creation timestamp.
    pub created: String,
    /// Mutations in execution order.
    pub entries: Vec<JournalEntry>,
}

impl RestorePoint {
    /// Entries in undo (LIFO) order.
    pub fn replay_order(&self) -> impl Iterator<Item = &JournalEntry> {
        self.entries.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_line_shape() {
        let entry = JournalEntry::moved(
            PathBuf::from("/root/a.mkv"),
            PathBuf::from("/root/Season 1/a.mkv"),
            "2024-01-01T00:00:00Z".to_string(),
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "move");
        assert_eq!(json["from"], "/root/a.mkv");
        assert!(json["path"].is_null());
    }

    #[test]
    fn test_header_line_shape() {
        let header = JournalHeader::new("organize", "2024-01-01T00:00:00Z".to_string());
        let line = serde_json::to_string(&header).unwrap();
        assert_eq!(
            line,
            r#"{"type":"meta","timestamp":"2024-01-01T00:00:00Z","label":"organize"}"#
        );
    }

    #[test]
    fn test_replay_order_is_reversed() {
        let point = RestorePoint {
            entries: vec![
                JournalEntry::created_dir(PathBuf::from("/a"), String::new()),
                JournalEntry::created_dir(PathBuf::from("/a/b"), String::new()),
            ],
            ..Default::default()
        };
        let paths: Vec<_> = point
            .replay_order()
            .filter_map(|e| e.path.clone())
            .collect();
        assert_eq!(paths, vec![PathBuf::from("/a/b"), PathBuf::from("/a")]);
    }
}
