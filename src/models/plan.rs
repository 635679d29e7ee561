//! Plan data model.

use super::episode::Episode;
use super::media::CandidateFile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The bucket a file is reported in. Every planned file carries exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ProposedRename,
    Discrepancy,
    Unmatched,
    Skipped,
    Duplicate,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::ProposedRename,
        Category::Discrepancy,
        Category::Unmatched,
        Category::Skipped,
        Category::Duplicate,
    ];

    /// Whether entries in this category still need something done to them.
    pub fn requires_action(&self) -> bool {
        !matches!(self, Category::Skipped)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::ProposedRename => write!(f, "rename"),
            Category::Discrepancy => write!(f, "discrepancy"),
            Category::Unmatched => write!(f, "unmatched"),
            Category::Skipped => write!(f, "skipped"),
            Category::Duplicate => write!(f, "duplicate"),
        }
    }
}

/// Which field disagreed with the reference record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscrepancyKind {
    Title,
    Number,
    Code,
}

impl fmt::Display for DiscrepancyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscrepancyKind::Title => write!(f, "title"),
            DiscrepancyKind::Number => write!(f, "number"),
            DiscrepancyKind::Code => write!(f, "code"),
        }
    }
}

/// A single extracted-vs-reference mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    /// Value found in the filename.
    pub extracted: String,
    /// Value of the matched reference record.
    pub expected: String,
}

impl Discrepancy {
    /// Structured detail: `kind|extracted|expected`.
    pub fn detail(&self) -> String {
        format!("{}|{}|{}", self.kind, self.extracted, self.expected)
    }
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: file has '{}', reference has '{}'",
            self.kind, self.extracted, self.expected
        )
    }
}

/// Outcome of matching one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    /// The file that was matched.
    pub file: CandidateFile,
    /// Matched episode, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<Episode>,
    /// File name the naming format produces.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposed_name: Option<String>,
    /// Series folder, starting with the series name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_folder: Option<PathBuf>,
    /// Mismatches between filename and reference.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub discrepancies: Vec<Discrepancy>,
}

impl MatchResult {
    /// An unmatched result for a file.
    pub fn unmatched(file: CandidateFile) -> Self {
        Self {
            file,
            episode: None,
            proposed_name: None,
            target_folder: None,
            discrepancies: Vec::new(),
        }
    }

    pub fn is_matched(&self) -> bool {
        self.episode.is_some()
    }

    pub fn has_discrepancy(&self) -> bool {
        !self.discrepancies.is_empty()
    }

    /// Kind of the first discrepancy.
    pub fn discrepancy_kind(&self) -> Option<DiscrepancyKind> {
        self.discrepancies.first().map(|d| d.kind)
    }

    /// All discrepancy details joined with "; ".
    pub fn discrepancy_detail(&self) -> Option<String> {
        if self.discrepancies.is_empty() {
            return None;
        }
        Some(
            self.discrepancies
                .iter()
                .map(Discrepancy::detail)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// Why a file ended up among the duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateReason {
    /// Same episode in another encoding; the smaller copy is moved aside.
    AlternateEncoding,
    /// Another file already claims the same target path.
    RenameCollision,
}

impl fmt::Display for DuplicateReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateReason::AlternateEncoding => write!(f, "Alternate Encoding"),
            DuplicateReason::RenameCollision => write!(f, "Rename Collision"),
        }
    }
}

/// A resolved duplicate: `kept` stays, `moved` goes to the duplicates folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicatePair {
    pub kept: PathBuf,
    pub moved: PathBuf,
    pub reason: DuplicateReason,
}

/// A file in the plan arena.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Position in the arena.
    pub id: usize,
    /// Current category tag.
    pub category: Category,
    /// Match outcome.
    pub result: MatchResult,
    /// Absolute target path for matched files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_path: Option<PathBuf>,
    /// Set when the entry is a duplicate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_reason: Option<DuplicateReason>,
}

impl PlanEntry {
    pub fn source(&self) -> &Path {
        &self.result.file.path
    }
}

/// The full reorganization plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    /// Plan version.
    pub version: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Working root.
    pub root: PathBuf,
    /// Series name used for folders and names.
    pub series_name: String,
    /// Naming format label.
    pub naming_format: String,
    /// File arena; categories are tags on the entries.
    pub entries: Vec<PlanEntry>,
    /// Resolved duplicate pairs.
    pub duplicates: Vec<DuplicatePair>,
}

impl Plan {
    /// Add a result to the arena and return its id.
    pub fn push(&mut self, result: MatchResult, category: Category) -> usize {
        let id = self.entries.len();
        self.entries.push(PlanEntry {
            id,
            category,
            result,
            target_path: None,
            duplicate_reason: None,
        });
        id
    }

    /// Move an entry to a category. The previous tag is replaced, so an
    /// entry can never sit in two categories.
    pub fn set_category(&mut self, id: usize, category: Category) {
        if let Some(entry) = self.entries.get_mut(id) {
            if entry.category != category {
                tracing::debug!(
                    "Reclassify {}: {} -> {}",
                    entry.result.file.name,
                    entry.category,
                    category
                );
            }
            entry.category = category;
            if category != Category::Duplicate {
                entry.duplicate_reason = None;
            }
        }
    }

    /// Tag an entry as a duplicate of `kept`.
    pub fn mark_duplicate(&mut self, id: usize, kept: &Path, reason: DuplicateReason) {
        self.set_category(id, Category::Duplicate);
        if let Some(entry) = self.entries.get_mut(id) {
            entry.duplicate_reason = Some(reason);
            self.duplicates.push(DuplicatePair {
                kept: kept.to_path_buf(),
                moved: entry.result.file.path.clone(),
                reason,
            });
        }
    }

    /// Entries currently tagged with a category.
    pub fn in_category(&self, category: Category) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(move |e| e.category == category)
    }

    pub fn count(&self, category: Category) -> usize {
        self.in_category(category).count()
    }

    /// Number of entries that still need action.
    pub fn pending_actions(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.category.requires_action())
            .count()
    }

    pub fn entry_for(&self, path: &Path) -> Option<&PlanEntry> {
        self.entries.iter().find(|e| e.source() == path)
    }
}
