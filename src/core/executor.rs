//! Plan executor module.
//!
//! Executes a plan under one restore point:
//! - mkdir: create missing target folders, one journal entry each
//! - move: rename matched files, divert duplicates and unmatched files
//! - sidecars: carry subtitles and thumbnails along with each video
//! - rmdir: remove source folders the run left empty

use crate::core::journal::{Journal, CLEANUP_DIR};
use crate::core::sidecar::plan_sidecars;
use crate::models::plan::{Category, Plan};
use crate::utils::fs::{ensure_within_root, is_case_only_rename, is_dir_empty, move_file, unique_path};
use crate::{Error, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

pub const DUPLICATES_DIR: &str = "duplicates";
pub const UNKNOWN_DIR: &str = "unknown";
pub const RESTORE_POINT_LABEL: &str = "organize";

/// Executor options.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Rename discrepancy entries as well.
    pub accept_discrepancies: bool,
    /// Remove source folders emptied by the run.
    pub remove_empty_dirs: bool,
    /// Suffix for renamed thumbnails.
    pub thumbnail_style: String,
    pub show_progress: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            accept_discrepancies: false,
            remove_empty_dirs: true,
            thumbnail_style: "thumb".to_string(),
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionKind {
    Rename,
    Duplicate,
    Unknown,
}

#[derive(Debug, Clone)]
struct Action {
    kind: ActionKind,
    from: PathBuf,
    to: PathBuf,
}

enum MoveOutcome {
    Moved(PathBuf),
    Deferred,
}

/// Plan executor.
pub struct Executor {
    root: PathBuf,
    options: ExecuteOptions,
}

impl Executor {
    /// Create a new executor for a working root.
    pub fn new(root: &Path, options: ExecuteOptions) -> Self {
        Self {
            root: root.to_path_buf(),
            options,
        }
    }

    pub fn cleanup_dir(&self) -> PathBuf {
        self.root.join(CLEANUP_DIR)
    }

    /// Execute a plan. Returns `OutsideRoot` without touching anything when a
    /// source or target lies outside the working root.
    pub fn execute(&self, plan: &Plan) -> Result<ExecutionReport> {
        let mut journal = Journal::new(&self.root);
        self.execute_in(plan, &mut journal)
    }

    /// Execute a plan, recording into `journal`. A restore point is started
    /// unless one is already active.
    fn execute_in(&self, plan: &Plan, journal: &mut Journal) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::default();
        let actions = self.collect_actions(plan, &mut report)?;

        if actions.is_empty() {
            tracing::info!("Nothing to execute");
            return Ok(report);
        }

        println!("{}", "🚀 Executing plan...".bold().cyan());
        println!();

        if !journal.is_active() {
            journal.begin(RESTORE_POINT_LABEL)?;
        }

        let scheduled: HashSet<PathBuf> = actions.iter().map(|a| a.from.clone()).collect();
        let mut emptied: BTreeSet<PathBuf> = BTreeSet::new();
        let mut deferred: Vec<&Action> = Vec::new();

        let pb = if self.options.show_progress {
            ProgressBar::new(actions.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );

        for action in &actions {
            pb.set_message(file_name(&action.from));
            pb.inc(1);

            match self.perform(action, journal, &mut report, Some(&scheduled)) {
                Ok(MoveOutcome::Moved(from_dir)) => {
                    emptied.insert(from_dir);
                }
                Ok(MoveOutcome::Deferred) => deferred.push(action),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => report.fail(&action.from, e),
            }
        }

        // Targets freed by later moves get a second chance.
        for action in deferred {
            tracing::debug!("Retrying deferred move of {:?}", action.from);
            match self.perform(action, journal, &mut report, None) {
                Ok(MoveOutcome::Moved(from_dir)) => {
                    emptied.insert(from_dir);
                }
                Ok(MoveOutcome::Deferred) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => report.fail(&action.from, e),
            }
        }

        pb.finish_with_message("Done!");

        if self.options.remove_empty_dirs {
            self.remove_empty_dirs(&emptied, journal, &mut report)?;
        }

        report.restore_point = journal.end()?;
        Ok(report)
    }

    /// Turn plan entries into moves and validate every path up front.
    fn collect_actions(&self, plan: &Plan, report: &mut ExecutionReport) -> Result<Vec<Action>> {
        let mut side_channel = Vec::new();
        let mut renames = Vec::new();

        for entry in &plan.entries {
            let from = entry.source().to_path_buf();
            let action = match entry.category {
                Category::Skipped => continue,
                Category::Discrepancy if !self.options.accept_discrepancies => {
                    report.discrepancies_left += 1;
                    continue;
                }
                Category::ProposedRename | Category::Discrepancy => {
                    let Some(to) = entry.target_path.clone() else {
                        report.fail(&from, Error::ExecuteError("no target path".to_string()));
                        continue;
                    };
                    Action {
                        kind: ActionKind::Rename,
                        from,
                        to,
                    }
                }
                Category::Duplicate => Action {
                    kind: ActionKind::Duplicate,
                    to: self.side_channel_path(DUPLICATES_DIR, &from),
                    from,
                },
                Category::Unmatched => Action {
                    kind: ActionKind::Unknown,
                    to: self.side_channel_path(UNKNOWN_DIR, &from),
                    from,
                },
            };

            ensure_within_root(&self.root, &action.from)?;
            ensure_within_root(&self.root, &action.to)?;

            if action.kind == ActionKind::Rename {
                renames.push(action);
            } else {
                side_channel.push(action);
            }
        }

        // Diverted files go first so they free up rename targets.
        side_channel.extend(renames);
        Ok(side_channel)
    }

    /// `cleanup/<channel>/<path relative to root>`.
    fn side_channel_path(&self, channel: &str, from: &Path) -> PathBuf {
        let relative = from
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(file_name(from)));
        self.cleanup_dir().join(channel).join(relative)
    }

    /// Move one file and its sidecars. Returns the source folder on success.
    fn perform(
        &self,
        action: &Action,
        journal: &mut Journal,
        report: &mut ExecutionReport,
        scheduled: Option<&HashSet<PathBuf>>,
    ) -> Result<MoveOutcome> {
        let from = &action.from;
        let to = match action.kind {
            ActionKind::Rename => action.to.clone(),
            ActionKind::Duplicate | ActionKind::Unknown => unique_path(&action.to),
        };

        if !from.exists() {
            return Err(Error::PathNotFound(from.display().to_string()));
        }
        if to.exists() && !is_case_only_rename(from, &to) {
            if scheduled.is_some_and(|s| s.contains(&to)) {
                tracing::debug!("Target {:?} is still occupied, deferring", to);
                return Ok(MoveOutcome::Deferred);
            }
            return Err(Error::FileAlreadyExists(to.display().to_string()));
        }

        if let Some(parent) = to.parent() {
            self.create_dirs(parent, journal, report)?;
        }

        move_file(from, &to)?;
        journal
            .record_move(from, &to)
            .map_err(|e| unrecorded(e, from, || move_file(&to, from)))?;
        tracing::info!("Moved: {:?} -> {:?}", from, to);

        match action.kind {
            ActionKind::Rename => report.renamed += 1,
            ActionKind::Duplicate => report.duplicates_moved += 1,
            ActionKind::Unknown => report.unknown_moved += 1,
        }

        self.move_sidecars(from, &to, journal, report)?;

        Ok(MoveOutcome::Moved(
            from.parent().map(Path::to_path_buf).unwrap_or_default(),
        ))
    }

    fn move_sidecars(
        &self,
        original: &Path,
        moved: &Path,
        journal: &mut Journal,
        report: &mut ExecutionReport,
    ) -> Result<()> {
        for sidecar in plan_sidecars(original, moved, &self.options.thumbnail_style)? {
            ensure_within_root(&self.root, &sidecar.to)?;
            if sidecar.to.exists() && !is_case_only_rename(&sidecar.from, &sidecar.to) {
                tracing::warn!(
                    "Sidecar target {:?} already exists, leaving {:?}",
                    sidecar.to,
                    sidecar.from
                );
                report.sidecars_skipped += 1;
                continue;
            }
            match move_file(&sidecar.from, &sidecar.to) {
                Ok(()) => {
                    journal
                        .record_move(&sidecar.from, &sidecar.to)
                        .map_err(|e| {
                            unrecorded(e, &sidecar.from, || move_file(&sidecar.to, &sidecar.from))
                        })?;
                    tracing::debug!("Sidecar: {:?} -> {:?}", sidecar.from, sidecar.to);
                    report.sidecars_moved += 1;
                }
                Err(e) => report.fail(&sidecar.from, e),
            }
        }
        Ok(())
    }

    /// Create `dir` and its missing ancestors top-down, journaling each.
    fn create_dirs(&self, dir: &Path, journal: &mut Journal, report: &mut ExecutionReport) -> Result<()> {
        let mut missing = Vec::new();
        let mut current = Some(dir);
        while let Some(path) = current {
            if path.exists() {
                break;
            }
            missing.push(path.to_path_buf());
            current = path.parent();
        }

        for path in missing.into_iter().rev() {
            ensure_within_root(&self.root, &path)?;
            fs::create_dir(&path)?;
            journal
                .record_create_dir(&path)
                .map_err(|e| unrecorded(e, &path, || Ok(fs::remove_dir(&path)?)))?;
            tracing::debug!("Created directory: {:?}", path);
            report.dirs_created += 1;
        }
        Ok(())
    }

    /// Remove emptied source folders and their emptied ancestors, deepest
    /// first. The root and the cleanup tree are never removed.
    fn remove_empty_dirs(
        &self,
        sources: &BTreeSet<PathBuf>,
        journal: &mut Journal,
        report: &mut ExecutionReport,
    ) -> Result<()> {
        let cleanup = self.cleanup_dir();
        let mut candidates: BTreeSet<PathBuf> = BTreeSet::new();
        for dir in sources {
            let mut current = Some(dir.as_path());
            while let Some(path) = current {
                if path == self.root || !path.starts_with(&self.root) || path.starts_with(&cleanup) {
                    break;
                }
                candidates.insert(path.to_path_buf());
                current = path.parent();
            }
        }

        let mut ordered: Vec<PathBuf> = candidates.into_iter().collect();
        ordered.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

        for dir in ordered {
            if !dir.is_dir() {
                continue;
            }
            match is_dir_empty(&dir) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::warn!("Cannot inspect {:?}: {}", dir, e);
                    continue;
                }
            }
            match fs::remove_dir(&dir) {
                Ok(()) => {
                    journal
                        .record_delete_dir(&dir)
                        .map_err(|e| unrecorded(e, &dir, || Ok(fs::create_dir(&dir)?)))?;
                    tracing::debug!("Removed empty directory: {:?}", dir);
                    report.dirs_removed += 1;
                }
                Err(e) => report.fail(&dir, e.into()),
            }
        }
        Ok(())
    }
}

/// A change the journal could not record is reverted, and the run stops so
/// the restore point stays complete.
fn unrecorded(error: Error, path: &Path, revert: impl FnOnce() -> Result<()>) -> Error {
    if let Err(e) = revert() {
        tracing::error!("Could not revert unrecorded change at {:?}: {}", path, e);
    }
    Error::JournalWrite(format!("{}: {}", path.display(), error))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Outcome of executing a plan.
#[derive(Debug, Default)]
pub struct ExecutionReport {
    /// Journal of this run, `None` when nothing was mutated.
    pub restore_point: Option<PathBuf>,
    pub renamed: usize,
    pub duplicates_moved: usize,
    pub unknown_moved: usize,
    pub sidecars_moved: usize,
    pub sidecars_skipped: usize,
    pub dirs_created: usize,
    pub dirs_removed: usize,
    /// Discrepancies left alone because they were not accepted.
    pub discrepancies_left: usize,
    pub error_count: usize,
    pub errors: Vec<String>,
}

impl ExecutionReport {
    fn fail(&mut self, path: &Path, error: Error) {
        let message = format!("{}: {}", path.display(), error);
        tracing::error!("Operation failed: {}", message);
        self.errors.push(message);
        self.error_count += 1;
    }

    pub fn is_success(&self) -> bool {
        self.error_count == 0
    }

    /// Number of files moved, sidecars included.
    pub fn files_moved(&self) -> usize {
        self.renamed + self.duplicates_moved + self.unknown_moved + self.sidecars_moved
    }

    /// Print summary.
    pub fn print_summary(&self) {
        println!();
        println!("{}", "📊 Execution Summary".bold().green());
        println!("  {} {}", "Renamed:".bold(), self.renamed);
        println!("  {} {}", "Duplicates moved aside:".bold(), self.duplicates_moved);
        println!("  {} {}", "Unmatched moved aside:".bold(), self.unknown_moved);
        println!("  {} {}", "Sidecars moved:".bold(), self.sidecars_moved);
        if self.sidecars_skipped > 0 {
            println!("  {} {}", "Sidecars skipped:".bold(), self.sidecars_skipped);
        }
        println!(
            "  {} {} created, {} removed",
            "Folders:".bold(),
            self.dirs_created,
            self.dirs_removed
        );
        if self.discrepancies_left > 0 {
            println!(
                "  {} {}",
                "Discrepancies left for review:".bold().yellow(),
                self.discrepancies_left
            );
        }
        println!("  {} {}", "Failed:".bold(), self.error_count);
        if let Some(path) = &self.restore_point {
            println!("  {} {}", "Restore point:".bold(), path.display());
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::journal::load_restore_point;
    use crate::models::media::CandidateFile;
    use crate::models::plan::{DuplicateReason, MatchResult};
    use tempfile::TempDir;

    fn options() -> ExecuteOptions {
        ExecuteOptions {
            show_progress: false,
            ..Default::default()
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }

    fn push(plan: &mut Plan, path: &Path, category: Category, target: Option<PathBuf>) -> usize {
        let id = plan.push(
            MatchResult::unmatched(CandidateFile::from_path(path).unwrap()),
            category,
        );
        plan.entries[id].target_path = target;
        id
    }

    #[test]
    fn test_execute_moves_and_journals() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("incoming/a.mkv"));
        touch(&root.join("incoming/a.en.srt"));
        touch(&root.join("junk/b.mkv"));

        let mut plan = Plan::default();
        let target = root.join("Show/Season 1/Show - s01e01 - A.mkv");
        push(&mut plan, &root.join("incoming/a.mkv"), Category::ProposedRename, Some(target.clone()));
        push(&mut plan, &root.join("junk/b.mkv"), Category::Unmatched, None);

        let report = Executor::new(root, options()).execute(&plan).unwrap();
        assert!(report.is_success());
        assert_eq!(report.renamed, 1);
        assert_eq!(report.unknown_moved, 1);
        assert_eq!(report.sidecars_moved, 1);
        assert!(target.exists());
        assert!(root.join("Show/Season 1/Show - s01e01 - A.en.srt").exists());
        assert!(root.join("cleanup/unknown/junk/b.mkv").exists());
        assert!(!root.join("incoming").exists());
        assert!(!root.join("junk").exists());

        let point = load_restore_point(&report.restore_point.unwrap()).unwrap();
        assert_eq!(point.label, RESTORE_POINT_LABEL);
        assert!(!point.entries.is_empty());
    }

    #[test]
    fn test_discrepancies_need_acceptance() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("a.mkv"));

        let mut plan = Plan::default();
        push(&mut plan, &root.join("a.mkv"), Category::Discrepancy, Some(root.join("S1/A.mkv")));

        let report = Executor::new(root, options()).execute(&plan).unwrap();
        assert_eq!(report.discrepancies_left, 1);
        assert!(report.restore_point.is_none());
        assert!(root.join("a.mkv").exists());

        let accept = ExecuteOptions {
            accept_discrepancies: true,
            ..options()
        };
        let report = Executor::new(root, accept).execute(&plan).unwrap();
        assert_eq!(report.renamed, 1);
        assert!(root.join("S1/A.mkv").exists());
    }

    struct FullDisk;

    impl std::io::Write for FullDisk {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unrecorded_move_is_reverted_and_aborts() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("show");
        touch(&root.join("a.mkv"));
        touch(&root.join("b.mkv"));

        let mut plan = Plan::default();
        push(&mut plan, &root.join("a.mkv"), Category::ProposedRename, Some(root.join("c.mkv")));
        push(&mut plan, &root.join("b.mkv"), Category::ProposedRename, Some(root.join("d.mkv")));

        let journal_file = temp.path().join("broken.jsonl");
        fs::write(&journal_file, "").unwrap();
        let mut journal = Journal::new(&root);
        journal.begin_with_writer(journal_file, Box::new(FullDisk));

        let err = Executor::new(&root, options())
            .execute_in(&plan, &mut journal)
            .unwrap_err();
        assert!(matches!(err, Error::JournalWrite(_)));
        assert!(err.is_fatal());

        assert!(root.join("a.mkv").exists());
        assert!(!root.join("c.mkv").exists());
        assert!(root.join("b.mkv").exists());
        assert!(!root.join("d.mkv").exists());
    }

    #[test]
    fn test_outside_root_is_fatal_and_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("show");
        touch(&root.join("a.mkv"));

        let mut plan = Plan::default();
        push(
            &mut plan,
            &root.join("a.mkv"),
            Category::ProposedRename,
            Some(temp.path().join("elsewhere/a.mkv")),
        );

        let err = Executor::new(&root, options()).execute(&plan).unwrap_err();
        assert!(err.is_fatal());
        assert!(root.join("a.mkv").exists());
        assert!(!root.join("cleanup").exists());
    }

    #[test]
    fn test_occupied_target_is_an_item_error() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("a.mkv"));
        touch(&root.join("b.mkv"));
        touch(&root.join("c.mkv"));

        let mut plan = Plan::default();
        push(&mut plan, &root.join("a.mkv"), Category::ProposedRename, Some(root.join("c.mkv")));
        push(&mut plan, &root.join("b.mkv"), Category::ProposedRename, Some(root.join("S1/b.mkv")));

        let report = Executor::new(root, options()).execute(&plan).unwrap();
        assert_eq!(report.error_count, 1);
        assert_eq!(report.renamed, 1);
        assert!(root.join("a.mkv").exists());
        assert!(root.join("S1/b.mkv").exists());
    }

    #[test]
    fn test_deferred_target_retried() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("a.mkv"));
        touch(&root.join("b.mkv"));

        // a takes b's name while b moves on.
        let mut plan = Plan::default();
        push(&mut plan, &root.join("a.mkv"), Category::ProposedRename, Some(root.join("b.mkv")));
        push(&mut plan, &root.join("b.mkv"), Category::ProposedRename, Some(root.join("S1/b.mkv")));

        let report = Executor::new(root, options()).execute(&plan).unwrap();
        assert!(report.is_success());
        assert_eq!(report.renamed, 2);
        assert!(root.join("b.mkv").exists());
        assert!(!root.join("a.mkv").exists());
        assert!(root.join("S1/b.mkv").exists());
    }

    #[test]
    fn test_duplicate_side_channel_gets_unique_name() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("a.mkv"));
        touch(&root.join("cleanup/duplicates/a.mkv"));

        let mut plan = Plan::default();
        let id = push(&mut plan, &root.join("a.mkv"), Category::Duplicate, None);
        plan.entries[id].duplicate_reason = Some(DuplicateReason::RenameCollision);

        let report = Executor::new(root, options()).execute(&plan).unwrap();
        assert_eq!(report.duplicates_moved, 1);
        assert!(root.join("cleanup/duplicates/a (1).mkv").exists());
    }

    #[test]
    fn test_keep_empty_dirs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        touch(&root.join("old/a.mkv"));

        let mut plan = Plan::default();
        push(&mut plan, &root.join("old/a.mkv"), Category::ProposedRename, Some(root.join("new/a.mkv")));

        let keep = ExecuteOptions {
            remove_empty_dirs: false,
            ..options()
        };
        let report = Executor::new(root, keep).execute(&plan).unwrap();
        assert_eq!(report.dirs_removed, 0);
        assert!(root.join("old").is_dir());
    }
}
