//! Plan generation module.
//!
//! Coordinates the planning process:
//! 1. Match every candidate file against the reference index
//! 2. Classify each file into exactly one category
//! 3. Compute target paths for matched files
//! 4. Divert alternate encodings and rename collisions to the duplicates

use crate::core::duplicates::find_alternate_encodings;
use crate::core::index::EpisodeIndex;
use crate::core::matcher::{MatchStrategy, Matcher};
use crate::generators::{sanitize_filename, series_folder, NamingFormat};
use crate::models::media::CandidateFile;
use crate::models::plan::{Category, DuplicateReason, MatchResult, Plan};
use crate::Result;
use chrono::Local;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

pub const PLAN_VERSION: &str = "1.0";

/// Plan generator.
pub struct Planner<'a> {
    matcher: Matcher<'a>,
    series_name: String,
    naming_format: NamingFormat,
}

impl<'a> Planner<'a> {
    /// Create a planner for one series.
    pub fn new(index: &'a EpisodeIndex, series_name: &str, strategy: MatchStrategy) -> Self {
        Self {
            matcher: Matcher::new(index, strategy).with_series_name(series_name),
            series_name: series_name.to_string(),
            naming_format: NamingFormat::default(),
        }
    }

    pub fn with_naming_format(mut self, naming_format: NamingFormat) -> Self {
        self.naming_format = naming_format;
        self
    }

    pub fn suppress_number_mismatch(mut self, suppress: bool) -> Self {
        self.matcher = self.matcher.suppress_number_mismatch(suppress);
        self
    }

    /// Build the plan for `files` under `root`.
    pub fn build(&self, root: &Path, files: &[CandidateFile]) -> Plan {
        tracing::info!(
            "Planning {} files with the {} strategy",
            files.len(),
            self.matcher.strategy()
        );

        let mut plan = Plan {
            version: PLAN_VERSION.to_string(),
            created_at: Local::now().to_rfc3339(),
            root: root.to_path_buf(),
            series_name: self.series_name.clone(),
            naming_format: self.naming_format.name().to_string(),
            entries: Vec::with_capacity(files.len()),
            duplicates: Vec::new(),
        };

        for file in files {
            let result = self.matcher.evaluate(file);
            self.classify(&mut plan, root, result);
        }

        self.resolve_alternate_encodings(&mut plan);
        self.resolve_rename_collisions(&mut plan);

        tracing::info!(
            "Plan: {} renames, {} discrepancies, {} unmatched, {} skipped, {} duplicates",
            plan.count(Category::ProposedRename),
            plan.count(Category::Discrepancy),
            plan.count(Category::Unmatched),
            plan.count(Category::Skipped),
            plan.count(Category::Duplicate)
        );
        plan
    }

    /// Route one match result into its category and fill in its target.
    fn classify(&self, plan: &mut Plan, root: &Path, mut result: MatchResult) {
        let Some(episode) = result.episode.as_ref() else {
            plan.push(result, Category::Unmatched);
            return;
        };

        let name = self
            .naming_format
            .format(episode, &self.series_name, &result.file.extension)
            .unwrap_or_else(|| result.file.name.clone());
        let folder = series_folder(&self.series_name, episode);
        let target = target_directory(root, &self.series_name, &folder).join(&name);

        let category = if result.has_discrepancy() {
            Category::Discrepancy
        } else if target == result.file.path {
            Category::Skipped
        } else {
            Category::ProposedRename
        };

        result.proposed_name = Some(name);
        result.target_folder = Some(folder);
        let id = plan.push(result, category);
        plan.entries[id].target_path = Some(target);
    }

    fn resolve_alternate_encodings(&self, plan: &mut Plan) {
        let pairs = find_alternate_encodings(plan.entries.iter().map(|e| (e.id, &e.result.file)));
        for pair in pairs {
            let kept = plan.entries[pair.kept].source().to_path_buf();
            tracing::info!(
                "Alternate encoding: keeping {:?}, diverting {:?}",
                kept,
                plan.entries[pair.moved].source()
            );
            plan.mark_duplicate(pair.moved, &kept, DuplicateReason::AlternateEncoding);
        }
    }

    /// Group matched entries by target path. Each group keeps one member:
    /// a file already in place if there is one, otherwise the first.
    fn resolve_rename_collisions(&self, plan: &mut Plan) {
        let mut groups: HashMap<String, Vec<usize>> = HashMap::new();
        for entry in &plan.entries {
            if !matches!(
                entry.category,
                Category::ProposedRename | Category::Discrepancy | Category::Skipped
            ) {
                continue;
            }
            if let Some(target) = &entry.target_path {
                groups
                    .entry(target.to_string_lossy().to_lowercase())
                    .or_default()
                    .push(entry.id);
            }
        }

        let mut groups: Vec<Vec<usize>> = groups.into_values().filter(|g| g.len() > 1).collect();
        groups.sort();

        for ids in groups {
            let keeper = ids
                .iter()
                .copied()
                .find(|&id| plan.entries[id].category == Category::Skipped)
                .unwrap_or(ids[0]);
            let kept = plan.entries[keeper].source().to_path_buf();

            for id in ids.into_iter().filter(|&id| id != keeper) {
                tracing::warn!(
                    "Rename collision: {:?} targets the same path as {:?}",
                    plan.entries[id].source(),
                    kept
                );
                plan.mark_duplicate(id, &kept, DuplicateReason::RenameCollision);
            }
        }
    }
}

/// Absolute directory for a series folder. When the working root already
/// is the series folder, the series component maps onto the root itself.
pub fn target_directory(root: &Path, series_name: &str, folder: &Path) -> PathBuf {
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    if !root_name.is_empty() && root_name == sanitize_filename(series_name) {
        let mut components = folder.components();
        if matches!(components.next(), Some(Component::Normal(_))) {
            return root.join(components.as_path());
        }
    }
    root.join(folder)
}

/// Series name derived from the working root's folder name.
pub fn default_series_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "Series".to_string())
}

/// Save a plan to a JSON file.
pub fn save_plan(plan: &Plan, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(plan)?;

    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut file = fs::File::create(path)?;
    file.write_all(json.as_bytes())?;

    tracing::info!("Plan saved to {:?}", path);
    Ok(())
}

/// Load a plan from a JSON file.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let content = fs::read_to_string(path)?;
    let plan: Plan = serde_json::from_str(&content)?;
    Ok(plan)
}
