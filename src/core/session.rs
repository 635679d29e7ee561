//! Working session.
//!
//! Holds everything one run needs: the working root, configuration, series
//! name, reference index and the cached video listing. Every operation that
//! changes the tree goes through here so the listing cache is invalidated.

use crate::core::executor::{ExecuteOptions, ExecutionReport, Executor};
use crate::core::index::EpisodeIndex;
use crate::core::journal::CLEANUP_DIR;
use crate::core::planner::{default_series_name, Planner};
use crate::core::reference::load_records;
use crate::core::scanner::ScanCache;
use crate::core::undo::{undo_latest, UndoReport};
use crate::models::config::Config;
use crate::models::episode::EpisodeRecord;
use crate::models::media::CandidateFile;
use crate::models::plan::Plan;
use crate::utils::fs::ensure_directory;
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub struct Session {
    root: PathBuf,
    config: Config,
    series_name: String,
    index: EpisodeIndex,
    excluded: Vec<PathBuf>,
    cache: ScanCache,
}

impl Session {
    /// Start a session over `root` with already loaded reference records.
    pub fn new(root: &Path, records: Vec<EpisodeRecord>, config: Config) -> Result<Self> {
        ensure_directory(root)?;
        let root = root.canonicalize()?;

        let series_name = config
            .series_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_series_name(&root));

        tracing::info!("Session for '{}' at {:?}", series_name, root);

        Ok(Self {
            excluded: vec![root.join(CLEANUP_DIR)],
            cache: ScanCache::new(Duration::from_secs(config.cache_ttl_secs)),
            index: EpisodeIndex::new(records),
            root,
            config,
            series_name,
        })
    }

    /// Start a session and load the reference list from `reference`. A
    /// reference folder inside the root is left out of scans.
    pub fn open(root: &Path, reference: &Path, config: Config) -> Result<Self> {
        let records = load_records(reference)?;
        let mut session = Self::new(root, records, config)?;

        if let Some(dir) = reference.canonicalize().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
            if dir != session.root && dir.starts_with(&session.root) {
                tracing::debug!("Excluding reference folder {:?}", dir);
                session.excluded.push(dir);
            }
        }
        Ok(session)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn series_name(&self) -> &str {
        &self.series_name
    }

    pub fn index(&self) -> &EpisodeIndex {
        &self.index
    }

    pub fn excluded(&self) -> &[PathBuf] {
        &self.excluded
    }

    /// Video files under the root, served from the cache while fresh.
    pub fn video_files(&mut self) -> Result<Vec<CandidateFile>> {
        self.cache.get_or_scan(&self.root, &self.excluded)
    }

    /// Match and classify every video file.
    pub fn build_plan(&mut self) -> Result<Plan> {
        let files = self.video_files()?;
        let planner = Planner::new(&self.index, &self.series_name, self.config.strategy)
            .with_naming_format(self.config.naming_format)
            .suppress_number_mismatch(self.config.suppress_number_mismatch);
        Ok(planner.build(&self.root, &files))
    }

    /// Executor options taken from the configuration.
    pub fn execute_options(&self) -> ExecuteOptions {
        ExecuteOptions {
            remove_empty_dirs: self.config.remove_empty_dirs,
            thumbnail_style: self.config.thumbnail_style.clone(),
            ..Default::default()
        }
    }

    /// Execute a plan under a new restore point.
    pub fn execute(&mut self, plan: &Plan, options: ExecuteOptions) -> Result<ExecutionReport> {
        let result = Executor::new(&self.root, options).execute(plan);
        self.invalidate_cache();
        result
    }

    /// Undo the most recent restore point.
    pub fn undo_latest(&mut self, dry_run: bool) -> Result<UndoReport> {
        let result = undo_latest(&self.root, dry_run);
        if !dry_run {
            self.invalidate_cache();
        }
        result
    }

    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }
}
