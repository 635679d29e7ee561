//! Directory scanner module.
//!
//! Lists the video files under a working root, skipping excluded folders
//! (the cleanup side-channels and the reference data folder).

use crate::models::media::CandidateFile;
use crate::utils::fs::{ensure_directory, is_video_file};
use crate::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Scan a directory for video files.
///
/// Files under any of `excluded` are skipped, as are hidden entries.
/// Results are sorted by path.
pub fn scan_videos(root: &Path, excluded: &[PathBuf]) -> Result<Vec<CandidateFile>> {
    ensure_directory(root)?;

    let mut videos = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            let hidden = e.depth() > 0 && e.file_name().to_string_lossy().starts_with('.');
            !hidden && !excluded.iter().any(|x| e.path().starts_with(x))
        });

    for entry in walker.filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() || !is_video_file(entry.path()) {
            continue;
        }
        match entry.metadata() {
            Ok(metadata) => videos.push(CandidateFile::with_size(entry.path(), metadata.len())),
            Err(e) => tracing::warn!("Cannot read {:?}: {}", entry.path(), e),
        }
    }

    videos.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!("Found {} video files under {:?}", videos.len(), root);
    Ok(videos)
}

/// Short-lived cache of the video listing.
///
/// Every operation that changes the tree must call [`ScanCache::invalidate`].
#[derive(Debug)]
pub struct ScanCache {
    ttl: Duration,
    cached: Option<(Instant, Vec<CandidateFile>)>,
}

impl ScanCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, cached: None }
    }

    /// Cached listing if still fresh, otherwise a new scan.
    pub fn get_or_scan(&mut self, root: &Path, excluded: &[PathBuf]) -> Result<Vec<CandidateFile>> {
        if let Some((at, files)) = &self.cached {
            if at.elapsed() < self.ttl {
                tracing::debug!("Using cached listing ({} files)", files.len());
                return Ok(files.clone());
            }
        }

        let files = scan_videos(root, excluded)?;
        self.cached = Some((Instant::now(), files.clone()));
        Ok(files)
    }

    pub fn is_fresh(&self) -> bool {
        self.cached
            .as_ref()
            .is_some_and(|(at, _)| at.elapsed() < self.ttl)
    }

    pub fn invalidate(&mut self) {
        if self.cached.take().is_some() {
            tracing::debug!("Video listing cache invalidated");
        }
    }
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
