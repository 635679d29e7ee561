//! Sidecar resolver.
//!
//! Finds subtitles and thumbnails that belong to a video and computes their
//! names next to the video's final location.

use crate::utils::fs::get_extension;
use crate::Result;
use std::fs;
use std::path::{Path, PathBuf};

pub const SUBTITLE_EXTENSIONS: &[&str] = &["srt", "ass", "ssa", "vtt", "sub", "idx"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "tbn"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SidecarKind {
    Subtitle,
    Image,
}

/// A sidecar move derived from a video move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarMove {
    pub from: PathBuf,
    pub to: PathBuf,
    pub kind: SidecarKind,
}

/// Subtitle tags found after the video base name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubtitleTags {
    pub language: Option<String>,
    pub forced: bool,
    pub sdh: bool,
}

impl SubtitleTags {
    /// Parse the dot-separated tokens after the base name (`en.forced`).
    pub fn parse(suffix: &str) -> Self {
        let mut tags = SubtitleTags::default();
        for token in suffix.split('.').filter(|t| !t.is_empty()) {
            let lower = token.to_lowercase();
            match lower.as_str() {
                "forced" => tags.forced = true,
                "sdh" | "hi" => tags.sdh = true,
                _ if tags.language.is_none() && is_language_code(&lower) => {
                    tags.language = Some(lower.clone())
                }
                _ => {}
            }
        }
        tags
    }

    /// `.lang.forced.sdh` in canonical order.
    pub fn suffix(&self) -> String {
        let mut out = String::new();
        if let Some(lang) = &self.language {
            out.push('.');
            out.push_str(lang);
        }
        if self.forced {
            out.push_str(".forced");
        }
        if self.sdh {
            out.push_str(".sdh");
        }
        out
    }
}

/// `en`, `eng`, `pt-br`.
fn is_language_code(token: &str) -> bool {
    let (primary, region) = match token.split_once('-') {
        Some((p, r)) => (p, Some(r)),
        None => (token, None),
    };
    (2..=3).contains(&primary.len())
        && primary.chars().all(|c| c.is_ascii_alphabetic())
        && region.map_or(true, |r| {
            (2..=4).contains(&r.len()) && r.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

fn sidecar_kind(path: &Path) -> Option<SidecarKind> {
    let ext = get_extension(path)?;
    if SUBTITLE_EXTENSIONS.contains(&ext.as_str()) {
        Some(SidecarKind::Subtitle)
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Some(SidecarKind::Image)
    } else {
        None
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Part of a sidecar stem after the video base, when the sidecar belongs
/// to it: `""` for an exact match, `"en.forced"` for `base.en.forced`,
/// `"-thumb"` for `base-thumb`.
fn belongs_to<'a>(sidecar_stem: &'a str, base: &str) -> Option<&'a str> {
    let rest = sidecar_stem.strip_prefix(base)?;
    if rest.is_empty() || rest == "-thumb" {
        return Some(rest);
    }
    rest.strip_prefix('.')
}

/// Sidecars sitting next to `video`.
pub fn find_sidecars(video: &Path) -> Result<Vec<(PathBuf, SidecarKind)>> {
    let Some(dir) = video.parent() else {
        return Ok(Vec::new());
    };
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let base = file_stem(video);
    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || path == video {
            continue;
        }
        if let Some(kind) = sidecar_kind(&path) {
            if belongs_to(&file_stem(&path), &base).is_some() {
                found.push((path, kind));
            }
        }
    }
    found.sort();
    Ok(found)
}

/// Target name of one sidecar for a video renamed to `final_video`.
pub fn sidecar_target(
    sidecar: &Path,
    kind: SidecarKind,
    original_video: &Path,
    final_video: &Path,
    thumbnail_style: &str,
) -> Option<PathBuf> {
    let base = file_stem(original_video);
    let final_base = file_stem(final_video);
    let final_dir = final_video.parent()?;
    let ext = sidecar
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_default();
    let sidecar_stem = file_stem(sidecar);
    let rest = belongs_to(&sidecar_stem, &base)?;

    let stem = match kind {
        SidecarKind::Subtitle => {
            format!("{}{}", final_base, SubtitleTags::parse(rest).suffix())
        }
        SidecarKind::Image => {
            let style = thumbnail_style.trim();
            if style.is_empty() {
                final_base
            } else {
                format!("{}-{}", final_base, style)
            }
        }
    };

    if ext.is_empty() {
        Some(final_dir.join(stem))
    } else {
        Some(final_dir.join(format!("{}.{}", stem, ext)))
    }
}

/// Moves needed to keep a video's sidecars alongside it. Sidecars that would
/// land on the same target as an earlier one are skipped with a warning.
pub fn plan_sidecars(
    original_video: &Path,
    final_video: &Path,
    thumbnail_style: &str,
) -> Result<Vec<SidecarMove>> {
    let mut moves: Vec<SidecarMove> = Vec::new();
    for (path, kind) in find_sidecars(original_video)? {
        let Some(target) = sidecar_target(&path, kind, original_video, final_video, thumbnail_style)
        else {
            continue;
        };
        if target == path {
            continue;
        }
        if moves.iter().any(|m| m.to == target) {
            tracing::warn!(
                "Sidecar {:?} would overwrite another sidecar at {:?}, skipping",
                path,
                target
            );
            continue;
        }
        moves.push(SidecarMove {
            from: path,
            to: target,
            kind,
        });
    }
    Ok(moves)
}
