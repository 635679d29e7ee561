//! Duplicate detector.
//!
//! Finds files in the same folder whose names differ only by an alternate
//! encoding marker (`Pilot.mkv` / `Pilot (Alt).mp4`). The decision is made on
//! file size alone: the larger copy is kept, an unmarked copy wins a tie.

use crate::core::analyzer::strip_alt_marker;
use crate::models::media::CandidateFile;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One alternate-encoding decision, by arena id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlternatePair {
    pub kept: usize,
    pub moved: usize,
}

struct Member<'a> {
    id: usize,
    file: &'a CandidateFile,
    marked: bool,
}

/// Group files by folder and marker-free name; every group holding a marked
/// file yields one pair per copy that is not kept.
pub fn find_alternate_encodings<'a, I>(files: I) -> Vec<AlternatePair>
where
    I: IntoIterator<Item = (usize, &'a CandidateFile)>,
{
    let mut groups: BTreeMap<(PathBuf, String), Vec<Member<'a>>> = BTreeMap::new();
    for (id, file) in files {
        let stem = file.stem();
        let (base, marked) = match strip_alt_marker(stem) {
            Some(base) => (base, true),
            None => (stem.to_string(), false),
        };
        groups
            .entry((file.directory.clone(), base.trim().to_lowercase()))
            .or_default()
            .push(Member { id, file, marked });
    }

    let mut pairs = Vec::new();
    for ((dir, base), mut members) in groups {
        if members.len() < 2 || !members.iter().any(|m| m.marked) {
            continue;
        }

        // Largest first; unmarked before marked; then by path.
        members.sort_by(|a, b| {
            b.file
                .size
                .cmp(&a.file.size)
                .then(a.marked.cmp(&b.marked))
                .then(a.file.path.cmp(&b.file.path))
        });

        let kept = &members[0];
        tracing::debug!(
            "Alternate encodings of '{}' in {:?}: keeping {}",
            base,
            dir,
            kept.file.name
        );
        for other in &members[1..] {
            pairs.push(AlternatePair {
                kept: kept.id,
                moved: other.id,
            });
        }
    }
    pairs
}
