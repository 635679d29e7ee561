//! Episode reference index.
//!
//! Lookup tables built once per loaded reference list:
//! - normalized title (and every alternate title) -> record
//! - overall number -> record
//! - lowercase series episode code -> record
//!
//! Colliding normalized titles are last-write-wins.

use crate::models::episode::{EpisodeCode, EpisodeRecord};
use std::collections::HashMap;

/// Normalize a title for comparison.
///
/// Curly apostrophes become straight ones, `&` reads as `and`, hyphens and
/// dashes read as spaces, everything is lowercased, other punctuation is
/// dropped and whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let mut expanded = String::with_capacity(title.len() + 8);
    for c in title.chars() {
        match c {
            '\u{2018}' | '\u{2019}' | '\u{201B}' | '\u{2032}' => expanded.push('\''),
            '&' => expanded.push_str(" and "),
            '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => {
                expanded.push(' ')
            }
            _ => expanded.push(c),
        }
    }

    expanded
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical key for an overall number: trimmed, leading zeros dropped from
/// integers so that `1`, `01` and `001` coincide.
pub(crate) fn number_key(number: &str) -> String {
    let trimmed = number.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let stripped = trimmed.trim_start_matches('0');
        if stripped.is_empty() {
            return "0".to_string();
        }
        return stripped.to_string();
    }
    trimmed.to_string()
}

/// Lookup tables over the reference records.
#[derive(Debug, Clone, Default)]
pub struct EpisodeIndex {
    records: Vec<EpisodeRecord>,
    by_title: HashMap<String, usize>,
    by_number: HashMap<String, usize>,
    by_code: HashMap<String, usize>,
}

impl EpisodeIndex {
    /// Build the index from reference records.
    pub fn new(records: Vec<EpisodeRecord>) -> Self {
        let mut index = Self {
            records,
            ..Default::default()
        };

        for (i, record) in index.records.iter().enumerate() {
            for title in std::iter::once(&record.title).chain(record.alt_titles.iter()) {
                let key = normalize_title(title);
                if key.is_empty() {
                    continue;
                }
                if let Some(previous) = index.by_title.insert(key.clone(), i) {
                    if previous != i {
                        tracing::debug!(
                            "Title '{}' of {} overrides {}",
                            key,
                            record.series_episode,
                            index.records[previous].series_episode
                        );
                    }
                }
            }

            if !record.number.trim().is_empty() {
                index.by_number.insert(number_key(&record.number), i);
            }

            let code = record.series_episode.trim().to_lowercase();
            if !code.is_empty() {
                if let Some(parsed) = EpisodeCode::parse(&code) {
                    index.by_code.insert(parsed.to_string(), i);
                }
                index.by_code.insert(code, i);
            }
        }

        tracing::debug!(
            "Indexed {} records: {} titles, {} numbers, {} codes",
            index.records.len(),
            index.by_title.len(),
            index.by_number.len(),
            index.by_code.len()
        );

        index
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    /// Exact lookup by an already-normalized title.
    pub fn by_normalized_title(&self, key: &str) -> Option<&EpisodeRecord> {
        self.by_title.get(key).map(|&i| &self.records[i])
    }

    /// Exact lookup by a raw title.
    pub fn by_title(&self, title: &str) -> Option<&EpisodeRecord> {
        self.by_normalized_title(&normalize_title(title))
    }

    /// All normalized title keys with their record (unordered).
    pub fn titles(&self) -> impl Iterator<Item = (&str, &EpisodeRecord)> {
        self.by_title
            .iter()
            .map(|(k, &i)| (k.as_str(), &self.records[i]))
    }

    /// Lookup by overall number.
    pub fn by_number(&self, number: &str) -> Option<&EpisodeRecord> {
        let key = number_key(number);
        if key.is_empty() {
            return None;
        }
        self.by_number.get(&key).map(|&i| &self.records[i])
    }

    /// Lookup by code, case-insensitive; `s00eNN` falls back to `mNN`.
    pub fn by_code(&self, code: &str) -> Option<&EpisodeRecord> {
        let lower = code.trim().to_lowercase();
        if let Some(&i) = self.by_code.get(&lower) {
            return Some(&self.records[i]);
        }

        let parsed = EpisodeCode::parse(&lower)?;
        if let Some(&i) = self.by_code.get(&parsed.to_string()) {
            return Some(&self.records[i]);
        }

        let legacy = parsed.legacy_movie()?;
        self.by_code.get(&legacy.to_string()).map(|&i| &self.records[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: &str, title: &str, code: &str) -> EpisodeRecord {
        EpisodeRecord {
            number: number.to_string(),
            title: title.to_string(),
            series_episode: code.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(normalize_title("Thomas & Gordon"), "thomas and gordon");
        assert_eq!(normalize_title("Edward’s Day Out"), "edwards day out");
        assert_eq!(normalize_title("Down the Mine - Part 2"), "down the mine part 2");
        assert_eq!(normalize_title("  Who's   There?! "), "whos there");
    }

    #[test]
    fn test_lookup_by_title_and_alt_title() {
        let mut rec = record("001", "Thomas & Gordon", "s01e01");
        rec.alt_titles = vec!["Thomas and the Big Engine".to_string()];
        let index = EpisodeIndex::new(vec![rec]);

        assert!(index.by_title("thomas and gordon").is_some());
        assert!(index.by_title("THOMAS & GORDON").is_some());
        assert!(index.by_title("Thomas and the Big Engine").is_some());
        assert!(index.by_title("Gordon").is_none());
    }

    #[test]
    fn test_title_collision_last_write_wins() {
        let index = EpisodeIndex::new(vec![
            record("001", "Pilot", "s01e01"),
            record("014", "Pilot", "s02e01"),
        ]);
        assert_eq!(index.by_title("Pilot").unwrap().series_episode, "s02e01");
    }

    #[test]
    fn test_lookup_by_number_ignores_padding() {
        let index = EpisodeIndex::new(vec![
            record("001", "A", "s01e01"),
            record("12.5", "B", "s01e02"),
        ]);
        assert_eq!(index.by_number("1").unwrap().title, "A");
        assert_eq!(index.by_number("001").unwrap().title, "A");
        assert_eq!(index.by_number("12.5").unwrap().title, "B");
        assert!(index.by_number("12").is_none());
        assert!(index.by_number("").is_none());
    }

    #[test]
    fn test_lookup_by_code_with_legacy_mapping() {
        let index = EpisodeIndex::new(vec![
            record("001", "A", "S01E01"),
            record("", "The Movie", "m05"),
        ]);
        assert_eq!(index.by_code("s01e01").unwrap().title, "A");
        assert_eq!(index.by_code("S1E1").unwrap().title, "A");
        assert_eq!(index.by_code("s00e05").unwrap().title, "The Movie");
        assert!(index.by_code("s00e06").is_none());
    }
}
