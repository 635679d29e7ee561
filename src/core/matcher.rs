//! Episode matcher.
//!
//! Pairs a file with a reference episode using one of four strategies and
//! records where the filename disagrees with the matched record.

use crate::core::analyzer::{self, ExtractedInfo};
use crate::core::index::{normalize_title, number_key, EpisodeIndex};
use crate::models::episode::{codes_equivalent, CompositeEpisode, Episode, EpisodeCode, EpisodeRecord};
use crate::models::media::CandidateFile;
use crate::models::plan::{Discrepancy, DiscrepancyKind, MatchResult};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Shortest normalized title allowed to take part in substring matching.
const MIN_SUBSTRING_LEN: usize = 3;

/// How a file is paired with a reference episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchStrategy {
    /// Title first, then episode code.
    #[default]
    #[serde(rename = "title")]
    TitlePriority,
    /// Episode code first, then title.
    #[serde(rename = "code")]
    CodePriority,
    /// Code and title must agree.
    #[serde(rename = "strict")]
    Strict,
    /// Overall episode number only.
    #[serde(rename = "number")]
    NumberOnly,
}

impl MatchStrategy {
    pub const ALL: [MatchStrategy; 4] = [
        MatchStrategy::TitlePriority,
        MatchStrategy::CodePriority,
        MatchStrategy::Strict,
        MatchStrategy::NumberOnly,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MatchStrategy::TitlePriority => "title",
            MatchStrategy::CodePriority => "code",
            MatchStrategy::Strict => "strict",
            MatchStrategy::NumberOnly => "number",
        }
    }
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MatchStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "title" | "title-priority" => Ok(MatchStrategy::TitlePriority),
            "2" | "code" | "code-priority" => Ok(MatchStrategy::CodePriority),
            "3" | "strict" => Ok(MatchStrategy::Strict),
            "4" | "number" | "number-only" => Ok(MatchStrategy::NumberOnly),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }
}

/// Join codes that share a season into one: `s02e10` + `s02e11` -> `s02e10e11`.
fn joined_code(codes: &[EpisodeCode]) -> Option<String> {
    let (first, rest) = codes.split_first()?;
    let mut joined = first.to_string();
    for code in rest {
        match code {
            EpisodeCode::Episode { episode, .. } => joined.push_str(&format!("e{:02}", episode)),
            EpisodeCode::Movie(_) => return None,
        }
    }
    Some(joined)
}

/// Build a composite episode from two or more codes of the same season.
///
/// Each code is resolved through the index (`s00eNN` also finds `mNN`);
/// at least two must resolve. The air date is kept only when every
/// constituent shares it.
pub fn new_composite(codes: &[String], index: &EpisodeIndex) -> Option<CompositeEpisode> {
    if codes.len() < 2 {
        return None;
    }

    let mut season = None;
    let mut resolved_codes = Vec::new();
    let mut parts: Vec<EpisodeRecord> = Vec::new();
    for code in codes {
        let parsed = EpisodeCode::parse(code)?;
        let this_season = parsed.season()?;
        if *season.get_or_insert(this_season) != this_season {
            tracing::debug!("Codes {:?} span several seasons", codes);
            return None;
        }
        if let Some(record) = index.by_code(code) {
            if !parts.iter().any(|p| p == record) {
                parts.push(record.clone());
                resolved_codes.push(parsed);
            }
        }
    }

    if parts.len() < 2 {
        return None;
    }

    let series_episode = joined_code(&resolved_codes)?;
    let title = parts
        .iter()
        .map(|p| p.title.as_str())
        .collect::<Vec<_>>()
        .join(" + ");
    let first_date = parts[0].air_date.clone().filter(|d| !d.trim().is_empty());
    let air_date = first_date.filter(|d| parts.iter().all(|p| p.air_date.as_deref() == Some(d.as_str())));

    Some(CompositeEpisode {
        number: parts[0].number.clone(),
        title,
        series_episode,
        air_date,
        parts,
    })
}

/// Pairs analyzed files with reference episodes.
pub struct Matcher<'a> {
    index: &'a EpisodeIndex,
    series_name: Option<String>,
    strategy: MatchStrategy,
    suppress_number_mismatch: bool,
}

impl<'a> Matcher<'a> {
    pub fn new(index: &'a EpisodeIndex, strategy: MatchStrategy) -> Self {
        Self {
            index,
            series_name: None,
            strategy,
            suppress_number_mismatch: false,
        }
    }

    /// Series name stripped from the front of extracted titles.
    pub fn with_series_name(mut self, series_name: impl Into<String>) -> Self {
        self.series_name = Some(series_name.into());
        self
    }

    pub fn suppress_number_mismatch(mut self, suppress: bool) -> Self {
        self.suppress_number_mismatch = suppress;
        self
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Analyze a filename.
    pub fn analyze(&self, name: &str) -> ExtractedInfo {
        analyzer::analyze(name, self.series_name.as_deref(), self.index)
    }

    /// Match a file and collect its discrepancies.
    pub fn evaluate(&self, file: &CandidateFile) -> MatchResult {
        let info = self.analyze(&file.name);
        tracing::debug!(
            "{}: title={:?} number={:?} codes={:?}",
            file.name,
            info.title,
            info.number,
            info.codes
        );

        let mut result = MatchResult::unmatched(file.clone());
        if let Some(episode) = self.match_info(&info) {
            result.discrepancies = self.discrepancies(&info, &episode);
            result.episode = Some(episode);
        }
        result
    }

    /// Apply the active strategy.
    pub fn match_info(&self, info: &ExtractedInfo) -> Option<Episode> {
        match self.strategy {
            MatchStrategy::TitlePriority => {
                let codes = info.codes.as_deref();
                let Some(title) = info.title.as_deref() else {
                    return codes.and_then(|c| self.match_codes(c));
                };
                let composite = codes
                    .filter(|c| c.len() >= 2)
                    .and_then(|c| new_composite(c, self.index));
                match composite {
                    // Multi-episode names only give way to an exact single title.
                    Some(composite) => Some(
                        self.index
                            .by_title(title)
                            .map(|r| Episode::Single(r.clone()))
                            .unwrap_or(Episode::Composite(composite)),
                    ),
                    None => self.match_title(title, codes),
                }
            }
            MatchStrategy::CodePriority => {
                let by_code = info.codes.as_deref().and_then(|c| self.match_codes(c));
                by_code.or_else(|| {
                    info.title
                        .as_deref()
                        .and_then(|t| self.match_title(t, info.codes.as_deref()))
                })
            }
            MatchStrategy::Strict => {
                let episode = info.codes.as_deref().and_then(|c| self.match_codes(c))?;
                let title = info.title.as_deref()?;
                if titles_agree(title, &episode) {
                    Some(episode)
                } else {
                    None
                }
            }
            MatchStrategy::NumberOnly => {
                let number = info.number.as_deref()?;
                self.index
                    .by_number(number)
                    .map(|r| Episode::Single(r.clone()))
            }
        }
    }

    /// Title lookup: exact normalized match, then substring containment
    /// either way. Ties are narrowed by part number, then by code agreement,
    /// then broken by the smallest code.
    pub fn match_title(&self, title: &str, codes: Option<&[String]>) -> Option<Episode> {
        if let Some(record) = self.index.by_title(title) {
            return Some(Episode::Single(record.clone()));
        }

        let key = normalize_title(title);
        if key.len() < MIN_SUBSTRING_LEN {
            return None;
        }

        let mut candidates: Vec<&EpisodeRecord> = Vec::new();
        for (indexed, record) in self.index.titles() {
            if indexed.len() < MIN_SUBSTRING_LEN {
                continue;
            }
            if (indexed.contains(&key) || key.contains(indexed))
                && !candidates.iter().any(|c| *c == record)
            {
                candidates.push(record);
            }
        }
        if candidates.is_empty() {
            return None;
        }

        if let Some(part) = analyzer::part_number(title) {
            let exact: Vec<&EpisodeRecord> = candidates
                .iter()
                .copied()
                .filter(|r| analyzer::part_number(&r.title) == Some(part))
                .collect();
            if !exact.is_empty() {
                candidates = exact;
            }
        }

        if let Some(codes) = codes {
            let agreeing: Vec<&EpisodeRecord> = candidates
                .iter()
                .copied()
                .filter(|r| codes.iter().any(|c| codes_equivalent(c, &r.series_episode)))
                .collect();
            if !agreeing.is_empty() {
                candidates = agreeing;
            }
        }

        if candidates.len() > 1 {
            tracing::debug!(
                "'{}' matches {} titles, taking the smallest code",
                title,
                candidates.len()
            );
        }

        candidates
            .into_iter()
            .min_by_key(|r| (r.series_episode.to_lowercase(), r.title.clone()))
            .map(|r| Episode::Single(r.clone()))
    }

    /// Code lookup: a composite for multi-episode codes, otherwise the first
    /// code that resolves.
    pub fn match_codes(&self, codes: &[String]) -> Option<Episode> {
        if codes.len() >= 2 {
            if let Some(composite) = new_composite(codes, self.index) {
                return Some(Episode::Composite(composite));
            }
        }
        codes
            .iter()
            .find_map(|c| self.index.by_code(c))
            .map(|r| Episode::Single(r.clone()))
    }

    /// Compare what the filename says against the matched episode.
    pub fn discrepancies(&self, info: &ExtractedInfo, episode: &Episode) -> Vec<Discrepancy> {
        let mut found = Vec::new();

        if let Some(title) = info.title.as_deref() {
            let key = normalize_title(title);
            let matches = std::iter::once(episode.title())
                .chain(episode.alt_titles().iter().map(String::as_str))
                .any(|t| normalize_title(t) == key);
            if !matches {
                found.push(Discrepancy {
                    kind: DiscrepancyKind::Title,
                    extracted: title.to_string(),
                    expected: episode.title().to_string(),
                });
            }
        }

        let check_number = !self.suppress_number_mismatch || self.strategy == MatchStrategy::NumberOnly;
        if let Some(number) = info.number.as_deref() {
            let reference = episode.number();
            if check_number && !reference.trim().is_empty() {
                let key = number_key(number);
                let matches = episode
                    .constituent_numbers()
                    .iter()
                    .any(|n| number_key(n) == key);
                if !matches {
                    found.push(Discrepancy {
                        kind: DiscrepancyKind::Number,
                        extracted: number.to_string(),
                        expected: reference.to_string(),
                    });
                }
            }
        }

        if let Some(codes) = info.codes.as_deref() {
            let reference = episode.constituent_codes();
            let matches = codes.len() == reference.len()
                && codes
                    .iter()
                    .zip(reference.iter())
                    .all(|(a, b)| codes_equivalent(a, b));
            if !matches {
                found.push(Discrepancy {
                    kind: DiscrepancyKind::Code,
                    extracted: display_codes(codes),
                    expected: episode.series_episode().to_string(),
                });
            }
        }

        found
    }
}

/// Title agreement used by the strict strategy: equal or contained either way.
fn titles_agree(title: &str, episode: &Episode) -> bool {
    let key = normalize_title(title);
    if key.is_empty() {
        return false;
    }
    std::iter::once(episode.title())
        .chain(episode.alt_titles().iter().map(String::as_str))
        .map(normalize_title)
        .any(|t| !t.is_empty() && (t == key || t.contains(&key) || key.contains(&t)))
}

fn display_codes(codes: &[String]) -> String {
    let parsed: Option<Vec<EpisodeCode>> = codes.iter().map(|c| EpisodeCode::parse(c)).collect();
    parsed
        .and_then(|p| joined_code(&p))
        .unwrap_or_else(|| codes.join(","))
}
