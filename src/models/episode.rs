//! Episode reference data models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One row of the reference episode list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Overall episode number (may be decimal, e.g. "12.5").
    pub number: String,
    /// Episode title.
    pub title: String,
    /// Series episode code: `sNNeNN`, `s00eNN` or `mNN`.
    pub series_episode: String,
    /// Air date (ISO `YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
    /// Alternate titles, in priority order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alt_titles: Vec<String>,
}

impl EpisodeRecord {
    /// Parsed form of the series episode code.
    pub fn code(&self) -> Option<EpisodeCode> {
        EpisodeCode::parse(&self.series_episode)
    }

    /// Whether this record describes a movie (`mNN`).
    pub fn is_movie(&self) -> bool {
        matches!(self.code(), Some(EpisodeCode::Movie(_)))
    }
}

/// A synthesized match for a filename that encodes several episodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeEpisode {
    /// Number of the first constituent.
    pub number: String,
    /// Constituent titles joined with " + ".
    pub title: String,
    /// Joined code, e.g. `s02e10e11`.
    pub series_episode: String,
    /// Shared air date, only when every constituent has the same one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<String>,
    /// Constituent records in filename order.
    pub parts: Vec<EpisodeRecord>,
}

/// Either a single reference record or a composite of several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Episode {
    Single(EpisodeRecord),
    Composite(CompositeEpisode),
}

impl Episode {
    pub fn number(&self) -> &str {
        match self {
            Episode::Single(r) => &r.number,
            Episode::Composite(c) => &c.number,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Episode::Single(r) => &r.title,
            Episode::Composite(c) => &c.title,
        }
    }

    pub fn series_episode(&self) -> &str {
        match self {
            Episode::Single(r) => &r.series_episode,
            Episode::Composite(c) => &c.series_episode,
        }
    }

    pub fn air_date(&self) -> Option<&str> {
        let date = match self {
            Episode::Single(r) => r.air_date.as_deref(),
            Episode::Composite(c) => c.air_date.as_deref(),
        };
        date.filter(|d| !d.trim().is_empty())
    }

    /// Four-digit year taken from the air date.
    pub fn year(&self) -> Option<u16> {
        self.air_date()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
    }

    pub fn alt_titles(&self) -> &[String] {
        match self {
            Episode::Single(r) => &r.alt_titles,
            Episode::Composite(_) => &[],
        }
    }

    /// Only single `mNN` records are movies; composites never are.
    pub fn is_movie(&self) -> bool {
        match self {
            Episode::Single(r) => r.is_movie(),
            Episode::Composite(_) => false,
        }
    }

    /// Codes of the records this episode stands for.
    pub fn constituent_codes(&self) -> Vec<&str> {
        match self {
            Episode::Single(r) => vec![r.series_episode.as_str()],
            Episode::Composite(c) => c.parts.iter().map(|p| p.series_episode.as_str()).collect(),
        }
    }

    /// Numbers of the records this episode stands for.
    pub fn constituent_numbers(&self) -> Vec<&str> {
        match self {
            Episode::Single(r) => vec![r.number.as_str()],
            Episode::Composite(c) => c.parts.iter().map(|p| p.number.as_str()).collect(),
        }
    }
}

/// Parsed series episode code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EpisodeCode {
    /// `sNNeNN`; season 0 marks a special.
    Episode { season: u32, episode: u32 },
    /// `mNN`.
    Movie(u32),
}

impl EpisodeCode {
    /// Parse a canonical code (`s01e05`, `S1E5`, `m03`), case-insensitive.
    pub fn parse(code: &str) -> Option<Self> {
        let lower = code.trim().to_lowercase();
        if let Some(rest) = lower.strip_prefix('m') {
            if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
                return rest.parse().ok().map(EpisodeCode::Movie);
            }
            return None;
        }
        let rest = lower.strip_prefix('s')?;
        let (season, episode) = rest.split_once('e')?;
        if season.is_empty()
            || episode.is_empty()
            || !season.chars().all(|c| c.is_ascii_digit())
            || !episode.chars().all(|c| c.is_ascii_digit())
        {
            return None;
        }
        Some(EpisodeCode::Episode {
            season: season.parse().ok()?,
            episode: episode.parse().ok()?,
        })
    }

    /// Season number, `None` for movies.
    pub fn season(&self) -> Option<u32> {
        match self {
            EpisodeCode::Episode { season, .. } => Some(*season),
            EpisodeCode::Movie(_) => None,
        }
    }

    /// Legacy mapping: a season-0 special `s00eNN` stands for movie `mNN`.
    pub fn legacy_movie(&self) -> Option<EpisodeCode> {
        match self {
            EpisodeCode::Episode { season: 0, episode } => Some(EpisodeCode::Movie(*episode)),
            _ => None,
        }
    }

    /// Codes are equivalent when equal or related by the legacy special/movie mapping.
    pub fn is_equivalent(&self, other: &EpisodeCode) -> bool {
        self == other
            || self.legacy_movie().as_ref() == Some(other)
            || other.legacy_movie().as_ref() == Some(self)
    }
}

impl fmt::Display for EpisodeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EpisodeCode::Episode { season, episode } => write!(f, "s{:02}e{:02}", season, episode),
            EpisodeCode::Movie(n) => write!(f, "m{:02}", n),
        }
    }
}

/// Compare two code strings using the legacy-aware equivalence.
pub fn codes_equivalent(a: &str, b: &str) -> bool {
    match (EpisodeCode::parse(a), EpisodeCode::parse(b)) {
        (Some(a), Some(b)) => a.is_equivalent(&b),
        _ => a.trim().eq_ignore_ascii_case(b.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        assert_eq!(
            EpisodeCode::parse("S01E05"),
            Some(EpisodeCode::Episode { season: 1, episode: 5 })
        );
        assert_eq!(EpisodeCode::parse("m03"), Some(EpisodeCode::Movie(3)));
        assert_eq!(EpisodeCode::parse("s01"), None);
        assert_eq!(EpisodeCode::parse("movie"), None);
        assert_eq!(EpisodeCode::parse(""), None);
    }

    #[test]
    fn test_display_is_canonical() {
        let code = EpisodeCode::parse("S2E7").unwrap();
        assert_eq!(code.to_string(), "s02e07");
        assert_eq!(EpisodeCode::Movie(5).to_string(), "m05");
    }

    #[test]
    fn test_legacy_special_equals_movie() {
        assert!(codes_equivalent("s00e05", "m05"));
        assert!(codes_equivalent("M05", "S00E05"));
        assert!(!codes_equivalent("s00e05", "m06"));
        assert!(!codes_equivalent("s01e05", "m05"));
    }

    #[test]
    fn test_year_from_air_date() {
        let ep = Episode::Single(EpisodeRecord {
            air_date: Some("1984-10-09".to_string()),
            ..Default::default()
        });
        assert_eq!(ep.year(), Some(1984));

        let ep = Episode::Single(EpisodeRecord {
            air_date: Some("".to_string()),
            ..Default::default()
        });
        assert_eq!(ep.air_date(), None);
        assert_eq!(ep.year(), None);
    }
}
