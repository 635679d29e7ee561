//! Filename generator.

use crate::models::episode::Episode;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Windows device names that cannot be used as a file stem.
const RESERVED_NAMES: [&str; 22] = [
    "con", "prn", "aux", "nul", "com1", "com2", "com3", "com4", "com5", "com6", "com7", "com8",
    "com9", "lpt1", "lpt2", "lpt3", "lpt4", "lpt5", "lpt6", "lpt7", "lpt8", "lpt9",
];

/// Output naming template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NamingFormat {
    /// `Series - s01e01 - Title`
    #[default]
    SeriesCodeTitle,
    /// `s01e01 - Title`
    CodeTitle,
    /// `Series - Title`
    SeriesTitle,
    /// `Title`
    TitleOnly,
    /// `001 - Title`
    NumberTitle,
    /// `Series - 001 - Title`
    SeriesNumberTitle,
    /// `Series.S01E01.Title`
    Dotted,
    /// `Series_S01E01_Title`
    Underscored,
    /// `Series - s01e01 - Title (1984-10-09)`
    SeriesCodeTitleAirDate,
    /// `s01e01 - Title (1984-10-09)`
    CodeTitleAirDate,
    /// `[Series] s01e01 - Title`
    BracketedSeries,
    /// `Series - S01E01 - Title`
    SeriesUpperCode,
    /// Keep the current file name.
    Skip,
}

impl NamingFormat {
    pub const ALL: [NamingFormat; 13] = [
        NamingFormat::SeriesCodeTitle,
        NamingFormat::CodeTitle,
        NamingFormat::SeriesTitle,
        NamingFormat::TitleOnly,
        NamingFormat::NumberTitle,
        NamingFormat::SeriesNumberTitle,
        NamingFormat::Dotted,
        NamingFormat::Underscored,
        NamingFormat::SeriesCodeTitleAirDate,
        NamingFormat::CodeTitleAirDate,
        NamingFormat::BracketedSeries,
        NamingFormat::SeriesUpperCode,
        NamingFormat::Skip,
    ];

    /// Config/CLI name.
    pub fn name(&self) -> &'static str {
        match self {
            NamingFormat::SeriesCodeTitle => "series-code-title",
            NamingFormat::CodeTitle => "code-title",
            NamingFormat::SeriesTitle => "series-title",
            NamingFormat::TitleOnly => "title-only",
            NamingFormat::NumberTitle => "number-title",
            NamingFormat::SeriesNumberTitle => "series-number-title",
            NamingFormat::Dotted => "dotted",
            NamingFormat::Underscored => "underscored",
            NamingFormat::SeriesCodeTitleAirDate => "series-code-title-air-date",
            NamingFormat::CodeTitleAirDate => "code-title-air-date",
            NamingFormat::BracketedSeries => "bracketed-series",
            NamingFormat::SeriesUpperCode => "series-upper-code",
            NamingFormat::Skip => "skip",
        }
    }

    /// Human readable template.
    pub fn label(&self) -> &'static str {
        match self {
            NamingFormat::SeriesCodeTitle => "Series - sXXeXX - Title",
            NamingFormat::CodeTitle => "sXXeXX - Title",
            NamingFormat::SeriesTitle => "Series - Title",
            NamingFormat::TitleOnly => "Title",
            NamingFormat::NumberTitle => "Number - Title",
            NamingFormat::SeriesNumberTitle => "Series - Number - Title",
            NamingFormat::Dotted => "Series.SXXEXX.Title",
            NamingFormat::Underscored => "Series_SXXEXX_Title",
            NamingFormat::SeriesCodeTitleAirDate => "Series - sXXeXX - Title (AirDate)",
            NamingFormat::CodeTitleAirDate => "sXXeXX - Title (AirDate)",
            NamingFormat::BracketedSeries => "[Series] sXXeXX - Title",
            NamingFormat::SeriesUpperCode => "Series - SXXEXX - Title",
            NamingFormat::Skip => "Skip renaming",
        }
    }

    /// File name for an episode, or `None` when renaming is skipped.
    pub fn format(&self, episode: &Episode, series: &str, extension: &str) -> Option<String> {
        if *self == NamingFormat::Skip {
            return None;
        }

        let stem = if episode.is_movie() {
            self.movie_stem(episode, series)
        } else {
            self.episode_stem(episode, series)
        };
        let stem = finish_stem(&stem);

        if extension.is_empty() {
            Some(stem)
        } else {
            Some(format!("{}.{}", stem, extension.trim_start_matches('.')))
        }
    }

    fn episode_stem(&self, episode: &Episode, series: &str) -> String {
        let series = sanitize_filename(series);
        let title = sanitize_filename(episode.title());
        let code = episode.series_episode().to_lowercase();
        let number = episode.number().trim();
        // Records without an overall number fall back to their code.
        let number = if number.is_empty() { code.as_str() } else { number };
        let dated = |base: String| match episode.air_date() {
            Some(date) => format!("{} ({})", base, date),
            None => base,
        };

        match self {
            NamingFormat::SeriesCodeTitle => format!("{} - {} - {}", series, code, title),
            NamingFormat::CodeTitle => format!("{} - {}", code, title),
            NamingFormat::SeriesTitle => format!("{} - {}", series, title),
            NamingFormat::TitleOnly => title,
            NamingFormat::NumberTitle => format!("{} - {}", number, title),
            NamingFormat::SeriesNumberTitle => format!("{} - {} - {}", series, number, title),
            NamingFormat::Dotted => {
                machine_name(&[&series, &code.to_uppercase(), &title], '.')
            }
            NamingFormat::Underscored => {
                machine_name(&[&series, &code.to_uppercase(), &title], '_')
            }
            NamingFormat::SeriesCodeTitleAirDate => {
                dated(format!("{} - {} - {}", series, code, title))
            }
            NamingFormat::CodeTitleAirDate => dated(format!("{} - {}", code, title)),
            NamingFormat::BracketedSeries => format!("[{}] {} - {}", series, code, title),
            NamingFormat::SeriesUpperCode => {
                format!("{} - {} - {}", series, code.to_uppercase(), title)
            }
            NamingFormat::Skip => title,
        }
    }

    fn movie_stem(&self, episode: &Episode, series: &str) -> String {
        let series = sanitize_filename(series);
        let title = sanitize_filename(episode.title());
        let titled = match episode.year() {
            Some(year) => format!("{} ({})", title, year),
            None => title.clone(),
        };

        match self {
            NamingFormat::SeriesCodeTitle
            | NamingFormat::SeriesTitle
            | NamingFormat::SeriesNumberTitle
            | NamingFormat::SeriesCodeTitleAirDate
            | NamingFormat::SeriesUpperCode => format!("{} - {}", series, titled),
            NamingFormat::BracketedSeries => format!("[{}] {}", series, titled),
            NamingFormat::CodeTitle
            | NamingFormat::TitleOnly
            | NamingFormat::NumberTitle
            | NamingFormat::CodeTitleAirDate
            | NamingFormat::Skip => titled,
            NamingFormat::Dotted | NamingFormat::Underscored => {
                let separator = if *self == NamingFormat::Dotted { '.' } else { '_' };
                let year = episode.year().map(|y| y.to_string()).unwrap_or_default();
                machine_name(&[&series, &title, &year], separator)
            }
        }
    }
}

impl fmt::Display for NamingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for NamingFormat {
    type Err = Error;

    /// Accepts a format name or its 1-based position.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        if let Ok(n) = wanted.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| NamingFormat::ALL.get(i).copied())
                .ok_or_else(|| Error::UnknownNamingFormat(s.to_string()));
        }
        NamingFormat::ALL
            .iter()
            .copied()
            .find(|f| f.name() == wanted)
            .ok_or_else(|| Error::UnknownNamingFormat(s.to_string()))
    }
}

/// Join words with a separator, spelling `&` as `and` and dropping
/// punctuation other than apostrophes.
fn machine_name(parts: &[&str], separator: char) -> String {
    parts
        .iter()
        .flat_map(|p| p.split_whitespace())
        .map(|word| {
            if word == "&" {
                return "and".to_string();
            }
            word.chars()
                .filter(|c| c.is_alphanumeric() || *c == '\'' || *c == '-')
                .collect::<String>()
        })
        .filter(|w| !w.is_empty() && w != "-")
        .collect::<Vec<_>>()
        .join(&separator.to_string())
}

/// Sanitize a string for use in file names.
///
/// `:` becomes ` -`; the other reserved characters are dropped.
pub fn sanitize_filename(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            ':' => out.push_str(" -"),
            '/' | '\\' | '*' | '?' | '"' | '<' | '>' | '|' => {}
            c if c.is_control() => {}
            _ => out.push(c),
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim trailing dots and spaces and escape device names.
fn finish_stem(stem: &str) -> String {
    let trimmed = stem.trim_start().trim_end_matches(['.', ' ']);
    let base = trimmed.split('.').next().unwrap_or(trimmed).to_lowercase();
    if RESERVED_NAMES.contains(&base.as_str()) {
        format!("{}_", trimmed)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::episode::{CompositeEpisode, EpisodeRecord};

    const SERIES: &str = "Thomas & Friends (1984)";

    fn episode() -> Episode {
        Episode::Single(EpisodeRecord {
            number: "001".to_string(),
            title: "Thomas & Gordon".to_string(),
            series_episode: "s01e01".to_string(),
            air_date: Some("1984-10-09".to_string()),
            alt_titles: Vec::new(),
        })
    }

    fn movie() -> Episode {
        Episode::Single(EpisodeRecord {
            number: String::new(),
            title: "The Great Discovery".to_string(),
            series_episode: "m01".to_string(),
            air_date: Some("2008-09-02".to_string()),
            alt_titles: Vec::new(),
        })
    }

    #[test]
    fn test_default_format() {
        assert_eq!(
            NamingFormat::default().format(&episode(), SERIES, "mp4").as_deref(),
            Some("Thomas & Friends (1984) - s01e01 - Thomas & Gordon.mp4")
        );
    }

    #[test]
    fn test_all_episode_formats() {
        let cases = [
            (NamingFormat::CodeTitle, "s01e01 - Thomas & Gordon.mkv"),
            (NamingFormat::SeriesTitle, "Thomas & Friends (1984) - Thomas & Gordon.mkv"),
            (NamingFormat::TitleOnly, "Thomas & Gordon.mkv"),
            (NamingFormat::NumberTitle, "001 - Thomas & Gordon.mkv"),
            (
                NamingFormat::SeriesNumberTitle,
                "Thomas & Friends (1984) - 001 - Thomas & Gordon.mkv",
            ),
            (NamingFormat::Dotted, "Thomas.and.Friends.1984.S01E01.Thomas.and.Gordon.mkv"),
            (NamingFormat::Underscored, "Thomas_and_Friends_1984_S01E01_Thomas_and_Gordon.mkv"),
            (
                NamingFormat::SeriesCodeTitleAirDate,
                "Thomas & Friends (1984) - s01e01 - Thomas & Gordon (1984-10-09).mkv",
            ),
            (NamingFormat::CodeTitleAirDate, "s01e01 - Thomas & Gordon (1984-10-09).mkv"),
            (
                NamingFormat::BracketedSeries,
                "[Thomas & Friends (1984)] s01e01 - Thomas & Gordon.mkv",
            ),
            (
                NamingFormat::SeriesUpperCode,
                "Thomas & Friends (1984) - S01E01 - Thomas & Gordon.mkv",
            ),
        ];
        for (format, expected) in cases {
            assert_eq!(
                format.format(&episode(), SERIES, "mkv").as_deref(),
                Some(expected),
                "{:?}",
                format
            );
        }
        assert_eq!(NamingFormat::Skip.format(&episode(), SERIES, "mkv"), None);
    }

    #[test]
    fn test_movie_formats() {
        assert_eq!(
            NamingFormat::SeriesCodeTitle.format(&movie(), SERIES, "mkv").as_deref(),
            Some("Thomas & Friends (1984) - The Great Discovery (2008).mkv")
        );
        assert_eq!(
            NamingFormat::CodeTitle.format(&movie(), SERIES, "mkv").as_deref(),
            Some("The Great Discovery (2008).mkv")
        );
        assert_eq!(
            NamingFormat::Dotted.format(&movie(), SERIES, "mkv").as_deref(),
            Some("Thomas.and.Friends.1984.The.Great.Discovery.2008.mkv")
        );
    }

    #[test]
    fn test_composite_code() {
        let composite = Episode::Composite(CompositeEpisode {
            number: "036".to_string(),
            title: "A + B".to_string(),
            series_episode: "s02e10e11".to_string(),
            air_date: None,
            parts: Vec::new(),
        });
        assert_eq!(
            NamingFormat::SeriesCodeTitleAirDate
                .format(&composite, "Show", "mkv")
                .as_deref(),
            Some("Show - s02e10e11 - A + B.mkv")
        );
    }

    #[test]
    fn test_from_str() {
        assert_eq!("1".parse::<NamingFormat>().unwrap(), NamingFormat::SeriesCodeTitle);
        assert_eq!("13".parse::<NamingFormat>().unwrap(), NamingFormat::Skip);
        assert_eq!("Dotted".parse::<NamingFormat>().unwrap(), NamingFormat::Dotted);
        assert!("0".parse::<NamingFormat>().is_err());
        assert!("14".parse::<NamingFormat>().is_err());
        assert!("fancy".parse::<NamingFormat>().is_err());
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Who: The Return"), "Who - The Return");
        assert_eq!(sanitize_filename("What? <Really>"), "What Really");
        assert_eq!(sanitize_filename("AC/DC"), "ACDC");
    }

    #[test]
    fn test_finish_stem() {
        assert_eq!(finish_stem("Title..."), "Title");
        assert_eq!(finish_stem("CON"), "CON_");
        assert_eq!(finish_stem("Lpt1"), "Lpt1_");
        assert_eq!(finish_stem("Console"), "Console");
    }
}
