//! Folder name generator.

use super::filename::sanitize_filename;
use crate::models::episode::{Episode, EpisodeCode};
use std::path::PathBuf;

/// Folder for an episode, relative to the library root.
///
/// - movies: `<Series>/Movies/<Series> - <Title> (<Year>)`, or
///   `<Series>/Movies` without a year
/// - episodes: `<Series>/Season <N>`
/// - unparseable codes: `<Series>/Unknown`
pub fn series_folder(series: &str, episode: &Episode) -> PathBuf {
    let series = sanitize_filename(series);
    let base = PathBuf::from(&series);

    if episode.is_movie() {
        let movies = base.join("Movies");
        return match episode.year() {
            Some(year) => movies.join(format!(
                "{} - {} ({})",
                series,
                sanitize_filename(episode.title()),
                year
            )),
            None => movies,
        };
    }

    // Composite codes such as s02e10e11 take the season of their first part.
    let season = episode
        .constituent_codes()
        .first()
        .and_then(|code| EpisodeCode::parse(code))
        .and_then(|code| code.season());

    match season {
        Some(n) => base.join(format!("Season {}", n)),
        None => base.join("Unknown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::episode::{CompositeEpisode, EpisodeRecord};
    use std::path::Path;

    fn single(code: &str, title: &str, air_date: Option<&str>) -> Episode {
        Episode::Single(EpisodeRecord {
            number: "1".to_string(),
            title: title.to_string(),
            series_episode: code.to_string(),
            air_date: air_date.map(String::from),
            alt_titles: Vec::new(),
        })
    }

    #[test]
    fn test_episode_folder() {
        assert_eq!(
            series_folder("Thomas & Friends (1984)", &single("s01e01", "A", None)),
            Path::new("Thomas & Friends (1984)/Season 1")
        );
        assert_eq!(
            series_folder("Show", &single("S12E03", "A", None)),
            Path::new("Show/Season 12")
        );
    }

    #[test]
    fn test_movie_folder() {
        assert_eq!(
            series_folder("Show", &single("m02", "The Movie", Some("2008-09-02"))),
            Path::new("Show/Movies/Show - The Movie (2008)")
        );
        assert_eq!(
            series_folder("Show", &single("m02", "The Movie", None)),
            Path::new("Show/Movies")
        );
    }

    #[test]
    fn test_malformed_code_goes_to_unknown() {
        assert_eq!(
            series_folder("Show", &single("special-1", "A", None)),
            Path::new("Show/Unknown")
        );
    }

    #[test]
    fn test_composite_uses_first_part_season() {
        let composite = Episode::Composite(CompositeEpisode {
            number: "36".to_string(),
            title: "A + B".to_string(),
            series_episode: "s02e10e11".to_string(),
            air_date: None,
            parts: vec![
                EpisodeRecord {
                    series_episode: "s02e10".to_string(),
                    ..Default::default()
                },
                EpisodeRecord {
                    series_episode: "s02e11".to_string(),
                    ..Default::default()
                },
            ],
        });
        assert_eq!(series_folder("Show", &composite), Path::new("Show/Season 2"));
    }
}
