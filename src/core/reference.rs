//! Reference list loading.
//!
//! Reads episode records from a CSV or JSON file. CSV headers are matched
//! case-insensitively and may be written `SeriesEpisode`, `series_episode`
//! or `Series Episode`.

use crate::models::episode::EpisodeRecord;
use crate::{Error, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Number,
    Title,
    SeriesEpisode,
    AirDate,
    AltTitles,
}

fn column_for(header: &str) -> Option<Column> {
    let key: String = header
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect::<String>()
        .to_lowercase();
    match key.as_str() {
        "number" | "no" | "episodenumber" => Some(Column::Number),
        "title" | "episodetitle" => Some(Column::Title),
        "seriesepisode" | "seriesepisodecode" | "code" => Some(Column::SeriesEpisode),
        "airdate" | "date" => Some(Column::AirDate),
        "alttitles" | "alternatetitles" | "alttitle" => Some(Column::AltTitles),
        _ => None,
    }
}

/// Split an alternate titles cell on `|` or `;`.
fn split_alt_titles(cell: &str) -> Vec<String> {
    cell.split(['|', ';'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trim every field, drop an empty air date and reject records that carry
/// neither a title nor a code.
fn normalize_record(mut record: EpisodeRecord, row: usize) -> Result<EpisodeRecord> {
    record.number = record.number.trim().to_string();
    record.title = record.title.trim().to_string();
    record.series_episode = record.series_episode.trim().to_string();
    record.air_date = record
        .air_date
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    record.alt_titles = record
        .alt_titles
        .iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();

    if record.title.is_empty() && record.series_episode.is_empty() {
        return Err(Error::InvalidReference(format!(
            "record {} has neither a title nor a series episode code",
            row
        )));
    }
    Ok(record)
}

/// Parse CSV text into records.
pub fn parse_csv(content: &str) -> Result<Vec<EpisodeRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let columns: Vec<Option<Column>> = reader.headers()?.iter().map(column_for).collect();
    if !columns.contains(&Some(Column::Title)) && !columns.contains(&Some(Column::SeriesEpisode)) {
        return Err(Error::InvalidReference(
            "no Title or SeriesEpisode column".to_string(),
        ));
    }

    let mut records = Vec::new();
    for (i, row) in reader.records().enumerate() {
        let row = row?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let mut record = EpisodeRecord::default();
        for (column, cell) in columns.iter().zip(row.iter()) {
            match column {
                Some(Column::Number) => record.number = cell.to_string(),
                Some(Column::Title) => record.title = cell.to_string(),
                Some(Column::SeriesEpisode) => record.series_episode = cell.to_string(),
                Some(Column::AirDate) => record.air_date = Some(cell.to_string()),
                Some(Column::AltTitles) => record.alt_titles = split_alt_titles(cell),
                None => {}
            }
        }
        // Header is line 1.
        records.push(normalize_record(record, i + 2)?);
    }
    Ok(records)
}

/// Parse a JSON array of records.
pub fn parse_json(content: &str) -> Result<Vec<EpisodeRecord>> {
    let raw: Vec<EpisodeRecord> = serde_json::from_str(content)?;
    raw.into_iter()
        .enumerate()
        .map(|(i, record)| normalize_record(record, i + 1))
        .collect()
}

/// Load records from a `.csv` or `.json` file.
pub fn load_records(path: &Path) -> Result<Vec<EpisodeRecord>> {
    if !path.is_file() {
        return Err(Error::PathNotFound(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let records = match extension.as_str() {
        "json" => parse_json(&content)?,
        "csv" | "txt" => parse_csv(&content)?,
        other => {
            return Err(Error::InvalidReference(format!(
                "unsupported reference file type '{}'",
                other
            )))
        }
    };

    tracing::info!("Loaded {} reference records from {:?}", records.len(), path);
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_csv() {
        let csv = "\u{feff}Number,Title,SeriesEpisode,AirDate,AltTitles\n\
                   001,Thomas & Gordon,s01e01,1984-10-09,\n\
                   002, Edward's Day Out ,S01E02,,Edward Helps | Edward's Day\n\
                   \n\
                   ,The Movie,m01,2000-07-14,\n";
        let records = parse_csv(csv).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].title, "Thomas & Gordon");
        assert_eq!(records[0].air_date.as_deref(), Some("1984-10-09"));
        assert_eq!(records[1].title, "Edward's Day Out");
        assert_eq!(records[1].air_date, None);
        assert_eq!(records[1].alt_titles, vec!["Edward Helps", "Edward's Day"]);
        assert!(records[2].is_movie());
        assert_eq!(records[2].number, "");
    }

    #[test]
    fn test_snake_case_headers() {
        let csv = "number,title,series_episode,air_date,alt_titles\n1,Pilot,s01e01,,A;B\n";
        let records = parse_csv(csv).unwrap();
        assert_eq!(records[0].series_episode, "s01e01");
        assert_eq!(records[0].alt_titles, vec!["A", "B"]);
    }

    #[test]
    fn test_reject_empty_record() {
        let csv = "Number,Title,SeriesEpisode\n7,,\n";
        let err = parse_csv(csv).unwrap_err();
        assert!(matches!(err, Error::InvalidReference(_)));
    }

    #[test]
    fn test_missing_columns() {
        assert!(parse_csv("Foo,Bar\n1,2\n").is_err());
    }

    #[test]
    fn test_parse_json() {
        let json = r#"[
            {"number": "001", "title": "Pilot", "series_episode": "s01e01", "air_date": ""},
            {"number": "", "title": "Film", "series_episode": "m01", "alt_titles": ["The Film"]}
        ]"#;
        let records = parse_json(json).unwrap();
        assert_eq!(records[0].air_date, None);
        assert_eq!(records[1].alt_titles, vec!["The Film"]);
    }

    #[test]
    fn test_load_records_by_extension() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("episodes.csv");
        std::fs::write(&path, "Number,Title,SeriesEpisode\n1,Pilot,s01e01\n").unwrap();
        assert_eq!(load_records(&path).unwrap().len(), 1);

        let other = temp.path().join("episodes.xml");
        std::fs::write(&other, "<x/>").unwrap();
        assert!(load_records(&other).is_err());
        assert!(load_records(&temp.path().join("missing.csv")).is_err());
    }
}
