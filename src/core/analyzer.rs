//! Filename analyzer.
//!
//! Extracts from a raw filename:
//! - the overall episode number (resolved against the reference index)
//! - the episode title
//! - one or more canonical episode codes (`sNNeNN`, `mNN`)

use crate::core::index::EpisodeIndex;
use crate::models::episode::EpisodeCode;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `sNNeNN` / `sNN epNN` at a word start; group 2 is the first episode.
static CODE_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])s(\d{1,2})[\s._]*(?:ep|e)[\s._]*(\d{2,3})")
        .expect("code start regex")
});

/// Continuation of a multi-episode code: `-E02`, `-02`, ` Ep02`, `e02`.
static CODE_CHAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:-(?:ep|e)[\s._]*|-|[\s._]*-?[\s._]*(?:ep|e)[\s._]*)(\d{2,3})(?:[^0-9]|$)")
        .expect("code chain regex")
});

/// Lenient single code, no word boundary required.
static SINGLE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)s(\d{1,2})[\s._]*(?:ep|e)[\s._]*(\d{1,3})").expect("single code regex")
});

static MOVIE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])m(\d{1,3})(?:[^a-z0-9]|$)").expect("movie code regex")
});

/// Full code token including chained episodes, used to cut the title.
static CODE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:^|[^a-z0-9])(s\d{1,2}[\s._]*(?:ep|e)[\s._]*\d{1,3}(?:(?:-(?:ep|e)[\s._]*|-|[\s._]*-?[\s._]*(?:ep|e)[\s._]*)\d{2,3})*)",
    )
    .expect("code token regex")
});

static PART_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[\(\[]\s*(?:part|pt)\.?\s*([0-9]+|[ivxlc]+)\s*[\)\]]").expect("part marker regex")
});

static PART_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:part|pt)\.?\s*([0-9]+|[ivxlc]+)\b").expect("part word regex")
});

static QUALITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:2160p|1080p|1080i|720p|576p|480p|360p|4k|x264|x265|h[\s.]?26[45]|hevc|xvid|divx|aac|ac3|eac3|dts|web[\s.-]?dl|webrip|bluray|blu-ray|bdrip|brrip|dvdrip|hdtv|vhsrip|remux|10bit|8bit)\b",
    )
    .expect("quality regex")
});

static ENCLOSED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[[^\]]*\]|\([^)]*\)|\{[^}]*\}").expect("enclosed regex")
});

static ALT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:[\s._-]*[\(\[]\s*alt(?:ernate)?(?:[\s._-]*(?:encode|encoding|version|ver))?\s*[\)\]]|[\s._-]+alt(?:ernate)?(?:[\s._-]*(?:encode|encoding))?\s*$)",
    )
    .expect("alt marker regex")
});

/// Leading numbering or code left in front of a title. A bare number only
/// counts as numbering when zero-padded, decimal, or followed by punctuation,
/// so titles like "24 Hours" survive.
static LEADING_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:(?:\d+(?:\.\d+)?|s\d{1,2}e\d{1,3}(?:e\d{2,3})*|m\d{1,3})\s*(?:[\-:;,._]+\s*|$)|(?:0\d+|\d+\.\d+|s\d{1,2}e\d{1,3}(?:e\d{2,3})*)\s+)",
    )
    .expect("leading token regex")
});

static RESIDUAL_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bs\d{1,2}e\d{1,3}(?:e\d{2,3})*\b").expect("residual code regex")
});

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").expect("iso date regex"));

static ENCLOSED_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\(\[]\d{4}[\)\]]").expect("enclosed year regex"));

/// Bare year at either end of a machine-style (dotted/underscored) name.
static MACHINE_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:19|20)\d{2}(?:\s+|$)|\s+(?:19|20)\d{2}$").expect("machine year regex")
});

static DASH_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\s*-\s*){2,}").expect("dash run regex"));

/// Everything the analyzer pulls out of one filename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedInfo {
    pub title: Option<String>,
    pub number: Option<String>,
    pub codes: Option<Vec<String>>,
}

/// Run all three extractors over a filename.
pub fn analyze(name: &str, series_name: Option<&str>, index: &EpisodeIndex) -> ExtractedInfo {
    ExtractedInfo {
        title: extract_title(name, series_name),
        number: extract_episode_number(name, index),
        codes: extract_episode_codes(name),
    }
}

/// Drop a file extension (letters required, so `12.5` stays intact).
pub fn strip_extension(name: &str) -> &str {
    if let Some((stem, ext)) = name.rsplit_once('.') {
        if !stem.is_empty()
            && (1..=5).contains(&ext.len())
            && ext.chars().all(|c| c.is_ascii_alphanumeric())
            && ext.chars().any(|c| c.is_ascii_alphabetic())
        {
            return stem;
        }
    }
    name
}

/// Replace unicode dashes with ASCII hyphens.
pub fn normalize_dashes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}'
            | '\u{2212}' => '-',
            _ => c,
        })
        .collect()
}

/// Remove an alternate-encoding marker such as `(Alt)` or `.alt`.
/// Returns `None` when the stem carries no marker.
pub fn strip_alt_marker(stem: &str) -> Option<String> {
    if !ALT_MARKER.is_match(stem) {
        return None;
    }
    let stripped = ALT_MARKER.replace_all(stem, "");
    let stripped = stripped.trim();
    if stripped.is_empty() {
        return None;
    }
    Some(stripped.to_string())
}

/// Part number mentioned in a title ("Part 2", "Pt. II"), as an integer.
pub fn part_number(text: &str) -> Option<u32> {
    let caps = PART_WORD.captures(text)?;
    parse_part_numeral(&caps[1])
}

fn parse_part_numeral(numeral: &str) -> Option<u32> {
    if let Ok(n) = numeral.parse::<u32>() {
        return Some(n);
    }
    roman_to_int(numeral)
}

fn roman_to_int(numeral: &str) -> Option<u32> {
    let values: Option<Vec<u32>> = numeral
        .to_ascii_lowercase()
        .chars()
        .map(|c| match c {
            'i' => Some(1),
            'v' => Some(5),
            'x' => Some(10),
            'l' => Some(50),
            'c' => Some(100),
            _ => None,
        })
        .collect();
    let values = values?;
    if values.is_empty() {
        return None;
    }

    let mut result = 0i64;
    for (i, value) in values.iter().enumerate() {
        let value = i64::from(*value);
        match values.get(i + 1) {
            Some(next) if i64::from(*next) > value => result -= value,
            _ => result += value,
        }
    }
    u32::try_from(result).ok().filter(|n| *n > 0)
}

/// Overall episode number encoded in a filename.
///
/// Tried in order, first hit wins:
/// 1. `sNNeNN` / `sNN epNN` resolved through the code index
/// 2. `N.N` tokens read as season.episode and resolved the same way
/// 3. decimal tokens equal to a known number
/// 4. standalone 1-3 digit tokens equal to a known number (zero padding ignored)
pub fn extract_episode_number(name: &str, index: &EpisodeIndex) -> Option<String> {
    let stem = normalize_dashes(strip_extension(name));
    let cleaned = ISO_DATE.replace_all(&stem, " ");
    let cleaned = ENCLOSED_YEAR.replace_all(&cleaned, " ");

    for caps in SINGLE_CODE.captures_iter(&cleaned) {
        let code = match canonical_code(&caps[1], &caps[2]) {
            Some(c) => c,
            None => continue,
        };
        if let Some(record) = index.by_code(&code) {
            if !record.number.trim().is_empty() {
                return Some(record.number.clone());
            }
        }
    }

    let tokens: Vec<&str> = cleaned
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '.'))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
        .collect();

    let decimals: Vec<&str> = tokens.iter().copied().filter(|t| is_decimal(t)).collect();

    for token in &decimals {
        if let Some((season, episode)) = token.split_once('.') {
            if season.len() > 2 || episode.len() > 2 {
                continue;
            }
            if let Some(code) = canonical_code(season, episode) {
                if let Some(record) = index.by_code(&code) {
                    if !record.number.trim().is_empty() {
                        return Some(record.number.clone());
                    }
                }
            }
        }
    }

    for token in &decimals {
        if let Some(record) = index.by_number(token) {
            return Some(record.number.clone());
        }
    }

    for token in tokens.iter().filter(|t| !is_decimal(t)) {
        for part in token.split('.') {
            if (1..=3).contains(&part.len()) && part.chars().all(|c| c.is_ascii_digit()) {
                let padded = format!("{:0>3}", part);
                if let Some(record) = index.by_number(&padded) {
                    return Some(record.number.clone());
                }
            }
        }
    }

    None
}

fn is_decimal(token: &str) -> bool {
    match token.split_once('.') {
        Some((a, b)) => {
            !a.is_empty()
                && !b.is_empty()
                && a.chars().all(|c| c.is_ascii_digit())
                && b.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

fn canonical_code(season: &str, episode: &str) -> Option<String> {
    let season: u32 = season.parse().ok()?;
    let episode: u32 = episode.parse().ok()?;
    Some(EpisodeCode::Episode { season, episode }.to_string())
}

/// Canonical episode codes encoded in a filename.
///
/// Handles chained multi-episode forms (`S01E01-E02`, `S01E01-02`,
/// `S01 Ep01 Ep02`, `s01e01e02`), then falls back to a single lenient code
/// and finally to a movie token `mNN`.
pub fn extract_episode_codes(name: &str) -> Option<Vec<String>> {
    let text = normalize_dashes(name);

    if let Some(caps) = CODE_START.captures(&text) {
        if let (Some(season), Some(first)) = (caps.get(1), caps.get(2)) {
            let season: u32 = season.as_str().parse().ok()?;
            let mut episodes: Vec<u32> = Vec::new();
            if let Ok(n) = first.as_str().parse() {
                episodes.push(n);
            }

            let mut rest = &text[first.end()..];
            while let Some(next) = CODE_CHAIN.captures(rest) {
                let Some(m) = next.get(1) else { break };
                if let Ok(n) = m.as_str().parse() {
                    episodes.push(n);
                }
                rest = &rest[m.end()..];
            }

            let mut seen = Vec::new();
            for episode in episodes {
                if !seen.contains(&episode) {
                    seen.push(episode);
                }
            }
            if !seen.is_empty() {
                return Some(
                    seen.into_iter()
                        .map(|episode| EpisodeCode::Episode { season, episode }.to_string())
                        .collect(),
                );
            }
        }
    }

    if let Some(caps) = SINGLE_CODE.captures(&text) {
        if let Some(code) = canonical_code(&caps[1], &caps[2]) {
            return Some(vec![code]);
        }
    }

    if let Some(caps) = MOVIE_CODE.captures(strip_extension(&text)) {
        if let Ok(n) = caps[1].parse::<u32>() {
            return Some(vec![EpisodeCode::Movie(n).to_string()]);
        }
    }

    None
}

/// Episode title embedded in a filename.
///
/// A trailing "(Part N)" marker is set aside and re-attached at the end;
/// quality tags, bracketed and parenthetical segments, leading numbering,
/// the series name prefix and everything up to an episode code are removed.
pub fn extract_title(name: &str, series_name: Option<&str>) -> Option<String> {
    let stem = normalize_dashes(strip_extension(name));

    // Machine-style names use dots or underscores as word separators.
    let machine = !stem.contains(' ') && (stem.contains('.') || stem.contains('_'));
    let mut text = if machine {
        stem.replace(['.', '_'], " ")
    } else {
        stem.replace('_', " ")
    };

    let part = PART_MARKER
        .captures_iter(&text)
        .last()
        .map(|caps| caps[1].to_string());
    if part.is_some() {
        text = PART_MARKER.replace_all(&text, " ").to_string();
    }

    if let Some(stripped) = strip_alt_marker(&text) {
        text = stripped;
    }
    text = QUALITY.replace_all(&text, " ").to_string();
    text = ENCLOSED.replace_all(&text, " ").to_string();

    if let Some(caps) = CODE_TOKEN.captures(&text) {
        if let Some(code) = caps.get(1) {
            text = text[code.end()..].to_string();
        }
    } else if let Some(m) = MOVIE_CODE.find(&text) {
        text = text[m.end()..].to_string();
    }
    text = RESIDUAL_CODE.replace_all(&text, " ").to_string();

    let prefixes = series_name.map(series_prefixes).unwrap_or_default();
    loop {
        let before = text.clone();
        text = trim_separators(&text).to_string();
        text = LEADING_TOKEN.replace(&text, "").to_string();
        text = strip_prefix_ci(&text, &prefixes);
        if machine {
            text = MACHINE_YEAR.replace_all(text.trim(), "").to_string();
        }
        if text == before {
            break;
        }
    }

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let collapsed = DASH_RUN.replace_all(&collapsed, " - ");
    let mut title = trim_separators(&collapsed).to_string();

    if let Some(numeral) = part {
        let already = part_number(&title).is_some_and(|n| Some(n) == parse_part_numeral(&numeral));
        if !already {
            if title.is_empty() {
                title = format!("(Part {})", numeral.to_uppercase());
            } else {
                title = format!("{} (Part {})", title, numeral.to_uppercase());
            }
        }
    }

    if title.chars().any(|c| c.is_alphanumeric()) {
        Some(title)
    } else {
        None
    }
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | ':' | ';' | ',' | '.' | '_' | '~' | '|' | '+')
    })
}

/// Series name variants checked as a title prefix: literal, without a
/// trailing "(year)", and with "&" spelled "and" (and back).
fn series_prefixes(series: &str) -> Vec<String> {
    let mut variants = Vec::new();
    let core = ENCLOSED.replace_all(series, " ");
    let core = core.split_whitespace().collect::<Vec<_>>().join(" ");

    for base in [series.trim().to_string(), core] {
        if base.is_empty() {
            continue;
        }
        let with_and = base.replace('&', "and");
        let with_amp = base.replace(" and ", " & ");
        for v in [base, with_and, with_amp] {
            let v = v.split_whitespace().collect::<Vec<_>>().join(" ");
            if !v.is_empty() && !variants.contains(&v) {
                variants.push(v);
            }
        }
    }

    // Longest first so "Show (1984)" wins over "Show".
    variants.sort_by_key(|v| std::cmp::Reverse(v.len()));
    variants
}

fn strip_prefix_ci(text: &str, prefixes: &[String]) -> String {
    let lower = text.to_lowercase();
    for prefix in prefixes {
        let prefix_lower = prefix.to_lowercase();
        if lower.starts_with(&prefix_lower) {
            // Lowercasing can change byte lengths; only cut when it did not.
            if lower.len() != text.len() {
                continue;
            }
            let rest = &text[prefix_lower.len()..];
            let boundary = rest.chars().next().map_or(true, |c| !c.is_alphanumeric());
            if boundary {
                return rest.to_string();
            }
        }
    }
    text.to_string()
}
