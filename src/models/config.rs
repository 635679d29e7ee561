//! Configuration model.

use crate::core::matcher::MatchStrategy;
use crate::generators::filename::NamingFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output naming template.
    pub naming_format: NamingFormat,
    /// Matching strategy.
    pub strategy: MatchStrategy,
    /// Do not flag number mismatches (ignored by the number-only strategy).
    pub suppress_number_mismatch: bool,
    /// Suffix for renamed thumbnails; empty means none.
    pub thumbnail_style: String,
    /// Lifetime of the cached video listing in seconds.
    pub cache_ttl_secs: u64,
    /// Remove source folders emptied by an organize run.
    pub remove_empty_dirs: bool,
    /// Series name override; defaults to the working root's folder name.
    pub series_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            naming_format: NamingFormat::default(),
            strategy: MatchStrategy::default(),
            suppress_number_mismatch: false,
            thumbnail_style: "thumb".to_string(),
            cache_ttl_secs: 30,
            remove_empty_dirs: true,
            series_name: None,
        }
    }
}

/// Get the configuration directory path.
fn dirs_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("episode_organizer")
}

/// Path of the user configuration file.
pub fn config_file_path() -> PathBuf {
    dirs_config_path().join("config.toml")
}

/// Parse configuration from TOML text.
pub fn parse_config(content: &str) -> crate::Result<Config> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from file, falling back to defaults.
pub fn load_config() -> Config {
    let config_path = config_file_path();

    if config_path.exists() {
        match std::fs::read_to_string(&config_path)
            .map_err(crate::Error::from)
            .and_then(|content| parse_config(&content))
        {
            Ok(config) => return config,
            Err(e) => {
                tracing::warn!("Ignoring unreadable config {:?}: {}", config_path, e);
            }
        }
    }

    Config::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.thumbnail_style, "thumb");
        assert_eq!(config.cache_ttl_secs, 30);
        assert!(config.remove_empty_dirs);
        assert!(!config.suppress_number_mismatch);
        assert_eq!(config.naming_format, NamingFormat::SeriesCodeTitle);
        assert_eq!(config.strategy, MatchStrategy::TitlePriority);
    }

    #[test]
    fn test_parse_partial_config() {
        let config = parse_config(
            r#"
naming_format = "code-title"
strategy = "strict"
thumbnail_style = ""
"#,
        )
        .unwrap();
        assert_eq!(config.naming_format, NamingFormat::CodeTitle);
        assert_eq!(config.strategy, MatchStrategy::Strict);
        assert_eq!(config.thumbnail_style, "");
        assert_eq!(config.cache_ttl_secs, 30);
    }

    #[test]
    fn test_parse_invalid_config() {
        assert!(parse_config("naming_format = \"nope\"").is_err());
    }
}
