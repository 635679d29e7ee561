//! CLI command implementations.

pub mod organize;
pub mod plan;
pub mod restore_points;
pub mod undo;

use crate::cli::args::MatchOptions;
use crate::core::session::Session;
use crate::models::config::{load_config, Config};
use crate::Result;

/// Configuration with the command line overrides applied.
pub fn resolve_config(options: &MatchOptions) -> Result<Config> {
    let mut config = load_config();
    if let Some(series) = &options.series {
        config.series_name = Some(series.clone());
    }
    if let Some(format) = &options.format {
        config.naming_format = format.parse()?;
    }
    if let Some(strategy) = &options.strategy {
        config.strategy = strategy.parse()?;
    }
    if options.suppress_number_mismatch {
        config.suppress_number_mismatch = true;
    }
    Ok(config)
}

/// Open a session from the shared options.
pub fn open_session(options: &MatchOptions, config: Config) -> Result<Session> {
    Session::open(&options.root, &options.reference, config)
}
