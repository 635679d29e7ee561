//! Command line argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Episode Organizer - Match episode files against a reference list and organize them
#[derive(Parser, Debug)]
#[command(name = "episode-organizer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by `plan` and `organize`.
#[derive(Args, Debug, Clone)]
pub struct MatchOptions {
    /// Folder containing the episode files
    #[arg(value_name = "ROOT")]
    pub root: PathBuf,

    /// Reference episode list (.csv or .json)
    #[arg(short, long, value_name = "FILE")]
    pub reference: PathBuf,

    /// Series name (defaults to the folder name)
    #[arg(short, long)]
    pub series: Option<String>,

    /// Naming format, by name or number (1-13)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Matching strategy: title, code, strict or number
    #[arg(long)]
    pub strategy: Option<String>,

    /// Do not report episode number mismatches
    #[arg(long)]
    pub suppress_number_mismatch: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show what organizing a folder would do
    Plan {
        #[command(flatten)]
        options: MatchOptions,

        /// Also write the plan to a JSON file
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Rename and move episode files according to the plan
    Organize {
        #[command(flatten)]
        options: MatchOptions,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Also rename files whose name disagrees with the reference
        #[arg(long)]
        accept_discrepancies: bool,

        /// Leave emptied source folders in place
        #[arg(long)]
        keep_empty_dirs: bool,

        /// Thumbnail suffix (empty for none)
        #[arg(long, value_name = "STYLE")]
        thumbnail_style: Option<String>,
    },

    /// Undo the most recent organize run
    Undo {
        /// Folder that was organized
        #[arg(value_name = "ROOT")]
        root: PathBuf,

        /// Dry run - show what would be done
        #[arg(long)]
        dry_run: bool,
    },

    /// List available restore points
    RestorePoints {
        /// Folder that was organized
        #[arg(value_name = "ROOT")]
        root: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_organize() {
        let cli = Cli::try_parse_from([
            "episode-organizer",
            "organize",
            "/shows/Thomas",
            "-r",
            "episodes.csv",
            "--format",
            "3",
            "--yes",
            "--thumbnail-style",
            "",
        ])
        .unwrap();

        match cli.command {
            Commands::Organize {
                options,
                yes,
                thumbnail_style,
                ..
            } => {
                assert_eq!(options.root, PathBuf::from("/shows/Thomas"));
                assert_eq!(options.format.as_deref(), Some("3"));
                assert!(yes);
                assert_eq!(thumbnail_style.as_deref(), Some(""));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
