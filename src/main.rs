//! Episode Organizer CLI
//!
//! A command-line tool for matching episode files against a reference list
//! and reorganizing them with undo support.

use clap::Parser;
use episode_organizer::cli::{
    args::{Cli, Commands},
    commands::{organize, plan, restore_points, undo},
};

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run the appropriate command
    match cli.command {
        Commands::Plan { options, output } => {
            plan::plan(&options, output.as_deref())?;
        }

        Commands::Organize {
            options,
            yes,
            accept_discrepancies,
            keep_empty_dirs,
            thumbnail_style,
        } => {
            let flags = organize::OrganizeFlags {
                yes,
                accept_discrepancies,
                keep_empty_dirs,
                thumbnail_style,
            };
            organize::organize(&options, &flags)?;
        }

        Commands::Undo { root, dry_run } => {
            undo::undo(&root, dry_run)?;
        }

        Commands::RestorePoints { root } => {
            restore_points::list(&root)?;
        }
    }

    Ok(())
}

/// Initialize logging based on verbosity.
fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("episode_organizer=debug")
    } else {
        EnvFilter::new("episode_organizer=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time())
        .with(filter)
        .init();
}
