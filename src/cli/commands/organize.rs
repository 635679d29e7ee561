//! Organize command implementation.
//!
//! Builds the plan, asks for confirmation and executes it under a new
//! restore point.

use super::plan::print_plan;
use super::{open_session, resolve_config};
use crate::cli::args::MatchOptions;
use crate::utils::prompt::confirm;
use crate::Result;
use colored::Colorize;

/// Options only the organize command has.
#[derive(Debug, Clone, Default)]
pub struct OrganizeFlags {
    pub yes: bool,
    pub accept_discrepancies: bool,
    pub keep_empty_dirs: bool,
    pub thumbnail_style: Option<String>,
}

/// Execute the organize command.
pub fn organize(options: &MatchOptions, flags: &OrganizeFlags) -> Result<()> {
    println!("{}", "📺 Organizing episodes...".bold().cyan());
    println!();

    let mut config = resolve_config(options)?;
    if flags.keep_empty_dirs {
        config.remove_empty_dirs = false;
    }
    if let Some(style) = &flags.thumbnail_style {
        config.thumbnail_style = style.clone();
    }

    let mut session = open_session(options, config)?;
    println!("  {} {}", "Root:".bold(), session.root().display());
    println!("  {} {}", "Series:".bold(), session.series_name());
    println!();

    let plan = session.build_plan()?;
    print_plan(&plan);
    println!();

    if plan.pending_actions() == 0 {
        println!("{}", "[OK] Nothing to do - everything is organized".green());
        return Ok(());
    }

    println!("{}", "[WARNING] This will move and rename files!".bold().yellow());
    if !flags.yes && !confirm("Proceed?")? {
        println!("{}", "Cancelled - no changes were made".yellow());
        return Ok(());
    }
    println!();

    let mut execute_options = session.execute_options();
    execute_options.accept_discrepancies = flags.accept_discrepancies;

    let report = session.execute(&plan, execute_options)?;
    report.print_summary();
    println!();

    if report.is_success() {
        println!("{}", "[OK] Organize completed successfully!".green());
    } else {
        println!(
            "{}",
            format!("[WARNING] Organize completed with {} errors", report.error_count).yellow()
        );
    }

    if report.restore_point.is_some() {
        println!();
        println!("{}", "[Next Steps]".bold().cyan());
        println!("  To undo this run:");
        println!(
            "     {}",
            format!("episode-organizer undo \"{}\"", session.root().display()).bold()
        );
    }

    Ok(())
}
