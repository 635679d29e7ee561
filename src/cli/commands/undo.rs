//! Undo command implementation.
//!
//! Replays the most recent restore point in reverse.

use crate::core::journal::{latest_restore_point, load_restore_point};
use crate::core::undo::undo_latest;
use crate::utils::fs::ensure_directory;
use crate::{Error, Result};
use colored::Colorize;
use std::path::Path;

/// Execute the undo command.
pub fn undo(root: &Path, dry_run: bool) -> Result<()> {
    println!("{}", "⏪ Undo command".bold().cyan());
    println!();

    ensure_directory(root)?;
    let root = root.canonicalize()?;

    let latest = latest_restore_point(&root)?
        .ok_or_else(|| Error::NoRestorePoint(root.display().to_string()))?;
    let point = load_restore_point(&latest)?;

    println!("  {} {}", "Restore point:".bold(), latest.display());
    println!("  {} {}", "Label:".bold(), point.label);
    println!("  {} {}", "Created:".bold(), point.created);
    println!("  {} {}", "Entries:".bold(), point.entries.len());
    println!();

    let report = undo_latest(&root, dry_run)?;
    report.print_summary();
    println!();

    if !report.is_success() {
        println!(
            "{}",
            format!(
                "[WARNING] {} entries failed - the restore point was kept",
                report.error_count
            )
            .yellow()
        );
    } else if dry_run {
        println!("{}", "[OK] Dry run complete - no changes were made".green());
        println!();
        println!("{}", "[Next Steps]".bold().cyan());
        println!("  To actually undo:");
        println!(
            "     {}",
            format!("episode-organizer undo \"{}\"", root.display()).bold()
        );
    } else {
        println!("{}", "[OK] Undo completed successfully!".green());
    }

    Ok(())
}
