//! Restore points command implementation.
//!
//! Lists the journals stored under `cleanup/restore_points/`.

use crate::core::journal::list_restore_points;
use crate::utils::fs::ensure_directory;
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// List all restore points of a working root, newest first.
pub fn list(root: &Path) -> Result<()> {
    println!("{}", "📁 Restore points".bold().cyan());
    println!();

    ensure_directory(root)?;
    let points = list_restore_points(&root.canonicalize()?)?;

    if points.is_empty() {
        println!("No restore points found.");
        return Ok(());
    }

    println!(
        "{:<28} {:<12} {:<8} {}",
        "Created".bold(),
        "Label".bold(),
        "Entries".bold(),
        "File".bold()
    );
    println!("{}", "-".repeat(80));

    for point in &points {
        let file = point
            .file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        println!(
            "{:<28} {:<12} {:<8} {}",
            point.created, point.label, point.entry_count, file
        );
    }

    println!();
    println!("Total: {} restore points", points.len());
    println!("{}", "The first one is undone by `episode-organizer undo`.".dimmed());
    Ok(())
}
