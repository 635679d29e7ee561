//! Plan command implementation.
//!
//! Matches every video file and prints the resulting plan without touching
//! the tree.

use super::{open_session, resolve_config};
use crate::cli::args::MatchOptions;
use crate::core::planner;
use crate::models::plan::{Category, Plan, PlanEntry};
use crate::Result;
use colored::Colorize;
use std::path::Path;

/// Execute the plan command.
pub fn plan(options: &MatchOptions, output: Option<&Path>) -> Result<()> {
    println!("{}", "📺 Planning episode organization...".bold().cyan());
    println!();

    let config = resolve_config(options)?;
    let mut session = open_session(options, config)?;

    println!("  {} {}", "Root:".bold(), session.root().display());
    println!("  {} {}", "Series:".bold(), session.series_name());
    println!("  {} {}", "Reference:".bold(), options.reference.display());
    println!("  {} {}", "Strategy:".bold(), session.config().strategy);
    println!(
        "  {} {}",
        "Format:".bold(),
        session.config().naming_format.label()
    );
    println!();

    let plan = session.build_plan()?;
    print_plan(&plan);

    if let Some(path) = output {
        planner::save_plan(&plan, path)?;
        println!();
        println!("  {} {}", "Plan saved:".bold(), path.display());
    }

    if plan.pending_actions() > 0 {
        println!();
        println!("{}", "[Next Steps]".bold().cyan());
        println!("  To apply this plan, run:");
        println!(
            "     {}",
            format!(
                "episode-organizer organize \"{}\" -r \"{}\"",
                options.root.display(),
                options.reference.display()
            )
            .bold()
        );
    }

    Ok(())
}

/// Print every category of a plan followed by a summary.
pub fn print_plan(plan: &Plan) {
    for category in Category::ALL {
        let entries: Vec<&PlanEntry> = plan.in_category(category).collect();
        if entries.is_empty() || category == Category::Skipped {
            continue;
        }

        println!("{}", heading(category, entries.len()));
        for entry in entries {
            print_entry(plan, entry);
        }
        println!();
    }

    println!("{}", "📋 Plan Summary".bold().green());
    println!("  {} {}", "Renames:".bold(), plan.count(Category::ProposedRename));
    println!("  {} {}", "Discrepancies:".bold(), plan.count(Category::Discrepancy));
    println!("  {} {}", "Unmatched:".bold(), plan.count(Category::Unmatched));
    println!("  {} {}", "Duplicates:".bold(), plan.count(Category::Duplicate));
    println!("  {} {}", "Already organized:".bold(), plan.count(Category::Skipped));
}

fn heading(category: Category, count: usize) -> String {
    let text = format!("{} ({})", category_title(category), count).bold();
    match category {
        Category::ProposedRename => text.green().to_string(),
        Category::Discrepancy => text.yellow().to_string(),
        Category::Unmatched => text.red().to_string(),
        Category::Duplicate => text.magenta().to_string(),
        Category::Skipped => text.to_string(),
    }
}

fn category_title(category: Category) -> &'static str {
    match category {
        Category::ProposedRename => "Proposed renames",
        Category::Discrepancy => "Discrepancies",
        Category::Unmatched => "Unmatched",
        Category::Skipped => "Already organized",
        Category::Duplicate => "Duplicates",
    }
}

fn relative<'a>(plan: &Plan, path: &'a Path) -> std::borrow::Cow<'a, str> {
    path.strip_prefix(&plan.root)
        .unwrap_or(path)
        .to_string_lossy()
}

fn print_entry(plan: &Plan, entry: &PlanEntry) {
    let source = relative(plan, entry.source());
    match entry.category {
        Category::ProposedRename | Category::Skipped => {
            let target = entry
                .target_path
                .as_deref()
                .map(|p| relative(plan, p).to_string())
                .unwrap_or_default();
            println!("  {} → {}", source, target.green());
        }
        Category::Discrepancy => {
            let target = entry
                .target_path
                .as_deref()
                .map(|p| relative(plan, p).to_string())
                .unwrap_or_default();
            println!("  {} → {}", source, target.yellow());
            for d in &entry.result.discrepancies {
                println!(
                    "      {} file has {}, reference has {}",
                    format!("{}:", d.kind).bold(),
                    d.extracted.red(),
                    d.expected.green()
                );
            }
        }
        Category::Unmatched => println!("  {}", source.red()),
        Category::Duplicate => {
            let reason = entry
                .duplicate_reason
                .map(|r| r.to_string())
                .unwrap_or_default();
            let kept = plan
                .duplicates
                .iter()
                .find(|d| d.moved == entry.source())
                .map(|d| relative(plan, &d.kept).to_string())
                .unwrap_or_default();
            println!("  {} ({}, kept {})", source.magenta(), reason, kept);
        }
    }
}
