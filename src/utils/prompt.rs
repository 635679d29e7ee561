//! Interactive confirmation.

use colored::Colorize;
use std::io::{BufRead, Write};

/// Ask a yes/no question on stdout and read the answer from stdin.
pub fn confirm(question: &str) -> crate::Result<bool> {
    print!("{} ", format!("{} (y/n):", question).magenta());
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    Ok(is_yes(&input))
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
