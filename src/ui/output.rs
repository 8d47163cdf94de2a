//! Output functions for consistent staging log formatting

use console::style;

const STEP_PREFIX: &str = "----->";
const DETAIL_INDENT: &str = "       ";

/// Display a step header
pub fn section(title: &str) {
    println!("{} {}", style(STEP_PREFIX).bold(), style(title).bold());
}

/// Display an indented detail line under the current step
pub fn detail(line: &str) {
    println!("{}{}", DETAIL_INDENT, line);
}

/// Display a warning
pub fn warning(message: &str) {
    println!("{} {}", style("**WARNING**").yellow().bold(), message);
}

/// Display the final failure line on stderr
pub fn failure(message: &str) {
    eprintln!("{} {}", style("**ERROR**").red().bold(), message);
}
