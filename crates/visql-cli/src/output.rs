//! Styled terminal output helpers

use colored::Colorize;

/// Print a section header with styling
pub fn print_header(title: &str) {
    println!();
    println!("{}", "─".repeat(70).bright_black());
    println!("{}", title.bold().cyan());
    println!("{}", "─".repeat(70).bright_black());
}

/// Print success message with green checkmark
pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg);
}

/// Print warning message with yellow warning sign
pub fn print_warning(msg: &str) {
    println!("  {} {}", "⚠".yellow().bold(), msg);
}

/// Print info message with blue info icon
pub fn print_info(msg: &str) {
    println!("  {} {}", "ℹ".blue(), msg);
}

/// Validation notification, shown where the form would pop one up.
pub fn print_notification(msg: &str) {
    eprintln!("  {} {}", "✗".red().bold(), msg.red());
}

/// Print generated SQL unstyled on its own line.
pub fn print_sql(sql: &str) {
    println!("{sql}");
}
