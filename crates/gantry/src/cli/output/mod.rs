//! Output formatting utilities

use console::style;

use gantry_tasks::TaskStatus;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print a warning message
pub fn warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled header
pub fn header(text: &str) -> String {
    style(text).bold().to_string()
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Glyph for a final task status
pub fn status_glyph(status: &TaskStatus) -> String {
    match status {
        TaskStatus::Success => style("✓").green().to_string(),
        TaskStatus::Skipped(_) => style("○").yellow().to_string(),
        TaskStatus::Failed(_) => style("✗").red().to_string(),
        TaskStatus::NotRun(_) => style("-").dim().to_string(),
    }
}

/// Plural suffix for `count`
pub fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}
