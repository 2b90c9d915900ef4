//! User-facing terminal output.
//!
//! Everything here goes to stderr: stdout is reserved for the generated
//! changelog and `info` JSON so they can be piped.

use console::style;
use std::error::Error;

use crate::warning::CldrWarning;

/// Joins an error and its sources into one message.
///
/// A source whose text already appears in an outer message is skipped.
pub fn error_report(err: &(dyn Error + 'static)) -> String {
    let mut report = String::new();
    for cause in std::iter::successors(Some(err), |&e| e.source()) {
        let message = cause.to_string();
        if report.contains(&message) {
            continue;
        }
        if !report.is_empty() {
            report.push_str("\n\nCaused by: ");
        }
        report.push_str(&message);
    }
    report
}

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    eprintln!("{} {}", style("✓").green().bold(), message);
}

/// Format and print a status message with blue arrow.
pub fn display_status(message: &str) {
    eprintln!("{} {}", style("→").blue(), message);
}

pub fn display_warning(warning: &CldrWarning) {
    eprintln!("{} {}", style("!").yellow().bold(), style(warning).yellow());
}

/// Show how newly added bullets will look in the released changelog.
pub fn display_bullet_preview(rendered: &[String]) {
    if rendered.is_empty() {
        return;
    }

    eprintln!("\n{}", style("New changelog bullet(s):").bold());
    for line in rendered {
        eprintln!("  {}", style(line).cyan());
    }
}
