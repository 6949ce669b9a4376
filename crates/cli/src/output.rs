//! Terminal output utilities
//!
//! Provides consistent formatting for CLI output.

use owo_colors::OwoColorize;
use safetravel_core::validation::ValidationIssue;

/// Status message helpers
pub struct Status;

impl Status {
    /// Print a success message
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Print an error message
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Print a warning message
    pub fn warning(message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message);
    }

    /// Print a header
    pub fn header(message: &str) {
        println!();
        println!("{}", message.bold());
        println!("{}", "─".repeat(message.chars().count()));
    }

    /// Print a key/value line, aligned for tables of settings
    pub fn field(key: &str, value: &str) {
        println!("  {:<28} {}", key.dimmed(), value);
    }
}

/// Print each warning with its code
pub fn print_warnings(warnings: &[ValidationIssue]) {
    for warning in warnings {
        Status::warning(&format_issue(warning));
    }
}

/// Render an issue as `field: message [CODE]`
pub fn format_issue(issue: &ValidationIssue) -> String {
    format!("{} [{}]", issue, issue.code)
}

/// Format a count with singular/plural
pub fn format_count(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_issue() {
        let issue = ValidationIssue::new("buildVariants.release.shrink", "UNKNOWN_KEY", "Unknown key");
        assert_eq!(
            format_issue(&issue),
            "buildVariants.release.shrink: Unknown key [UNKNOWN_KEY]"
        );
    }

    #[test]
    fn test_format_count_singular() {
        assert_eq!(format_count(1, "warning", "warnings"), "1 warning");
    }

    #[test]
    fn test_format_count_plural() {
        assert_eq!(format_count(0, "warning", "warnings"), "0 warnings");
        assert_eq!(format_count(5, "variant", "variants"), "5 variants");
    }
}
