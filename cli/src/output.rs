//! Output formatting utilities for CLI commands

use colored::{ColoredString, Colorize};

/// Print error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print warning message
pub fn warning(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print a section heading
pub fn section(title: &str) {
    println!("\n{}", format!("=== {} ===", title).bold());
}

/// Percentage colored by severity
pub fn percent(p: f64) -> ColoredString {
    let text = format!("{:>6.2}%", p);
    if p >= 10.0 {
        text.red().bold()
    } else if p >= 1.0 {
        text.yellow()
    } else {
        text.normal()
    }
}

/// Seconds colored against a slow threshold
pub fn seconds(value: f64, threshold: f64) -> ColoredString {
    let text = format!("{:>9.3}s", value);
    if value >= threshold {
        text.red()
    } else {
        text.green()
    }
}

/// Shorten `s` to at most `max` characters, marking the cut
pub fn truncate(s: &str, max: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("select  *\n from t", 40), "select * from t");
        assert_eq!(truncate("abcdef", 4), "abc…");
    }
}
