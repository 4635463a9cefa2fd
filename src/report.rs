//! Report formatting and printing utilities.
//!
//! This module provides functions to display build problems in cargo-style
//! format. Separate from the pipeline so pommel can be used as a library
//! without printing side effects.

use std::fs;
use std::path::Path;

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use crate::problem::{Problem, Severity};

/// Success mark for consistent output formatting
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓
/// Failure mark for consistent output formatting
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Print problems in a cargo-style format.
///
/// Problems are sorted and displayed with:
/// - Severity and message
/// - Clickable source location (path:line:col)
/// - Source line context with caret indicator where the document is on disk
/// - Cause notes
/// - Summary of total errors/warnings
pub fn print_report(problems: &[Problem]) {
    let mut sorted: Vec<&Problem> = problems.iter().collect();
    sorted.sort_by(|a, b| {
        a.source
            .cmp(&b.source)
            .then_with(|| {
                a.location
                    .as_ref()
                    .map(|l| l.line)
                    .cmp(&b.location.as_ref().map(|l| l.line))
            })
            .then_with(|| a.message.cmp(&b.message))
    });

    let max_line_width = sorted
        .iter()
        .filter_map(|p| p.location.as_ref().map(|l| l.line))
        .max()
        .map(|n| n.to_string().len())
        .unwrap_or(1);

    for problem in &sorted {
        let severity_str = match problem.severity {
            Severity::Warning => "warning".bold().yellow(),
            Severity::Error => "error".bold().red(),
            Severity::Fatal => "fatal".bold().red(),
        };
        println!("{}: {}", severity_str, problem.message);

        if !problem.source.is_empty() {
            match &problem.location {
                Some(location) => println!("  {} {}", "-->".blue(), location),
                None => println!("  {} {}", "-->".blue(), problem.source),
            }
        }

        // Show the offending line when the location points at a real file.
        if let Some(location) = &problem.location
            && let Some(source_line) = read_source_line(&location.source, location.line)
        {
            let caret_char = match problem.severity {
                Severity::Warning => "^".yellow(),
                _ => "^".red(),
            };
            println!("{:>width$} {}", "", "|".blue(), width = max_line_width);
            println!(
                "{:>width$} {} {}",
                location.line.to_string().blue(),
                "|".blue(),
                source_line,
                width = max_line_width
            );
            // Caret position uses unicode display width so CJK content in
            // the document does not shift it.
            let col = location.col.unwrap_or(1);
            let prefix: String = source_line.chars().take(col.saturating_sub(1)).collect();
            let caret_padding = UnicodeWidthStr::width(prefix.as_str());
            println!(
                "{:>width$} {} {:>padding$}{}",
                "",
                "|".blue(),
                "",
                caret_char,
                width = max_line_width,
                padding = caret_padding
            );
        }

        if let Some(cause) = &problem.cause {
            println!(
                "{:>width$} {} {} {}",
                "",
                "=".blue(),
                "note:".bold(),
                cause,
                width = max_line_width
            );
        }
    }

    print_summary(problems);
}

fn read_source_line(source: &str, line: usize) -> Option<String> {
    let path = Path::new(source);
    if !path.is_file() {
        return None;
    }
    let content = fs::read_to_string(path).ok()?;
    content.lines().nth(line.checked_sub(1)?).map(str::to_string)
}

/// Count problems per severity: (warnings, errors, fatals).
pub fn count_by_severity(problems: &[Problem]) -> (usize, usize, usize) {
    let mut counts = (0, 0, 0);
    for problem in problems {
        match problem.severity {
            Severity::Warning => counts.0 += 1,
            Severity::Error => counts.1 += 1,
            Severity::Fatal => counts.2 += 1,
        }
    }
    counts
}

fn print_summary(problems: &[Problem]) {
    let (warnings, errors, fatals) = count_by_severity(problems);
    if errors + fatals > 0 {
        println!(
            "{} {} error(s), {} warning(s)",
            FAILURE_MARK.red(),
            errors + fatals,
            warnings
        );
    } else if warnings > 0 {
        println!("{} 0 errors, {} warning(s)", SUCCESS_MARK.green(), warnings);
    } else {
        println!("{} no problems", SUCCESS_MARK.green());
    }
}
