//! Shared output formatting for lint results.

use anyhow::Result;
use errchecklog_core::{LintResult, Severity, ViolationDiagnostic};
use std::fmt::Write as _;
use std::path::Path;

use crate::OutputFormat;

/// Print lint results in the specified format.
///
/// `root` is the analysis root that violation paths are relative to.
pub fn print(result: &LintResult, format: OutputFormat, root: &Path) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => println!("{}", render_json(result)?),
        OutputFormat::Compact => print!("{}", render_compact(result)),
        OutputFormat::Fancy => print_fancy(result, root),
    }
    Ok(())
}

fn print_text(result: &LintResult) {
    let (errors, warnings, _) = result.count_by_severity();

    for violation in &result.violations {
        let severity_indicator = match violation.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        println!(
            "{} {} at {}:{}:{}",
            violation.code,
            violation.rule,
            violation.location.file.display(),
            violation.location.line,
            violation.location.column,
        );
        println!("  {}: {}", severity_indicator, violation.message);
        if let Some(suggestion) = &violation.suggestion {
            println!("  = help: {}", suggestion.message);
        }
        println!();
    }

    for skipped in &result.skipped_files {
        println!("\x1b[33mskipped\x1b[0m {} (parse error)", skipped.display());
    }

    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!("{summary_color}{}\x1b[0m", result.summary());
}

fn render_json(result: &LintResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

fn render_compact(result: &LintResult) -> String {
    let mut out = String::new();
    for violation in &result.violations {
        let _ = writeln!(out, "{violation}");
    }
    out
}

fn print_fancy(result: &LintResult, root: &Path) {
    for violation in &result.violations {
        let file = &violation.location.file;
        let mut diagnostic = ViolationDiagnostic::from(violation);
        match std::fs::read_to_string(root.join(file)) {
            Ok(content) => {
                diagnostic = diagnostic.with_source(file.to_string_lossy(), content);
            }
            Err(e) => tracing::debug!("No source for {}: {}", file.display(), e),
        }
        println!("{:?}", miette::Report::new(diagnostic));
    }
    println!("{}", result.summary());
}
