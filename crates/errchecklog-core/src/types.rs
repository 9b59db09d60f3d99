//! Core types for lint violations and results.

use errchecklog_go::ast::Span;
use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Severity level for lint violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to the analysis root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte offset in file (for miette integration).
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a location covering a syntax node.
    #[must_use]
    pub fn from_span(file: PathBuf, span: Span) -> Self {
        Self {
            file,
            line: span.line,
            column: span.column,
            offset: span.offset,
            length: span.len,
        }
    }

    /// Creates a new location with explicit values.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

    /// Sets the byte offset and length for this location.
    #[must_use]
    pub fn with_span(mut self, offset: usize, length: usize) -> Self {
        self.offset = offset;
        self.length = length;
        self
    }
}

/// A labeled span for additional context in violations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    /// Location of the label.
    pub location: Location,
    /// Message for this label.
    pub message: String,
}

impl Label {
    /// Creates a new label.
    #[must_use]
    pub fn new(location: Location, message: impl Into<String>) -> Self {
        Self {
            location,
            message: message.into(),
        }
    }
}

/// A suggested fix for a violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    /// Human-readable description of the fix.
    pub message: String,
}

impl Suggestion {
    /// Creates a new suggestion.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A lint violation found during analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    /// Rule code (e.g., "ECL001").
    pub code: String,
    /// Rule name (e.g., "errchecklog").
    pub rule: String,
    /// Severity of this violation.
    pub severity: Severity,
    /// Primary location of the violation.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// Optional suggestion for fixing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<Suggestion>,
    /// Additional labels for context.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<Label>,
}

impl Violation {
    /// Creates a new violation.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            location,
            message: message.into(),
            suggestion: None,
            labels: Vec::new(),
        }
    }

    /// Adds a suggestion to this violation.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: Suggestion) -> Self {
        self.suggestion = Some(suggestion);
        self
    }

    /// Adds a label to this violation.
    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.labels.push(label);
        self
    }

    /// Formats the violation for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!(
            "{} {} at {}:{}:{}\n",
            self.code,
            self.rule,
            self.location.file.display(),
            self.location.line,
            self.location.column,
        );
        let _ = writeln!(output, "  {}: {}", self.severity, self.message);
        for label in &self.labels {
            let _ = writeln!(
                output,
                "  --> {}:{}: {}",
                label.location.line, label.location.column, label.message
            );
        }
        if let Some(suggestion) = &self.suggestion {
            let _ = writeln!(output, "  = help: {}", suggestion.message);
        }
        output
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.code,
            self.message
        )
    }
}

/// A violation as a miette diagnostic, for graphical rendering.
#[derive(Debug, thiserror::Error, Diagnostic)]
#[error("{message}")]
pub struct ViolationDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[source_code]
    source_code: Option<NamedSource<String>>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
    #[label(collection)]
    labels: Vec<LabeledSpan>,
}

impl ViolationDiagnostic {
    /// Attaches the file contents so that renderers can show a snippet.
    #[must_use]
    pub fn with_source(mut self, name: impl AsRef<str>, content: String) -> Self {
        self.source_code = Some(NamedSource::new(name, content));
        self
    }
}

impl From<&Violation> for ViolationDiagnostic {
    fn from(v: &Violation) -> Self {
        Self {
            message: format!("[{}] {}", v.code, v.message),
            help: v.suggestion.as_ref().map(|s| s.message.clone()),
            source_code: None,
            span: SourceSpan::from((v.location.offset, v.location.length)),
            label_message: v.rule.clone(),
            labels: v
                .labels
                .iter()
                .map(|l| {
                    LabeledSpan::new(
                        Some(l.message.clone()),
                        l.location.offset,
                        l.location.length,
                    )
                })
                .collect(),
        }
    }
}

/// Result of running lint analysis.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All violations found.
    pub violations: Vec<Violation>,
    /// Number of files checked.
    pub files_checked: usize,
    /// Number of packages checked.
    #[serde(default)]
    pub packages_checked: usize,
    /// Files skipped because they could not be read or parsed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_files: Vec<PathBuf>,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity == Severity::Error)
    }

    /// Returns true if there are any warnings or errors.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        self.violations
            .iter()
            .any(|v| v.severity >= Severity::Warning)
    }

    /// Returns violations filtered by severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .collect()
    }

    /// Counts violations by severity.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |severity| {
            self.violations
                .iter()
                .filter(|v| v.severity == severity)
                .count()
        };
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }

    /// Prints a summary report to stdout.
    pub fn print_report(&self) {
        for violation in &self.violations {
            println!("{}", violation.format());
        }
        println!("\n{}", self.summary());
    }

    /// One-line summary of the counts.
    #[must_use]
    pub fn summary(&self) -> String {
        let (errors, warnings, infos) = self.count_by_severity();
        let mut summary = format!(
            "Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s)",
            self.files_checked
        );
        if !self.skipped_files.is_empty() {
            summary.push_str(&format!(" ({} skipped)", self.skipped_files.len()));
        }
        summary
    }

    /// Checks if any violations meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Adds violations from another result.
    pub fn extend(&mut self, other: Self) {
        self.violations.extend(other.violations);
        self.files_checked += other.files_checked;
        self.packages_checked += other.packages_checked;
        self.skipped_files.extend(other.skipped_files);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_violation(severity: Severity) -> Violation {
        Violation::new(
            "ECL001",
            "errchecklog",
            severity,
            Location::new(PathBuf::from("handler/handler.go"), 12, 2),
            "if err != nil block does NOT contain a call to example.com/app/logging.Reporter",
        )
    }

    #[test]
    fn location_from_span_keeps_offsets() {
        let span = Span {
            offset: 40,
            len: 2,
            line: 5,
            column: 2,
        };
        let loc = Location::from_span(PathBuf::from("a.go"), span);
        assert_eq!((loc.line, loc.column, loc.offset, loc.length), (5, 2, 40, 2));
    }

    #[test]
    fn violation_display_is_one_line() {
        let v = make_violation(Severity::Error);
        insta::assert_snapshot!(
            v.to_string(),
            @"handler/handler.go:12:2: error [ECL001] if err != nil block does NOT contain a call to example.com/app/logging.Reporter"
        );
    }

    #[test]
    fn violation_format_includes_labels_and_help() {
        let v = make_violation(Severity::Error)
            .with_label(Label::new(
                Location::new(PathBuf::from("handler/handler.go"), 12, 5),
                "error checked here",
            ))
            .with_suggestion(Suggestion::new("report the error"));
        let formatted = v.format();
        assert!(formatted.contains("  --> 12:5: error checked here"));
        assert!(formatted.contains("= help: report the error"));
    }

    #[test]
    fn violation_format_omits_help_when_none() {
        let formatted = make_violation(Severity::Warning).format();
        assert!(!formatted.contains("help:"));
        assert!(formatted.contains("warning: if err != nil"));
    }

    #[test]
    fn diagnostic_carries_help_and_labels() {
        let v = make_violation(Severity::Error)
            .with_label(Label::new(
                Location::new(PathBuf::from("a.go"), 1, 1).with_span(3, 3),
                "error checked here",
            ))
            .with_suggestion(Suggestion::new("report the error"));
        let diagnostic = ViolationDiagnostic::from(&v).with_source("a.go", "if err != nil {}".into());
        assert_eq!(diagnostic.help().map(|h| h.to_string()).as_deref(), Some("report the error"));
        assert_eq!(diagnostic.labels().map(Iterator::count), Some(2));
        assert!(diagnostic.source_code().is_some());
    }

    #[test]
    fn has_violations_at_error_only() {
        let mut result = LintResult::new();
        result.violations.push(make_violation(Severity::Warning));
        assert!(!result.has_violations_at(Severity::Error));
        assert!(result.has_violations_at(Severity::Warning));
        assert!(!result.has_errors());
        assert!(result.has_warnings());
    }

    #[test]
    fn summary_counts_and_skips() {
        let mut result = LintResult::new();
        result.files_checked = 3;
        result.violations.push(make_violation(Severity::Error));
        result.violations.push(make_violation(Severity::Warning));
        result.skipped_files.push(PathBuf::from("broken.go"));
        insta::assert_snapshot!(
            result.summary(),
            @"Found 1 error(s), 1 warning(s), 0 info(s) in 3 file(s) (1 skipped)"
        );
    }

    #[test]
    fn extend_merges_counts() {
        let mut a = LintResult::new();
        a.files_checked = 1;
        a.packages_checked = 1;
        let mut b = LintResult::new();
        b.files_checked = 2;
        b.packages_checked = 1;
        b.violations.push(make_violation(Severity::Error));
        a.extend(b);
        assert_eq!(a.files_checked, 3);
        assert_eq!(a.packages_checked, 2);
        assert_eq!(a.by_severity(Severity::Error).len(), 1);
    }
}
