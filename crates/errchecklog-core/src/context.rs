//! Context types for rule execution.

use std::path::{Path, PathBuf};

use errchecklog_go::ast::Span;
use errchecklog_go::loader::is_test_file;

use crate::types::Location;

/// Context provided to per-file rules.
///
/// Contains metadata about the file being analyzed that rules can use
/// to make context-aware decisions.
#[derive(Debug, Clone)]
pub struct FileContext<'a> {
    /// Path to the file as discovered.
    pub path: &'a Path,
    /// File contents as a string.
    pub content: &'a str,
    /// Whether this is a `_test.go` file.
    pub is_test: bool,
    /// Import path of the package the file belongs to.
    pub package_path: &'a str,
    /// Path relative to the analysis root.
    pub relative_path: PathBuf,
}

impl<'a> FileContext<'a> {
    /// Creates a new file context.
    #[must_use]
    pub fn new(path: &'a Path, content: &'a str, package_path: &'a str, root: &Path) -> Self {
        let relative_path = path
            .strip_prefix(root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf);

        Self {
            path,
            content,
            is_test: is_test_file(path),
            package_path,
            relative_path,
        }
    }

    /// The reported location of a syntax node in this file.
    #[must_use]
    pub fn location(&self, span: Span) -> Location {
        Location::from_span(self.relative_path.clone(), span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_path_and_test_detection() {
        let root = Path::new("/work/app");
        let path = Path::new("/work/app/handler/handler_test.go");
        let ctx = FileContext::new(path, "package handler\n", "example.com/app/handler", root);
        assert_eq!(ctx.relative_path, PathBuf::from("handler/handler_test.go"));
        assert!(ctx.is_test);
        assert_eq!(ctx.package_path, "example.com/app/handler");
    }

    #[test]
    fn test_path_outside_root_is_kept() {
        let ctx = FileContext::new(Path::new("other/main.go"), "", "main", Path::new("/work"));
        assert_eq!(ctx.relative_path, PathBuf::from("other/main.go"));
        assert!(!ctx.is_test);
    }

    #[test]
    fn test_location_uses_relative_path() {
        let ctx = FileContext::new(
            Path::new("/work/app/main.go"),
            "",
            "main",
            Path::new("/work/app"),
        );
        let loc = ctx.location(Span {
            offset: 30,
            len: 2,
            line: 4,
            column: 2,
        });
        assert_eq!(loc.file, PathBuf::from("main.go"));
        assert_eq!((loc.line, loc.column, loc.offset, loc.length), (4, 2, 30, 2));
    }
}
