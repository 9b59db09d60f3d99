//! Rule trait for defining lint rules.

use errchecklog_go::ast::SourceFile;
use errchecklog_go::TypeResolver;

use crate::context::FileContext;
use crate::types::{Severity, Violation};

/// A per-file lint rule over a type-checked Go syntax tree.
///
/// Rules receive the parsed file together with the type information of the
/// package it belongs to, and typically traverse function bodies with
/// [`errchecklog_go::Visit`].
///
/// # Example
///
/// ```ignore
/// use errchecklog_core::{FileContext, Rule, Violation};
/// use errchecklog_go::{ast::SourceFile, TypeResolver};
///
/// pub struct NoInitFunctions;
///
/// impl Rule for NoInitFunctions {
///     fn name(&self) -> &'static str { "no-init" }
///     fn code(&self) -> &'static str { "ECL100" }
///
///     fn check(&self, ctx: &FileContext, file: &SourceFile, _types: &dyn TypeResolver) -> Vec<Violation> {
///         file.functions()
///             .filter(|f| f.name.name == "init")
///             .map(|f| Violation::new(self.code(), self.name(), self.default_severity(),
///                 ctx.location(f.name.span), "init functions are not allowed"))
///             .collect()
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "errchecklog").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "ECL001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for violations from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Error
    }

    /// Checks a single file and returns any violations found.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Context about the file being checked
    /// * `file` - The parsed syntax tree of the file
    /// * `types` - Static types of the file's package
    fn check(&self, ctx: &FileContext, file: &SourceFile, types: &dyn TypeResolver)
        -> Vec<Violation>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;
