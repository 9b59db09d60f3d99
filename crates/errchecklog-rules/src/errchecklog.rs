//! Rule requiring error guards in handlers to report through a given type.
//!
//! # Rationale
//!
//! Errors should be observed where they are detected. In functions named
//! `handle` or `Handle`, every `if err != nil { ... }` block must call a
//! method on a value of the configured named type (typically a logger or
//! error reporter interface).
//!
//! # Detected Patterns
//!
//! - `if <expr> != nil { ... }` where `<expr>` is assignable to `error` and
//!   the block contains no call `recv.method(...)` with `recv` of the target
//!   type
//!
//! `nil != err` is not recognized as a guard.
//!
//! # Configuration
//!
//! - `ifacepkg`: import path of the package declaring the target type
//! - `ifacename`: name of the target type
//!
//! The rule reports nothing unless both are set.

use std::ops::ControlFlow;

use errchecklog_core::{Config, FileContext, Label, Rule, Severity, Suggestion, Violation};
use errchecklog_go::ast::{BinaryOp, Block, Expr, ExprKind, FuncDecl, IfStmt, SourceFile, Stmt};
use errchecklog_go::visit::{walk_expr, walk_stmt};
use errchecklog_go::{TypeResolver, Visit};

/// Rule code for errchecklog.
pub const CODE: &str = "ECL001";

/// Rule name for errchecklog.
pub const NAME: &str = "errchecklog";

/// Names of the functions whose guards are checked.
const HANDLER_NAMES: &[&str] = &["handle", "Handle"];

/// The named type whose methods must be called in every guard block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetInterface {
    /// Import path of the declaring package.
    pub package_path: String,
    /// Declared type name.
    pub name: String,
}

impl TargetInterface {
    /// Creates a target from a package path and type name.
    #[must_use]
    pub fn new(package_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package_path: package_path.into(),
            name: name.into(),
        }
    }

    /// Whether both parts are set. An inactive target disables the rule.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.package_path.is_empty() && !self.name.is_empty()
    }
}

impl std::fmt::Display for TargetInterface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.package_path, self.name)
    }
}

/// Requires every error guard in a handler to call a method of the target type.
#[derive(Debug, Clone)]
pub struct ErrCheckLog {
    target: TargetInterface,
    severity: Severity,
}

impl ErrCheckLog {
    /// Creates the rule for the given target.
    #[must_use]
    pub fn new(target: TargetInterface) -> Self {
        Self {
            target,
            severity: Severity::Error,
        }
    }

    /// Creates the rule from the `ifacepkg` and `ifacename` options of the
    /// `[rules.errchecklog]` section.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let target = config.rule(NAME).map_or_else(TargetInterface::default, |rule| {
            TargetInterface::new(rule.get_str("ifacepkg", ""), rule.get_str("ifacename", ""))
        });
        Self::new(target)
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// The configured target.
    #[must_use]
    pub fn target(&self) -> &TargetInterface {
        &self.target
    }

    fn violation(&self, ctx: &FileContext, guard: &IfStmt, checked: &Expr) -> Violation {
        Violation::new(
            CODE,
            NAME,
            self.severity,
            ctx.location(guard.if_token),
            format!(
                "if err != nil block does NOT contain a call to {}.{}",
                self.target.package_path, self.target.name
            ),
        )
        .with_label(Label::new(ctx.location(checked.span), "error checked here"))
        .with_suggestion(Suggestion::new(format!(
            "report the error through a {} value inside this block",
            self.target
        )))
    }
}

impl Rule for ErrCheckLog {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires error guards in handle functions to call the configured reporter type"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn check(
        &self,
        ctx: &FileContext,
        file: &SourceFile,
        types: &dyn TypeResolver,
    ) -> Vec<Violation> {
        if !self.target.is_active() {
            return Vec::new();
        }

        let mut visitor = GuardVisitor {
            ctx,
            rule: self,
            types,
            violations: Vec::new(),
        };
        for body in handler_bodies(file) {
            let _ = visitor.visit_block(body);
        }
        visitor.violations
    }
}

/// Bodies of the `handle`/`Handle` functions and methods, in declaration order.
fn handler_bodies(file: &SourceFile) -> impl Iterator<Item = &Block> {
    file.functions()
        .filter(|func| is_handler(func))
        .filter_map(|func| func.body.as_ref())
}

fn is_handler(func: &FuncDecl) -> bool {
    HANDLER_NAMES.contains(&func.name.name.as_str())
}

/// The checked operand of an `<expr> != nil` guard on an error value.
fn guarded_error<'a>(cond: &'a Expr, types: &dyn TypeResolver) -> Option<&'a Expr> {
    let ExprKind::Binary {
        op: BinaryOp::NotEq,
        lhs,
        rhs,
    } = &cond.kind
    else {
        return None;
    };
    if !matches!(rhs.kind, ExprKind::Nil) {
        return None;
    }
    let ty = types.resolve_static_type(lhs)?;
    types.is_error_signaling_type(ty).then_some(lhs.as_ref())
}

struct GuardVisitor<'a> {
    ctx: &'a FileContext<'a>,
    rule: &'a ErrCheckLog,
    types: &'a dyn TypeResolver,
    violations: Vec<Violation>,
}

impl<'ast> Visit<'ast> for GuardVisitor<'_> {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) -> ControlFlow<()> {
        if let Stmt::If(guard) = stmt {
            if let Some(checked) = guarded_error(&guard.cond, self.types) {
                let reported = guard
                    .body
                    .as_ref()
                    .is_some_and(|body| calls_target(body, &self.rule.target, self.types));
                if !reported {
                    self.violations
                        .push(self.rule.violation(self.ctx, guard, checked));
                }
            }
        }
        walk_stmt(self, stmt)
    }
}

/// Whether `block` contains a call through a value of the target type.
fn calls_target(block: &Block, target: &TargetInterface, types: &dyn TypeResolver) -> bool {
    let mut finder = CallFinder { target, types };
    finder.visit_block(block).is_break()
}

struct CallFinder<'a> {
    target: &'a TargetInterface,
    types: &'a dyn TypeResolver,
}

impl<'ast> Visit<'ast> for CallFinder<'_> {
    fn visit_expr(&mut self, expr: &'ast Expr) -> ControlFlow<()> {
        if let ExprKind::Call { func, .. } = &expr.kind {
            if let ExprKind::Selector { operand, .. } = &func.kind {
                let matches = self.types.resolve_static_type(operand).is_some_and(|ty| {
                    ty.is_named(&self.target.package_path, &self.target.name)
                });
                if matches {
                    return ControlFlow::Break(());
                }
            }
        }
        walk_expr(self, expr)
    }
}
