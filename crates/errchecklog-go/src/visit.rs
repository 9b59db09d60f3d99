//! Syntax tree traversal.
//!
//! Each `visit_*` method defaults to the matching `walk_*` function, which
//! descends into every child. Returning [`ControlFlow::Break`] stops the whole
//! traversal, so searches can exit on their first hit.

use std::ops::ControlFlow;

use crate::ast::{Block, Expr, ExprKind, Stmt};

/// A syntax tree visitor.
pub trait Visit<'ast> {
    /// Visits a block.
    fn visit_block(&mut self, block: &'ast Block) -> ControlFlow<()> {
        walk_block(self, block)
    }

    /// Visits a statement.
    fn visit_stmt(&mut self, stmt: &'ast Stmt) -> ControlFlow<()> {
        walk_stmt(self, stmt)
    }

    /// Visits an expression.
    fn visit_expr(&mut self, expr: &'ast Expr) -> ControlFlow<()> {
        walk_expr(self, expr)
    }
}

/// Visits every statement of `block`.
pub fn walk_block<'ast, V>(v: &mut V, block: &'ast Block) -> ControlFlow<()>
where
    V: Visit<'ast> + ?Sized,
{
    walk_stmts(v, &block.stmts)
}

fn walk_stmts<'ast, V>(v: &mut V, stmts: &'ast [Stmt]) -> ControlFlow<()>
where
    V: Visit<'ast> + ?Sized,
{
    for stmt in stmts {
        v.visit_stmt(stmt)?;
    }
    ControlFlow::Continue(())
}

fn walk_exprs<'ast, V>(v: &mut V, exprs: &'ast [Expr]) -> ControlFlow<()>
where
    V: Visit<'ast> + ?Sized,
{
    for expr in exprs {
        v.visit_expr(expr)?;
    }
    ControlFlow::Continue(())
}

fn walk_opt_stmt<'ast, V>(v: &mut V, stmt: Option<&'ast Stmt>) -> ControlFlow<()>
where
    V: Visit<'ast> + ?Sized,
{
    match stmt {
        Some(stmt) => v.visit_stmt(stmt),
        None => ControlFlow::Continue(()),
    }
}

/// Visits the children of `stmt`.
pub fn walk_stmt<'ast, V>(v: &mut V, stmt: &'ast Stmt) -> ControlFlow<()>
where
    V: Visit<'ast> + ?Sized,
{
    match stmt {
        Stmt::Expr(expr) | Stmt::Go(expr) | Stmt::Defer(expr) | Stmt::IncDec(expr) => {
            v.visit_expr(expr)
        }
        Stmt::Assign { lhs, rhs, .. } => {
            walk_exprs(v, lhs)?;
            walk_exprs(v, rhs)
        }
        Stmt::Var(specs) => {
            for spec in specs {
                walk_exprs(v, &spec.values)?;
            }
            ControlFlow::Continue(())
        }
        Stmt::Return(values) => walk_exprs(v, values),
        Stmt::If(if_stmt) => {
            walk_opt_stmt(v, if_stmt.init.as_deref())?;
            v.visit_expr(&if_stmt.cond)?;
            if let Some(body) = &if_stmt.body {
                v.visit_block(body)?;
            }
            walk_opt_stmt(v, if_stmt.else_branch.as_deref())
        }
        Stmt::For(for_stmt) => {
            walk_opt_stmt(v, for_stmt.init.as_deref())?;
            if let Some(cond) = &for_stmt.cond {
                v.visit_expr(cond)?;
            }
            walk_opt_stmt(v, for_stmt.post.as_deref())?;
            v.visit_block(&for_stmt.body)
        }
        Stmt::Range(range) => {
            if let Some(key) = &range.key {
                v.visit_expr(key)?;
            }
            if let Some(value) = &range.value {
                v.visit_expr(value)?;
            }
            v.visit_expr(&range.expr)?;
            v.visit_block(&range.body)
        }
        Stmt::Switch(switch) => {
            walk_opt_stmt(v, switch.init.as_deref())?;
            if let Some(tag) = &switch.tag {
                v.visit_expr(tag)?;
            }
            for clause in &switch.clauses {
                walk_exprs(v, &clause.values)?;
                walk_stmts(v, &clause.body)?;
            }
            ControlFlow::Continue(())
        }
        Stmt::TypeSwitch(switch) => {
            walk_opt_stmt(v, switch.init.as_deref())?;
            v.visit_expr(&switch.subject)?;
            for clause in &switch.clauses {
                walk_stmts(v, &clause.body)?;
            }
            ControlFlow::Continue(())
        }
        Stmt::Select(clauses) => {
            for clause in clauses {
                walk_opt_stmt(v, clause.comm.as_deref())?;
                walk_stmts(v, &clause.body)?;
            }
            ControlFlow::Continue(())
        }
        Stmt::Send { channel, value } => {
            v.visit_expr(channel)?;
            v.visit_expr(value)
        }
        Stmt::Labeled(inner) => v.visit_stmt(inner),
        Stmt::Block(block) => v.visit_block(block),
        Stmt::Type(_) | Stmt::Branch | Stmt::Empty => ControlFlow::Continue(()),
    }
}

/// Visits the children of `expr`, including the bodies of function literals.
pub fn walk_expr<'ast, V>(v: &mut V, expr: &'ast Expr) -> ControlFlow<()>
where
    V: Visit<'ast> + ?Sized,
{
    match &expr.kind {
        ExprKind::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs)?;
            v.visit_expr(rhs)
        }
        ExprKind::Unary { operand, .. }
        | ExprKind::Paren(operand)
        | ExprKind::Selector { operand, .. }
        | ExprKind::TypeAssert { operand, .. }
        | ExprKind::Conversion { operand, .. } => v.visit_expr(operand),
        ExprKind::Call { func, args } => {
            v.visit_expr(func)?;
            walk_exprs(v, args)
        }
        ExprKind::Index { operand, index } => {
            v.visit_expr(operand)?;
            v.visit_expr(index)
        }
        ExprKind::Slice { operand, bounds } => {
            v.visit_expr(operand)?;
            walk_exprs(v, bounds)
        }
        ExprKind::Composite { elems, .. } => walk_exprs(v, elems),
        ExprKind::KeyValue { key, value } => {
            v.visit_expr(key)?;
            v.visit_expr(value)
        }
        ExprKind::FuncLit { body, .. } => v.visit_block(body),
        ExprKind::Ident(_)
        | ExprKind::Nil
        | ExprKind::BasicLit(_)
        | ExprKind::Type(_)
        | ExprKind::Bad => ControlFlow::Continue(()),
    }
}
