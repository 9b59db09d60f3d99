//! Go parser: tree-sitter-go concrete syntax lowered into [`crate::ast`].

use tree_sitter::{Language, Node, Parser};

use crate::ast::{
    BinaryOp, Block, CaseClause, CommClause, Decl, Expr, ExprIdGen, ExprKind, FieldDecl,
    ForStmt, FuncDecl, FuncType, Ident, IfStmt, ImportSpec, InterfaceElem, LitKind, Param,
    RangeStmt, SourceFile, Span, Stmt, SwitchStmt, TypeCaseClause, TypeExpr, TypeSpec,
    TypeSwitchStmt, UnaryOp, ValueSpec,
};

/// Errors produced while parsing a Go file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The grammar could not be loaded into the parser.
    #[error("failed to load the Go grammar: {0}")]
    Language(String),

    /// tree-sitter returned no tree.
    #[error("parser produced no syntax tree")]
    NoTree,

    /// The source contains a syntax error.
    #[error("syntax error at {line}:{column}")]
    Syntax {
        /// Line of the first error (1-indexed).
        line: usize,
        /// Column of the first error (1-indexed).
        column: usize,
    },

    /// The file has no `package` clause.
    #[error("missing package clause")]
    MissingPackage,
}

/// Parses Go source files into the owned syntax model.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    /// Creates a parser for Go.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Language`] if the grammar version is incompatible
    /// with the linked tree-sitter runtime.
    pub fn new() -> Result<Self, ParseError> {
        let language: Language = tree_sitter_go::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ParseError::Language(e.to_string()))?;
        Ok(Self { parser })
    }

    /// Parses one file. Expression ids are drawn from `ids`.
    ///
    /// # Errors
    ///
    /// Fails on syntax errors and on files without a `package` clause.
    pub fn parse(&mut self, source: &str, ids: &mut ExprIdGen) -> Result<SourceFile, ParseError> {
        let tree = self.parser.parse(source, None).ok_or(ParseError::NoTree)?;
        let root = tree.root_node();

        if root.has_error() {
            let (line, column) = first_error(root).map_or((1, 1), |n| {
                let p = n.start_position();
                (p.row + 1, p.column + 1)
            });
            return Err(ParseError::Syntax { line, column });
        }

        Lowering {
            src: source.as_bytes(),
            ids,
        }
        .file(root)
    }
}

fn first_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error)
}

fn span_of(node: Node<'_>) -> Span {
    let start = node.start_position();
    Span {
        offset: node.start_byte(),
        len: node.end_byte() - node.start_byte(),
        line: start.row + 1,
        column: start.column + 1,
    }
}

/// Named children, comments excluded.
fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| c.kind() != "comment")
        .collect()
}

fn field_nodes<'t>(node: Node<'t>, name: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(name, &mut cursor).collect()
}

fn has_token(node: Node<'_>, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| c.kind() == token);
    found
}

struct Lowering<'a> {
    src: &'a [u8],
    ids: &'a mut ExprIdGen,
}

impl<'a> Lowering<'a> {
    fn text(&self, node: Node<'_>) -> &'a str {
        node.utf8_text(self.src).unwrap_or("")
    }

    fn ident(&self, node: Node<'_>) -> Ident {
        Ident {
            name: self.text(node).to_string(),
            span: span_of(node),
        }
    }

    fn file(&mut self, root: Node<'_>) -> Result<SourceFile, ParseError> {
        let mut package = None;
        let mut imports = Vec::new();
        let mut decls = Vec::new();

        for node in named_children(root) {
            match node.kind() {
                "package_clause" => {
                    package = named_children(node).first().map(|n| self.ident(*n));
                }
                "import_declaration" => self.imports(node, &mut imports),
                "function_declaration" | "method_declaration" => {
                    decls.push(Decl::Func(self.func_decl(node)));
                }
                "type_declaration" => decls.push(Decl::Type(self.type_specs(node))),
                "var_declaration" => decls.push(Decl::Var(self.value_specs(node, "var_spec"))),
                "const_declaration" => {
                    decls.push(Decl::Const(self.value_specs(node, "const_spec")));
                }
                _ => {}
            }
        }

        Ok(SourceFile {
            package: package.ok_or(ParseError::MissingPackage)?,
            imports,
            decls,
        })
    }

    fn imports(&self, node: Node<'_>, out: &mut Vec<ImportSpec>) {
        for child in named_children(node) {
            match child.kind() {
                "import_spec" => {
                    let Some(path) = child.child_by_field_name("path") else {
                        continue;
                    };
                    out.push(ImportSpec {
                        name: child
                            .child_by_field_name("name")
                            .map(|n| self.text(n).to_string()),
                        path: unquote(self.text(path)).to_string(),
                        span: span_of(child),
                    });
                }
                "import_spec_list" => self.imports(child, out),
                _ => {}
            }
        }
    }

    fn func_decl(&mut self, node: Node<'_>) -> FuncDecl {
        let name = node
            .child_by_field_name("name")
            .map_or_else(|| missing_ident(node), |n| self.ident(n));
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|n| self.params(n).into_iter().next());
        let params = node
            .child_by_field_name("parameters")
            .map(|n| self.params(n))
            .unwrap_or_default();
        let results = self.results(node);
        let body = node.child_by_field_name("body").map(|n| self.block(n));

        FuncDecl {
            name,
            receiver,
            params,
            results,
            body,
            span: span_of(node),
        }
    }

    /// Lowers the `result` field of a function-like node.
    fn results(&mut self, node: Node<'_>) -> Vec<Param> {
        match node.child_by_field_name("result") {
            Some(result) if result.kind() == "parameter_list" => self.params(result),
            Some(result) => vec![Param {
                names: Vec::new(),
                ty: self.type_expr(result),
                variadic: false,
            }],
            None => Vec::new(),
        }
    }

    fn params(&mut self, list: Node<'_>) -> Vec<Param> {
        let mut params = Vec::new();
        for child in named_children(list) {
            let variadic = match child.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => continue,
            };
            let names = field_nodes(child, "name")
                .into_iter()
                .map(|n| self.ident(n))
                .collect();
            let ty = child
                .child_by_field_name("type")
                .map_or(TypeExpr::Unknown, |n| self.type_expr(n));
            let ty = if variadic {
                TypeExpr::Slice(Box::new(ty))
            } else {
                ty
            };
            params.push(Param {
                names,
                ty,
                variadic,
            });
        }
        params
    }

    /// Flattens parameter groups into one type per declared entry.
    fn func_type(&mut self, node: Node<'_>) -> FuncType {
        let params = node
            .child_by_field_name("parameters")
            .map(|n| self.params(n))
            .unwrap_or_default();
        let results = self.results(node);
        FuncType {
            params: expand_params(&params),
            results: expand_params(&results),
        }
    }

    fn type_specs(&mut self, node: Node<'_>) -> Vec<TypeSpec> {
        let mut specs = Vec::new();
        for child in named_children(node) {
            let alias = match child.kind() {
                "type_spec" => false,
                "type_alias" => true,
                _ => continue,
            };
            let Some(name) = child.child_by_field_name("name") else {
                continue;
            };
            let ty = child
                .child_by_field_name("type")
                .map_or(TypeExpr::Unknown, |n| self.type_expr(n));
            specs.push(TypeSpec {
                name: self.ident(name),
                alias,
                ty,
            });
        }
        specs
    }

    fn value_specs(&mut self, node: Node<'_>, spec_kind: &str) -> Vec<ValueSpec> {
        let mut specs = Vec::new();
        for child in named_children(node) {
            if child.kind() == spec_kind {
                let names = field_nodes(child, "name")
                    .into_iter()
                    .map(|n| self.ident(n))
                    .collect();
                let ty = child.child_by_field_name("type").map(|n| self.type_expr(n));
                let values = child
                    .child_by_field_name("value")
                    .map(|n| self.expr_list(n))
                    .unwrap_or_default();
                specs.push(ValueSpec { names, ty, values });
            } else if child.kind().ends_with("_spec_list") {
                specs.extend(self.value_specs(child, spec_kind));
            }
        }
        specs
    }

    fn type_expr(&mut self, node: Node<'_>) -> TypeExpr {
        let first_named = || named_children(node).into_iter().next();
        match node.kind() {
            "type_identifier" | "identifier" => TypeExpr::Name(self.text(node).to_string()),
            "qualified_type" => match (
                node.child_by_field_name("package"),
                node.child_by_field_name("name"),
            ) {
                (Some(pkg), Some(name)) => TypeExpr::Qualified {
                    package: self.text(pkg).to_string(),
                    name: self.text(name).to_string(),
                },
                _ => TypeExpr::Unknown,
            },
            "selector_expression" => match (
                node.child_by_field_name("operand"),
                node.child_by_field_name("field"),
            ) {
                (Some(pkg), Some(name)) if pkg.kind() == "identifier" => TypeExpr::Qualified {
                    package: self.text(pkg).to_string(),
                    name: self.text(name).to_string(),
                },
                _ => TypeExpr::Unknown,
            },
            "pointer_type" => match first_named() {
                Some(inner) => TypeExpr::Pointer(Box::new(self.type_expr(inner))),
                None => TypeExpr::Unknown,
            },
            "parenthesized_type" => match first_named() {
                Some(inner) => self.type_expr(inner),
                None => TypeExpr::Unknown,
            },
            "slice_type" => TypeExpr::Slice(Box::new(self.type_field(node, "element"))),
            "array_type" | "implicit_length_array_type" => {
                TypeExpr::Array(Box::new(self.type_field(node, "element")))
            }
            "map_type" => TypeExpr::Map(
                Box::new(self.type_field(node, "key")),
                Box::new(self.type_field(node, "value")),
            ),
            "channel_type" => TypeExpr::Chan(Box::new(self.type_field(node, "value"))),
            "function_type" => TypeExpr::Func(self.func_type(node)),
            "struct_type" => TypeExpr::Struct(self.struct_fields(node)),
            "interface_type" => TypeExpr::Interface(self.interface_elems(node)),
            "generic_type" => TypeExpr::Generic(Box::new(self.type_field(node, "type"))),
            _ => TypeExpr::Unknown,
        }
    }

    fn type_field(&mut self, node: Node<'_>, field: &str) -> TypeExpr {
        node.child_by_field_name(field)
            .map_or(TypeExpr::Unknown, |n| self.type_expr(n))
    }

    fn struct_fields(&mut self, node: Node<'_>) -> Vec<FieldDecl> {
        let mut fields = Vec::new();
        for list in named_children(node) {
            if list.kind() != "field_declaration_list" {
                continue;
            }
            for decl in named_children(list) {
                if decl.kind() != "field_declaration" {
                    continue;
                }
                let names: Vec<String> = field_nodes(decl, "name")
                    .into_iter()
                    .map(|n| self.text(n).to_string())
                    .collect();
                let mut ty = self.type_field(decl, "type");
                if names.is_empty() && has_token(decl, "*") {
                    ty = TypeExpr::Pointer(Box::new(ty));
                }
                fields.push(FieldDecl { names, ty });
            }
        }
        fields
    }

    fn interface_elems(&mut self, node: Node<'_>) -> Vec<InterfaceElem> {
        let mut elems = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "method_elem" | "method_spec" => {
                    let Some(name) = child.child_by_field_name("name") else {
                        continue;
                    };
                    let name = self.text(name).to_string();
                    elems.push(InterfaceElem::Method {
                        name,
                        sig: self.func_type(child),
                    });
                }
                "type_elem" | "constraint_elem" | "interface_type_name" => {
                    // Unions (`A | B`) embed nothing usable.
                    if let [single] = named_children(child).as_slice() {
                        elems.push(InterfaceElem::Embed(self.type_expr(*single)));
                    }
                }
                "type_identifier" | "qualified_type" => {
                    elems.push(InterfaceElem::Embed(self.type_expr(child)));
                }
                _ => {}
            }
        }
        elems
    }

    fn block(&mut self, node: Node<'_>) -> Block {
        Block {
            stmts: self.stmt_list(node, &[]),
            span: span_of(node),
        }
    }

    /// Lowers the statements directly under `node`, skipping the node ids in
    /// `skip` (clause headers) and flattening `statement_list` wrappers.
    fn stmt_list(&mut self, node: Node<'_>, skip: &[usize]) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        for child in named_children(node) {
            if skip.contains(&child.id()) {
                continue;
            }
            if child.kind() == "statement_list" {
                stmts.extend(self.stmt_list(child, &[]));
            } else {
                stmts.push(self.stmt(child));
            }
        }
        stmts
    }

    fn opt_stmt(&mut self, node: Node<'_>, field: &str) -> Option<Box<Stmt>> {
        node.child_by_field_name(field)
            .map(|n| Box::new(self.stmt(n)))
    }

    fn stmt(&mut self, node: Node<'_>) -> Stmt {
        match node.kind() {
            "expression_statement" => match named_children(node).first() {
                Some(inner) => Stmt::Expr(self.expr(*inner)),
                None => Stmt::Empty,
            },
            "short_var_declaration" | "assignment_statement" => Stmt::Assign {
                lhs: self.expr_field_list(node, "left"),
                rhs: self.expr_field_list(node, "right"),
                define: node.kind() == "short_var_declaration",
            },
            "var_declaration" => Stmt::Var(self.value_specs(node, "var_spec")),
            "const_declaration" => Stmt::Var(self.value_specs(node, "const_spec")),
            "type_declaration" => Stmt::Type(self.type_specs(node)),
            "return_statement" => Stmt::Return(
                named_children(node)
                    .first()
                    .map(|n| self.expr_list(*n))
                    .unwrap_or_default(),
            ),
            "if_statement" => Stmt::If(self.if_stmt(node)),
            "for_statement" => self.for_stmt(node),
            "expression_switch_statement" => Stmt::Switch(self.switch_stmt(node)),
            "type_switch_statement" => Stmt::TypeSwitch(self.type_switch_stmt(node)),
            "select_statement" => Stmt::Select(self.select_clauses(node)),
            "go_statement" | "defer_statement" => match named_children(node).first() {
                Some(call) => {
                    let call = self.expr(*call);
                    if node.kind() == "go_statement" {
                        Stmt::Go(call)
                    } else {
                        Stmt::Defer(call)
                    }
                }
                None => Stmt::Empty,
            },
            "send_statement" => match (
                node.child_by_field_name("channel"),
                node.child_by_field_name("value"),
            ) {
                (Some(channel), Some(value)) => Stmt::Send {
                    channel: self.expr(channel),
                    value: self.expr(value),
                },
                _ => Stmt::Empty,
            },
            "receive_statement" => self.receive_stmt(node),
            "inc_statement" | "dec_statement" => match named_children(node).first() {
                Some(operand) => Stmt::IncDec(self.expr(*operand)),
                None => Stmt::Empty,
            },
            "labeled_statement" => match named_children(node)
                .into_iter()
                .find(|c| c.kind() != "label_name")
            {
                Some(inner) => Stmt::Labeled(Box::new(self.stmt(inner))),
                None => Stmt::Empty,
            },
            "block" => Stmt::Block(self.block(node)),
            "break_statement" | "continue_statement" | "goto_statement"
            | "fallthrough_statement" => Stmt::Branch,
            _ => Stmt::Empty,
        }
    }

    fn receive_stmt(&mut self, node: Node<'_>) -> Stmt {
        let Some(right) = node.child_by_field_name("right") else {
            return Stmt::Empty;
        };
        let rhs = self.expr(right);
        if node.child_by_field_name("left").is_some() {
            Stmt::Assign {
                lhs: self.expr_field_list(node, "left"),
                rhs: vec![rhs],
                define: has_token(node, ":="),
            }
        } else {
            Stmt::Expr(rhs)
        }
    }

    fn if_stmt(&mut self, node: Node<'_>) -> IfStmt {
        let start = span_of(node);
        let if_token = Span { len: 2, ..start };
        let init = self.opt_stmt(node, "initializer");
        let cond = match node.child_by_field_name("condition") {
            Some(cond) => self.expr(cond),
            None => self.bad_expr(node),
        };
        let body = node
            .child_by_field_name("consequence")
            .map(|n| self.block(n));
        let else_branch = node.child_by_field_name("alternative").map(|alt| {
            Box::new(if alt.kind() == "if_statement" {
                Stmt::If(self.if_stmt(alt))
            } else {
                Stmt::Block(self.block(alt))
            })
        });

        IfStmt {
            if_token,
            init,
            cond,
            body,
            else_branch,
        }
    }

    fn for_stmt(&mut self, node: Node<'_>) -> Stmt {
        let body_node = node.child_by_field_name("body");
        let body = body_node.map_or_else(
            || Block {
                stmts: Vec::new(),
                span: span_of(node),
            },
            |n| self.block(n),
        );
        let header = named_children(node)
            .into_iter()
            .find(|c| Some(c.id()) != body_node.map(|b| b.id()));

        match header {
            Some(clause) if clause.kind() == "range_clause" => {
                let mut left = self.expr_field_list(clause, "left").into_iter();
                let expr = match clause.child_by_field_name("right") {
                    Some(right) => self.expr(right),
                    None => self.bad_expr(clause),
                };
                Stmt::Range(RangeStmt {
                    key: left.next(),
                    value: left.next(),
                    define: has_token(clause, ":="),
                    expr,
                    body,
                })
            }
            Some(clause) if clause.kind() == "for_clause" => Stmt::For(ForStmt {
                init: self.opt_stmt(clause, "initializer"),
                cond: clause
                    .child_by_field_name("condition")
                    .map(|n| self.expr(n)),
                post: self.opt_stmt(clause, "update"),
                body,
            }),
            Some(cond) => Stmt::For(ForStmt {
                init: None,
                cond: Some(self.expr(cond)),
                post: None,
                body,
            }),
            None => Stmt::For(ForStmt {
                init: None,
                cond: None,
                post: None,
                body,
            }),
        }
    }

    fn switch_stmt(&mut self, node: Node<'_>) -> SwitchStmt {
        let init = self.opt_stmt(node, "initializer");
        let tag = node.child_by_field_name("value").map(|n| self.expr(n));
        let mut clauses = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "expression_case" => {
                    let value = child.child_by_field_name("value");
                    let values = value.map(|n| self.expr_list(n)).unwrap_or_default();
                    let skip: Vec<usize> = value.map(|n| n.id()).into_iter().collect();
                    clauses.push(CaseClause {
                        values,
                        body: self.stmt_list(child, &skip),
                    });
                }
                "default_case" => clauses.push(CaseClause {
                    values: Vec::new(),
                    body: self.stmt_list(child, &[]),
                }),
                _ => {}
            }
        }
        SwitchStmt { init, tag, clauses }
    }

    fn type_switch_stmt(&mut self, node: Node<'_>) -> TypeSwitchStmt {
        let init = self.opt_stmt(node, "initializer");
        let binding = node
            .child_by_field_name("alias")
            .and_then(|alias| {
                if alias.kind() == "expression_list" {
                    named_children(alias).into_iter().next()
                } else {
                    Some(alias)
                }
            })
            .map(|n| self.ident(n));
        let subject = match node.child_by_field_name("value") {
            Some(value) => self.expr(value),
            None => self.bad_expr(node),
        };

        let mut clauses = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "type_case" => {
                    let type_nodes = field_nodes(child, "type");
                    let skip: Vec<usize> = type_nodes.iter().map(Node::id).collect();
                    let types = type_nodes.into_iter().map(|n| self.type_expr(n)).collect();
                    clauses.push(TypeCaseClause {
                        types,
                        body: self.stmt_list(child, &skip),
                    });
                }
                "default_case" => clauses.push(TypeCaseClause {
                    types: Vec::new(),
                    body: self.stmt_list(child, &[]),
                }),
                _ => {}
            }
        }

        TypeSwitchStmt {
            init,
            binding,
            subject,
            clauses,
        }
    }

    fn select_clauses(&mut self, node: Node<'_>) -> Vec<CommClause> {
        let mut clauses = Vec::new();
        for child in named_children(node) {
            match child.kind() {
                "communication_case" => {
                    let comm = child.child_by_field_name("communication");
                    let skip: Vec<usize> = comm.map(|n| n.id()).into_iter().collect();
                    clauses.push(CommClause {
                        comm: comm.map(|n| Box::new(self.stmt(n))),
                        body: self.stmt_list(child, &skip),
                    });
                }
                "default_case" => clauses.push(CommClause {
                    comm: None,
                    body: self.stmt_list(child, &[]),
                }),
                _ => {}
            }
        }
        clauses
    }

    fn expr_field_list(&mut self, node: Node<'_>, field: &str) -> Vec<Expr> {
        node.child_by_field_name(field)
            .map(|n| self.expr_list(n))
            .unwrap_or_default()
    }

    fn expr_list(&mut self, node: Node<'_>) -> Vec<Expr> {
        if node.kind() == "expression_list" {
            named_children(node)
                .into_iter()
                .map(|n| self.expr(n))
                .collect()
        } else {
            vec![self.expr(node)]
        }
    }

    fn bad_expr(&mut self, node: Node<'_>) -> Expr {
        Expr {
            id: self.ids.next_id(),
            span: span_of(node),
            kind: ExprKind::Bad,
        }
    }

    fn boxed(&mut self, node: Node<'_>, field: &str) -> Box<Expr> {
        Box::new(match node.child_by_field_name(field) {
            Some(child) => self.expr(child),
            None => self.bad_expr(node),
        })
    }

    fn expr(&mut self, node: Node<'_>) -> Expr {
        let id = self.ids.next_id();
        let span = span_of(node);
        let kind = match node.kind() {
            "identifier" | "field_identifier" | "package_identifier" | "type_identifier"
            | "true" | "false" | "iota" => ExprKind::Ident(self.text(node).to_string()),
            "nil" => ExprKind::Nil,
            "int_literal" => ExprKind::BasicLit(LitKind::Int),
            "float_literal" => ExprKind::BasicLit(LitKind::Float),
            "imaginary_literal" => ExprKind::BasicLit(LitKind::Imaginary),
            "rune_literal" => ExprKind::BasicLit(LitKind::Rune),
            "interpreted_string_literal" | "raw_string_literal" => {
                ExprKind::BasicLit(LitKind::String)
            }
            "parenthesized_expression" | "literal_element" | "variadic_argument" => {
                match named_children(node).first() {
                    Some(inner) if node.kind() == "parenthesized_expression" => {
                        ExprKind::Paren(Box::new(self.expr(*inner)))
                    }
                    Some(inner) => return self.expr(*inner),
                    None => ExprKind::Bad,
                }
            }
            "unary_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .and_then(|n| UnaryOp::from_token(n.kind()));
                match op {
                    Some(op) => ExprKind::Unary {
                        op,
                        operand: self.boxed(node, "operand"),
                    },
                    None => ExprKind::Bad,
                }
            }
            "binary_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .and_then(|n| BinaryOp::from_token(n.kind()));
                match op {
                    Some(op) => ExprKind::Binary {
                        op,
                        lhs: self.boxed(node, "left"),
                        rhs: self.boxed(node, "right"),
                    },
                    None => ExprKind::Bad,
                }
            }
            "selector_expression" => match node.child_by_field_name("field") {
                Some(field) => ExprKind::Selector {
                    operand: self.boxed(node, "operand"),
                    field: self.ident(field),
                },
                None => ExprKind::Bad,
            },
            "call_expression" => {
                let func = self.boxed(node, "function");
                let args: Vec<Expr> = node
                    .child_by_field_name("arguments")
                    .map(|list| {
                        named_children(list)
                            .into_iter()
                            .map(|arg| self.expr(arg))
                            .collect()
                    })
                    .unwrap_or_default();
                ExprKind::Call { func, args }
            }
            "index_expression" => ExprKind::Index {
                operand: self.boxed(node, "operand"),
                index: self.boxed(node, "index"),
            },
            "slice_expression" => {
                let operand = self.boxed(node, "operand");
                let bounds = ["start", "end", "capacity"]
                    .into_iter()
                    .filter_map(|f| node.child_by_field_name(f))
                    .map(|n| self.expr(n))
                    .collect();
                ExprKind::Slice { operand, bounds }
            }
            "type_assertion_expression" => ExprKind::TypeAssert {
                operand: self.boxed(node, "operand"),
                ty: self.type_field(node, "type"),
            },
            "type_conversion_expression" => ExprKind::Conversion {
                ty: self.type_field(node, "type"),
                operand: self.boxed(node, "operand"),
            },
            "composite_literal" => ExprKind::Composite {
                ty: node.child_by_field_name("type").map(|n| self.type_expr(n)),
                elems: node
                    .child_by_field_name("body")
                    .map(|body| self.literal_elems(body))
                    .unwrap_or_default(),
            },
            "literal_value" => ExprKind::Composite {
                ty: None,
                elems: self.literal_elems(node),
            },
            "keyed_element" => {
                let children = named_children(node);
                let key = node.child_by_field_name("key").or(children.first().copied());
                let value = node
                    .child_by_field_name("value")
                    .or(children.last().copied());
                match (key, value) {
                    (Some(key), Some(value)) if key.id() != value.id() => ExprKind::KeyValue {
                        key: Box::new(self.expr(key)),
                        value: Box::new(self.expr(value)),
                    },
                    _ => ExprKind::Bad,
                }
            }
            "func_literal" => {
                let params = node
                    .child_by_field_name("parameters")
                    .map(|n| self.params(n))
                    .unwrap_or_default();
                let results = self.results(node);
                let body = node.child_by_field_name("body").map_or_else(
                    || Block {
                        stmts: Vec::new(),
                        span,
                    },
                    |n| self.block(n),
                );
                ExprKind::FuncLit {
                    params,
                    results,
                    body,
                }
            }
            "qualified_type" | "generic_type" | "pointer_type" | "slice_type" | "array_type"
            | "implicit_length_array_type" | "map_type" | "channel_type" | "function_type"
            | "struct_type" | "interface_type" | "parenthesized_type" => {
                ExprKind::Type(self.type_expr(node))
            }
            _ => ExprKind::Bad,
        };

        Expr { id, span, kind }
    }

    fn literal_elems(&mut self, body: Node<'_>) -> Vec<Expr> {
        named_children(body)
            .into_iter()
            .map(|n| self.expr(n))
            .collect()
    }
}

fn missing_ident(node: Node<'_>) -> Ident {
    Ident {
        name: String::new(),
        span: span_of(node),
    }
}

fn unquote(literal: &str) -> &str {
    literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| literal.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
        .unwrap_or(literal)
}

/// One type per declared name; unnamed groups count once.
fn expand_params(params: &[Param]) -> Vec<TypeExpr> {
    params
        .iter()
        .flat_map(|p| std::iter::repeat(p.ty.clone()).take(p.names.len().max(1)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> SourceFile {
        let mut ids = ExprIdGen::new();
        GoParser::new()
            .expect("grammar loads")
            .parse(src, &mut ids)
            .expect("source parses")
    }

    fn only_func(file: &SourceFile) -> &FuncDecl {
        file.functions().next().expect("one function")
    }

    #[test]
    fn parses_package_and_imports() {
        let file = parse(
            r#"package handler

import (
	"errors"
	lg "example.com/app/logging"
	_ "embed"
)
"#,
        );
        assert_eq!(file.package.name, "handler");
        assert_eq!(file.imports.len(), 3);
        assert_eq!(file.imports[0].path, "errors");
        assert_eq!(file.imports[1].name.as_deref(), Some("lg"));
        assert_eq!(file.imports[1].path, "example.com/app/logging");
        assert_eq!(file.imports[2].local_name(), None);
    }

    #[test]
    fn parses_function_signature() {
        let file = parse(
            "package p\n\nfunc Handle(ctx context.Context, ids ...int) (n int, err error) {\n\treturn 0, nil\n}\n",
        );
        let func = only_func(&file);
        assert_eq!(func.name.name, "Handle");
        assert!(func.receiver.is_none());
        assert_eq!(func.params.len(), 2);
        assert!(func.params[1].variadic);
        assert_eq!(func.params[1].ty, TypeExpr::Slice(Box::new(TypeExpr::Name("int".into()))));
        assert_eq!(func.results.len(), 2);
        assert_eq!(func.results[1].ty, TypeExpr::Name("error".into()));
        assert!(func.body.is_some());
    }

    #[test]
    fn parses_method_receiver() {
        let file = parse("package p\n\nfunc (h *Handler) handle() {}\n");
        let func = only_func(&file);
        let receiver = func.receiver.as_ref().expect("receiver");
        assert_eq!(receiver.names[0].name, "h");
        assert_eq!(
            receiver.ty,
            TypeExpr::Pointer(Box::new(TypeExpr::Name("Handler".into())))
        );
    }

    #[test]
    fn bodiless_function_has_no_body() {
        let file = parse("package p\n\nfunc handle(x int) error\n");
        assert!(only_func(&file).body.is_none());
    }

    #[test]
    fn if_statement_records_keyword_position() {
        let file = parse("package p\n\nfunc f() {\n\tif err != nil {\n\t}\n}\n");
        let body = only_func(&file).body.as_ref().expect("body");
        let Stmt::If(if_stmt) = &body.stmts[0] else {
            panic!("expected if statement");
        };
        assert_eq!(if_stmt.if_token.line, 4);
        assert_eq!(if_stmt.if_token.column, 2);
        assert_eq!(if_stmt.if_token.len, 2);
        let ExprKind::Binary { op, lhs, rhs } = &if_stmt.cond.kind else {
            panic!("expected binary condition");
        };
        assert_eq!(*op, BinaryOp::NotEq);
        assert!(matches!(&lhs.kind, ExprKind::Ident(name) if name == "err"));
        assert!(matches!(rhs.kind, ExprKind::Nil));
    }

    #[test]
    fn else_if_chain_is_nested() {
        let file = parse(
            "package p\n\nfunc f() {\n\tif a {\n\t} else if b {\n\t} else {\n\t}\n}\n",
        );
        let body = only_func(&file).body.as_ref().expect("body");
        let Stmt::If(first) = &body.stmts[0] else {
            panic!("expected if");
        };
        let Some(else_branch) = &first.else_branch else {
            panic!("expected else");
        };
        let Stmt::If(second) = else_branch.as_ref() else {
            panic!("expected else-if");
        };
        assert!(matches!(
            second.else_branch.as_deref(),
            Some(Stmt::Block(_))
        ));
    }

    #[test]
    fn lowers_selector_calls() {
        let file = parse("package p\n\nfunc f() {\n\th.log.Report(err)\n}\n");
        let body = only_func(&file).body.as_ref().expect("body");
        let Stmt::Expr(call) = &body.stmts[0] else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { func, args } = &call.kind else {
            panic!("expected call");
        };
        assert_eq!(args.len(), 1);
        let ExprKind::Selector { operand, field } = &func.kind else {
            panic!("expected selector");
        };
        assert_eq!(field.name, "Report");
        assert!(matches!(&operand.kind, ExprKind::Selector { field, .. } if field.name == "log"));
    }

    #[test]
    fn lowers_loops_switches_and_closures() {
        let file = parse(
            r"package p

func f(items []int) {
	for i := 0; i < 3; i++ {
	}
	for _, item := range items {
		_ = item
	}
	switch x := g(); x {
	case 1, 2:
		h()
	default:
	}
	switch v := y.(type) {
	case error:
		_ = v
	}
	go func() {
		defer done()
	}()
}
",
        );
        let body = only_func(&file).body.as_ref().expect("body");
        assert!(matches!(body.stmts[0], Stmt::For(_)));
        let Stmt::Range(range) = &body.stmts[1] else {
            panic!("expected range");
        };
        assert!(range.define);
        assert!(range.value.is_some());
        let Stmt::Switch(switch) = &body.stmts[2] else {
            panic!("expected switch");
        };
        assert!(switch.init.is_some());
        assert_eq!(switch.clauses.len(), 2);
        assert_eq!(switch.clauses[0].values.len(), 2);
        assert_eq!(switch.clauses[0].body.len(), 1);
        let Stmt::TypeSwitch(type_switch) = &body.stmts[3] else {
            panic!("expected type switch");
        };
        assert_eq!(
            type_switch.binding.as_ref().map(|b| b.name.as_str()),
            Some("v")
        );
        assert_eq!(type_switch.clauses[0].types, vec![TypeExpr::Name("error".into())]);
        assert_eq!(type_switch.clauses[0].body.len(), 1);
        assert!(matches!(body.stmts[4], Stmt::Go(_)));
    }

    #[test]
    fn parses_struct_and_interface_types() {
        let file = parse(
            r"package p

type Reporter interface {
	error
	Report(err error)
}

type Handler struct {
	*Base
	log, audit Reporter
}
",
        );
        let Decl::Type(specs) = &file.decls[0] else {
            panic!("expected type decl");
        };
        let TypeExpr::Interface(elems) = &specs[0].ty else {
            panic!("expected interface");
        };
        assert_eq!(elems.len(), 2);
        assert!(matches!(&elems[0], InterfaceElem::Embed(TypeExpr::Name(n)) if n == "error"));
        assert!(matches!(&elems[1], InterfaceElem::Method { name, .. } if name == "Report"));

        let Decl::Type(specs) = &file.decls[1] else {
            panic!("expected type decl");
        };
        let TypeExpr::Struct(fields) = &specs[0].ty else {
            panic!("expected struct");
        };
        assert!(fields[0].names.is_empty());
        assert_eq!(
            fields[0].ty,
            TypeExpr::Pointer(Box::new(TypeExpr::Name("Base".into())))
        );
        assert_eq!(fields[1].names, vec!["log".to_string(), "audit".to_string()]);
    }

    #[test]
    fn comments_are_skipped() {
        let file = parse(
            "package p\n\n// Handle does things.\nfunc Handle() {\n\t// nothing yet\n\tx()\n}\n",
        );
        let body = only_func(&file).body.as_ref().expect("body");
        assert_eq!(body.stmts.len(), 1);
    }

    #[test]
    fn rejects_syntax_errors() {
        let mut ids = ExprIdGen::new();
        let err = GoParser::new()
            .expect("grammar loads")
            .parse("package p\n\nfunc f( {\n", &mut ids)
            .unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn rejects_missing_package_clause() {
        let mut ids = ExprIdGen::new();
        let err = GoParser::new()
            .expect("grammar loads")
            .parse("func f() {}\n", &mut ids)
            .unwrap_err();
        assert!(matches!(err, ParseError::MissingPackage));
    }
}
