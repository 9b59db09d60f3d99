//! Owned Go syntax model.
//!
//! The tree produced by [`GoParser`](crate::GoParser) is lowered into these
//! types so that rules and the checker never touch tree-sitter nodes directly.
//! Only the shapes the checker and rules care about are modelled precisely;
//! everything else degrades to [`ExprKind::Bad`], [`TypeExpr::Unknown`] or
//! [`Stmt::Empty`].

/// Identifies an expression node. Unique across one load, so that a single
/// type table can serve every file of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(pub u32);

/// Hands out [`ExprId`]s.
#[derive(Debug, Default)]
pub struct ExprIdGen {
    next: u32,
}

impl ExprIdGen {
    /// Creates a generator starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh id.
    pub fn next_id(&mut self) -> ExprId {
        let id = ExprId(self.next);
        self.next += 1;
        id
    }
}

/// Source range of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset from the start of the file.
    pub offset: usize,
    /// Length in bytes.
    pub len: usize,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, in bytes).
    pub column: usize,
}

/// An identifier with its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    /// Identifier text.
    pub name: String,
    /// Where it appears.
    pub span: Span,
}

/// One parsed `.go` file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Name from the `package` clause.
    pub package: Ident,
    /// Import specs in source order.
    pub imports: Vec<ImportSpec>,
    /// Top-level declarations in source order.
    pub decls: Vec<Decl>,
}

impl SourceFile {
    /// Iterates over top-level function and method declarations.
    pub fn functions(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Func(func) => Some(func),
            _ => None,
        })
    }
}

/// An `import` spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    /// Explicit name (`alias`, `_` or `.`), if any.
    pub name: Option<String>,
    /// Import path without quotes.
    pub path: String,
    /// Where the spec appears.
    pub span: Span,
}

impl ImportSpec {
    /// Name the import binds in the file scope.
    ///
    /// Blank and dot imports bind nothing. Without an explicit name the last
    /// path element is used, skipping a trailing major-version element
    /// (`example.com/lib/v2` binds `lib`) and a `gopkg.in` style `.vN` suffix.
    #[must_use]
    pub fn local_name(&self) -> Option<String> {
        match self.name.as_deref() {
            Some("_" | ".") => None,
            Some(name) => Some(name.to_string()),
            None => {
                let mut segments = self.path.rsplit('/');
                let mut last = segments.next()?;
                if is_major_version(last) {
                    last = segments.next()?;
                }
                let last = match last.rsplit_once('.') {
                    Some((head, tail)) if is_major_version(tail) => head,
                    _ => last,
                };
                Some(last.to_string())
            }
        }
    }
}

fn is_major_version(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// A top-level declaration.
#[derive(Debug, Clone)]
pub enum Decl {
    /// `func` or method declaration.
    Func(FuncDecl),
    /// `type` declaration group.
    Type(Vec<TypeSpec>),
    /// `var` declaration group.
    Var(Vec<ValueSpec>),
    /// `const` declaration group.
    Const(Vec<ValueSpec>),
}

/// A function or method declaration.
#[derive(Debug, Clone)]
pub struct FuncDecl {
    /// Declared name.
    pub name: Ident,
    /// Method receiver, if this is a method.
    pub receiver: Option<Param>,
    /// Parameters.
    pub params: Vec<Param>,
    /// Results; unnamed results have empty `names`.
    pub results: Vec<Param>,
    /// Body; `None` for external declarations.
    pub body: Option<Block>,
    /// Whole declaration.
    pub span: Span,
}

/// A parameter group such as `a, b int`.
#[derive(Debug, Clone)]
pub struct Param {
    /// Names in the group, empty for unnamed parameters.
    pub names: Vec<Ident>,
    /// Declared type. Variadic parameters are recorded as slices.
    pub ty: TypeExpr,
    /// Whether the group is `...T`.
    pub variadic: bool,
}

/// One `type` spec.
#[derive(Debug, Clone)]
pub struct TypeSpec {
    /// Declared name.
    pub name: Ident,
    /// `type A = B`.
    pub alias: bool,
    /// Right-hand side.
    pub ty: TypeExpr,
}

/// One `var` or `const` spec.
#[derive(Debug, Clone)]
pub struct ValueSpec {
    /// Declared names.
    pub names: Vec<Ident>,
    /// Explicit type, if written.
    pub ty: Option<TypeExpr>,
    /// Initializers.
    pub values: Vec<Expr>,
}

/// A type as written in source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `T`
    Name(String),
    /// `pkg.T`
    Qualified {
        /// Package name as written.
        package: String,
        /// Type name.
        name: String,
    },
    /// `*T`
    Pointer(Box<TypeExpr>),
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T`
    Array(Box<TypeExpr>),
    /// `map[K]V`
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// `chan T`
    Chan(Box<TypeExpr>),
    /// `func(...) ...`
    Func(FuncType),
    /// `struct { ... }`
    Struct(Vec<FieldDecl>),
    /// `interface { ... }`
    Interface(Vec<InterfaceElem>),
    /// `T[A, B]`; type arguments are dropped.
    Generic(Box<TypeExpr>),
    /// Anything not modelled.
    Unknown,
}

/// Parameters and results of a function type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FuncType {
    /// Parameter types, one entry per declared parameter.
    pub params: Vec<TypeExpr>,
    /// Result types, one entry per declared result.
    pub results: Vec<TypeExpr>,
}

/// A struct field declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    /// Field names; empty for embedded fields.
    pub names: Vec<String>,
    /// Field type.
    pub ty: TypeExpr,
}

/// An interface element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceElem {
    /// A method signature.
    Method {
        /// Method name.
        name: String,
        /// Signature.
        sig: FuncType,
    },
    /// An embedded type.
    Embed(TypeExpr),
}

/// A `{ ... }` block.
#[derive(Debug, Clone)]
pub struct Block {
    /// Statements in order.
    pub stmts: Vec<Stmt>,
    /// Whole block including braces.
    pub span: Span,
}

/// A statement.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// Expression statement.
    Expr(Expr),
    /// `a, b = x, y`, `a += x` or `a, b := x, y`.
    Assign {
        /// Left-hand side.
        lhs: Vec<Expr>,
        /// Right-hand side.
        rhs: Vec<Expr>,
        /// `:=`
        define: bool,
    },
    /// Local `var` or `const` declaration.
    Var(Vec<ValueSpec>),
    /// Local `type` declaration.
    Type(Vec<TypeSpec>),
    /// `return ...`
    Return(Vec<Expr>),
    /// `if` statement.
    If(IfStmt),
    /// Three-clause, condition-only or infinite `for`.
    For(ForStmt),
    /// `for ... range`
    Range(RangeStmt),
    /// Expression `switch`.
    Switch(SwitchStmt),
    /// Type `switch`.
    TypeSwitch(TypeSwitchStmt),
    /// `select`
    Select(Vec<CommClause>),
    /// `go f()`
    Go(Expr),
    /// `defer f()`
    Defer(Expr),
    /// `ch <- v`
    Send {
        /// Channel.
        channel: Expr,
        /// Sent value.
        value: Expr,
    },
    /// `x++` / `x--`
    IncDec(Expr),
    /// `label: stmt`
    Labeled(Box<Stmt>),
    /// Nested block.
    Block(Block),
    /// `break`, `continue`, `goto`, `fallthrough`.
    Branch,
    /// Empty or unmodelled statement.
    Empty,
}

/// An `if` statement.
#[derive(Debug, Clone)]
pub struct IfStmt {
    /// The `if` keyword.
    pub if_token: Span,
    /// Optional init statement.
    pub init: Option<Box<Stmt>>,
    /// Condition.
    pub cond: Expr,
    /// Consequence block; `None` only for malformed input.
    pub body: Option<Block>,
    /// `else` branch: a block or another `if`.
    pub else_branch: Option<Box<Stmt>>,
}

/// A non-range `for` statement.
#[derive(Debug, Clone)]
pub struct ForStmt {
    /// Init statement.
    pub init: Option<Box<Stmt>>,
    /// Condition.
    pub cond: Option<Expr>,
    /// Post statement.
    pub post: Option<Box<Stmt>>,
    /// Loop body.
    pub body: Block,
}

/// A `for ... range` statement.
#[derive(Debug, Clone)]
pub struct RangeStmt {
    /// Key binding or target.
    pub key: Option<Expr>,
    /// Value binding or target.
    pub value: Option<Expr>,
    /// `:=` rather than `=`.
    pub define: bool,
    /// Ranged expression.
    pub expr: Expr,
    /// Loop body.
    pub body: Block,
}

/// An expression `switch`.
#[derive(Debug, Clone)]
pub struct SwitchStmt {
    /// Init statement.
    pub init: Option<Box<Stmt>>,
    /// Tag expression.
    pub tag: Option<Expr>,
    /// `case` and `default` clauses.
    pub clauses: Vec<CaseClause>,
}

/// A clause of an expression `switch`.
#[derive(Debug, Clone)]
pub struct CaseClause {
    /// Case values; empty for `default`.
    pub values: Vec<Expr>,
    /// Clause body.
    pub body: Vec<Stmt>,
}

/// A type `switch`.
#[derive(Debug, Clone)]
pub struct TypeSwitchStmt {
    /// Init statement.
    pub init: Option<Box<Stmt>>,
    /// `v` in `switch v := x.(type)`.
    pub binding: Option<Ident>,
    /// `x` in `x.(type)`.
    pub subject: Expr,
    /// Clauses.
    pub clauses: Vec<TypeCaseClause>,
}

/// A clause of a type `switch`.
#[derive(Debug, Clone)]
pub struct TypeCaseClause {
    /// Listed types; empty for `default`.
    pub types: Vec<TypeExpr>,
    /// Clause body.
    pub body: Vec<Stmt>,
}

/// A clause of a `select`.
#[derive(Debug, Clone)]
pub struct CommClause {
    /// Send or receive; `None` for `default`.
    pub comm: Option<Box<Stmt>>,
    /// Clause body.
    pub body: Vec<Stmt>,
}

/// An expression node.
#[derive(Debug, Clone)]
pub struct Expr {
    /// Identity used by type tables.
    pub id: ExprId,
    /// Source range.
    pub span: Span,
    /// Shape.
    pub kind: ExprKind,
}

/// Expression shapes.
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Identifier, including `true`, `false` and `iota`.
    Ident(String),
    /// `nil`
    Nil,
    /// Literal.
    BasicLit(LitKind),
    /// `a op b`
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `op x`
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// `f(args)`
    Call {
        /// Callee.
        func: Box<Expr>,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// `x.field`
    Selector {
        /// Operand.
        operand: Box<Expr>,
        /// Selected name.
        field: Ident,
    },
    /// `x[i]`
    Index {
        /// Operand.
        operand: Box<Expr>,
        /// Index.
        index: Box<Expr>,
    },
    /// `x[a:b:c]`
    Slice {
        /// Operand.
        operand: Box<Expr>,
        /// Present bounds.
        bounds: Vec<Expr>,
    },
    /// `x.(T)`
    TypeAssert {
        /// Operand.
        operand: Box<Expr>,
        /// Asserted type.
        ty: TypeExpr,
    },
    /// `T(x)` when the parser recognizes the conversion syntactically.
    Conversion {
        /// Target type.
        ty: TypeExpr,
        /// Converted value.
        operand: Box<Expr>,
    },
    /// `T{...}` or an elided nested `{...}`.
    Composite {
        /// Literal type, absent for elided nested literals.
        ty: Option<TypeExpr>,
        /// Elements.
        elems: Vec<Expr>,
    },
    /// `func(...) { ... }`
    FuncLit {
        /// Parameters of the literal.
        params: Vec<Param>,
        /// Results of the literal.
        results: Vec<Param>,
        /// Body.
        body: Block,
    },
    /// `(x)`
    Paren(Box<Expr>),
    /// `key: value` inside a composite literal.
    KeyValue {
        /// Key.
        key: Box<Expr>,
        /// Value.
        value: Box<Expr>,
    },
    /// A type in expression position, e.g. the first argument of `make`.
    Type(TypeExpr),
    /// Not modelled.
    Bad,
}

/// Literal kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LitKind {
    /// Integer literal.
    Int,
    /// Floating-point literal.
    Float,
    /// Imaginary literal.
    Imaginary,
    /// Rune literal.
    Rune,
    /// Interpreted or raw string literal.
    String,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `&^`
    AndNot,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
}

impl BinaryOp {
    /// Parses an operator token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "==" => Self::Eq,
            "!=" => Self::NotEq,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "&&" => Self::LogicalAnd,
            "||" => Self::LogicalOr,
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            "&" => Self::BitAnd,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "&^" => Self::AndNot,
            "<<" => Self::Shl,
            ">>" => Self::Shr,
            _ => return None,
        })
    }

    /// Whether the operator yields an untyped boolean.
    #[must_use]
    pub fn is_comparison_or_logical(self) -> bool {
        matches!(
            self,
            Self::Eq
                | Self::NotEq
                | Self::Lt
                | Self::Le
                | Self::Gt
                | Self::Ge
                | Self::LogicalAnd
                | Self::LogicalOr
        )
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `^`
    BitNot,
    /// `*`
    Deref,
    /// `&`
    Addr,
    /// `<-`
    Recv,
}

impl UnaryOp {
    /// Parses an operator token.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        Some(match token {
            "!" => Self::Not,
            "-" => Self::Neg,
            "+" => Self::Plus,
            "^" => Self::BitNot,
            "*" => Self::Deref,
            "&" => Self::Addr,
            "<-" => Self::Recv,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn import(name: Option<&str>, path: &str) -> ImportSpec {
        ImportSpec {
            name: name.map(String::from),
            path: path.to_string(),
            span: Span::default(),
        }
    }

    #[test]
    fn local_name_uses_last_path_element() {
        assert_eq!(
            import(None, "example.com/app/logging").local_name().as_deref(),
            Some("logging")
        );
        assert_eq!(import(None, "errors").local_name().as_deref(), Some("errors"));
    }

    #[test]
    fn local_name_skips_major_version_suffix() {
        assert_eq!(
            import(None, "github.com/acme/lib/v2").local_name().as_deref(),
            Some("lib")
        );
        assert_eq!(
            import(None, "gopkg.in/yaml.v3").local_name().as_deref(),
            Some("yaml")
        );
    }

    #[test]
    fn local_name_prefers_alias_and_ignores_blank_imports() {
        assert_eq!(
            import(Some("lg"), "example.com/app/logging")
                .local_name()
                .as_deref(),
            Some("lg")
        );
        assert_eq!(import(Some("_"), "embed").local_name(), None);
        assert_eq!(import(Some("."), "strings").local_name(), None);
    }

    #[test]
    fn expr_ids_are_sequential() {
        let mut ids = ExprIdGen::new();
        assert_eq!(ids.next_id(), ExprId(0));
        assert_eq!(ids.next_id(), ExprId(1));
    }

    #[test]
    fn binary_op_classification() {
        assert_eq!(BinaryOp::from_token("!="), Some(BinaryOp::NotEq));
        assert!(BinaryOp::NotEq.is_comparison_or_logical());
        assert!(!BinaryOp::Add.is_comparison_or_logical());
        assert_eq!(BinaryOp::from_token(":="), None);
    }
}
