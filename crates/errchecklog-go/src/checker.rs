//! Declaration-driven type checker.
//!
//! [`Universe`] indexes the declarations of every loaded package. Checking a
//! package walks each function body with lexical scopes and records the
//! static type of every expression it can resolve in a [`TypeInfo`], which
//! serves as the [`TypeResolver`] for rules.
//!
//! The checker is deliberately partial. Whatever it cannot resolve is simply
//! absent from the table, so callers see a resolution gap rather than a
//! wrong type.

use std::collections::HashMap;
use std::iter;

use tracing::debug;

use crate::ast::{
    BinaryOp, Block, Decl, Expr, ExprId, ExprKind, FuncType, InterfaceElem, LitKind, Param,
    SourceFile, Stmt, TypeExpr, TypeSpec, UnaryOp, ValueSpec,
};
use crate::loader::Package;
use crate::prelude;
use crate::types::{Field, Method, Signature, TypeDescriptor, TypeResolver};

/// Bound on alias chains, embedding depth and underlying-type hops.
const MAX_DEPTH: usize = 16;

const BUILTIN_FUNCS: &[&str] = &[
    "append", "cap", "clear", "close", "complex", "copy", "delete", "imag", "len", "make", "max",
    "min", "new", "panic", "print", "println", "real", "recover",
];

/// Local import name to import path, for one file.
type Imports = HashMap<String, String>;

#[derive(Debug, Clone, Copy)]
struct FileScope<'a> {
    package: &'a str,
    imports: &'a Imports,
}

#[derive(Debug, Clone)]
enum TypeDecl {
    Defined {
        underlying: Option<TypeDescriptor>,
        /// Embedded elements of an interface declaration.
        embeds: Vec<TypeDescriptor>,
    },
    Alias(Option<TypeDescriptor>),
}

#[derive(Debug, Clone)]
struct MethodDecl {
    sig: Signature,
    pointer_receiver: bool,
}

#[derive(Debug, Default)]
struct PackageDecls {
    types: HashMap<String, TypeDecl>,
    funcs: HashMap<String, Signature>,
    /// Receiver base type name to methods by name.
    methods: HashMap<String, HashMap<String, MethodDecl>>,
    vars: HashMap<String, TypeDescriptor>,
}

#[derive(Debug, Clone)]
enum Binding {
    Value(Option<TypeDescriptor>),
    Type(Option<TypeDescriptor>),
}

type Scope = HashMap<String, Binding>;

/// Declarations of every loaded package.
#[derive(Debug, Default)]
pub struct Universe {
    packages: HashMap<String, PackageDecls>,
    /// Import path to `package` clause name.
    names: HashMap<String, String>,
}

impl Universe {
    /// Indexes the declarations of `packages`.
    #[must_use]
    pub fn new(packages: &[Package]) -> Self {
        let mut universe = Self::default();
        for package in packages {
            universe
                .names
                .insert(package.path.clone(), package.name.clone());
            let decls = universe.packages.entry(package.path.clone()).or_default();
            for spec in packages_type_specs(package) {
                let decl = if spec.alias {
                    TypeDecl::Alias(None)
                } else {
                    TypeDecl::Defined {
                        underlying: None,
                        embeds: Vec::new(),
                    }
                };
                decls.types.insert(spec.name.name.clone(), decl);
            }
        }

        universe.resolve_aliases(packages);
        universe.resolve_declarations(packages);
        universe.infer_package_vars(packages);

        debug!("Indexed {} packages", universe.packages.len());
        universe
    }

    /// Local names bound by the imports of `file`.
    ///
    /// An unnamed import of a loaded package binds that package's name;
    /// otherwise the name is guessed from the import path.
    fn file_imports(&self, file: &SourceFile) -> Imports {
        file.imports
            .iter()
            .filter_map(|spec| {
                let name = match (&spec.name, self.names.get(&spec.path)) {
                    (None, Some(name)) => name.clone(),
                    _ => spec.local_name()?,
                };
                Some((name, spec.path.clone()))
            })
            .collect()
    }

    /// Whether `path` is one of the loaded packages.
    #[must_use]
    pub fn contains_package(&self, path: &str) -> bool {
        self.packages.contains_key(path)
    }

    /// Types the function bodies and package-level initializers of `package`.
    #[must_use]
    pub fn check(&self, package: &Package) -> TypeInfo<'_> {
        let mut types = HashMap::new();
        for file in &package.files {
            let imports = self.file_imports(&file.ast);
            let mut checker = BodyChecker::new(
                self,
                FileScope {
                    package: &package.path,
                    imports: &imports,
                },
            );
            for decl in &file.ast.decls {
                match decl {
                    Decl::Func(func) => {
                        if let Some(body) = &func.body {
                            checker.check_function(
                                func.receiver.as_ref(),
                                &func.params,
                                &func.results,
                                body,
                            );
                        }
                    }
                    Decl::Var(specs) | Decl::Const(specs) => {
                        for spec in specs {
                            for value in &spec.values {
                                checker.check_expr(value);
                            }
                        }
                    }
                    Decl::Type(_) => {}
                }
            }
            types.extend(checker.types);
        }
        debug!("Typed {} expressions in {}", types.len(), package.path);
        TypeInfo {
            universe: self,
            types,
        }
    }

    /// Whether a value of type `ty` is assignable to `error`.
    ///
    /// True for `error` itself, for interfaces whose method set contains
    /// `Error() string`, for named non-interface types declaring that method
    /// with a value receiver, and for pointers to named types declaring it
    /// with either receiver kind, and for struct types promoting such a method
    /// from an embedded field. Types from packages that were not loaded are
    /// never assignable.
    #[must_use]
    pub fn is_error_signaling_type(&self, ty: &TypeDescriptor) -> bool {
        match ty {
            TypeDescriptor::Error => true,
            TypeDescriptor::Interface(methods) => has_error_method(methods),
            TypeDescriptor::Named { package, name } => {
                self.named_has_error_method(package, name, false, 0)
            }
            TypeDescriptor::Pointer(inner) => self.pointer_has_error_method(inner, 0),
            _ => false,
        }
    }

    fn pointer_has_error_method(&self, inner: &TypeDescriptor, depth: usize) -> bool {
        match inner {
            TypeDescriptor::Named { package, name } => {
                !self.is_interface(inner, 0)
                    && self.named_has_error_method(package, name, true, depth)
            }
            _ => false,
        }
    }

    /// A method declared on the type shadows any promoted one. Without it,
    /// `Error` may be promoted from an embedded field of the underlying
    /// struct.
    fn named_has_error_method(
        &self,
        package: &str,
        name: &str,
        through_pointer: bool,
        depth: usize,
    ) -> bool {
        if depth >= MAX_DEPTH {
            return false;
        }
        let Some(TypeDecl::Defined { .. }) = self.decl(package, name) else {
            return false;
        };
        let named = TypeDescriptor::named(package, name);
        if self.is_interface(&named, 0) {
            return has_error_method(&self.interface_methods(&named, 0));
        }
        if let Some(method) = self.method(package, name, "Error") {
            return method.sig.is_error_method() && (through_pointer || !method.pointer_receiver);
        }
        match self.underlying(&named) {
            Some(TypeDescriptor::Struct(fields)) => {
                self.promotes_error_method(&fields, through_pointer, depth + 1)
            }
            _ => false,
        }
    }

    /// Whether `Error() string` is promoted through an embedded field.
    /// `addressable` is set when the struct is reached through a pointer,
    /// which brings pointer-receiver methods of embedded values into the set.
    fn promotes_error_method(&self, fields: &[Field], addressable: bool, depth: usize) -> bool {
        if depth >= MAX_DEPTH {
            return false;
        }
        fields
            .iter()
            .filter(|f| f.embedded)
            .any(|field| match &field.ty {
                TypeDescriptor::Pointer(inner) => self.pointer_has_error_method(inner, depth + 1),
                TypeDescriptor::Named { package, name } => {
                    self.named_has_error_method(package, name, addressable, depth + 1)
                }
                ty @ (TypeDescriptor::Error | TypeDescriptor::Interface(_)) => {
                    self.is_error_signaling_type(ty)
                }
                _ => false,
            })
    }

    fn decl(&self, package: &str, name: &str) -> Option<&TypeDecl> {
        self.packages.get(package)?.types.get(name)
    }

    fn method(&self, package: &str, type_name: &str, name: &str) -> Option<&MethodDecl> {
        self.packages
            .get(package)?
            .methods
            .get(type_name)?
            .get(name)
    }

    fn resolve_aliases(&mut self, packages: &[Package]) {
        let total = packages
            .iter()
            .flat_map(packages_type_specs)
            .filter(|spec| spec.alias)
            .count();

        // Each round resolves at least one more link of every alias chain.
        for _ in 0..=total {
            let mut resolved = Vec::new();
            for package in packages {
                for file in &package.files {
                    let imports = self.file_imports(&file.ast);
                    let scope = FileScope {
                        package: &package.path,
                        imports: &imports,
                    };
                    for spec in file_type_specs(&file.ast).filter(|s| s.alias) {
                        if !matches!(
                            self.decl(&package.path, &spec.name.name),
                            Some(TypeDecl::Alias(None))
                        ) {
                            continue;
                        }
                        if let Some(ty) = self.resolve_type(scope, &spec.ty, &[]) {
                            resolved.push((package.path.clone(), spec.name.name.clone(), ty));
                        }
                    }
                }
            }
            if resolved.is_empty() {
                break;
            }
            for (package, name, ty) in resolved {
                self.insert_type(package, name, TypeDecl::Alias(Some(ty)));
            }
        }
    }

    fn resolve_declarations(&mut self, packages: &[Package]) {
        let mut types = Vec::new();
        let mut funcs = Vec::new();
        let mut methods = Vec::new();

        for package in packages {
            for file in &package.files {
                let imports = self.file_imports(&file.ast);
                let scope = FileScope {
                    package: &package.path,
                    imports: &imports,
                };
                for decl in &file.ast.decls {
                    match decl {
                        Decl::Type(specs) => {
                            for spec in specs.iter().filter(|s| !s.alias) {
                                let decl = TypeDecl::Defined {
                                    underlying: self.resolve_type(scope, &spec.ty, &[]),
                                    embeds: self.interface_embeds(scope, &spec.ty),
                                };
                                types.push((package.path.clone(), spec.name.name.clone(), decl));
                            }
                        }
                        Decl::Func(func) => {
                            let sig = self.signature(scope, &func.params, &func.results, &[]);
                            match &func.receiver {
                                Some(receiver) => {
                                    if let Some((base, pointer_receiver)) =
                                        receiver_base(&receiver.ty)
                                    {
                                        methods.push((
                                            package.path.clone(),
                                            base,
                                            func.name.name.clone(),
                                            MethodDecl {
                                                sig,
                                                pointer_receiver,
                                            },
                                        ));
                                    }
                                }
                                None => {
                                    funcs.push((package.path.clone(), func.name.name.clone(), sig));
                                }
                            }
                        }
                        Decl::Var(_) | Decl::Const(_) => {}
                    }
                }
            }
        }

        for (package, name, decl) in types {
            self.insert_type(package, name, decl);
        }
        for (package, name, sig) in funcs {
            self.packages
                .entry(package)
                .or_default()
                .funcs
                .insert(name, sig);
        }
        for (package, base, name, method) in methods {
            self.packages
                .entry(package)
                .or_default()
                .methods
                .entry(base)
                .or_default()
                .insert(name, method);
        }
    }

    /// Types package-level variables and constants. Initializers may refer
    /// to variables declared later, so two passes are made.
    fn infer_package_vars(&mut self, packages: &[Package]) {
        for _ in 0..2 {
            let mut inferred = Vec::new();
            for package in packages {
                for file in &package.files {
                    let imports = self.file_imports(&file.ast);
                    let mut checker = BodyChecker::new(
                        self,
                        FileScope {
                            package: &package.path,
                            imports: &imports,
                        },
                    );
                    for decl in &file.ast.decls {
                        let (Decl::Var(specs) | Decl::Const(specs)) = decl else {
                            continue;
                        };
                        for spec in specs {
                            let types = checker.value_spec_types(spec);
                            for (name, ty) in spec.names.iter().zip(types) {
                                if let Some(ty) = ty {
                                    inferred.push((package.path.clone(), name.name.clone(), ty));
                                }
                            }
                        }
                    }
                }
            }
            for (package, name, ty) in inferred {
                self.packages
                    .entry(package)
                    .or_default()
                    .vars
                    .insert(name, ty);
            }
        }
    }

    fn insert_type(&mut self, package: String, name: String, decl: TypeDecl) {
        self.packages
            .entry(package)
            .or_default()
            .types
            .insert(name, decl);
    }

    fn interface_embeds(&self, scope: FileScope<'_>, ty: &TypeExpr) -> Vec<TypeDescriptor> {
        let TypeExpr::Interface(elems) = ty else {
            return Vec::new();
        };
        elems
            .iter()
            .filter_map(|elem| match elem {
                InterfaceElem::Embed(embedded) => self.resolve_type(scope, embedded, &[]),
                InterfaceElem::Method { .. } => None,
            })
            .collect()
    }

    /// Resolves a written type. `scopes` supplies local type declarations and
    /// shadowing variables, innermost last.
    fn resolve_type(
        &self,
        scope: FileScope<'_>,
        ty: &TypeExpr,
        scopes: &[Scope],
    ) -> Option<TypeDescriptor> {
        let boxed = |inner: &TypeExpr| self.resolve_type(scope, inner, scopes).map(Box::new);
        match ty {
            TypeExpr::Name(name) => {
                if let Some(binding) = scopes.iter().rev().find_map(|s| s.get(name)) {
                    return match binding {
                        Binding::Type(ty) => ty.clone(),
                        Binding::Value(_) => None,
                    };
                }
                match self.decl(scope.package, name) {
                    Some(decl) => decl_type(scope.package, name, decl),
                    None => predeclared_type(name),
                }
            }
            TypeExpr::Qualified { package, name } => {
                let path = scope.imports.get(package)?;
                match self.decl(path, name) {
                    Some(decl) => decl_type(path, name, decl),
                    None => Some(TypeDescriptor::named(path.as_str(), name.as_str())),
                }
            }
            TypeExpr::Pointer(inner) => Some(TypeDescriptor::Pointer(boxed(inner)?)),
            TypeExpr::Slice(inner) => Some(TypeDescriptor::Slice(boxed(inner)?)),
            TypeExpr::Array(inner) => Some(TypeDescriptor::Array(boxed(inner)?)),
            TypeExpr::Chan(inner) => Some(TypeDescriptor::Chan(boxed(inner)?)),
            TypeExpr::Map(key, value) => Some(TypeDescriptor::Map(boxed(key)?, boxed(value)?)),
            TypeExpr::Func(func) => Some(TypeDescriptor::Func(self.func_type(scope, func, scopes))),
            TypeExpr::Struct(fields) => Some(TypeDescriptor::Struct(
                fields
                    .iter()
                    .flat_map(|decl| {
                        let ty = self
                            .resolve_type(scope, &decl.ty, scopes)
                            .unwrap_or(TypeDescriptor::Unknown);
                        let fields: Vec<Field> = if decl.names.is_empty() {
                            embedded_name(&decl.ty)
                                .map(|name| Field {
                                    name,
                                    ty,
                                    embedded: true,
                                })
                                .into_iter()
                                .collect()
                        } else {
                            decl.names
                                .iter()
                                .map(|name| Field {
                                    name: name.clone(),
                                    ty: ty.clone(),
                                    embedded: false,
                                })
                                .collect()
                        };
                        fields
                    })
                    .collect(),
            )),
            TypeExpr::Interface(elems) => {
                let mut methods = Vec::new();
                for elem in elems {
                    match elem {
                        InterfaceElem::Method { name, sig } => methods.push(Method {
                            name: name.clone(),
                            sig: self.func_type(scope, sig, scopes),
                        }),
                        InterfaceElem::Embed(embedded) => {
                            if self.resolve_type(scope, embedded, scopes)
                                == Some(TypeDescriptor::Error)
                            {
                                methods.push(error_method());
                            }
                        }
                    }
                }
                Some(TypeDescriptor::Interface(methods))
            }
            TypeExpr::Generic(inner) => self.resolve_type(scope, inner, scopes),
            TypeExpr::Unknown => None,
        }
    }

    fn func_type(&self, scope: FileScope<'_>, func: &FuncType, scopes: &[Scope]) -> Signature {
        let resolve = |list: &[TypeExpr]| -> Vec<TypeDescriptor> {
            list.iter()
                .map(|ty| {
                    self.resolve_type(scope, ty, scopes)
                        .unwrap_or(TypeDescriptor::Unknown)
                })
                .collect()
        };
        Signature {
            params: resolve(&func.params),
            results: resolve(&func.results),
            variadic: false,
        }
    }

    fn signature(
        &self,
        scope: FileScope<'_>,
        params: &[Param],
        results: &[Param],
        scopes: &[Scope],
    ) -> Signature {
        let expand = |list: &[Param]| -> Vec<TypeDescriptor> {
            list.iter()
                .flat_map(|param| {
                    let ty = self
                        .resolve_type(scope, &param.ty, scopes)
                        .unwrap_or(TypeDescriptor::Unknown);
                    iter::repeat(ty).take(param.names.len().max(1))
                })
                .collect()
        };
        Signature {
            params: expand(params),
            results: expand(results),
            variadic: params.last().is_some_and(|p| p.variadic),
        }
    }

    /// Follows named types to their underlying type. `None` for named types
    /// that were not loaded.
    fn underlying(&self, ty: &TypeDescriptor) -> Option<TypeDescriptor> {
        let mut current = ty.clone();
        for _ in 0..MAX_DEPTH {
            let next = match &current {
                TypeDescriptor::Named { package, name } => match self.decl(package, name) {
                    Some(TypeDecl::Defined {
                        underlying: Some(underlying),
                        ..
                    }) => underlying.clone(),
                    _ => return None,
                },
                _ => return Some(current),
            };
            current = next;
        }
        None
    }

    fn is_interface(&self, ty: &TypeDescriptor, depth: usize) -> bool {
        match ty {
            TypeDescriptor::Error | TypeDescriptor::Interface(_) => true,
            TypeDescriptor::Named { package, name } if depth < MAX_DEPTH => matches!(
                self.decl(package, name),
                Some(TypeDecl::Defined { underlying: Some(underlying), .. })
                    if self.is_interface(underlying, depth + 1)
            ),
            _ => false,
        }
    }

    /// Method set of an interface type, embedded interfaces included.
    fn interface_methods(&self, ty: &TypeDescriptor, depth: usize) -> Vec<Method> {
        if depth >= MAX_DEPTH {
            return Vec::new();
        }
        match ty {
            TypeDescriptor::Error => vec![error_method()],
            TypeDescriptor::Interface(methods) => methods.clone(),
            TypeDescriptor::Named { package, name } => match self.decl(package, name) {
                Some(TypeDecl::Defined {
                    underlying: Some(underlying),
                    embeds,
                }) => {
                    let mut methods = self.interface_methods(underlying, depth + 1);
                    for embedded in embeds {
                        methods.extend(self.interface_methods(embedded, depth + 1));
                    }
                    methods
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    /// Type of the selector `x.name` for `x` of type `ty`: a field type, or
    /// the function type of a method.
    fn select(&self, ty: &TypeDescriptor, name: &str, depth: usize) -> Option<TypeDescriptor> {
        if depth >= MAX_DEPTH {
            return None;
        }
        match ty {
            TypeDescriptor::Pointer(inner) => match inner.as_ref() {
                TypeDescriptor::Named { .. } | TypeDescriptor::Struct(_) => {
                    self.select(inner, name, depth + 1)
                }
                _ => None,
            },
            TypeDescriptor::Named {
                package,
                name: type_name,
            } => {
                if let Some(method) = self.method(package, type_name, name) {
                    return Some(TypeDescriptor::Func(method.sig.clone()));
                }
                match self.decl(package, type_name) {
                    None => prelude::method(package, type_name, name),
                    Some(TypeDecl::Alias(_)) => None,
                    Some(TypeDecl::Defined { .. }) if self.is_interface(ty, depth) => self
                        .interface_methods(ty, depth)
                        .into_iter()
                        .find(|m| m.name == name)
                        .map(|m| TypeDescriptor::Func(m.sig)),
                    Some(TypeDecl::Defined { .. }) => {
                        let underlying = self.underlying(ty)?;
                        self.select(&underlying, name, depth + 1)
                    }
                }
            }
            TypeDescriptor::Struct(fields) => {
                if let Some(field) = fields.iter().find(|f| f.name == name) {
                    return known(field.ty.clone());
                }
                fields
                    .iter()
                    .filter(|f| f.embedded)
                    .find_map(|f| self.select(&f.ty, name, depth + 1))
            }
            TypeDescriptor::Interface(methods) => methods
                .iter()
                .find(|m| m.name == name)
                .map(|m| TypeDescriptor::Func(m.sig.clone())),
            TypeDescriptor::Error => {
                (name == "Error").then(|| TypeDescriptor::Func(error_method().sig))
            }
            _ => None,
        }
    }

    /// Type of the package-level member `name` of the package at `path`.
    fn package_member(&self, path: &str, name: &str) -> Option<TypeDescriptor> {
        match self.packages.get(path) {
            Some(decls) => decls
                .vars
                .get(name)
                .cloned()
                .or_else(|| decls.funcs.get(name).cloned().map(TypeDescriptor::Func)),
            None => prelude::member(path, name),
        }
    }
}

fn packages_type_specs(package: &Package) -> impl Iterator<Item = &TypeSpec> {
    package.files.iter().flat_map(|f| file_type_specs(&f.ast))
}

fn file_type_specs(file: &SourceFile) -> impl Iterator<Item = &TypeSpec> {
    file.decls.iter().flat_map(|decl| match decl {
        Decl::Type(specs) => specs.as_slice(),
        _ => &[] as &[TypeSpec],
    })
}

fn decl_type(package: &str, name: &str, decl: &TypeDecl) -> Option<TypeDescriptor> {
    match decl {
        TypeDecl::Defined { .. } => Some(TypeDescriptor::named(package, name)),
        TypeDecl::Alias(target) => target.clone(),
    }
}

fn predeclared_type(name: &str) -> Option<TypeDescriptor> {
    match name {
        "error" => Some(TypeDescriptor::Error),
        "any" | "comparable" => Some(TypeDescriptor::Interface(Vec::new())),
        "bool" | "string" | "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8"
        | "uint16" | "uint32" | "uint64" | "uintptr" | "byte" | "rune" | "float32" | "float64"
        | "complex64" | "complex128" => Some(TypeDescriptor::basic(name)),
        _ => None,
    }
}

fn error_method() -> Method {
    Method {
        name: "Error".to_string(),
        sig: Signature::returning(vec![TypeDescriptor::basic("string")]),
    }
}

fn has_error_method(methods: &[Method]) -> bool {
    methods
        .iter()
        .any(|m| m.name == "Error" && m.sig.is_error_method())
}

/// Base type name and pointer-ness of a method receiver.
fn receiver_base(ty: &TypeExpr) -> Option<(String, bool)> {
    match ty {
        TypeExpr::Name(name) => Some((name.clone(), false)),
        TypeExpr::Generic(inner) => receiver_base(inner),
        TypeExpr::Pointer(inner) => receiver_base(inner).map(|(name, _)| (name, true)),
        _ => None,
    }
}

/// Field name introduced by an embedded field.
fn embedded_name(ty: &TypeExpr) -> Option<String> {
    match ty {
        TypeExpr::Name(name) | TypeExpr::Qualified { name, .. } => Some(name.clone()),
        TypeExpr::Pointer(inner) | TypeExpr::Generic(inner) => embedded_name(inner),
        _ => None,
    }
}

fn known(ty: TypeDescriptor) -> Option<TypeDescriptor> {
    (ty != TypeDescriptor::Unknown).then_some(ty)
}

fn literal_type(kind: LitKind) -> TypeDescriptor {
    TypeDescriptor::basic(match kind {
        LitKind::Int => "int",
        LitKind::Float => "float64",
        LitKind::Imaginary => "complex128",
        LitKind::Rune => "rune",
        LitKind::String => "string",
    })
}

fn is_comma_ok(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Paren(inner) => is_comma_ok(inner),
        ExprKind::Index { .. }
        | ExprKind::TypeAssert { .. }
        | ExprKind::Unary {
            op: UnaryOp::Recv, ..
        } => true,
        _ => false,
    }
}

/// Walks function bodies of one file, recording expression types.
struct BodyChecker<'a> {
    universe: &'a Universe,
    file: FileScope<'a>,
    scopes: Vec<Scope>,
    types: HashMap<ExprId, TypeDescriptor>,
}

impl<'a> BodyChecker<'a> {
    fn new(universe: &'a Universe, file: FileScope<'a>) -> Self {
        Self {
            universe,
            file,
            scopes: Vec::new(),
            types: HashMap::new(),
        }
    }

    fn with_scope<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.scopes.push(Scope::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    fn declare(&mut self, name: &str, ty: Option<TypeDescriptor>) {
        if name == "_" {
            return;
        }
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), Binding::Value(ty));
        }
    }

    fn declare_type(&mut self, name: &str, ty: Option<TypeDescriptor>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), Binding::Type(ty));
        }
    }

    fn declare_params(&mut self, params: &[Param]) {
        for param in params {
            let ty = self.resolve(&param.ty);
            for name in &param.names {
                self.declare(&name.name, ty.clone());
            }
        }
    }

    fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|s| s.get(name))
    }

    /// Type of `name` if it is declared in the innermost scope.
    fn current_value(&self, name: &str) -> Option<TypeDescriptor> {
        match self.scopes.last()?.get(name)? {
            Binding::Value(ty) => ty.clone(),
            Binding::Type(_) => None,
        }
    }

    fn resolve(&self, ty: &TypeExpr) -> Option<TypeDescriptor> {
        self.universe.resolve_type(self.file, ty, &self.scopes)
    }

    fn record(&mut self, expr: &Expr, ty: Option<TypeDescriptor>) -> Option<TypeDescriptor> {
        let ty = ty.and_then(known)?;
        self.types.insert(expr.id, ty.clone());
        Some(ty)
    }

    /// Import path bound to `name` in the file scope, unless shadowed.
    fn import_path(&self, name: &str) -> Option<String> {
        if self.lookup(name).is_some() {
            return None;
        }
        self.file.imports.get(name).cloned()
    }

    fn package_decls(&self) -> Option<&PackageDecls> {
        self.universe.packages.get(self.file.package)
    }

    fn is_package_value(&self, name: &str) -> bool {
        self.package_decls()
            .is_some_and(|p| p.vars.contains_key(name) || p.funcs.contains_key(name))
    }

    fn check_function(
        &mut self,
        receiver: Option<&Param>,
        params: &[Param],
        results: &[Param],
        body: &Block,
    ) {
        self.with_scope(|c| {
            if let Some(receiver) = receiver {
                c.declare_params(std::slice::from_ref(receiver));
            }
            c.declare_params(params);
            c.declare_params(results);
            c.check_stmts(&body.stmts);
        });
    }

    fn check_block(&mut self, block: &Block) {
        self.with_scope(|c| c.check_stmts(&block.stmts));
    }

    fn check_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.check_stmt(stmt);
        }
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) | Stmt::Go(expr) | Stmt::Defer(expr) | Stmt::IncDec(expr) => {
                self.check_expr(expr);
            }
            Stmt::Assign { lhs, rhs, define } => self.check_assign(lhs, rhs, *define),
            Stmt::Var(specs) => {
                for spec in specs {
                    let types = self.value_spec_types(spec);
                    for (name, ty) in spec.names.iter().zip(types) {
                        self.declare(&name.name, ty);
                    }
                }
            }
            Stmt::Type(specs) => {
                for spec in specs {
                    let ty = self.resolve(&spec.ty);
                    self.declare_type(&spec.name.name, ty);
                }
            }
            Stmt::Return(values) => {
                for value in values {
                    self.check_expr(value);
                }
            }
            Stmt::If(if_stmt) => self.with_scope(|c| {
                if let Some(init) = &if_stmt.init {
                    c.check_stmt(init);
                }
                c.check_expr(&if_stmt.cond);
                if let Some(body) = &if_stmt.body {
                    c.check_block(body);
                }
                if let Some(else_branch) = &if_stmt.else_branch {
                    c.check_stmt(else_branch);
                }
            }),
            Stmt::For(for_stmt) => self.with_scope(|c| {
                if let Some(init) = &for_stmt.init {
                    c.check_stmt(init);
                }
                if let Some(cond) = &for_stmt.cond {
                    c.check_expr(cond);
                }
                if let Some(post) = &for_stmt.post {
                    c.check_stmt(post);
                }
                c.check_block(&for_stmt.body);
            }),
            Stmt::Range(range) => {
                let ranged = self.check_expr(&range.expr);
                let (key_ty, value_ty) = self.range_types(ranged.as_ref());
                self.with_scope(|c| {
                    for (target, ty) in [(&range.key, key_ty), (&range.value, value_ty)] {
                        let Some(target) = target else { continue };
                        match &target.kind {
                            ExprKind::Ident(name) if range.define => {
                                c.declare(name, ty.clone());
                                c.record(target, ty);
                            }
                            _ => {
                                c.check_expr(target);
                            }
                        }
                    }
                    c.check_block(&range.body);
                });
            }
            Stmt::Switch(switch) => self.with_scope(|c| {
                if let Some(init) = &switch.init {
                    c.check_stmt(init);
                }
                if let Some(tag) = &switch.tag {
                    c.check_expr(tag);
                }
                for clause in &switch.clauses {
                    for value in &clause.values {
                        c.check_expr(value);
                    }
                    c.with_scope(|c| c.check_stmts(&clause.body));
                }
            }),
            Stmt::TypeSwitch(switch) => self.with_scope(|c| {
                if let Some(init) = &switch.init {
                    c.check_stmt(init);
                }
                let subject = c.check_expr(&switch.subject);
                for clause in &switch.clauses {
                    c.with_scope(|c| {
                        if let Some(binding) = &switch.binding {
                            let ty = match clause.types.as_slice() {
                                [TypeExpr::Name(name)] if name == "nil" => subject.clone(),
                                [single] => c.resolve(single),
                                _ => subject.clone(),
                            };
                            c.declare(&binding.name, ty);
                        }
                        c.check_stmts(&clause.body);
                    });
                }
            }),
            Stmt::Select(clauses) => {
                for clause in clauses {
                    self.with_scope(|c| {
                        if let Some(comm) = &clause.comm {
                            c.check_stmt(comm);
                        }
                        c.check_stmts(&clause.body);
                    });
                }
            }
            Stmt::Send { channel, value } => {
                self.check_expr(channel);
                self.check_expr(value);
            }
            Stmt::Labeled(inner) => self.check_stmt(inner),
            Stmt::Block(block) => self.check_block(block),
            Stmt::Branch | Stmt::Empty => {}
        }
    }

    fn check_assign(&mut self, lhs: &[Expr], rhs: &[Expr], define: bool) {
        let values = self.check_values(rhs, lhs.len());
        for (target, ty) in lhs.iter().zip(values) {
            match &target.kind {
                ExprKind::Ident(name) if define => {
                    // Redeclared names keep their type when the new one is unknown.
                    let ty = ty.or_else(|| self.current_value(name));
                    self.declare(name, ty.clone());
                    self.record(target, ty);
                }
                _ => {
                    self.check_expr(target);
                }
            }
        }
    }

    /// Types of the values assigned to `count` targets.
    fn check_values(&mut self, values: &[Expr], count: usize) -> Vec<Option<TypeDescriptor>> {
        if let [value] = values {
            if count > 1 {
                let ty = self.check_expr(value);
                return match ty {
                    Some(TypeDescriptor::Tuple(items)) => items
                        .into_iter()
                        .map(known)
                        .chain(iter::repeat(None))
                        .take(count)
                        .collect(),
                    ty if count == 2 && is_comma_ok(value) => {
                        vec![ty, Some(TypeDescriptor::basic("bool"))]
                    }
                    _ => vec![None; count],
                };
            }
        }
        values.iter().map(|value| self.check_expr(value)).collect()
    }

    fn value_spec_types(&mut self, spec: &ValueSpec) -> Vec<Option<TypeDescriptor>> {
        let declared = spec.ty.as_ref().map(|ty| self.resolve(ty));
        let values = self.check_values(&spec.values, spec.names.len());
        (0..spec.names.len())
            .map(|i| match &declared {
                Some(ty) => ty.clone(),
                None => values.get(i).cloned().flatten(),
            })
            .collect()
    }

    fn range_types(
        &self,
        ranged: Option<&TypeDescriptor>,
    ) -> (Option<TypeDescriptor>, Option<TypeDescriptor>) {
        let int = || Some(TypeDescriptor::basic("int"));
        let Some(underlying) = ranged.and_then(|ty| self.universe.underlying(ty)) else {
            return (None, None);
        };
        match underlying {
            TypeDescriptor::Slice(elem) | TypeDescriptor::Array(elem) => (int(), known(*elem)),
            TypeDescriptor::Pointer(inner) => match *inner {
                TypeDescriptor::Array(elem) => (int(), known(*elem)),
                _ => (None, None),
            },
            TypeDescriptor::Map(key, value) => (known(*key), known(*value)),
            TypeDescriptor::Chan(elem) => (known(*elem), None),
            TypeDescriptor::Basic(name) if name == "string" => {
                (int(), Some(TypeDescriptor::basic("rune")))
            }
            basic @ TypeDescriptor::Basic(_) => (ranged.cloned().or(Some(basic)), None),
            _ => (None, None),
        }
    }

    fn check_expr(&mut self, expr: &Expr) -> Option<TypeDescriptor> {
        let ty = self.infer(expr);
        self.record(expr, ty)
    }

    fn infer(&mut self, expr: &Expr) -> Option<TypeDescriptor> {
        match &expr.kind {
            ExprKind::Ident(name) => self.ident_type(name),
            ExprKind::Nil | ExprKind::Type(_) | ExprKind::Bad => None,
            ExprKind::BasicLit(kind) => Some(literal_type(*kind)),
            ExprKind::Paren(inner) => self.check_expr(inner),
            ExprKind::Binary { op, lhs, rhs } => {
                let left = self.check_expr(lhs);
                let right = self.check_expr(rhs);
                if op.is_comparison_or_logical() {
                    Some(TypeDescriptor::basic("bool"))
                } else if matches!(op, BinaryOp::Shl | BinaryOp::Shr) {
                    left
                } else {
                    left.or(right)
                }
            }
            ExprKind::Unary { op, operand } => {
                let ty = self.check_expr(operand);
                match op {
                    UnaryOp::Addr => ty.map(|ty| TypeDescriptor::Pointer(Box::new(ty))),
                    UnaryOp::Deref => match self.universe.underlying(&ty?)? {
                        TypeDescriptor::Pointer(inner) => known(*inner),
                        _ => None,
                    },
                    UnaryOp::Recv => match self.universe.underlying(&ty?)? {
                        TypeDescriptor::Chan(elem) => known(*elem),
                        _ => None,
                    },
                    UnaryOp::Not => Some(TypeDescriptor::basic("bool")),
                    UnaryOp::Neg | UnaryOp::Plus | UnaryOp::BitNot => ty,
                }
            }
            ExprKind::Call { func, args } => self.infer_call(func, args),
            ExprKind::Selector { operand, field } => {
                if let ExprKind::Ident(local) = &operand.kind {
                    if let Some(path) = self.import_path(local) {
                        return self.universe.package_member(&path, &field.name);
                    }
                }
                let ty = self.check_expr(operand)?;
                self.universe.select(&ty, &field.name, 0)
            }
            ExprKind::Index { operand, index } => {
                let ty = self.check_expr(operand);
                self.check_expr(index);
                match self.universe.underlying(&ty?)? {
                    TypeDescriptor::Slice(elem) | TypeDescriptor::Array(elem) => known(*elem),
                    TypeDescriptor::Map(_, value) => known(*value),
                    TypeDescriptor::Basic(name) if name == "string" => {
                        Some(TypeDescriptor::basic("byte"))
                    }
                    TypeDescriptor::Pointer(inner) => match *inner {
                        TypeDescriptor::Array(elem) => known(*elem),
                        _ => None,
                    },
                    // Explicit instantiation of a generic function.
                    func @ TypeDescriptor::Func(_) => Some(func),
                    _ => None,
                }
            }
            ExprKind::Slice { operand, bounds } => {
                let ty = self.check_expr(operand);
                for bound in bounds {
                    self.check_expr(bound);
                }
                let ty = ty?;
                match self.universe.underlying(&ty)? {
                    TypeDescriptor::Basic(_) | TypeDescriptor::Slice(_) => Some(ty),
                    TypeDescriptor::Array(elem) => Some(TypeDescriptor::Slice(elem)),
                    TypeDescriptor::Pointer(inner) => match *inner {
                        TypeDescriptor::Array(elem) => Some(TypeDescriptor::Slice(elem)),
                        _ => None,
                    },
                    _ => None,
                }
            }
            ExprKind::TypeAssert { operand, ty } | ExprKind::Conversion { ty, operand } => {
                self.check_expr(operand);
                self.resolve(ty)
            }
            ExprKind::Composite { ty, elems } => {
                for elem in elems {
                    self.check_expr(elem);
                }
                ty.as_ref().and_then(|ty| self.resolve(ty))
            }
            ExprKind::KeyValue { key, value } => {
                // Bare identifiers in key position name struct fields.
                if !matches!(key.kind, ExprKind::Ident(_)) {
                    self.check_expr(key);
                }
                self.check_expr(value);
                None
            }
            ExprKind::FuncLit {
                params,
                results,
                body,
            } => {
                let sig = self
                    .universe
                    .signature(self.file, params, results, &self.scopes);
                self.with_scope(|c| {
                    c.declare_params(params);
                    c.declare_params(results);
                    c.check_stmts(&body.stmts);
                });
                Some(TypeDescriptor::Func(sig))
            }
        }
    }

    fn ident_type(&self, name: &str) -> Option<TypeDescriptor> {
        match self.lookup(name) {
            Some(Binding::Value(ty)) => return ty.clone(),
            Some(Binding::Type(_)) => return None,
            None => {}
        }
        if let Some(decls) = self.package_decls() {
            if let Some(ty) = decls.vars.get(name) {
                return Some(ty.clone());
            }
            if let Some(sig) = decls.funcs.get(name) {
                return Some(TypeDescriptor::Func(sig.clone()));
            }
        }
        match name {
            "true" | "false" => Some(TypeDescriptor::basic("bool")),
            "iota" => Some(TypeDescriptor::basic("int")),
            _ => None,
        }
    }

    fn infer_call(&mut self, func: &Expr, args: &[Expr]) -> Option<TypeDescriptor> {
        if let Some(target) = self.as_type(func) {
            for arg in args {
                self.check_expr(arg);
            }
            return target;
        }
        if let ExprKind::Ident(name) = &func.kind {
            if self.lookup(name).is_none()
                && !self.is_package_value(name)
                && BUILTIN_FUNCS.contains(&name.as_str())
            {
                return self.builtin_call(name, args);
            }
        }

        let callee = self.check_expr(func);
        for arg in args {
            self.check_expr(arg);
        }
        match self.universe.underlying(&callee?)? {
            TypeDescriptor::Func(sig) => sig.call_result().and_then(known),
            _ => None,
        }
    }

    fn builtin_call(&mut self, name: &str, args: &[Expr]) -> Option<TypeDescriptor> {
        let mut operands = Vec::with_capacity(args.len());
        for arg in args {
            let ty = match self.as_type(arg) {
                Some(ty) => ty,
                None => self.check_expr(arg),
            };
            operands.push(ty);
        }
        let first = operands.into_iter().next().flatten();
        match name {
            "new" => first.map(|ty| TypeDescriptor::Pointer(Box::new(ty))),
            "make" | "append" | "min" | "max" => first,
            "len" | "cap" | "copy" => Some(TypeDescriptor::basic("int")),
            "complex" => Some(TypeDescriptor::basic("complex128")),
            "real" | "imag" => Some(TypeDescriptor::basic("float64")),
            "recover" => Some(TypeDescriptor::Interface(Vec::new())),
            _ => None,
        }
    }

    /// If `expr` denotes a type, the resolved type (which may itself be
    /// unknown). `None` if `expr` is a value.
    #[allow(clippy::option_option)]
    fn as_type(&self, expr: &Expr) -> Option<Option<TypeDescriptor>> {
        match &expr.kind {
            ExprKind::Type(ty) => Some(self.resolve(ty)),
            ExprKind::Paren(inner) | ExprKind::Index { operand: inner, .. } => self.as_type(inner),
            ExprKind::Unary {
                op: UnaryOp::Deref,
                operand,
            } => self
                .as_type(operand)
                .map(|ty| ty.map(|ty| TypeDescriptor::Pointer(Box::new(ty)))),
            ExprKind::Ident(name) => match self.lookup(name) {
                Some(Binding::Type(ty)) => Some(ty.clone()),
                Some(Binding::Value(_)) => None,
                None => {
                    let declared = self
                        .package_decls()
                        .is_some_and(|p| p.types.contains_key(name));
                    let predeclared =
                        !self.is_package_value(name) && predeclared_type(name).is_some();
                    (declared || predeclared).then(|| self.resolve(&TypeExpr::Name(name.clone())))
                }
            },
            ExprKind::Selector { operand, field } => {
                let ExprKind::Ident(local) = &operand.kind else {
                    return None;
                };
                let path = self.import_path(local)?;
                let is_type = self
                    .universe
                    .packages
                    .get(&path)
                    .is_some_and(|p| p.types.contains_key(&field.name));
                is_type.then(|| {
                    self.resolve(&TypeExpr::Qualified {
                        package: local.clone(),
                        name: field.name.clone(),
                    })
                })
            }
            _ => None,
        }
    }
}

/// Expression types of one checked package.
#[derive(Debug)]
pub struct TypeInfo<'u> {
    universe: &'u Universe,
    types: HashMap<ExprId, TypeDescriptor>,
}

impl TypeInfo<'_> {
    /// Type recorded for the expression with id `id`.
    #[must_use]
    pub fn type_of(&self, id: ExprId) -> Option<&TypeDescriptor> {
        self.types.get(&id)
    }
}

impl TypeResolver for TypeInfo<'_> {
    fn resolve_static_type(&self, expr: &Expr) -> Option<&TypeDescriptor> {
        self.type_of(expr.id)
    }

    fn is_error_signaling_type(&self, ty: &TypeDescriptor) -> bool {
        self.universe.is_error_signaling_type(ty)
    }
}
