//! Resolved types and the type-resolution seam used by rules.

use std::fmt;

use crate::ast::Expr;

/// A resolved Go type.
///
/// Named types are identified by their declaring package's import path and
/// their declared name; two named types are identical iff both match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// A predeclared non-interface type such as `int` or `string`.
    Basic(String),
    /// The predeclared `error` interface.
    Error,
    /// A defined type.
    Named {
        /// Import path of the declaring package.
        package: String,
        /// Declared name.
        name: String,
    },
    /// `*T`
    Pointer(Box<TypeDescriptor>),
    /// `[]T`
    Slice(Box<TypeDescriptor>),
    /// `[N]T`
    Array(Box<TypeDescriptor>),
    /// `map[K]V`
    Map(Box<TypeDescriptor>, Box<TypeDescriptor>),
    /// `chan T`
    Chan(Box<TypeDescriptor>),
    /// A function type.
    Func(Signature),
    /// An unnamed struct type.
    Struct(Vec<Field>),
    /// An unnamed interface type with its explicit methods.
    Interface(Vec<Method>),
    /// The result list of a multi-value call.
    Tuple(Vec<TypeDescriptor>),
    /// Placeholder for an unresolvable parameter, result or field type.
    /// Never reported for an expression.
    Unknown,
}

impl TypeDescriptor {
    /// Shorthand for a [`TypeDescriptor::Named`].
    #[must_use]
    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Named {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Shorthand for a [`TypeDescriptor::Basic`].
    #[must_use]
    pub fn basic(name: impl Into<String>) -> Self {
        Self::Basic(name.into())
    }

    /// Whether this is exactly the named type `package.name`.
    ///
    /// Pointers to the named type do not match.
    #[must_use]
    pub fn is_named(&self, package: &str, name: &str) -> bool {
        matches!(self, Self::Named { package: p, name: n } if p == package && n == name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Basic(name) => f.write_str(name),
            Self::Error => f.write_str("error"),
            Self::Named { package, name } => write!(f, "{package}.{name}"),
            Self::Pointer(inner) => write!(f, "*{inner}"),
            Self::Slice(elem) => write!(f, "[]{elem}"),
            Self::Array(elem) => write!(f, "[...]{elem}"),
            Self::Map(key, value) => write!(f, "map[{key}]{value}"),
            Self::Chan(elem) => write!(f, "chan {elem}"),
            Self::Func(sig) => write!(f, "func{sig}"),
            Self::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", field.ty)?;
                    } else {
                        write!(f, "{} {}", field.name, field.ty)?;
                    }
                }
                f.write_str("}")
            }
            Self::Interface(methods) => {
                f.write_str("interface{")?;
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{}{}", method.name, method.sig)?;
                }
                f.write_str("}")
            }
            Self::Tuple(items) => {
                f.write_str("(")?;
                write_list(f, items)?;
                f.write_str(")")
            }
            Self::Unknown => f.write_str("invalid type"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: &[TypeDescriptor]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Parameter and result types of a function.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Signature {
    /// Parameter types; a variadic final parameter is a slice.
    pub params: Vec<TypeDescriptor>,
    /// Result types.
    pub results: Vec<TypeDescriptor>,
    /// Whether the final parameter is variadic.
    pub variadic: bool,
}

impl Signature {
    /// A signature with no parameters and the given results.
    #[must_use]
    pub fn returning(results: Vec<TypeDescriptor>) -> Self {
        Self {
            params: Vec::new(),
            results,
            variadic: false,
        }
    }

    /// The type of a call to a function with this signature.
    ///
    /// `None` for functions without results.
    #[must_use]
    pub fn call_result(&self) -> Option<TypeDescriptor> {
        match self.results.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(TypeDescriptor::Tuple(many.to_vec())),
        }
    }

    /// Whether this is the signature of `Error() string`.
    #[must_use]
    pub fn is_error_method(&self) -> bool {
        self.params.is_empty()
            && matches!(self.results.as_slice(), [TypeDescriptor::Basic(name)] if name == "string")
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_list(f, &self.params)?;
        f.write_str(")")?;
        match self.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " {single}"),
            many => {
                f.write_str(" (")?;
                write_list(f, many)?;
                f.write_str(")")
            }
        }
    }
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name; for embedded fields, the type's name.
    pub name: String,
    /// Field type.
    pub ty: TypeDescriptor,
    /// Whether the field is embedded.
    pub embedded: bool,
}

/// An interface method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    /// Method name.
    pub name: String,
    /// Method signature without the receiver.
    pub sig: Signature,
}

/// Static type information for the expressions of one package.
///
/// Rules depend on this trait rather than on a concrete checker. Every
/// method is total: anything the resolver cannot answer is `None` or `false`.
pub trait TypeResolver {
    /// The static type of `expr`, if known.
    fn resolve_static_type(&self, expr: &Expr) -> Option<&TypeDescriptor>;

    /// Whether a value of type `ty` is assignable to `error`.
    fn is_error_signaling_type(&self, ty: &TypeDescriptor) -> bool;
}
