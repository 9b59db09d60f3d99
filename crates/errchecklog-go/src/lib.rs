//! # errchecklog-go
//!
//! Tree-sitter based Go front end for errchecklog.
//!
//! This crate turns Go sources into the inputs a rule needs:
//!
//! - [`GoParser`] lowers tree-sitter-go trees into the owned [`ast`] model
//! - [`PackageLoader`] groups parsed files into [`Package`]s with import paths
//! - [`Universe`] indexes declarations across packages and type-checks
//!   function bodies into a [`TypeInfo`]
//! - [`TypeResolver`] is the seam rules use to query static types
//! - [`Visit`] walks the syntax tree with early exit

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ast;
pub mod checker;
pub mod loader;
pub mod parser;
mod prelude;
pub mod types;
pub mod visit;

pub use checker::{TypeInfo, Universe};
pub use loader::{LoadError, Module, Package, PackageLoader, ParsedFile};
pub use parser::{GoParser, ParseError};
pub use types::{Signature, TypeDescriptor, TypeResolver};
pub use visit::Visit;
