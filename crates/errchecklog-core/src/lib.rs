//! # errchecklog-core
//!
//! Core framework for linting Go packages with type information.
//!
//! This crate provides the host side of errchecklog:
//!
//! - [`Rule`] trait for per-file rules over a type-checked syntax tree
//! - [`Analyzer`] for discovering, loading and checking Go packages
//! - [`Config`] for the TOML configuration file
//! - [`Violation`] for representing lint findings
//!
//! ## Example
//!
//! ```ignore
//! use errchecklog_core::{Analyzer, Config};
//!
//! let analyzer = Analyzer::builder()
//!     .root("./service")
//!     .config(Config::from_file("errchecklog.toml".as_ref())?)
//!     .rule(MyRule::new())
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! result.print_report();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod context;
mod rule;
mod types;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError};
pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig};
pub use context::FileContext;
pub use rule::{Rule, RuleBox};
pub use types::{
    Label, LintResult, Location, Severity, Suggestion, Violation, ViolationDiagnostic,
};
