//! # errchecklog-rules
//!
//! Built-in lint rules for errchecklog.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | ECL001 | `errchecklog` | Requires `if err != nil` blocks in `handle`/`Handle` to call the configured reporter type |
//!
//! ## Usage
//!
//! ```ignore
//! use errchecklog_core::Analyzer;
//! use errchecklog_rules::{ErrCheckLog, TargetInterface};
//!
//! let analyzer = Analyzer::builder()
//!     .root("./service")
//!     .rule(ErrCheckLog::new(TargetInterface::new("example.com/app/logging", "Reporter")))
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod errchecklog;

pub use errchecklog::{ErrCheckLog, TargetInterface, CODE, NAME};

/// Re-export core types for convenience.
pub use errchecklog_core::{Rule, RuleBox, Severity, Violation};

/// Returns every built-in rule, configured from `config`.
#[must_use]
pub fn all_rules(config: &errchecklog_core::Config) -> Vec<RuleBox> {
    vec![Box::new(ErrCheckLog::from_config(config))]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_rules() {
        let rules = all_rules(&errchecklog_core::Config::default());
        let codes: Vec<&str> = rules.iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec![CODE]);
    }
}
