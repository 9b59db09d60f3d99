//! Configuration types for errchecklog.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Per-rule configurations, keyed by rule name.
    #[serde(default)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }

    /// Checks if a rule is enabled. Rules without a section are enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_name: &str) -> bool {
        self.rules
            .get(rule_name)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_name: &str) -> Option<crate::Severity> {
        self.rules.get(rule_name).and_then(|c| c.severity)
    }

    /// Gets the configuration section of a rule.
    #[must_use]
    pub fn rule(&self, rule_name: &str) -> Option<&RuleConfig> {
        self.rules.get(rule_name)
    }

    /// Sets a string option on a rule, creating its section if needed.
    pub fn set_rule_option(&mut self, rule_name: &str, key: &str, value: impl Into<String>) {
        self.rules
            .entry(rule_name.to_string())
            .or_default()
            .options
            .insert(key.to_string(), toml::Value::String(value.into()));
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Root directory to analyze (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Glob patterns to exclude from analysis.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Whether `_test.go` files are analyzed.
    #[serde(default = "default_true")]
    pub tests: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            exclude: default_exclude(),
            respect_gitignore: true,
            tests: true,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_exclude() -> Vec<String> {
    vec!["**/vendor/**".to_string(), "**/testdata/**".to_string()]
}

fn default_true() -> bool {
    true
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<crate::Severity>,

    /// Rule-specific options as key-value pairs.
    #[serde(flatten)]
    pub options: HashMap<String, toml::Value>,
}

impl RuleConfig {
    /// Gets a boolean option with a default value.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.options
            .get(key)
            .and_then(toml::Value::as_bool)
            .unwrap_or(default)
    }

    /// Gets a string option with a default value.
    #[must_use]
    pub fn get_str<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.options
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.analyzer.respect_gitignore);
        assert!(config.analyzer.tests);
        assert!(config.rules.is_empty());
        assert!(config.is_rule_enabled("errchecklog"));
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[analyzer]
root = "./svc"
exclude = ["**/generated/**"]
tests = false

[rules.errchecklog]
enabled = true
severity = "warning"
ifacepkg = "example.com/app/logging"
ifacename = "Reporter"
"#;

        let config = Config::parse(toml).expect("Failed to parse");
        assert_eq!(config.analyzer.root, PathBuf::from("./svc"));
        assert_eq!(config.analyzer.exclude, vec!["**/generated/**".to_string()]);
        assert!(!config.analyzer.tests);
        assert!(config.is_rule_enabled("errchecklog"));
        assert_eq!(config.rule_severity("errchecklog"), Some(Severity::Warning));

        let rule_config = config.rule("errchecklog").unwrap();
        assert_eq!(rule_config.get_str("ifacepkg", ""), "example.com/app/logging");
        assert_eq!(rule_config.get_str("ifacename", ""), "Reporter");
        assert_eq!(rule_config.get_str("missing", "fallback"), "fallback");
    }

    #[test]
    fn test_disabled_rule() {
        let config = Config::parse("[rules.errchecklog]\nenabled = false\n").unwrap();
        assert!(!config.is_rule_enabled("errchecklog"));
    }

    #[test]
    fn test_set_rule_option_overrides_file_value() {
        let mut config =
            Config::parse("[rules.errchecklog]\nifacename = \"Logger\"\n").unwrap();
        config.set_rule_option("errchecklog", "ifacename", "Reporter");
        config.set_rule_option("errchecklog", "ifacepkg", "example.com/app/logging");
        let rule = config.rule("errchecklog").unwrap();
        assert_eq!(rule.get_str("ifacename", ""), "Reporter");
        assert_eq!(rule.get_str("ifacepkg", ""), "example.com/app/logging");
    }

    #[test]
    fn test_invalid_config() {
        let err = Config::parse("[analyzer\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
