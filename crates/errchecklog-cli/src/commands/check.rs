//! Check command implementation.

use anyhow::{Context, Result};
use clap::Args;
use errchecklog_core::{Analyzer, Config};
use errchecklog_rules::{all_rules, NAME};
use std::path::PathBuf;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Exit status when violations at error severity were found.
const EXIT_VIOLATIONS: i32 = 3;

/// Arguments of `errchecklog check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to analyze (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Import path of the package declaring the reporter type
    #[arg(long, env = "ERRCHECKLOG_IFACEPKG")]
    pub ifacepkg: Option<String>,

    /// Name of the reporter type
    #[arg(long, env = "ERRCHECKLOG_IFACENAME")]
    pub ifacename: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Exclude patterns (can be specified multiple times)
    #[arg(short, long)]
    pub exclude: Vec<String>,

    /// Skip `_test.go` files
    #[arg(long)]
    pub no_tests: bool,

    /// Abort when a file fails to parse instead of skipping it
    #[arg(long)]
    pub fail_on_parse_error: bool,
}

/// Runs the check command.
pub fn run(args: &CheckArgs, source: &ConfigSource) -> Result<()> {
    let mut config = load_config(source)?;
    apply_overrides(&mut config, args);

    let mut builder = Analyzer::builder()
        .root(&args.path)
        .excludes(args.exclude.iter().cloned())
        .fail_on_parse_error(args.fail_on_parse_error);
    if args.no_tests {
        builder = builder.include_tests(false);
    }
    for rule in all_rules(&config) {
        builder = builder.rule_box(rule);
    }

    let analyzer = builder
        .config(config)
        .build()
        .context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {:?} with {} rules",
        analyzer.root(),
        analyzer.rule_count()
    );

    let result = analyzer.analyze().context("Analysis failed")?;

    super::output::print(&result, args.format, analyzer.root())?;

    if result.has_errors() {
        std::process::exit(EXIT_VIOLATIONS);
    }

    Ok(())
}

fn load_config(source: &ConfigSource) -> Result<Config> {
    let Some(path) = source.path() else {
        return Ok(Config::default());
    };
    if source.is_global() {
        tracing::info!("Using global config: {}", path.display());
    }
    Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(config: &mut Config, args: &CheckArgs) {
    if let Some(pkg) = &args.ifacepkg {
        config.set_rule_option(NAME, "ifacepkg", pkg.as_str());
    }
    if let Some(name) = &args.ifacename {
        config.set_rule_option(NAME, "ifacename", name.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: CheckArgs,
    }

    fn parse(argv: &[&str]) -> CheckArgs {
        TestCli::parse_from(std::iter::once("check").chain(argv.iter().copied())).args
    }

    #[test]
    fn flags_override_config_file() {
        let mut config = Config::parse(
            "[rules.errchecklog]\nifacepkg = \"example.com/old\"\nifacename = \"Logger\"\n",
        )
        .unwrap();
        let args = parse(&["--ifacepkg", "example.com/app/logging", "./svc"]);
        apply_overrides(&mut config, &args);

        let rule = config.rule(NAME).unwrap();
        assert_eq!(rule.get_str("ifacepkg", ""), "example.com/app/logging");
        assert_eq!(rule.get_str("ifacename", ""), "Logger");
        assert_eq!(args.path, PathBuf::from("./svc"));
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert_eq!(args.path, PathBuf::from("."));
        assert_eq!(args.format, OutputFormat::Text);
        assert!(!args.no_tests);
        assert!(!args.fail_on_parse_error);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let source = ConfigSource::Explicit(PathBuf::from("/nonexistent/errchecklog.toml"));
        assert!(load_config(&source).is_err());
        assert!(load_config(&ConfigSource::Default).is_ok());
    }
}
