//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# errchecklog configuration

[analyzer]
# Root directory to analyze (default: current directory)
# root = "./service"

# Glob patterns to exclude from analysis
exclude = [
    "**/vendor/**",
    "**/testdata/**",
]

# Respect .gitignore files
respect_gitignore = true

# Analyze _test.go files
tests = true

[rules.errchecklog]
enabled = true
# severity = "warning"  # Override default severity

# The rule does nothing until both are set.
# Import path of the package declaring the reporter type
ifacepkg = ""
# Name of the reporter type
ifacename = ""
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new("errchecklog.toml");
    write_config(config_path, force)?;

    println!("Created errchecklog.toml");
    println!("\nNext steps:");
    println!("  1. Set ifacepkg and ifacename in errchecklog.toml");
    println!("  2. Run: errchecklog check");

    Ok(())
}

fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    std::fs::write(path, DEFAULT_CONFIG)?;
    Ok(())
}
