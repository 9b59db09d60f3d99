//! Configuration file resolution with global fallback.
//!
//! Resolves the configuration file path using a deterministic priority order:
//!
//! 1. `--config` flag (explicit path)
//! 2. `errchecklog.toml` or `.errchecklog.toml` in the checked directory or
//!    any parent up to and including the Go module root (the directory
//!    holding `go.mod`)
//! 3. `~/.errchecklog/config.toml` (global fallback)
//! 4. No config found → defaults

use std::path::{Path, PathBuf};

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly specified via `--config` flag.
    Explicit(PathBuf),
    /// Found in the checked directory or one of its parents in the module.
    Project(PathBuf),
    /// Loaded from the global config directory (`~/.errchecklog/`).
    Global(PathBuf),
    /// No config found; defaults will be used.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Returns `true` if the config was loaded from the global directory.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }
}

/// Project-level config file names, checked in order within each directory.
const PROJECT_CONFIG_NAMES: &[&str] = &["errchecklog.toml", ".errchecklog.toml"];

/// Config file name within the global config directory.
const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Resolves the configuration file for a check of `target`.
///
/// See module-level docs for resolution order.
#[must_use]
pub fn resolve(target: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_inner(target, explicit, global_config_dir())
}

/// Testable core: accepts `global_dir` as parameter to avoid env var races.
fn resolve_inner(
    target: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> ConfigSource {
    if let Some(p) = explicit {
        return ConfigSource::Explicit(p.to_path_buf());
    }

    if let Some(found) = find_project_config(target) {
        tracing::debug!("Found project config: {}", found.display());
        return ConfigSource::Project(found);
    }

    if let Some(dir) = global_dir {
        let candidate = dir.join(GLOBAL_CONFIG_NAME);
        if candidate.is_file() {
            tracing::debug!("Found global config: {}", candidate.display());
            return ConfigSource::Global(candidate);
        }
    }

    ConfigSource::Default
}

/// Walks from `target` upwards, stopping after the module root.
fn find_project_config(target: &Path) -> Option<PathBuf> {
    let start = std::fs::canonicalize(target).unwrap_or_else(|_| target.to_path_buf());
    let start = if start.is_file() {
        start.parent().map(Path::to_path_buf)?
    } else {
        start
    };

    for dir in start.ancestors() {
        let found = PROJECT_CONFIG_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file());
        if found.is_some() {
            return found;
        }
        if dir.join("go.mod").is_file() {
            break;
        }
    }
    None
}

/// Returns the global config directory path.
///
/// Resolution: `$ERRCHECKLOG_CONFIG_DIR` > `~/.errchecklog/`
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("ERRCHECKLOG_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".errchecklog"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// A module root with a nested package directory.
    fn module() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let root = fs::canonicalize(tmp.path()).unwrap().join("app");
        let pkg = root.join("internal/handler");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(root.join("go.mod"), "module example.com/app\n").unwrap();
        (tmp, pkg)
    }

    #[test]
    fn explicit_wins_and_is_not_checked() {
        let (_tmp, pkg) = module();
        fs::write(pkg.join("errchecklog.toml"), "").unwrap();

        let result = resolve_inner(&pkg, Some(Path::new("/nonexistent.toml")), None);
        assert_eq!(
            result,
            ConfigSource::Explicit(PathBuf::from("/nonexistent.toml"))
        );
    }

    #[test]
    fn config_in_checked_directory() {
        let (_tmp, pkg) = module();
        fs::write(pkg.join(".errchecklog.toml"), "").unwrap();

        let result = resolve_inner(&pkg, None, None);
        assert_eq!(result, ConfigSource::Project(pkg.join(".errchecklog.toml")));
    }

    #[test]
    fn plain_name_preferred_over_dot_prefix() {
        let (_tmp, pkg) = module();
        fs::write(pkg.join("errchecklog.toml"), "").unwrap();
        fs::write(pkg.join(".errchecklog.toml"), "").unwrap();

        let result = resolve_inner(&pkg, None, None);
        assert_eq!(result, ConfigSource::Project(pkg.join("errchecklog.toml")));
    }

    #[test]
    fn nearest_parent_config_up_to_module_root() {
        let (_tmp, pkg) = module();
        let root = pkg.parent().and_then(Path::parent).unwrap().to_path_buf();
        fs::write(root.join("errchecklog.toml"), "").unwrap();

        let result = resolve_inner(&pkg, None, None);
        assert_eq!(result, ConfigSource::Project(root.join("errchecklog.toml")));

        let internal = pkg.parent().unwrap();
        fs::write(internal.join("errchecklog.toml"), "").unwrap();
        let result = resolve_inner(&pkg, None, None);
        assert_eq!(result, ConfigSource::Project(internal.join("errchecklog.toml")));
    }

    #[test]
    fn search_stops_at_module_root() {
        let (tmp, pkg) = module();
        // Above go.mod: must not be picked up.
        fs::write(tmp.path().join("errchecklog.toml"), "").unwrap();

        let result = resolve_inner(&pkg, None, None);
        assert_eq!(result, ConfigSource::Default);
    }

    #[test]
    fn global_fallback_when_no_project_config() {
        let (_tmp, pkg) = module();
        let global = TempDir::new().unwrap();
        fs::write(global.path().join("config.toml"), "").unwrap();

        let result = resolve_inner(&pkg, None, Some(global.path().to_path_buf()));
        assert_eq!(
            result,
            ConfigSource::Global(global.path().join("config.toml"))
        );
    }

    #[test]
    fn global_skipped_when_project_config_exists() {
        let (_tmp, pkg) = module();
        fs::write(pkg.join("errchecklog.toml"), "").unwrap();
        let global = TempDir::new().unwrap();
        fs::write(global.path().join("config.toml"), "").unwrap();

        let result = resolve_inner(&pkg, None, Some(global.path().to_path_buf()));
        assert!(matches!(result, ConfigSource::Project(_)));
    }

    #[test]
    fn global_dir_without_config_file_returns_default() {
        let (_tmp, pkg) = module();
        let global = TempDir::new().unwrap();

        let result = resolve_inner(&pkg, None, Some(global.path().to_path_buf()));
        assert_eq!(result, ConfigSource::Default);
    }

    #[test]
    fn file_target_searches_its_directory() {
        let (_tmp, pkg) = module();
        let file = pkg.join("handler.go");
        fs::write(&file, "package handler\n").unwrap();
        fs::write(pkg.join("errchecklog.toml"), "").unwrap();

        let result = resolve_inner(&file, None, None);
        assert_eq!(result, ConfigSource::Project(pkg.join("errchecklog.toml")));
    }

    #[test]
    fn source_accessors() {
        let p = PathBuf::from("/tmp/test.toml");
        assert!(ConfigSource::Default.path().is_none());
        assert_eq!(ConfigSource::Project(p.clone()).path(), Some(p.as_path()));
        assert!(ConfigSource::Global(p.clone()).is_global());
        assert!(!ConfigSource::Explicit(p).is_global());
    }
}
