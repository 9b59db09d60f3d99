//! Core analyzer for orchestrating lint execution.

use crate::config::Config;
use crate::context::FileContext;
use crate::rule::{Rule, RuleBox};
use crate::types::{LintResult, Violation};

use errchecklog_go::loader::is_test_file;
use errchecklog_go::{LoadError, Package, PackageLoader, ParseError, ParsedFile, Universe};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error resolving the root.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A source file could not be read.
    #[error(transparent)]
    Load(LoadError),

    /// Error parsing a Go source file.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// The Go grammar could not be loaded.
    #[error("Failed to initialize Go parser: {0}")]
    Frontend(#[from] ParseError),

    /// Directory walk error.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<LoadError> for AnalyzerError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Parse { path, source } => Self::Parse {
                path,
                message: source.to_string(),
            },
            other @ LoadError::Io { .. } => Self::Load(other),
        }
    }
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    rules: Vec<RuleBox>,
    exclude_patterns: Vec<String>,
    config: Option<Config>,
    include_tests: Option<bool>,
    fail_on_parse_error: bool,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push(rule);
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets whether `_test.go` files are analyzed (default: from config).
    #[must_use]
    pub fn include_tests(mut self, include: bool) -> Self {
        self.include_tests = Some(include);
        self
    }

    /// Sets whether to fail on parse errors (default: false).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = fail;
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined or an
    /// exclude pattern is invalid.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let config = self.config.unwrap_or_default();
        let root = self.root.unwrap_or_else(|| config.analyzer.root.clone());

        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };
        let root = std::fs::canonicalize(&root).unwrap_or(root);

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());
        let excludes = exclude_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Analyzer {
            root,
            rules: self.rules,
            excludes,
            include_tests: self.include_tests.unwrap_or(config.analyzer.tests),
            fail_on_parse_error: self.fail_on_parse_error,
            config,
        })
    }
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    rules: Vec<RuleBox>,
    excludes: Vec<glob::Pattern>,
    include_tests: bool,
    config: Config,
    fail_on_parse_error: bool,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Analyzes all files and returns the results.
    ///
    /// Every package of the enclosing Go module is loaded so that calls into
    /// packages outside the root still resolve, but rules only run on files
    /// under the root.
    ///
    /// # Errors
    ///
    /// Returns an error if file discovery or reading fails, or if a file
    /// fails to parse while `fail_on_parse_error` is set.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        info!("Starting analysis at {:?}", self.root);

        let mut result = LintResult::new();
        let paths = self.discover_files(&self.root, false)?;

        info!("Found {} files to analyze", paths.len());

        let mut loader = PackageLoader::new(&self.root)?;
        let mut files = Vec::with_capacity(paths.len());
        for path in &paths {
            match loader.parse_file(path) {
                Ok(file) => files.push(file),
                Err(LoadError::Parse { path, source }) => {
                    warn!("Failed to parse {}: {}", path.display(), source);
                    if self.fail_on_parse_error {
                        return Err(LoadError::Parse { path, source }.into());
                    }
                    result.skipped_files.push(self.relative(&path));
                }
                Err(e) => return Err(e.into()),
            }
        }
        files.extend(self.load_module_context(&mut loader, &paths)?);

        let targets: HashSet<&Path> = paths.iter().map(PathBuf::as_path).collect();
        let packages = loader.assemble(files);
        let universe = Universe::new(&packages);

        for package in &packages {
            let checked = package
                .files
                .iter()
                .filter(|f| targets.contains(f.path.as_path()))
                .count();
            if checked == 0 {
                continue;
            }
            result
                .violations
                .extend(self.analyze_package(&universe, package, &targets));
            result.files_checked += checked;
            result.packages_checked += 1;
        }

        result.violations.sort_by(|a, b| {
            a.location
                .file
                .cmp(&b.location.file)
                .then(a.location.line.cmp(&b.location.line))
                .then(a.location.column.cmp(&b.location.column))
        });

        info!(
            "Analysis complete: {} violations in {} files",
            result.violations.len(),
            result.files_checked
        );

        Ok(result)
    }

    /// Parses the module's files outside the root, for type information only.
    ///
    /// Nested modules are not entered. Files that fail to parse are dropped.
    fn load_module_context(
        &self,
        loader: &mut PackageLoader,
        targets: &[PathBuf],
    ) -> Result<Vec<ParsedFile>, AnalyzerError> {
        let Some(module_root) = loader.module().map(|m| m.root.clone()) else {
            return Ok(Vec::new());
        };
        if module_root == self.root {
            return Ok(Vec::new());
        }

        let targets: HashSet<&Path> = targets.iter().map(PathBuf::as_path).collect();
        let mut files = Vec::new();
        for path in self.discover_files(&module_root, true)? {
            if targets.contains(path.as_path()) {
                continue;
            }
            match loader.parse_file(&path) {
                Ok(file) => files.push(file),
                Err(e) => debug!("Ignoring module file: {}", e),
            }
        }
        debug!(
            "Loaded {} module files outside {}",
            files.len(),
            self.root.display()
        );
        Ok(files)
    }

    /// Type-checks one package and runs every enabled rule on its files
    /// under the root.
    fn analyze_package(
        &self,
        universe: &Universe,
        package: &Package,
        targets: &HashSet<&Path>,
    ) -> Vec<Violation> {
        debug!("Checking package {}", package.path);
        let types = universe.check(package);
        let mut violations = Vec::new();

        for file in package
            .files
            .iter()
            .filter(|f| targets.contains(f.path.as_path()))
        {
            violations.extend(self.analyze_file(package, file, &types));
        }

        violations
    }

    fn analyze_file(
        &self,
        package: &Package,
        file: &ParsedFile,
        types: &errchecklog_go::TypeInfo<'_>,
    ) -> Vec<Violation> {
        debug!("Analyzing: {}", file.path.display());

        let ctx = FileContext::new(&file.path, &file.content, &package.path, &self.root);
        let mut violations = Vec::new();

        for rule in &self.rules {
            if !self.config.is_rule_enabled(rule.name()) {
                debug!("Skipping disabled rule: {}", rule.name());
                continue;
            }

            let rule_violations = rule.check(&ctx, &file.ast, types);
            let rule_violations = self.apply_severity_override(rule.name(), rule_violations);
            violations.extend(rule_violations);
        }

        violations
    }

    /// Applies severity overrides from configuration.
    fn apply_severity_override(
        &self,
        rule_name: &str,
        mut violations: Vec<Violation>,
    ) -> Vec<Violation> {
        if let Some(severity) = self.config.rule_severity(rule_name) {
            for v in &mut violations {
                v.severity = severity;
            }
        }
        violations
    }

    /// Discovers the Go source files under `dir`, in path order.
    fn discover_files(
        &self,
        dir: &Path,
        skip_nested_modules: bool,
    ) -> Result<Vec<PathBuf>, AnalyzerError> {
        let respect_gitignore = self.config.analyzer.respect_gitignore;
        let mut builder = ignore::WalkBuilder::new(dir);
        builder
            .git_ignore(respect_gitignore)
            .git_exclude(respect_gitignore)
            .ignore(respect_gitignore)
            .require_git(false);
        if skip_nested_modules {
            builder.filter_entry(|entry| {
                entry.depth() == 0 || !entry.path().join("go.mod").is_file()
            });
        }

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file())
                || path.extension().and_then(|e| e.to_str()) != Some("go")
            {
                continue;
            }
            if !self.include_tests && is_test_file(path) {
                debug!("Skipping test file: {}", path.display());
                continue;
            }
            if self.should_exclude(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Checks if a path matches an exclude pattern, either relative to the
    /// root or as given.
    fn should_exclude(&self, path: &Path) -> bool {
        let relative = self.relative(path);
        self.excludes
            .iter()
            .any(|pattern| pattern.matches_path(&relative) || pattern.matches_path(path))
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;
    use errchecklog_go::ast::SourceFile;
    use errchecklog_go::TypeResolver;
    use std::fs;

    struct EveryFunction;

    impl Rule for EveryFunction {
        fn name(&self) -> &'static str {
            "every-function"
        }
        fn code(&self) -> &'static str {
            "TEST001"
        }
        fn default_severity(&self) -> Severity {
            Severity::Warning
        }
        fn check(
            &self,
            ctx: &FileContext,
            file: &SourceFile,
            _types: &dyn TypeResolver,
        ) -> Vec<Violation> {
            file.functions()
                .map(|f| {
                    Violation::new(
                        self.code(),
                        self.name(),
                        self.default_severity(),
                        ctx.location(f.name.span),
                        format!("{} in {}", f.name.name, ctx.package_path),
                    )
                })
                .collect()
        }
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "go.mod", "module example.com/app\n\ngo 1.22\n");
        write(dir.path(), "main.go", "package main\n\nfunc main() {}\n");
        write(dir.path(), "api/api.go", "package api\n\nfunc Handle() {}\n");
        write(dir.path(), "api/api_test.go", "package api\n\nfunc helper() {}\n");
        write(dir.path(), "vendor/dep/dep.go", "package dep\n\nfunc handle() {}\n");
        dir
    }

    #[test]
    fn test_builder() {
        let analyzer = Analyzer::builder()
            .root(".")
            .exclude("**/vendor/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.root().exists());
        assert_eq!(analyzer.rule_count(), 0);
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let result = Analyzer::builder().root(".").exclude("[").build();
        assert!(matches!(result, Err(AnalyzerError::Glob(_))));
    }

    #[test]
    fn test_exclude_patterns() {
        let analyzer = Analyzer::builder()
            .root("/repo")
            .exclude("**/generated/**")
            .build()
            .expect("Failed to build analyzer");

        assert!(analyzer.should_exclude(Path::new("/repo/vendor/x/lib.go")));
        assert!(analyzer.should_exclude(Path::new("/repo/api/generated/types.go")));
        assert!(analyzer.should_exclude(Path::new("/repo/testdata/sample.go")));
        assert!(!analyzer.should_exclude(Path::new("/repo/api/api.go")));
    }

    #[test]
    fn test_analyze_runs_rules_per_package() {
        let dir = fixture();
        let result = Analyzer::builder()
            .root(dir.path())
            .rule(EveryFunction)
            .build()
            .unwrap()
            .analyze()
            .unwrap();

        let messages: Vec<&str> = result.violations.iter().map(|v| v.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "Handle in example.com/app/api",
                "helper in example.com/app/api",
                "main in example.com/app"
            ]
        );
        assert_eq!(result.files_checked, 3);
        assert_eq!(result.packages_checked, 2);
        assert_eq!(result.violations[0].location.file, PathBuf::from("api/api.go"));
    }

    #[test]
    fn test_exclude_tests() {
        let dir = fixture();
        let result = Analyzer::builder()
            .root(dir.path())
            .rule(EveryFunction)
            .include_tests(false)
            .build()
            .unwrap()
            .analyze()
            .unwrap();

        assert_eq!(result.files_checked, 2);
        assert!(result.violations.iter().all(|v| !v.message.starts_with("helper")));
    }

    #[test]
    fn test_severity_override_and_disable() {
        let dir = fixture();
        let config =
            Config::parse("[rules.every-function]\nseverity = \"error\"\n").unwrap();
        let result = Analyzer::builder()
            .root(dir.path())
            .rule(EveryFunction)
            .config(config)
            .build()
            .unwrap()
            .analyze()
            .unwrap();
        assert!(result.violations.iter().all(|v| v.severity == Severity::Error));

        let config = Config::parse("[rules.every-function]\nenabled = false\n").unwrap();
        let result = Analyzer::builder()
            .root(dir.path())
            .rule(EveryFunction)
            .config(config)
            .build()
            .unwrap()
            .analyze()
            .unwrap();
        assert!(result.violations.is_empty());
        assert_eq!(result.files_checked, 3);
    }

    #[test]
    fn test_parse_failure_is_skipped_by_default() {
        let dir = fixture();
        write(dir.path(), "broken/broken.go", "package broken\n\nfunc (\n");

        let result = Analyzer::builder()
            .root(dir.path())
            .rule(EveryFunction)
            .build()
            .unwrap()
            .analyze()
            .unwrap();
        assert_eq!(result.skipped_files, vec![PathBuf::from("broken/broken.go")]);
        assert_eq!(result.files_checked, 3);

        let err = Analyzer::builder()
            .root(dir.path())
            .rule(EveryFunction)
            .fail_on_parse_error(true)
            .build()
            .unwrap()
            .analyze()
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::Parse { .. }));
    }

    #[test]
    fn test_gitignore_respected() {
        let dir = fixture();
        write(dir.path(), ".gitignore", "gen/\n");
        write(dir.path(), "gen/gen.go", "package gen\n\nfunc Gen() {}\n");

        let result = Analyzer::builder()
            .root(dir.path())
            .rule(EveryFunction)
            .build()
            .unwrap()
            .analyze()
            .unwrap();
        assert!(result
            .violations
            .iter()
            .all(|v| v.location.file != Path::new("gen/gen.go")));
        assert_eq!(result.files_checked, 3);
    }
}
