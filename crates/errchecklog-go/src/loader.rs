//! Groups parsed Go files into packages with import paths.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ast::{ExprIdGen, SourceFile};
use crate::parser::{GoParser, ParseError};

/// Errors produced while loading Go sources.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Reading a file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A file failed to parse.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File that could not be parsed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: ParseError,
    },
}

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path as discovered.
    pub path: PathBuf,
    /// File contents.
    pub content: String,
    /// Syntax tree.
    pub ast: SourceFile,
}

/// A Go package: the files of one directory sharing a `package` clause.
#[derive(Debug, Clone)]
pub struct Package {
    /// Import path.
    pub path: String,
    /// Name from the `package` clause.
    pub name: String,
    /// Directory containing the files.
    pub dir: PathBuf,
    /// Files in path order.
    pub files: Vec<ParsedFile>,
}

impl Package {
    /// Builds a package from in-memory `(file name, source)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Parse`] for the first source that fails to parse.
    pub fn from_sources(path: &str, sources: &[(&str, &str)]) -> Result<Self, LoadError> {
        let mut parser = GoParser::new().map_err(|source| LoadError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        let mut ids = ExprIdGen::new();
        let mut files = Vec::with_capacity(sources.len());
        for (name, content) in sources {
            let ast = parser
                .parse(content, &mut ids)
                .map_err(|source| LoadError::Parse {
                    path: PathBuf::from(name),
                    source,
                })?;
            files.push(ParsedFile {
                path: PathBuf::from(name),
                content: (*content).to_string(),
                ast,
            });
        }
        let name = files
            .first()
            .map(|f| f.ast.package.name.clone())
            .unwrap_or_default();
        Ok(Self {
            path: path.to_string(),
            name,
            dir: PathBuf::new(),
            files,
        })
    }
}

/// The module a load belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Module path from `go.mod`.
    pub path: String,
    /// Directory containing `go.mod`.
    pub root: PathBuf,
}

/// Parses files and assembles them into packages.
///
/// Expression ids are unique across everything one loader parses.
pub struct PackageLoader {
    root: PathBuf,
    module: Option<Module>,
    parser: GoParser,
    ids: ExprIdGen,
}

impl PackageLoader {
    /// Creates a loader for sources under `root`, locating the enclosing
    /// module's `go.mod` if there is one.
    ///
    /// # Errors
    ///
    /// Fails if the Go grammar cannot be loaded.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ParseError> {
        let root = root.into();
        let module = find_module(&root);
        match &module {
            Some(m) => debug!("Module {} at {}", m.path, m.root.display()),
            None => debug!("No go.mod found above {}", root.display()),
        }
        Ok(Self {
            root,
            module,
            parser: GoParser::new()?,
            ids: ExprIdGen::new(),
        })
    }

    /// The module the root belongs to, if any.
    #[must_use]
    pub fn module(&self) -> Option<&Module> {
        self.module.as_ref()
    }

    /// Reads and parses one file.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the file cannot be read or parsed.
    pub fn parse_file(&mut self, path: &Path) -> Result<ParsedFile, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let ast = self
            .parser
            .parse(&content, &mut self.ids)
            .map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(ParsedFile {
            path: path.to_path_buf(),
            content,
            ast,
        })
    }

    /// Groups files by directory and package clause.
    ///
    /// Packages are returned ordered by import path; files keep their order.
    #[must_use]
    pub fn assemble(&self, files: Vec<ParsedFile>) -> Vec<Package> {
        let mut groups: BTreeMap<(PathBuf, String), Vec<ParsedFile>> = BTreeMap::new();
        for file in files {
            let dir = file
                .path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let name = file.ast.package.name.clone();
            groups.entry((dir, name)).or_default().push(file);
        }

        let mut packages: Vec<Package> = groups
            .into_iter()
            .map(|((dir, name), mut files)| {
                files.sort_by(|a, b| a.path.cmp(&b.path));
                let mut path = self.import_path(&dir, &name);
                if name.ends_with("_test") {
                    path.push_str("_test");
                }
                debug!("Package {} ({} files)", path, files.len());
                Package {
                    path,
                    name,
                    dir,
                    files,
                }
            })
            .collect();
        packages.sort_by(|a, b| a.path.cmp(&b.path));
        packages
    }

    fn import_path(&self, dir: &Path, name: &str) -> String {
        if let Some(module) = &self.module {
            let abs = absolute(dir);
            if let Ok(rel) = abs.strip_prefix(&module.root) {
                let rel = slash_path(rel);
                return if rel.is_empty() {
                    module.path.clone()
                } else {
                    format!("{}/{rel}", module.path)
                };
            }
        }
        let rel = slash_path(dir.strip_prefix(&self.root).unwrap_or(dir));
        if rel.is_empty() {
            name.trim_end_matches("_test").to_string()
        } else {
            rel
        }
    }
}

/// Whether `path` is a Go test file.
#[must_use]
pub fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("_test.go"))
}

/// Finds the nearest `go.mod` at or above `start`.
#[must_use]
pub fn find_module(start: &Path) -> Option<Module> {
    let start = absolute(start);
    start.ancestors().find_map(|dir| {
        let content = fs::read_to_string(dir.join("go.mod")).ok()?;
        let path = parse_module_path(&content)?;
        Some(Module {
            path,
            root: dir.to_path_buf(),
        })
    })
}

/// Extracts the module path from `go.mod` contents.
#[must_use]
pub fn parse_module_path(go_mod: &str) -> Option<String> {
    go_mod.lines().find_map(|line| {
        let line = line.split("//").next().unwrap_or("").trim();
        let rest = line.strip_prefix("module")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let path = rest.trim().trim_matches('"').trim_matches('`');
        (!path.is_empty()).then(|| path.to_string())
    })
}

fn absolute(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| c.as_os_str().to_str())
        .filter(|c| *c != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn parses_module_directive() {
        assert_eq!(
            parse_module_path("// comment\nmodule example.com/app\n\ngo 1.22\n").as_deref(),
            Some("example.com/app")
        );
        assert_eq!(
            parse_module_path("module \"example.com/quoted\" // trailing\n").as_deref(),
            Some("example.com/quoted")
        );
        assert_eq!(parse_module_path("modules x\n"), None);
        assert_eq!(parse_module_path("go 1.22\n"), None);
    }

    #[test]
    fn detects_test_files() {
        assert!(is_test_file(Path::new("pkg/handler_test.go")));
        assert!(!is_test_file(Path::new("pkg/handler.go")));
        assert!(!is_test_file(Path::new("pkg/test.go")));
    }

    #[test]
    fn assembles_packages_with_module_paths() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "go.mod", "module example.com/app\n\ngo 1.22\n");
        let main = write(dir.path(), "main.go", "package main\n\nfunc main() {}\n");
        let logging = write(
            dir.path(),
            "logging/logging.go",
            "package logging\n\ntype Reporter interface {\n\tReport(err error)\n}\n",
        );
        let internal = write(
            dir.path(),
            "logging/logging_test.go",
            "package logging\n\nfunc helper() {}\n",
        );
        let external = write(
            dir.path(),
            "logging/external_test.go",
            "package logging_test\n\nfunc helper() {}\n",
        );

        let mut loader = PackageLoader::new(dir.path()).unwrap();
        assert_eq!(
            loader.module().map(|m| m.path.as_str()),
            Some("example.com/app")
        );
        let files = [main, logging, internal, external]
            .iter()
            .map(|p| loader.parse_file(p).unwrap())
            .collect();
        let packages = loader.assemble(files);

        let paths: Vec<&str> = packages.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "example.com/app",
                "example.com/app/logging",
                "example.com/app/logging_test"
            ]
        );
        assert_eq!(packages[1].name, "logging");
        assert_eq!(packages[1].files.len(), 2);
    }

    #[test]
    fn falls_back_to_relative_paths_without_go_mod() {
        let dir = tempfile::tempdir().unwrap();
        let root_file = write(dir.path(), "main.go", "package main\n");
        let nested = write(dir.path(), "svc/api/api.go", "package api\n");

        let mut loader = PackageLoader::new(dir.path()).unwrap();
        if loader.module().is_some() {
            // A go.mod above the temp dir would take precedence.
            return;
        }
        let files = vec![
            loader.parse_file(&root_file).unwrap(),
            loader.parse_file(&nested).unwrap(),
        ];
        let paths: Vec<String> = loader.assemble(files).into_iter().map(|p| p.path).collect();
        assert_eq!(paths, vec!["main".to_string(), "svc/api".to_string()]);
    }

    #[test]
    fn reports_parse_failures_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let broken = write(dir.path(), "broken.go", "package p\n\nfunc (\n");
        let mut loader = PackageLoader::new(dir.path()).unwrap();
        let err = loader.parse_file(&broken).unwrap_err();
        assert!(matches!(err, LoadError::Parse { ref path, .. } if *path == broken));
    }

    #[test]
    fn from_sources_builds_one_package() {
        let pkg = Package::from_sources(
            "example.com/app/handler",
            &[
                ("a.go", "package handler\n\nvar a = 1\n"),
                ("b.go", "package handler\n\nvar b = 2\n"),
            ],
        )
        .unwrap();
        assert_eq!(pkg.name, "handler");
        assert_eq!(pkg.files.len(), 2);
    }
}
