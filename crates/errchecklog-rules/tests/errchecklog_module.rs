//! Runs the errchecklog rule through the analyzer over on-disk Go modules.

use std::fs;
use std::path::Path;

use errchecklog_core::{Analyzer, Config, LintResult};
use errchecklog_rules::ErrCheckLog;

fn write(dir: &Path, rel: &str, content: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn analyze(dir: &Path, config: &str) -> LintResult {
    let config = Config::parse(config).unwrap();
    Analyzer::builder()
        .root(dir)
        .rule(ErrCheckLog::from_config(&config))
        .config(config)
        .build()
        .unwrap()
        .analyze()
        .unwrap()
}

fn rendered(result: &LintResult) -> String {
    result
        .violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

const TARGET: &str = r#"
[rules.errchecklog]
ifacepkg = "example.com/app/logging"
ifacename = "Reporter"
"#;

fn service_module() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "go.mod", "module example.com/app\n\ngo 1.22\n");
    write(
        dir.path(),
        "logging/logging.go",
        r#"package logging

type Reporter interface {
	Report(err error)
}
"#,
    );
    write(
        dir.path(),
        "handler/handler.go",
        r#"package handler

import (
	"encoding/json"
	"net/http"
	"strconv"

	"example.com/app/logging"
)

type Handler struct {
	log logging.Reporter
}

type request struct {
	ID string `json:"id"`
}

func (h *Handler) Handle(w http.ResponseWriter, r *http.Request) {
	var req request
	if err := json.NewDecoder(r.Body).Decode(&req); err != nil {
		h.log.Report(err)
		return
	}
	id, err := strconv.Atoi(req.ID)
	if err != nil {
		http.Error(w, "bad id", http.StatusBadRequest)
		return
	}
	_ = id
}

func handle(log logging.Reporter, raw string) error {
	if _, err := strconv.ParseBool(raw); err != nil {
		return err
	}
	return nil
}
"#,
    );
    dir
}

#[test]
fn reports_unlogged_guards_in_handlers() {
    let dir = service_module();
    let result = analyze(dir.path(), TARGET);

    insta::assert_snapshot!(rendered(&result), @r"
    handler/handler.go:26:2: error [ECL001] if err != nil block does NOT contain a call to example.com/app/logging.Reporter
    handler/handler.go:34:2: error [ECL001] if err != nil block does NOT contain a call to example.com/app/logging.Reporter
    ");
    assert_eq!(result.packages_checked, 2);
    assert!(result.has_errors());
}

#[test]
fn unconfigured_rule_is_silent() {
    let dir = service_module();
    let result = analyze(dir.path(), "");
    assert!(result.violations.is_empty());
    assert_eq!(result.files_checked, 2);

    let result = analyze(
        dir.path(),
        "[rules.errchecklog]\nifacepkg = \"example.com/app/logging\"\n",
    );
    assert!(result.violations.is_empty());
}

#[test]
fn severity_and_enablement_come_from_config() {
    let dir = service_module();
    let result = analyze(dir.path(), &format!("{TARGET}severity = \"warning\"\n"));
    assert_eq!(result.violations.len(), 2);
    assert!(!result.has_errors());
    assert!(result.has_warnings());

    let result = analyze(dir.path(), &format!("{TARGET}enabled = false\n"));
    assert!(result.violations.is_empty());
}

#[test]
fn target_from_unloaded_package_is_matched_by_import_path() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "go.mod", "module example.com/svc\n\ngo 1.22\n");
    write(
        dir.path(),
        "main.go",
        r#"package main

import (
	"os"

	"github.com/acme/observe"
)

func Handle(r observe.Reporter) {
	if _, err := os.ReadFile("config.json"); err != nil {
		r.Capture(err)
	}
	if err := os.Remove("stale.lock"); err != nil {
		return
	}
}

func main() {}
"#,
    );

    let result = analyze(
        dir.path(),
        "[rules.errchecklog]\nifacepkg = \"github.com/acme/observe\"\nifacename = \"Reporter\"\n",
    );
    insta::assert_snapshot!(rendered(&result), @"main.go:13:2: error [ECL001] if err != nil block does NOT contain a call to github.com/acme/observe.Reporter");
}

#[test]
fn custom_error_types_are_guards() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "go.mod", "module example.com/app\n\ngo 1.22\n");
    write(
        dir.path(),
        "logging/logging.go",
        "package logging\n\ntype Reporter interface {\n\tReport(err error)\n}\n",
    );
    write(
        dir.path(),
        "api/api.go",
        r#"package api

type NotFound struct {
	Key string
}

func (e *NotFound) Error() string {
	return "not found: " + e.Key
}

func lookup(key string) *NotFound {
	return nil
}

func Handle(key string) {
	if nf := lookup(key); nf != nil {
		return
	}
	if code := len(key); code != 0 {
		return
	}
}
"#,
    );

    let result = analyze(dir.path(), TARGET);
    insta::assert_snapshot!(rendered(&result), @"api/api.go:16:2: error [ECL001] if err != nil block does NOT contain a call to example.com/app/logging.Reporter");
}

#[test]
fn subdirectory_check_resolves_module_packages() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "go.mod", "module example.com/app\n\ngo 1.22\n");
    write(
        dir.path(),
        "logging/logging.go",
        r#"package logging

type Reporter interface {
	Report(err error)
}

func New() Reporter {
	return nil
}
"#,
    );
    write(
        dir.path(),
        "api/api.go",
        r#"package api

import (
	"os"

	"example.com/app/logging"
)

func Handle() {
	l := logging.New()
	if err := os.Remove("a.lock"); err != nil {
		l.Report(err)
	}
	if err := os.Remove("b.lock"); err != nil {
		return
	}
}
"#,
    );

    let whole = analyze(dir.path(), TARGET);
    insta::assert_snapshot!(rendered(&whole), @"api/api.go:14:2: error [ECL001] if err != nil block does NOT contain a call to example.com/app/logging.Reporter");

    let api = analyze(&dir.path().join("api"), TARGET);
    insta::assert_snapshot!(rendered(&api), @"api.go:14:2: error [ECL001] if err != nil block does NOT contain a call to example.com/app/logging.Reporter");
    assert_eq!(api.files_checked, 1);
}

#[test]
fn import_binds_package_name_not_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "go.mod", "module example.com/app\n\ngo 1.22\n");
    write(
        dir.path(),
        "go-logging/logging.go",
        "package logging\n\ntype Reporter interface {\n\tReport(err error)\n}\n",
    );
    write(
        dir.path(),
        "api/api.go",
        r#"package api

import (
	"os"

	"example.com/app/go-logging"
)

func Handle(l logging.Reporter) {
	if err := os.Remove("a.lock"); err != nil {
		l.Report(err)
	}
	if err := os.Remove("b.lock"); err != nil {
		return
	}
}
"#,
    );

    let result = analyze(
        dir.path(),
        "[rules.errchecklog]\nifacepkg = \"example.com/app/go-logging\"\nifacename = \"Reporter\"\n",
    );
    insta::assert_snapshot!(rendered(&result), @"api/api.go:13:2: error [ECL001] if err != nil block does NOT contain a call to example.com/app/go-logging.Reporter");
}

#[test]
fn embedded_error_makes_a_guard() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "go.mod", "module example.com/app\n\ngo 1.22\n");
    write(
        dir.path(),
        "logging/logging.go",
        "package logging\n\ntype Reporter interface {\n\tReport(err error)\n}\n",
    );
    write(
        dir.path(),
        "api/api.go",
        r#"package api

type wrapped struct {
	error
}

func get() *wrapped {
	return nil
}

func Handle() {
	err := get()
	if err != nil {
		return
	}
}
"#,
    );

    let result = analyze(dir.path(), TARGET);
    insta::assert_snapshot!(rendered(&result), @"api/api.go:13:2: error [ECL001] if err != nil block does NOT contain a call to example.com/app/logging.Reporter");
}
