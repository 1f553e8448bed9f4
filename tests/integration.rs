//! Integration tests for the abook-parser commands

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

const BOOK: &str = "# abook addressbook file

[format]
program=abook
version=0.6.1


[0]
name=Alice
email=alice@example.com

[1]
nick=zed

[2]
name=bob
email=bob@example.com
phone=555-0100
";

/// Addressbook plus a config whose editor is a non-interactive `sed` script.
struct TestEnv {
    temp_dir: TempDir,
    config_path: PathBuf,
    book_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_editor(r"'sed', '-i', 's/Alice/Alicia/'")
    }

    /// `editor` is the body of a TOML array, e.g. `'sed', '-i', 's/a/b/'`.
    fn with_editor(editor: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let book_path = temp_dir.path().join("addressbook");

        fs::write(&book_path, BOOK).unwrap();
        fs::write(
            &config_path,
            format!(
                "addressbook = '{}'\n\n[editor]\ncommand = [{}]\n",
                book_path.display(),
                editor
            ),
        )
        .unwrap();

        Self {
            temp_dir,
            config_path,
            book_path,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = abook_cmd();
        cmd.arg("--config").arg(&self.config_path);
        cmd
    }

    fn book(&self) -> String {
        fs::read_to_string(&self.book_path).unwrap()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }
}

fn abook_cmd() -> Command {
    let mut cmd = Command::cargo_bin("abook-parser").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

// =============================================================================
// parse
// =============================================================================

#[test]
fn test_parse_prints_abook_text() {
    let env = TestEnv::new();

    env.cmd()
        .args(["parse", path_arg(&env.book_path)])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "# abook addressbook file\n\n[format]\nprogram=abook\nversion=0.6.1\n",
        ))
        .stdout(predicate::str::contains("[1]\nnick=zed\n"))
        .stdout(predicate::str::ends_with("phone=555-0100\n"));
}

#[test]
fn test_parse_json_sorted_by_name() {
    let env = TestEnv::new();

    let output = env
        .cmd()
        .args(["parse", "-o", "json", "-k", "name", path_arg(&env.book_path)])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("{\n    \"format\": {\n        \"program\": \"abook\""));
    assert!(stdout.ends_with("}\n"));

    let value: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(value["contacts"]["0"]["name"], "Alice");
    assert_eq!(value["contacts"]["1"]["name"], "bob");
    assert_eq!(value["contacts"]["2"]["nick"], "zed");
}

#[test]
fn test_parse_reads_stdin() {
    abook_cmd()
        .args(["parse", "-o", "json", "-"])
        .write_stdin("[format]\n[5]\nname=Eve\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"5\": {\n            \"name\": \"Eve\""));
}

#[test]
fn test_parse_without_format_section_fails() {
    abook_cmd()
        .args(["parse", "-"])
        .write_stdin("[0]\nname=Eve\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing [format] section"));
}

#[test]
fn test_parse_reports_line_of_bad_section() {
    abook_cmd()
        .args(["parse", "-"])
        .write_stdin("[format]\n\n[friends]\nname=Eve\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 3"));
}

#[test]
fn test_parse_output_file() {
    let env = TestEnv::new();
    let out = env.path("out.json");

    env.cmd()
        .args([
            "parse",
            "-o",
            "json",
            "--output-file",
            path_arg(&out),
            path_arg(&env.book_path),
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = fs::read_to_string(&out).unwrap();
    assert!(written.contains("\"email\": \"bob@example.com\""));
    assert!(written.ends_with("}\n"));
}

#[test]
fn test_missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.toml");

    abook_cmd()
        .args(["--config", path_arg(&missing), "parse", "-"])
        .write_stdin("[format]\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.toml"));
}

// =============================================================================
// edit
// =============================================================================

#[test]
fn test_edit_by_query_updates_file() {
    let env = TestEnv::new();

    env.cmd()
        .args(["edit", "-q", "name:alice", path_arg(&env.book_path)])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated contact 0"));

    let text = env.book();
    assert!(text.contains("[0]\nname=Alicia\nemail=alice@example.com\n"));
    assert!(text.contains("[2]\nname=bob\n"));
    let zero = text.find("[0]").unwrap();
    let one = text.find("[1]").unwrap();
    assert!(zero < one);
}

#[test]
fn test_edit_uses_configured_addressbook() {
    let env = TestEnv::new();

    env.cmd()
        .args(["edit", "--query", "email=^alice@"])
        .assert()
        .success();

    assert!(env.book().contains("name=Alicia"));
}

#[test]
fn test_edit_case_sensitive_query_misses() {
    let env = TestEnv::new();

    env.cmd()
        .args(["edit", "-q", "name:alice", "--case-sensitive"])
        .assert()
        .success()
        .stderr(predicate::str::contains("no record matches `name:alice`"));

    assert_eq!(env.book(), BOOK);
}

#[test]
fn test_edit_without_changes_keeps_file() {
    let env = TestEnv::with_editor(r"'sed', '-i', 's/nobody/somebody/'");

    env.cmd()
        .args(["edit", "-q", "nick:zed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No changes to contact 1"));

    assert_eq!(env.book(), BOOK);
}

#[test]
fn test_edit_rejects_changed_id() {
    let env = TestEnv::with_editor(r"'sed', '-i', 's/\[0\]/[7]/'");

    env.cmd()
        .args(["edit", "-q", "name:alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("contact id changed from 0 to 7"));

    assert_eq!(env.book(), BOOK);
}

#[test]
fn test_edit_failing_editor_cancels() {
    let env = TestEnv::with_editor("'false'");

    env.cmd()
        .args(["edit", "-q", "name:alice"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cancelled"));

    assert_eq!(env.book(), BOOK);
}

#[test]
fn test_edit_rejects_stdin() {
    let env = TestEnv::new();

    env.cmd()
        .args(["edit", "-q", "name:alice", "-"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("standard input"));
}

#[test]
fn test_edit_invalid_query_fails() {
    let env = TestEnv::new();

    env.cmd()
        .args(["edit", "-q", "alice"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("alice"));

    env.cmd()
        .args(["edit", "-q", "name:("])
        .assert()
        .failure();

    assert_eq!(env.book(), BOOK);
}

// =============================================================================
// find / fields
// =============================================================================

#[test]
fn test_find_prints_fragment() {
    let env = TestEnv::new();

    env.cmd()
        .args(["find", "-q", "phone:555"])
        .assert()
        .success()
        .stdout("[2]\nname=bob\nemail=bob@example.com\nphone=555-0100\n");
}

#[test]
fn test_find_json() {
    let env = TestEnv::new();

    env.cmd()
        .args(["find", "--json", "-q", "nick:z"])
        .assert()
        .success()
        .stdout("{\n    \"1\": {\n        \"nick\": \"zed\"\n    }\n}\n");
}

#[test]
fn test_find_no_match_exits_cleanly() {
    let env = TestEnv::new();

    env.cmd()
        .args(["find", "-q", "name:nobody"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no record matches `name:nobody`"));
}

#[test]
fn test_fields_ranked_by_frequency() {
    let env = TestEnv::new();

    env.cmd()
        .args(["fields", path_arg(&env.book_path)])
        .assert()
        .success()
        .stdout("name\t2\nemail\t2\nnick\t1\nphone\t1\n");
}
