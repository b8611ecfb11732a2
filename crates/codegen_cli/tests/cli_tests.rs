//! End-to-end tests for the `codegen` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_project(dir: &Path, input: &str) {
    fs::create_dir_all(dir.join("templates")).unwrap();
    fs::write(
        dir.join("templates/base.tera"),
        "Base: {% block content %}{% endblock content %}",
    )
    .unwrap();
    fs::write(
        dir.join("page.tera"),
        r#"{% extends "base.tera" %}{% block content %}Hi, {{ Name }}!{% endblock content %}"#,
    )
    .unwrap();
    fs::write(dir.join("data.json"), input).unwrap();
    fs::write(
        dir.join("codegen.json"),
        r#"{
    "includes": ["templates/base.tera"],
    "outputs": [
        {"template": "page.tera", "input": "data.json", "output": "page.txt"}
    ]
}"#,
    )
    .unwrap();
}

#[test]
fn test_generate_is_default_command() {
    let temp = TempDir::new().unwrap();
    setup_project(temp.path(), r#"{"Name": "World"}"#);

    Command::cargo_bin("codegen")
        .unwrap()
        .current_dir(temp.path())
        .env_remove("CODEGEN_PROJECT")
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(temp.path().join("page.txt")).unwrap(),
        "Base: Hi, World!"
    );
}

#[test]
fn test_generate_with_yaml_project() {
    let temp = TempDir::new().unwrap();
    setup_project(temp.path(), r#"{"Name": "YAML"}"#);
    fs::write(
        temp.path().join("site.yaml"),
        r#"
includes:
  - templates/base.tera
outputs:
  - template: page.tera
    input: data.json
    output: from-yaml.txt
"#,
    )
    .unwrap();

    Command::cargo_bin("codegen")
        .unwrap()
        .current_dir(temp.path())
        .args(["generate", "--project", "site.yaml", "--atomic"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(temp.path().join("from-yaml.txt")).unwrap(),
        "Base: Hi, YAML!"
    );
}

#[test]
fn test_malformed_input_exits_with_parse_code() {
    let temp = TempDir::new().unwrap();
    setup_project(temp.path(), r#"{"Name": "World""#);

    Command::cargo_bin("codegen")
        .unwrap()
        .current_dir(temp.path())
        .args(["--project", "codegen.json"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains(
            "failed to parse input file 'data.json'",
        ))
        .stderr(predicate::str::contains("EOF while parsing"));

    assert!(!temp.path().join("page.txt").exists());
}

#[test]
fn test_missing_project_exits_with_io_code() {
    let temp = TempDir::new().unwrap();

    Command::cargo_bin("codegen")
        .unwrap()
        .current_dir(temp.path())
        .args(["--project", "missing.json"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn test_validate_does_not_write_outputs() {
    let temp = TempDir::new().unwrap();
    setup_project(temp.path(), r#"{"Name": "World"}"#);

    Command::cargo_bin("codegen")
        .unwrap()
        .current_dir(temp.path())
        .args(["validate", "-p", "codegen.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("All outputs are ready to render"));

    assert!(!temp.path().join("page.txt").exists());
}

#[test]
fn test_render_error_exit_code() {
    let temp = TempDir::new().unwrap();
    setup_project(temp.path(), r#"{"Other": "value"}"#);

    Command::cargo_bin("codegen")
        .unwrap()
        .current_dir(temp.path())
        .args(["-p", "codegen.json"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("page.txt"))
        .stderr(predicate::str::contains("Name"));
}

#[test]
fn test_include_syntax_error_names_file_and_cause() {
    let temp = TempDir::new().unwrap();
    setup_project(temp.path(), r#"{"Name": "World"}"#);
    fs::write(temp.path().join("templates/base.tera"), "{% if %}").unwrap();

    Command::cargo_bin("codegen")
        .unwrap()
        .current_dir(temp.path())
        .args(["-p", "codegen.json"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains(
            "failed parsing include files 'templates/base.tera': ",
        ))
        .stderr(predicate::str::contains("Failed to parse 'base.tera'"));
}
