use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn scan_json(extra: &[&str]) -> serde_json::Value {
    let fixture = fixture_path("polyglot");
    let mut args = vec!["scan", fixture.to_str().unwrap(), "--format", "json", "--quiet"];
    args.extend_from_slice(extra);
    let output = Command::cargo_bin("routescan")
        .unwrap()
        .args(&args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).unwrap()
}

fn routes(json: &serde_json::Value) -> Vec<(String, String)> {
    json["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["method"].as_str().unwrap().to_string(),
                e["path"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[test]
fn scan_polyglot_json() {
    let json = scan_json(&[]);

    assert_eq!(json["metadata"]["files_scanned"], 6);
    assert_eq!(json["metadata"]["files_matched"], 6);
    assert_eq!(json["metadata"]["files_skipped"], 0);
    assert_eq!(json["metadata"]["endpoint_count"], 11);
    assert_eq!(json["metadata"]["frameworks"]["Spring"], 3);
    assert_eq!(json["metadata"]["frameworks"]["JAX-RS"], 2);
    assert_eq!(json["metadata"]["frameworks"]["Echo"], 1);
    assert_eq!(json["metadata"]["frameworks"]["FastAPI"], 2);
    assert_eq!(json["metadata"]["frameworks"]["Flask"], 1);
    assert_eq!(json["metadata"]["frameworks"]["Flask-RESTful"], 2);
    assert!(json["metadata"]["frameworks"]["Gin"].is_null());

    let expected: Vec<(String, String)> = [
        ("GET", "/api/v1/ping"),
        ("GET", "/orders"),
        ("POST", "/orders/{id}/cancel"),
        ("GET", "/api/users"),
        ("POST", "/api/users"),
        ("DELETE", "/api/users/{id}"),
        ("GET", "/users"),
        ("POST", "/users"),
        ("GET", "/health"),
        ("GET", "/items"),
        ("PUT", "/items/{item_id}"),
    ]
    .iter()
    .map(|(m, p)| (m.to_string(), p.to_string()))
    .collect();
    assert_eq!(routes(&json), expected);
}

#[test]
fn scan_reports_location_and_owner() {
    let json = scan_json(&[]);
    let list = json["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["handler"] == "list")
        .unwrap();

    assert_eq!(list["owner"], "UserController");
    assert_eq!(list["framework"], "Spring");
    assert_eq!(
        list["file"],
        "java/src/main/java/com/shop/UserController.java"
    );
    assert_eq!(list["line"], 9);
}

#[test]
fn scan_skips_tests_and_dependencies_by_default() {
    let json = scan_json(&[]);
    let paths: Vec<String> = routes(&json).into_iter().map(|(_, p)| p).collect();
    assert!(!paths.contains(&"/from-test".to_string()));
    assert!(!paths.contains(&"/test-only".to_string()));
    assert!(!paths.contains(&"/vendored".to_string()));
}

#[test]
fn scan_include_tests() {
    let json = scan_json(&["--include-tests"]);
    let paths: Vec<String> = routes(&json).into_iter().map(|(_, p)| p).collect();
    assert!(paths.contains(&"/from-test".to_string()));
    assert!(paths.contains(&"/test-only".to_string()));
    assert!(!paths.contains(&"/vendored".to_string()));
}

#[test]
fn scan_framework_filter() {
    let json = scan_json(&["--framework", "flask"]);
    assert_eq!(
        routes(&json),
        vec![
            ("GET".to_string(), "/users".to_string()),
            ("POST".to_string(), "/users".to_string()),
            ("GET".to_string(), "/health".to_string()),
        ]
    );
}

#[test]
fn scan_exclude_glob() {
    let json = scan_json(&["--exclude", "java/**"]);
    assert_eq!(json["metadata"]["endpoint_count"], 6);
    assert!(json["metadata"]["frameworks"]["Spring"].is_null());
}

#[test]
fn scan_text_output() {
    Command::cargo_bin("routescan")
        .unwrap()
        .args([
            "scan",
            fixture_path("polyglot").to_str().unwrap(),
            "--format",
            "text",
            "--quiet",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("GET /api/users"))
        .stdout(predicate::str::contains("UserController.list"))
        .stdout(predicate::str::contains("[Flask-RESTful]"))
        .stdout(predicate::str::contains("py/app.py:16"));
}

#[test]
fn scan_prints_summary_unless_quiet() {
    Command::cargo_bin("routescan")
        .unwrap()
        .args(["scan", fixture_path("polyglot").to_str().unwrap()])
        .assert()
        .success()
        .stderr(predicate::str::contains("Found 11 endpoints"));
}

#[test]
fn scan_empty_dir_fails() {
    let tmp = tempfile::tempdir().unwrap();
    Command::cargo_bin("routescan")
        .unwrap()
        .args(["scan", tmp.path().to_str().unwrap(), "--quiet"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No scannable files"));
}

#[test]
fn scan_missing_path_fails() {
    Command::cargo_bin("routescan")
        .unwrap()
        .args(["scan", "/definitely/not/here", "--quiet"])
        .assert()
        .failure();
}

#[test]
fn scan_unreadable_file_is_skipped() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join("app.py"),
        "from flask import Flask\n@app.route('/ok')\ndef ok():\n    pass\n",
    )
    .unwrap();
    std::fs::write(tmp.path().join("binary.py"), [0xff, 0xfe, 0x00, 0x81]).unwrap();

    let output = Command::cargo_bin("routescan")
        .unwrap()
        .args(["scan", tmp.path().to_str().unwrap(), "--format", "json", "--quiet"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["metadata"]["files_scanned"], 2);
    assert_eq!(json["metadata"]["files_skipped"], 1);
    assert_eq!(json["metadata"]["endpoint_count"], 1);
}
