use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn search_json(query: &str) -> serde_json::Value {
    let output = Command::cargo_bin("routescan")
        .unwrap()
        .args([
            "search",
            query,
            fixture_path("polyglot").to_str().unwrap(),
            "--format",
            "json",
            "--quiet",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn search_matches_method_case_insensitively() {
    let json = search_json("post");
    let endpoints = json["endpoints"].as_array().unwrap();
    assert_eq!(endpoints.len(), 3);
    assert!(endpoints.iter().all(|e| e["method"] == "POST"
        || e["handler"].as_str().unwrap().contains("post")));
    assert_eq!(json["metadata"]["query"], "post");
    // Totals describe the whole scan
    assert_eq!(json["metadata"]["endpoint_count"], 11);
}

#[test]
fn search_matches_framework_tag() {
    let json = search_json("jax-rs");
    let paths: Vec<&str> = json["endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["/orders", "/orders/{id}/cancel"]);
}

#[test]
fn search_matches_owner() {
    let json = search_json("userresource");
    assert_eq!(json["endpoints"].as_array().unwrap().len(), 2);
}

#[test]
fn search_without_matches_is_empty() {
    let json = search_json("graphql");
    assert_eq!(json["endpoints"], serde_json::json!([]));
}

#[test]
fn search_text_summary() {
    Command::cargo_bin("routescan")
        .unwrap()
        .args(["search", "items", fixture_path("polyglot").to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("GET /items"))
        .stdout(predicate::str::contains("PUT /items/{item_id}"))
        .stderr(predicate::str::contains("2 matching 'items'"));
}
