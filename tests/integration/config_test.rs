use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

/// `routescan` with no user config and no ROUTESCAN_* variables leaking in.
fn routescan(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("routescan").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home);
    for key in [
        "ROUTESCAN_FORMAT",
        "ROUTESCAN_QUIET",
        "ROUTESCAN_INCLUDE_TESTS",
        "ROUTESCAN_INCLUDE",
        "ROUTESCAN_EXCLUDE",
        "ROUTESCAN_FRAMEWORKS",
        "ROUTESCAN_DEBOUNCE_MS",
    ] {
        cmd.env_remove(key);
    }
    cmd
}

fn write_flask_app(dir: &Path) {
    std::fs::write(
        dir.join("app.py"),
        "from flask import Flask\napp = Flask(__name__)\n\n@app.route('/ok', methods=['POST'])\ndef ok():\n    pass\n",
    )
    .unwrap();
}

#[test]
fn config_show_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    routescan(home.path())
        .args(["config", "show", "--path", tmp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded config files: (none)"))
        .stdout(predicate::str::contains("Resolved settings:"))
        .stdout(predicate::str::contains("defaults.format: text <- default"))
        .stdout(predicate::str::contains("defaults.quiet: false <- default"))
        .stdout(predicate::str::contains("watch.debounce_ms: 250 <- default"))
        .stdout(predicate::str::contains(
            "frameworks.enabled: [\"Spring\", \"JAX-RS\", \"Gin\", \"Echo\", \"FastAPI\", \"Flask\"] <- default",
        ));
}

#[test]
fn config_show_with_project_config() {
    let tmp = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join(".routescan.toml"),
        r#"
[defaults]
format = "json"
quiet = true

[frameworks]
enabled = ["flask", "spring"]

[watch]
debounce_ms = 500
"#,
    )
    .unwrap();

    routescan(home.path())
        .args(["config", "show", "--path", tmp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(".routescan.toml"))
        .stdout(predicate::str::contains("defaults.format: json <- project config"))
        .stdout(predicate::str::contains("defaults.quiet: true <- project config"))
        .stdout(predicate::str::contains(
            "frameworks.enabled: [\"Spring\", \"Flask\"] <- project config",
        ))
        .stdout(predicate::str::contains("watch.debounce_ms: 500 <- project config"));
}

#[test]
fn config_show_env_override() {
    let tmp = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    routescan(home.path())
        .env("ROUTESCAN_FORMAT", "json")
        .args(["config", "show", "--path", tmp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "defaults.format: json <- env var (ROUTESCAN_FORMAT)",
        ));
}

#[test]
fn config_show_lists_ignore_patterns() {
    let tmp = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join(".routescanignore"), "# generated\ngen/\n").unwrap();

    routescan(home.path())
        .args(["config", "show", "--path", tmp.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ignore file patterns:"))
        .stdout(predicate::str::contains("gen/**"));
}

#[test]
fn config_show_invalid_path() {
    let home = tempfile::tempdir().unwrap();
    routescan(home.path())
        .args(["config", "show", "--path", "/definitely/not/here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid path"));
}

#[test]
fn project_config_drives_scan() {
    let tmp = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    write_flask_app(tmp.path());
    std::fs::write(
        tmp.path().join(".routescan.toml"),
        "[defaults]\nformat = \"json\"\nquiet = true\n",
    )
    .unwrap();

    let output = routescan(home.path())
        .args(["scan", tmp.path().to_str().unwrap()])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["endpoints"][0]["method"], "POST");
    assert_eq!(json["endpoints"][0]["path"], "/ok");
}

#[test]
fn cli_flag_beats_project_config() {
    let tmp = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    write_flask_app(tmp.path());
    std::fs::write(
        tmp.path().join(".routescan.toml"),
        "[defaults]\nformat = \"json\"\n",
    )
    .unwrap();

    routescan(home.path())
        .args(["scan", tmp.path().to_str().unwrap(), "--format", "text", "--quiet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("POST /ok"))
        .stdout(predicate::str::contains("\"metadata\"").not());
}

#[test]
fn ignore_file_excludes_from_scan() {
    let tmp = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    write_flask_app(tmp.path());
    std::fs::create_dir(tmp.path().join("gen")).unwrap();
    write_flask_app(&tmp.path().join("gen"));
    std::fs::write(tmp.path().join(".routescanignore"), "gen/\n").unwrap();

    let output = routescan(home.path())
        .args(["scan", tmp.path().to_str().unwrap(), "--format", "json", "--quiet"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["metadata"]["files_scanned"], 1);
}

#[test]
fn malformed_config_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join(".routescan.toml"), "[defaults\nformat = ").unwrap();

    routescan(home.path())
        .args(["config", "show", "--path", tmp.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid project config"));
}

#[test]
fn unknown_framework_in_config_is_an_error() {
    let tmp = tempfile::tempdir().unwrap();
    let home = tempfile::tempdir().unwrap();
    std::fs::write(
        tmp.path().join(".routescan.toml"),
        "[frameworks]\nenabled = [\"django\"]\n",
    )
    .unwrap();

    routescan(home.path())
        .args(["config", "show", "--path", tmp.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("django"));
}
