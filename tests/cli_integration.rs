//! End-to-end tests of the `hubkit` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A command isolated from the caller's environment and config file.
fn hubkit(config_dir: &TempDir) -> Command {
    let config = config_dir.path().join("config.toml");
    std::fs::write(&config, "").unwrap();

    let mut cmd = Command::cargo_bin("hubkit").unwrap();
    cmd.env_remove("GITHUB_PERSONAL_ACCESS_TOKEN")
        .env_remove("HUBKIT_API_BASE")
        .env_remove("RUST_LOG")
        .env("HUBKIT_CONFIG", &config);
    cmd
}

#[test]
fn help_lists_commands() {
    let dir = TempDir::new().unwrap();
    hubkit(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("tools"))
        .stdout(predicate::str::contains("call"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn tools_needs_no_token() {
    let dir = TempDir::new().unwrap();
    let output = hubkit(&dir).arg("tools").output().unwrap();
    assert!(output.status.success());

    let catalog: Vec<Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(catalog.len(), 19);
    assert!(catalog
        .iter()
        .any(|tool| tool["name"] == "push_files" && tool["inputSchema"]["type"] == "object"));
}

#[test]
fn call_without_token_fails() {
    let dir = TempDir::new().unwrap();
    hubkit(&dir)
        .args(["call", "get_issue", "--args", "{}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GITHUB_PERSONAL_ACCESS_TOKEN"));
}

#[test]
fn invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "colour = \"blue\"\n").unwrap();

    hubkit(&dir)
        .env("GITHUB_PERSONAL_ACCESS_TOKEN", "ghp_test")
        .arg("--config")
        .arg(&bad)
        .args(["call", "get_issue", "--args", "{}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn unknown_tool_fails_before_any_request() {
    let dir = TempDir::new().unwrap();
    hubkit(&dir)
        .env("GITHUB_PERSONAL_ACCESS_TOKEN", "ghp_test")
        .args(["--api-base", "http://127.0.0.1:9"])
        .args(["call", "nope", "--args", "{}"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown tool: nope"));
}

#[tokio::test(flavor = "multi_thread")]
async fn call_prints_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/pulls/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 5,
            "title": "Add feature",
            "state": "open",
            "html_url": "https://github.com/octo/demo/pull/5",
            "head": { "ref": "feature", "sha": "1111111111111111111111111111111111111111" },
            "base": { "ref": "main", "sha": "2222222222222222222222222222222222222222" },
        })))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let output = tokio::task::spawn_blocking(move || {
        let dir = TempDir::new().unwrap();
        hubkit(&dir)
            .env("GITHUB_PERSONAL_ACCESS_TOKEN", "ghp_test")
            .env("HUBKIT_API_BASE", &uri)
            .args(["call", "get_pull_request"])
            .write_stdin(r#"{"owner": "octo", "repo": "demo", "pull_number": 5}"#)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let result: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["number"], 5);
    assert_eq!(result["head"]["ref"], "feature");
}

#[tokio::test(flavor = "multi_thread")]
async fn serve_answers_each_line() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/demo/issues/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 1,
            "title": "First",
            "state": "open",
            "html_url": "https://github.com/octo/demo/issues/1",
        })))
        .mount(&server)
        .await;

    let uri = server.uri();
    let input = [
        r#"{"id": 1, "name": "get_issue", "arguments": {"owner": "octo", "repo": "demo", "issue_number": 1}}"#,
        r#"{"id": 2, "name": "get_issue", "arguments": {"owner": "octo", "repo": "demo", "issue_number": 2}}"#,
        "not json",
    ]
    .join("\n");

    let output = tokio::task::spawn_blocking(move || {
        let dir = TempDir::new().unwrap();
        hubkit(&dir)
            .env("GITHUB_PERSONAL_ACCESS_TOKEN", "ghp_test")
            .args(["--api-base", &uri, "serve"])
            .write_stdin(input)
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let lines: Vec<Value> = String::from_utf8(output.stdout)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0]["id"], 1);
    assert_eq!(lines[0]["result"]["title"], "First");
    assert_eq!(lines[1]["id"], 2);
    assert_eq!(lines[1]["error"]["kind"], "not_found");
    assert_eq!(lines[2]["error"]["kind"], "invalid_request");
}
