use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use httpmock::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn cargo_bin() -> Command {
    Command::cargo_bin("burstpit").expect("binary exists")
}

#[test]
fn displays_help() {
    let mut cmd = cargo_bin();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "Fire one HTTP request many times",
        ));
}

#[test]
fn displays_version() {
    let mut cmd = cargo_bin();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn errors_when_request_missing() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path());
    cmd.arg("missing.json");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("missing.json"));
}

#[test]
fn prints_json_report() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/items")
            .header("content-type", "application/json")
            .body("{\"name\":\"widget\"}");
        then.status(201).body("created");
    });

    temp.child("create.json")
        .write_str(&format!(
            r#"{{"url": "{}", "method": "post", "body": {{"name": "widget"}}, "frequency": 3, "timeout": 5}}"#,
            server.url("/items")
        ))
        .unwrap();

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path());
    cmd.arg("create.json").arg("--json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"total\": 3"))
        .stdout(predicate::str::contains("\"success\": 3"))
        .stdout(predicate::str::contains("\"uniqueResults\""))
        .stdout(predicate::str::contains("\"status_code\": 201"));

    mock.assert_hits(3);
}

#[test]
fn expands_placeholders_from_config_and_writes_audit_log() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/ping")
            .query_param("who", "ada")
            .header("authorization", "Bearer t0k");
        then.status(200).body("pong");
    });

    temp.child("burstpit.json")
        .write_str(&format!(
            r#"{{"concurrency": 2, "logDir": "logs", "env": "run.env", "variables": {{"BASE": "{}"}}}}"#,
            server.base_url()
        ))
        .unwrap();
    temp.child("run.env").write_str("TOKEN=t0k\n").unwrap();
    temp.child("ping.json")
        .write_str(
            r#"{"url": "{BASE}/ping", "header": {"Authorization": "Bearer {TOKEN}"}, "params": {"who": "ada"}, "frequency": 2}"#,
        )
        .unwrap();

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path());
    cmd.arg("ping.json").arg("--quiet");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Success:"))
        .stdout(predicate::str::contains("pong"));

    mock.assert_hits(2);
    temp.child("logs/request.log")
        .assert(predicate::str::contains("success: 2, fail: 0"));
}

#[test]
fn zero_concurrency_is_a_run_level_error() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("req.json")
        .write_str(r#"{"url": "http://127.0.0.1:9/", "frequency": 1}"#)
        .unwrap();

    let mut cmd = cargo_bin();
    cmd.current_dir(temp.path());
    cmd.arg("req.json").arg("-C").arg("0");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("concurrency cap must be at least 1"));
}
