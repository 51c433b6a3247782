//! Integration tests for the `netpresence` CLI binary.
//!
//! Argument parsing, completions and config handling run without a router.
//! The `hosts` and `watch --once` cases run against a wiremock router.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const NONEXISTENT_HOME: &str = "/tmp/netpresence-cli-test-nonexistent";

/// Build a [`Command`] for the `netpresence` binary with env isolation.
///
/// Clears all `NETPRESENCE_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn np_cmd_in(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netpresence");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("RUST_LOG")
        .env_remove("NETPRESENCE_PROFILE")
        .env_remove("NETPRESENCE_ROUTER")
        .env_remove("NETPRESENCE_OUTPUT")
        .env_remove("NETPRESENCE_INSECURE")
        .env_remove("NETPRESENCE_TIMEOUT")
        .env_remove("NETPRESENCE_USERNAME")
        .env_remove("NETPRESENCE_PASSWORD");
    cmd
}

fn np_cmd() -> assert_cmd::Command {
    np_cmd_in(Path::new(NONEXISTENT_HOME))
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// A router answering login, logout and a two-row host table.
async fn mock_router() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "ok" })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/session/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "ok" })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/host/hostTbl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "ok",
            "data": {
                "hostTbl": [
                    {
                        "ipaddress": "10.0.0.10",
                        "physaddress": "11:22:33:44:55:66",
                        "hostname": "tv",
                        "active": "false",
                        "Status": "offline"
                    },
                    {
                        "ipaddress": "10.0.0.5",
                        "physaddress": "AA-BB-CC-DD-EE-FF",
                        "hostname": "phone",
                        "active": "true"
                    }
                ]
            }
        })))
        .mount(&server)
        .await;

    server
}

/// Run a blocking command from inside an async test.
async fn run_blocking(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = np_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    np_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("host table")
            .and(predicate::str::contains("hosts"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    np_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netpresence"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    np_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    np_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = np_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_hosts_without_config() {
    let output = np_cmd().arg("hosts").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(
        text.contains("Configuration file not found"),
        "Expected missing-config error:\n{text}"
    );
}

#[test]
fn test_hosts_router_without_username() {
    let output = np_cmd()
        .args(["hosts", "--router", "10.0.0.1", "--password", "pw"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "Expected auth exit code");
}

#[test]
fn test_watch_interval_must_be_numeric() {
    let output = np_cmd()
        .args(["watch", "--interval", "soon"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path() {
    np_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_defaults() {
    np_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[defaults]"));
}

#[test]
fn test_config_init_plaintext_then_options() {
    let home = tempfile::tempdir().unwrap();

    np_cmd_in(home.path())
        .args([
            "config",
            "init",
            "--plaintext",
            "--profile",
            "home",
            "--router",
            "192.168.0.1",
            "--username",
            "admin",
            "--password",
            "hunter2",
        ])
        .assert()
        .success();

    np_cmd_in(home.path())
        .args([
            "config",
            "options",
            "--profile",
            "home",
            "--disabled-ips",
            "10.0.0.9, 10.0.0.5",
            "--name-overrides",
            "AA-BB-CC-DD-EE-FF = Alice's Phone",
        ])
        .assert()
        .success();

    np_cmd_in(home.path())
        .args(["config", "options", "--profile", "home"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("scan_interval = 300")
                .and(predicate::str::contains("disabled_ips = 10.0.0.5, 10.0.0.9"))
                .and(predicate::str::contains("aa:bb:cc:dd:ee:ff = Alice's Phone")),
        );

    np_cmd_in(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.home]")
                .and(predicate::str::contains("****"))
                .and(predicate::str::contains("hunter2").not()),
        );
}

#[test]
fn test_config_init_requires_router_when_not_interactive() {
    let home = tempfile::tempdir().unwrap();
    let output = np_cmd_in(home.path())
        .args(["config", "init", "--plaintext"])
        .write_stdin("")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--router"));
}

// ── Against a mock router ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hosts_json_against_mock_router() {
    let server = mock_router().await;

    let mut cmd = np_cmd();
    cmd.args([
        "hosts",
        "-o",
        "json",
        "--router",
        &server.uri(),
        "--username",
        "admin",
        "--password",
        "pw",
    ]);
    let output = run_blocking(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let hosts: Value = serde_json::from_slice(&output.stdout).unwrap();
    let hosts = hosts.as_array().unwrap();
    assert_eq!(hosts.len(), 2);
    assert_eq!(hosts[0]["ip"], "10.0.0.5");
    assert_eq!(hosts[0]["online"], true);
    assert_eq!(hosts[1]["ip"], "10.0.0.10");
    assert_eq!(hosts[1]["online"], false);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hosts_table_shows_totals() {
    let server = mock_router().await;

    let mut cmd = np_cmd();
    cmd.args([
        "hosts",
        "--color",
        "never",
        "--router",
        &server.uri(),
        "--username",
        "admin",
        "--password",
        "pw",
    ]);
    let output = run_blocking(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("phone"), "{stdout}");
    assert!(
        stdout.contains("Total devices: 2 — Online: 1 — Offline: 1"),
        "{stdout}"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_watch_once_prints_entities() {
    let server = mock_router().await;

    let mut cmd = np_cmd();
    cmd.args([
        "watch",
        "--once",
        "-o",
        "json",
        "--router",
        &server.uri(),
        "--username",
        "admin",
        "--password",
        "pw",
    ]);
    let output = run_blocking(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let entities: Value = serde_json::from_slice(&output.stdout).unwrap();
    let entities = entities.as_array().unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0]["unique_id"], "default_tracker_ip_10.0.0.5");
    assert_eq!(entities[0]["name"], "phone Network Presence");
    assert_eq!(entities[0]["mac"], "aa:bb:cc:dd:ee:ff");
    assert_eq!(entities[0]["state"], "home");
    assert_eq!(entities[0]["source_type"], "router");
    assert_eq!(entities[1]["state"], "not_home");
}

#[test]
fn test_hosts_router_down_is_connection_error() {
    // Reserve a port, then free it so nothing is listening there.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let uri = format!("http://127.0.0.1:{port}");

    let output = np_cmd()
        .args([
            "hosts", "--router", &uri, "--username", "admin", "--password", "pw",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7), "{}", combined_output(&output));
}
