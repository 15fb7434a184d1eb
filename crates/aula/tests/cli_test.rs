//! Integration tests for the `aula` CLI binary.
//!
//! These tests cover argument parsing, help output, shell completions,
//! offline config commands and error exit codes. None of them needs a
//! running auditorium server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `aula` binary with env isolation.
///
/// Clears all `AULA_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn aula_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("aula");
    cmd.env("HOME", "/tmp/aula-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/aula-cli-test-nonexistent")
        .env("AULA_CONFIG", "/tmp/aula-cli-test-nonexistent/config.toml")
        .env("NO_COLOR", "1")
        .env_remove("AULA_PROFILE")
        .env_remove("AULA_SERVER")
        .env_remove("AULA_USERNAME")
        .env_remove("AULA_PASSWORD")
        .env_remove("AULA_OUTPUT")
        .env_remove("AULA_COLOR")
        .env_remove("AULA_INSECURE")
        .env_remove("AULA_TIMEOUT")
        .env_remove("AULA_NEW_PASSWORD");
    cmd
}

/// Same as [`aula_cmd`] but with the config file at `path`.
fn aula_with_config(path: &Path) -> assert_cmd::Command {
    let mut cmd = aula_cmd();
    cmd.env("AULA_CONFIG", path);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = aula_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    aula_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("auditorium")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("mode"))
            .and(predicate::str::contains("audit")),
    );
}

#[test]
fn test_version_flag() {
    aula_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("aula"));
}

#[test]
fn test_mode_help_lists_modes() {
    aula_cmd().args(["mode", "--help"]).assert().success().stdout(
        predicate::str::contains("conferencia")
            .and(predicate::str::contains("cine"))
            .and(predicate::str::contains("standby"))
            .and(predicate::str::contains("off")),
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    aula_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    aula_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Argument validation ─────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = aula_cmd().arg("foobar").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_unknown_mode_rejected() {
    aula_cmd()
        .args(["mode", "karaoke"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("karaoke"));
}

#[test]
fn test_log_limit_out_of_range() {
    aula_cmd().args(["logs", "--limit", "0"]).assert().code(2);
    aula_cmd().args(["logs", "--limit", "101"]).assert().code(2);
}

#[test]
fn test_interval_requires_follow() {
    aula_cmd().args(["logs", "--interval", "5"]).assert().code(2);
}

#[test]
fn test_invalid_output_format() {
    aula_cmd()
        .args(["-o", "xml", "status"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("xml"));
}

// ── Missing configuration ───────────────────────────────────────────

#[test]
fn test_status_without_config() {
    let output = aula_cmd().arg("status").output().unwrap();
    assert_eq!(output.status.code(), Some(8), "Expected config exit code");
    let text = combined_output(&output);
    assert!(
        text.contains("aula config init"),
        "Expected setup hint:\n{text}"
    );
}

#[test]
fn test_unknown_profile() {
    let output = aula_cmd()
        .args(["--profile", "nowhere", "stats"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(8));
    assert!(combined_output(&output).contains("nowhere"));
}

#[test]
fn test_invalid_server_url() {
    aula_cmd()
        .args(["--server", "not a url", "status"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("server"));
}

#[test]
fn test_unreachable_server() {
    let output = aula_cmd()
        .args(["--server", "http://127.0.0.1:9", "--timeout", "2", "status"])
        .output()
        .unwrap();
    assert_eq!(
        output.status.code(),
        Some(5),
        "Expected network exit code:\n{}",
        combined_output(&output)
    );
}

// ── Offline config commands ─────────────────────────────────────────

#[test]
fn test_config_profiles_empty() {
    aula_cmd()
        .args(["config", "profiles"])
        .assert()
        .success()
        .stderr(predicate::str::contains("No profiles configured"));
}

#[test]
fn test_config_set_and_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    aula_with_config(&path)
        .args(["config", "set", "server", "http://aula.local:5000"])
        .assert()
        .success();
    aula_with_config(&path)
        .args(["config", "set", "username", "tecnico"])
        .assert()
        .success();

    aula_with_config(&path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.default]")
                .and(predicate::str::contains("server = \"http://aula.local:5000\""))
                .and(predicate::str::contains("username = \"tecnico\"")),
        );

    aula_with_config(&path)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("default *"));
}

#[test]
fn test_config_set_rejects_unknown_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    aula_with_config(&path)
        .args(["config", "set", "api_key", "abc"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown config key"));
    assert!(!path.exists(), "nothing should be written on error");
}

#[test]
fn test_config_use_missing_profile() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    aula_with_config(&path)
        .args(["config", "set", "server", "http://aula.local"])
        .assert()
        .success();
    aula_with_config(&path)
        .args(["config", "use", "auditorio-b"])
        .assert()
        .code(8)
        .stderr(predicate::str::contains("default"));
}

#[test]
fn test_config_show_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    aula_with_config(&path)
        .args(["config", "set", "server", "http://aula.local"])
        .assert()
        .success();
    let output = aula_with_config(&path)
        .args(["-o", "json", "config", "show"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["profiles"]["default"]["server"], "http://aula.local");
}
