use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to create a test command bound to a config file inside `dir`
fn statewait(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("statewait").unwrap();
    cmd.env_remove("STATEWAIT_PROFILE")
        .env_remove("RUST_LOG")
        .arg("--config-file")
        .arg(dir.path().join("config.toml"));
    cmd
}

fn bare() -> Command {
    Command::cargo_bin("statewait").unwrap()
}

#[test]
fn test_help_flag() {
    bare()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("eventually consistent"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    bare()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("statewait"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command_json() {
    bare()
        .args(["version", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"version\""))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_args_shows_help() {
    bare()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    bare()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_wait_help() {
    bare()
        .args(["wait", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--pending"))
        .stdout(predicate::str::contains("--not-found-checks"))
        .stdout(predicate::str::contains("--continuous-target"));
}

#[test]
fn test_storage_share_help() {
    bare()
        .args(["storage", "share", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("exists"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_wait_rejects_non_numeric_status() {
    bare()
        .args(["wait", "http://localhost/x", "--pending", "abc"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn test_wait_rejects_overlapping_states() {
    let dir = TempDir::new().unwrap();
    statewait(&dir)
        .args(["wait", "http://localhost/x", "--pending", "200", "--target", "200"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("both pending and target"));
}

#[test]
fn test_config_path_uses_override() {
    let dir = TempDir::new().unwrap();
    statewait(&dir)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_timeouts_json() {
    let dir = TempDir::new().unwrap();
    let output = statewait(&dir)
        .args(["config", "timeouts", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 6);

    let openshift = rows
        .iter()
        .find(|r| r["kind"] == "open_shift_cluster")
        .unwrap();
    assert_eq!(openshift["create_secs"], 5400);

    let share = rows.iter().find(|r| r["kind"] == "storage_share").unwrap();
    assert_eq!(share["create_secs"], 1800);
    assert_eq!(share["read_secs"], 300);
}

#[test]
fn test_config_timeouts_respect_overrides() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "[timeouts.storage_share]\ncreate_secs = 60\n",
    )
    .unwrap();

    let output = statewait(&dir)
        .args(["config", "timeouts", "-o", "json"])
        .output()
        .unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let share = rows
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["kind"] == "storage_share")
        .unwrap()
        .clone();
    assert_eq!(share["create_secs"], 60);
    assert_eq!(share["delete_secs"], 1800);
}

#[test]
fn test_config_show_masks_tokens() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        r#"
default_profile = "dev"

[profiles.dev]
endpoint = "http://127.0.0.1:10000"
bearer_token = "super-secret"
"#,
    )
    .unwrap();

    statewait(&dir)
        .args(["config", "show", "-o", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("127.0.0.1:10000"))
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("super-secret").not());
}

#[test]
fn test_invalid_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("config.toml"), "this is = = not toml").unwrap();

    statewait(&dir)
        .args(["config", "show"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn test_profile_set_list_remove() {
    let dir = TempDir::new().unwrap();

    statewait(&dir)
        .args([
            "profile",
            "set",
            "dev",
            "--endpoint",
            "http://127.0.0.1:10000",
            "--sas-token",
            "sv=2023",
            "--default",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'dev' saved"));

    let saved = fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(saved.contains("default_profile = \"dev\""));

    let output = statewait(&dir)
        .args(["profile", "list", "-o", "json"])
        .output()
        .unwrap();
    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["name"], "dev");
    assert_eq!(rows[0]["default"], true);
    assert_eq!(rows[0]["auth"], "sas");

    statewait(&dir)
        .args(["profile", "remove", "dev"])
        .assert()
        .success();

    statewait(&dir)
        .args(["profile", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No profiles configured"));
}

#[test]
fn test_profile_remove_missing() {
    let dir = TempDir::new().unwrap();
    statewait(&dir)
        .args(["profile", "remove", "ghost"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Profile 'ghost' not found"));
}

#[test]
fn test_storage_with_unknown_profile() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        "[profiles.dev]\nendpoint = \"http://127.0.0.1:1\"\n",
    )
    .unwrap();

    statewait(&dir)
        .args(["--profile", "prod", "storage", "share", "exists", "acct01", "logs"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Profile 'prod' not found"))
        .stderr(predicate::str::contains("statewait profile list"));
}

#[test]
fn test_storage_rejects_invalid_share_name() {
    let dir = TempDir::new().unwrap();
    statewait(&dir)
        .args(["storage", "share", "create", "acct01", "Bad_Name"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid input"));
}
