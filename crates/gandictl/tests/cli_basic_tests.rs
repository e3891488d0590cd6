use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Helper to create a test command isolated from the caller's environment
fn gandictl() -> Command {
    let mut cmd = Command::cargo_bin("gandictl").unwrap();
    for var in [
        "GANDI_APIKEY",
        "GANDI_URL",
        "GANDI_IMAGE",
        "GANDI_DATACENTER",
        "GANDICTL_PROFILE",
        "GANDICTL_CONFIG_FILE",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

/// Command bound to a config file inside `dir`
fn gandictl_in(dir: &TempDir) -> Command {
    let mut cmd = gandictl();
    cmd.arg("--config-file").arg(config_path(dir.path()));
    cmd
}

fn config_path(dir: &Path) -> PathBuf {
    dir.join("config.toml")
}

#[test]
fn test_help_flag() {
    gandictl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Provision and manage Gandi hosting VMs"))
        .stdout(predicate::str::contains("EXAMPLES:"));
}

#[test]
fn test_version_flag() {
    gandictl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gandictl"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_version_command_json() {
    gandictl()
        .args(["version", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"gandictl\""));
}

#[test]
fn test_no_args_shows_help() {
    gandictl()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_invalid_subcommand() {
    gandictl()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_create_help_lists_machine_flags() {
    gandictl()
        .args(["create", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--datacenter"))
        .stdout(predicate::str::contains("--image"))
        .stdout(predicate::str::contains("--memory"))
        .stdout(predicate::str::contains("--core"))
        .stdout(predicate::str::contains("--ssh-key"))
        .stdout(predicate::str::contains("--wait-timeout"));
}

#[test]
fn test_zero_wait_interval_is_rejected() {
    gandictl()
        .args(["start", "web-1", "--wait-interval", "0"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--wait-interval"));
}

#[test]
fn test_invalid_output_format() {
    gandictl()
        .args(["ls", "-o", "xml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_completions_bash() {
    gandictl()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gandictl"));
}

#[test]
fn test_profile_lifecycle() {
    let dir = TempDir::new().unwrap();

    gandictl_in(&dir)
        .args([
            "profile",
            "set",
            "prod",
            "--api-key",
            "abcdef123456",
            "--datacenter",
            "FR-SD2",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Profile 'prod' created."));

    let saved = std::fs::read_to_string(config_path(dir.path())).unwrap();
    assert!(saved.contains("default_profile = \"prod\""));
    assert!(saved.contains("FR-SD2"));

    gandictl_in(&dir)
        .args(["profile", "list", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"prod\""))
        .stdout(predicate::str::contains("abcd..."))
        .stdout(predicate::str::contains("abcdef123456").not());

    gandictl_in(&dir)
        .args(["profile", "remove", "prod"])
        .assert()
        .success();

    gandictl_in(&dir)
        .args(["profile", "show", "prod"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'prod' not found"));
}

#[test]
fn test_profile_default_requires_existing_profile() {
    let dir = TempDir::new().unwrap();
    gandictl_in(&dir)
        .args(["profile", "default", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Profile 'ghost' not found"));
}

#[test]
fn test_ls_without_machines() {
    let dir = TempDir::new().unwrap();
    gandictl_in(&dir)
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("No machines."));

    gandictl_in(&dir)
        .args(["ls", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_unknown_machine_fails() {
    let dir = TempDir::new().unwrap();
    for command in ["ip", "url", "inspect", "start", "rm"] {
        gandictl_in(&dir)
            .args([command, "ghost"])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Machine 'ghost' not found"));
    }
}

#[test]
fn test_create_without_api_key_fails() {
    let dir = TempDir::new().unwrap();
    gandictl_in(&dir)
        .args(["create", "web-1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No API key configured"))
        .stderr(predicate::str::contains("GANDI_APIKEY"));

    assert!(!dir.path().join("machines.toml").exists());
}

#[test]
fn test_ip_and_url_read_the_machine_store() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("machines.toml"),
        r#"
[machines.web-1]
vm_id = 4242
ip_address = "192.0.2.7"

[machines.web-1.config]
name = "web-1"

[machines.pending]

[machines.pending.config]
name = "pending"
"#,
    )
    .unwrap();

    gandictl_in(&dir)
        .args(["ip", "web-1"])
        .assert()
        .success()
        .stdout("192.0.2.7\n");

    gandictl_in(&dir)
        .args(["url", "web-1"])
        .assert()
        .success()
        .stdout("tcp://192.0.2.7:2376\n");

    gandictl_in(&dir)
        .args(["ip", "pending"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IP address is not set"));

    gandictl_in(&dir)
        .args(["ls", "--quiet", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"web-1\""))
        .stdout(predicate::str::contains("\"datacenter\": \"LU-BI1\""));

    // Never created on Gandi, so removal only forgets the record
    gandictl_in(&dir)
        .args(["rm", "pending"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed"));
}

#[test]
fn test_profile_edits_keep_env_references() {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        config_path(dir.path()),
        "default_profile = \"ci\"\n\n[profiles.ci]\napi_key = \"${PATH}\"\n",
    )
    .unwrap();

    gandictl_in(&dir)
        .args(["profile", "set", "other", "--datacenter", "FR-SD2"])
        .assert()
        .success();

    gandictl_in(&dir)
        .args(["profile", "default", "other"])
        .assert()
        .success();

    let saved = std::fs::read_to_string(config_path(dir.path())).unwrap();
    assert!(saved.contains("api_key = \"${PATH}\""), "{saved}");
    assert!(saved.contains("default_profile = \"other\""));
}
