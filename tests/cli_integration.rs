//! Command-line behavior tests
//!
//! Exercise the binary through `assert_cmd` without contacting a model.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

mod common;

use common::temp_config_file;

fn retail_assistant() -> Command {
    let mut cmd = Command::cargo_bin("retail-assistant").unwrap();
    cmd.env_remove("RETAIL_ASSISTANT_CONFIG")
        .env_remove("RETAIL_ASSISTANT_MEMORY_BACKEND")
        .env_remove("RETAIL_ASSISTANT_PROVIDER");
    cmd
}

#[test]
fn test_version_flag() {
    retail_assistant()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("retail-assistant"));
}

#[test]
fn test_sessions_stats_without_memory() {
    retail_assistant()
        .args(["--config", "does-not-exist.yaml", "--memory", "none", "sessions", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Memory backend:  none"))
        .stdout(predicate::str::contains("Active sessions: 0"));
}

#[test]
fn test_sessions_clear_with_sled_memory() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("sessions");

    retail_assistant()
        .args(["--config", "does-not-exist.yaml", "--memory", "sled", "--memory-path"])
        .arg(&db)
        .args(["sessions", "clear", "shopper-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared session shopper-1"));
}

#[test]
fn test_invalid_memory_backend_is_rejected() {
    retail_assistant()
        .args(["--memory", "redis", "sessions", "stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("redis"));
}

#[test]
fn test_invalid_config_fails_validation() {
    let (_dir, config_path) = temp_config_file(
        r#"
provider:
  type: openai
"#,
    );

    retail_assistant()
        .arg("--config")
        .arg(&config_path)
        .args(["sessions", "stats"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid provider type"));
}

#[test]
fn test_ask_rejects_blank_message() {
    let (_dir, config_path) = temp_config_file(
        r#"
memory:
  backend: none
"#,
    );

    retail_assistant()
        .arg("--config")
        .arg(&config_path)
        .args(["ask", "--session", "s1", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("message cannot be empty"));
}
