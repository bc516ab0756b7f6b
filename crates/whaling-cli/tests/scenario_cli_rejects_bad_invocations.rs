//! # Invariant under test
//!
//! Commands fail closed before touching any adapter: a missing database URL,
//! an unknown realm or a `refresh` without a batch source is reported and
//! nothing is written.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::path::PathBuf;
use std::process::Command;

fn repo_config() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("config")
        .join("whaling.yaml")
}

fn whaling(dir: &tempfile::TempDir) -> anyhow::Result<Command> {
    let mut cmd = Command::cargo_bin("whaling")?;
    cmd.current_dir(dir.path())
        .env_remove(whaling_db::ENV_DB_URL)
        .arg("--config")
        .arg(repo_config());
    Ok(cmd)
}

#[test]
fn schedule_without_database_url_fails_by_name() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    whaling(&dir)?
        .arg("schedule")
        .assert()
        .failure()
        .stderr(predicate::str::contains("WHALING_DATABASE_URL"));
    assert!(!dir.path().join("outbox").exists());
    Ok(())
}

#[test]
fn enroll_with_unknown_realm_fails() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    whaling(&dir)?
        .args([
            "enroll",
            "--account",
            "1",
            "--realm",
            "na",
            "--token",
            "t",
            "--expires-at",
            "1700000000",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --realm"));
    Ok(())
}

#[test]
fn refresh_requires_a_batch_source() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    whaling(&dir)?
        .arg("refresh")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--payload-file or --outbox"));
    Ok(())
}
