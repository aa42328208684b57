use assert_cmd::Command;
use predicates::prelude::*;

fn gamevault() -> Command {
    let mut cmd = Command::cargo_bin("gamevault-backup").unwrap();
    cmd.env_clear();
    cmd
}

#[test]
fn test_no_flags_prints_usage() {
    gamevault()
        .assert()
        .success()
        .stdout(predicate::str::contains("--restore-date YYYY-MM-DD"))
        .stdout(predicate::str::contains("MONGODB_URI"));
}

#[test]
fn test_manual_without_configuration_fails() {
    gamevault()
        .arg("--manual")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("missing environment variables"))
        .stderr(predicate::str::contains("R2_SECRET_ACCESS_KEY"));
}

#[test]
fn test_list_without_configuration_fails() {
    gamevault()
        .arg("--list")
        .env("MONGODB_URI", "mongodb://localhost:27017/gamevault")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("R2_BUCKET"))
        .stderr(predicate::str::contains("MONGODB_URI").not());
}

#[test]
fn test_conflicting_actions_are_rejected() {
    gamevault()
        .args(["--manual", "--list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_restore_date_without_value_fails() {
    gamevault()
        .arg("--restore-date")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--restore-date"));
}

#[test]
fn test_unknown_flag_fails() {
    gamevault()
        .arg("--backup-everything")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unexpected argument"));
}

#[test]
fn test_help_succeeds() {
    gamevault()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--restore-complete"));
}

#[test]
fn test_version() {
    gamevault()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gamevault-backup"));
}
