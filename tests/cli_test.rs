use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_exits_successfully() {
    Command::cargo_bin("foresight")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("intercept"));
}

#[test]
fn intercept_on_a_missing_device_fails_with_device_exit_code() {
    Command::cargo_bin("foresight")
        .unwrap()
        .args(["intercept", "/dev/input/event-does-not-exist"])
        .assert()
        .failure()
        .code(2);
}

#[test]
fn no_subcommand_reports_usage_error() {
    Command::cargo_bin("foresight")
        .unwrap()
        .assert()
        .failure();
}
