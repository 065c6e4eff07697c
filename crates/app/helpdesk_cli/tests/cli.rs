use assert_cmd::Command;
use predicates::prelude::*;

fn helpdesk() -> Command {
    let mut cmd = Command::cargo_bin("helpdesk").unwrap();
    cmd.env_remove("DATABASE_URL");
    cmd
}

#[test]
fn version_prints_package() {
    helpdesk()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("helpdesk_cli"));
}

#[test]
fn help_lists_commands() {
    helpdesk()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("migrate")
                .and(predicate::str::contains("promote"))
                .and(predicate::str::contains("purge-sessions")),
        );
}

#[test]
fn promote_requires_user() {
    helpdesk()
        .arg("promote")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<USER_ID>"));
}

#[test]
fn unreachable_database_fails() {
    helpdesk()
        .args([
            "migrate",
            "--database-url",
            "postgres://127.0.0.1:1/helpdesk",
            "--acquire-timeout-secs",
            "1",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("database:"));
}
