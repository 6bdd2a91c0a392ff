use assert_cmd::Command;
use predicates::str::contains;

mod common;
use common::TestEnv;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("kvprobe").expect("binary builds");
    cmd.env_clear();
    cmd
}

#[test]
fn help_lists_the_probe_flags() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--vault-url"))
        .stdout(contains("--key-name"))
        .stdout(contains("--skip-all"));
}

#[test]
fn missing_vault_url_prints_usage_and_fails() {
    cmd()
        .args(["--key-name", "k1"])
        .assert()
        .failure()
        .stderr(contains("--vault-url"))
        .stderr(contains("Usage"));
}

#[test]
fn missing_key_name_prints_usage_and_fails() {
    cmd()
        .args(["--vault-url", "https://v.vault.azure.net/"])
        .assert()
        .failure()
        .stderr(contains("--key-name"));
}

#[test]
fn empty_required_values_are_rejected() {
    cmd()
        .args(["--vault-url", "", "--key-name", "k1"])
        .assert()
        .failure();
    cmd()
        .args(["--vault-url", "https://v.vault.azure.net/", "--key-name", ""])
        .assert()
        .failure();
}

#[test]
fn unknown_algorithm_is_rejected() {
    cmd()
        .args([
            "--vault-url",
            "https://v.vault.azure.net/",
            "--key-name",
            "k1",
            "--algorithm",
            "RS999",
        ])
        .assert()
        .failure()
        .stderr(contains("--algorithm"));
}

#[test]
fn missing_required_flags_issue_no_remote_calls() {
    let env = TestEnv::new();
    env.bare_cmd()
        .args(["--vault-url", &env.server.uri()])
        .assert()
        .failure();
    assert!(env.requests().is_empty());
}

#[test]
fn disabling_every_probe_reports_no_tests_and_calls_nothing() {
    let env = TestEnv::new();
    env.cmd()
        .args(["--test-sign=false", "--test-verify=false", "--test-get=false"])
        .assert()
        .success()
        .stdout(contains("No tests selected"))
        .stdout(contains("Permission probe completed."));
    assert!(env.requests().is_empty());
}

#[test]
fn skip_all_alone_reports_no_tests_and_calls_nothing() {
    let env = TestEnv::new();
    env.cmd()
        .arg("--skip-all")
        .assert()
        .success()
        .stdout(contains("No tests selected"));
    assert!(env.requests().is_empty());
}

#[test]
fn no_tests_selected_skips_credential_acquisition() {
    // No token in the environment: the run must still succeed because no
    // probe is enabled, proving the client is never constructed.
    let env = TestEnv::new();
    env.cmd_without_credentials()
        .arg("--skip-all")
        .assert()
        .success()
        .stdout(contains("No tests selected"));
    assert!(env.requests().is_empty());
}
