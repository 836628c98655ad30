use std::process::Command;

fn run(fixture: &str) -> (String, String, bool) {
    run_with_env(fixture, &[])
}

fn run_with_env(fixture: &str, vars: &[(&str, &str)]) -> (String, String, bool) {
    let path = format!("tests/fixtures/{fixture}");
    let output = Command::new(env!("CARGO_BIN_EXE_referral-ledger"))
        .arg(&path)
        .env("RUST_LOG", "warn")
        .envs(vars.iter().copied())
        .output()
        .expect("failed to run binary");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[test]
fn valid_submissions() {
    let (stdout, stderr, success) = run("valid.csv");

    assert!(success);
    assert!(stderr.is_empty());

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        [
            "rank,name,referrals,tier",
            "1,Max M.,3,Silber",
            "2,Eva B.,1,Bronze",
        ]
    );
}

#[test]
fn errors_warn_but_do_not_block() {
    let (stdout, stderr, success) = run("with_errors.csv");

    assert!(success);
    assert!(stderr.contains("unrecognized submission type"));
    assert!(stderr.contains("email must not be empty"));

    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, ["rank,name,referrals,tier", "1,Max M.,2,Bronze"]);
}

#[test]
fn missing_input_fails() {
    let (stdout, stderr, success) = run("does_not_exist.csv");

    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("failed to open input"));
}

#[test]
fn retry_settings_from_environment() {
    let (stdout, _, success) = run_with_env(
        "valid.csv",
        &[("LEDGER_MAX_RETRIES", "2"), ("LEDGER_RETRY_JITTER", "false")],
    );

    assert!(success);
    assert!(stdout.contains("1,Max M.,3,Silber"));
}

#[test]
fn invalid_retry_settings_fail() {
    let (stdout, stderr, success) = run_with_env("valid.csv", &[("LEDGER_MAX_RETRIES", "many")]);

    assert!(!success);
    assert!(stdout.is_empty());
    assert!(stderr.contains("failed to load configuration"));
}
