use assert_cmd::Command;
use predicates::prelude::*;
use std::error::Error;
use tempfile::tempdir;

fn script_command(home: &std::path::Path) -> Result<Command, Box<dyn Error>> {
    let mut cmd = Command::cargo_bin("credit_ledger_cli")?;
    cmd.env("CREDIT_LEDGER_CLI_SCRIPT", "1")
        .env("CREDIT_LEDGER_HOME", home)
        .env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn script_mode_records_and_reports_balance() -> Result<(), Box<dyn Error>> {
    let home = tempdir()?;
    script_command(home.path())?
        .write_stdin("charge 50000\nuse 2000\nbalance\nhistory\nuse 999999\nexit\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Balance: ₩48,000")
                .and(predicate::str::contains("=== History ==="))
                .and(predicate::str::contains("Insufficient balance"))
                .and(predicate::str::contains("Add funds")),
        );
    assert!(home.path().join("ledger.json").exists());
    Ok(())
}

#[test]
fn script_mode_state_persists_between_runs() -> Result<(), Box<dyn Error>> {
    let home = tempdir()?;
    script_command(home.path())?
        .write_stdin("charge 10,000 --method bank\nexit\n")
        .assert()
        .success();

    script_command(home.path())?
        .write_stdin("balance\nexit\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Balance: ₩10,000")
                .and(predicate::str::contains("via bank")),
        );
    Ok(())
}

#[test]
fn script_mode_reports_bad_input_and_keeps_going() -> Result<(), Box<dyn Error>> {
    let home = tempdir()?;
    script_command(home.path())?
        .write_stdin("charge 0\ncharge abc\nfrobnicate\nhistory\nexit\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Amount must not be zero")
                .and(predicate::str::contains("`abc` is not a number."))
                .and(predicate::str::contains("Unknown command `frobnicate`."))
                .and(predicate::str::contains("No transactions.")),
        );
    Ok(())
}

#[test]
fn script_mode_filters_history_by_kind() -> Result<(), Box<dyn Error>> {
    let home = tempdir()?;
    script_command(home.path())?
        .write_stdin("charge 5000\nuse 1000\ncharge 700\nhistory --kind use\nhistory --kind points\nexit\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Showing 1-1 of 1")
                .and(predicate::str::contains("unknown transaction type `points`")),
        );
    Ok(())
}
