use crate::common::command::run_bit_history_command;
use crate::common::redirect_temp_dir;
use assert_fs::TempDir;
use predicates::prelude::predicate;

#[test]
fn log_outside_a_repository_fails() -> Result<(), Box<dyn std::error::Error>> {
    redirect_temp_dir();
    let dir = TempDir::new()?;

    run_bit_history_command(dir.path(), &["log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("not a git repository"));

    Ok(())
}

#[test]
fn log_of_a_missing_path_fails() -> Result<(), Box<dyn std::error::Error>> {
    redirect_temp_dir();
    let dir = TempDir::new()?;

    run_bit_history_command(dir.path(), &["log", "does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to open repository"));

    Ok(())
}

#[test]
fn invalid_ref_name_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    redirect_temp_dir();
    let dir = TempDir::new()?;

    run_bit_history_command(dir.path(), &["log", "--remote", "origin/../master"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid ref name"));

    Ok(())
}
