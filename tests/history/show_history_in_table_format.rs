use crate::common::command::{repository, run_bit_history_command};
use crate::common::repository::RepositoryFixture;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn show_history_in_table_format(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit_by("Grace_Hopper", &[], "Initial import");
    let c2 = repository.commit_by("Ada", &[&c1], "Fix parser");
    repository.set_ref("refs/heads/master", &c2);
    repository.set_ref("refs/remotes/origin/master", &c1);

    let output = run_bit_history_command(repository.path(), &["log", "--utc"]).output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        format!(
            "{}  (local) Fix parser       Ada           2023-01-01 12:02:00\n\
             {}  (remote) Initial import  Grace_Hopper  2023-01-01 12:01:00\n",
            c2.to_short_oid(),
            c1.to_short_oid()
        )
    );

    Ok(())
}

#[rstest]
fn show_history_with_custom_date_format_and_offset(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    repository.set_ref("refs/heads/master", &c1);

    let output = run_bit_history_command(
        repository.path(),
        &["log", "--timezone", "+02:00", "--date-format", "%d.%m.%Y %H:%M %z"],
    )
    .output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        format!(
            "{}  (local) C1  fake_user  01.01.2023 14:01 +0200\n",
            c1.to_short_oid()
        )
    );

    Ok(())
}

#[rstest]
fn invalid_date_format_is_rejected(repository: RepositoryFixture) {
    run_bit_history_command(repository.path(), &["log", "--date-format", "%Q"])
        .assert()
        .failure();
}
