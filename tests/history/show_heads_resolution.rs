use crate::common::command::{repository, run_bit_history_command};
use crate::common::repository::RepositoryFixture;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn show_heads_resolution(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    repository.set_ref("refs/heads/master", &c1);

    let output = run_bit_history_command(repository.path(), &["heads"]).output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        format!(
            "local   refs/heads/master  {c1}\n\
             remote  origin/master      unresolved\n"
        )
    );

    Ok(())
}

#[rstest]
fn show_heads_for_custom_refs(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    let c2 = repository.commit(&[&c1], "C2");
    repository.set_ref("refs/heads/main", &c2);
    repository.set_ref("refs/remotes/upstream/main", &c1);

    let output = run_bit_history_command(
        repository.path(),
        &["heads", "--local", "main", "--remote", "upstream/main"],
    )
    .output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        format!(
            "local   main           {c2}\n\
             remote  upstream/main  {c1}\n"
        )
    );

    Ok(())
}
