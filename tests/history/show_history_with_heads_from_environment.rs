use crate::common::command::{bit_history_oneline, oneline_output, repository};
use crate::common::repository::RepositoryFixture;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn show_history_with_heads_from_environment(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    let c2 = repository.commit(&[&c1], "C2");
    let c3 = repository.commit(&[&c1], "Unrelated master work");
    repository.set_ref("refs/heads/master", &c3);
    repository.set_ref("refs/heads/develop", &c2);
    repository.set_ref("refs/remotes/upstream/develop", &c1);

    let output = bit_history_oneline(repository.path())
        .env("BIT_HISTORY_LOCAL_REF", "develop")
        .env("BIT_HISTORY_REMOTE_REF", "upstream/develop")
        .output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        oneline_output(&[
            (c2.to_short_oid(), "(local) C2"),
            (c1.to_short_oid(), "(remote) C1"),
        ])
    );

    Ok(())
}

#[rstest]
fn command_line_heads_override_the_environment(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    repository.set_ref("refs/heads/master", &c1);

    let output = bit_history_oneline(repository.path())
        .env("BIT_HISTORY_LOCAL_REF", "develop")
        .args(["--local", "master"])
        .output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        oneline_output(&[(c1.to_short_oid(), "(local) C1")])
    );

    Ok(())
}
