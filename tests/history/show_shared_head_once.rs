use crate::common::command::{bit_history_oneline, oneline_output, repository};
use crate::common::repository::RepositoryFixture;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn show_shared_head_once(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    let c2 = repository.commit(&[&c1], "C2");
    repository.set_ref("refs/heads/master", &c2);
    repository.set_ref("refs/remotes/origin/master", &c2);

    let output = bit_history_oneline(repository.path()).output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        oneline_output(&[
            (c2.to_short_oid(), "(local/remote) C2"),
            (c1.to_short_oid(), "C1"),
        ])
    );

    Ok(())
}
