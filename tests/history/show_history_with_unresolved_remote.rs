use crate::common::command::{bit_history_oneline, oneline_output, repository};
use crate::common::repository::RepositoryFixture;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn show_history_with_unresolved_remote(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    // never fetched: there is no refs/remotes/origin at all
    let c1 = repository.commit(&[], "C1");
    let c2 = repository.commit(&[&c1], "C2");
    let c3 = repository.commit(&[&c2], "C3");
    repository.set_ref("refs/heads/master", &c3);

    let output = bit_history_oneline(repository.path()).output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        oneline_output(&[
            (c3.to_short_oid(), "(local) C3"),
            (c2.to_short_oid(), "C2"),
            (c1.to_short_oid(), "C1"),
        ])
    );

    Ok(())
}
