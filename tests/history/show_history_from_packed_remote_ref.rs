use crate::common::command::{bit_history_oneline, oneline_output, repository};
use crate::common::repository::RepositoryFixture;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn show_history_from_packed_remote_ref(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    let c2 = repository.commit(&[&c1], "C2");
    repository.pack_refs(&[
        ("refs/heads/master", &c1),
        ("refs/remotes/origin/master", &c2),
    ]);
    // the loose ref is newer than its packed entry
    repository.set_ref("refs/heads/master", &c2);

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

#[rstest]
fn show_history_through_remote_head_symref(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    let c2 = repository.commit(&[&c1], "C2");
    repository.set_ref("refs/heads/master", &c1);
    repository.set_ref("refs/remotes/origin/main", &c2);
    repository.set_symref("refs/remotes/origin/HEAD", "refs/remotes/origin/main");

    let output = bit_history_oneline(repository.path())
        .args(["--remote", "origin"])
        .output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        oneline_output(&[
            (c2.to_short_oid(), "(remote) C2"),
            (c1.to_short_oid(), "(local) C1"),
        ])
    );

    Ok(())
}
