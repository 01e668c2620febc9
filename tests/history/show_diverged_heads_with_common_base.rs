use crate::common::command::{bit_history_oneline, oneline_output, repository};
use crate::common::repository::RepositoryFixture;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn show_diverged_heads_with_common_base(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    //   L1 - L2   (master)
    //  /
    // B
    //  \
    //   R1        (origin/master)
    let base = repository.commit(&[], "Base");
    let l1 = repository.commit(&[&base], "Local-1");
    let r1 = repository.commit(&[&base], "Remote-1");
    let l2 = repository.commit(&[&l1], "Local-2");
    repository.set_ref("refs/heads/master", &l2);
    repository.set_ref("refs/remotes/origin/master", &r1);

    let output = bit_history_oneline(repository.path()).output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        oneline_output(&[
            (l2.to_short_oid(), "(local) Local-2"),
            (r1.to_short_oid(), "(remote) Remote-1"),
            (l1.to_short_oid(), "Local-1"),
            (base.to_short_oid(), "Base"),
        ])
    );

    Ok(())
}

#[rstest]
fn show_ancestor_before_descendant_is_impossible_even_with_skewed_clocks(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    // the child claims to be older than its parent
    let parent = repository.commit_at("fake_user", &[], "Parent", 1_672_578_000);
    let child = repository.commit_at("fake_user", &[&parent], "Child", 1_672_574_400);
    repository.set_ref("refs/heads/master", &child);

    let output = bit_history_oneline(repository.path()).output()?;

    assert_eq!(
        String::from_utf8(output.stdout)?,
        oneline_output(&[
            (child.to_short_oid(), "(local) Child"),
            (parent.to_short_oid(), "Parent"),
        ])
    );

    Ok(())
}
