use crate::common::command::{bit_history_oneline, oneline_output, repository};
use crate::common::repository::RepositoryFixture;
use bit_history::artifacts::history::reconcile::{ReconcileOptions, reconcile};
use bit_history::artifacts::history::row::HeadMarkers;
use bit_history::artifacts::objects::object_id::ObjectId;
use predicates::prelude::predicate;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn reconcile_reads_packed_commits(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    let c2 = repository.commit(&[&c1], "C2");
    repository.set_ref("refs/heads/master", &c2);
    repository.set_ref("refs/remotes/origin/master", &c1);
    repository.pack_objects();

    let history = reconcile(repository.repository(), &ReconcileOptions::default())?;

    let rows: Vec<(ObjectId, HeadMarkers)> = history
        .iter()
        .map(|row| (row.oid().clone(), row.markers()))
        .collect();
    assert_eq!(
        rows,
        vec![(c2, HeadMarkers::LOCAL), (c1, HeadMarkers::REMOTE)]
    );
    assert!(history.gaps().is_empty());

    Ok(())
}

#[rstest]
fn show_history_from_packed_objects(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    let c2 = repository.commit(&[&c1], "C2");
    repository.set_ref("refs/heads/master", &c2);
    repository.set_ref("refs/remotes/origin/master", &c1);
    repository.pack_objects();

    let output = bit_history_oneline(repository.path()).output()?;

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
fn show_loose_commits_on_top_of_a_pack(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    let c2 = repository.commit(&[&c1], "C2");
    repository.pack_objects();
    let c3 = repository.commit(&[&c2], "C3");
    repository.set_ref("refs/heads/master", &c3);
    repository.set_ref("refs/remotes/origin/master", &c2);

    let output = bit_history_oneline(repository.path()).output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8(output.stdout)?,
        oneline_output(&[
            (c3.to_short_oid(), "(local) C3"),
            (c2.to_short_oid(), "(remote) C2"),
            (c1.to_short_oid(), "C1"),
        ])
    );

    Ok(())
}

#[rstest]
fn log_with_head_on_absent_commit_fails(mut repository: RepositoryFixture) {
    let c1 = repository.commit(&[], "C1");
    repository.set_ref("refs/heads/master", &c1);
    repository.pack_objects();
    let absent = ObjectId::try_parse("ab".repeat(20)).unwrap();
    repository.set_ref("refs/remotes/origin/master", &absent);

    bit_history_oneline(repository.path())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("missing from the object store"));
}
