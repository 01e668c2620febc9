use crate::common::command::{bit_history_oneline, repository};
use crate::common::repository::RepositoryFixture;
use predicates::prelude::predicate;
use rstest::rstest;

#[rstest]
fn log_with_corrupt_commit_fails(mut repository: RepositoryFixture) {
    let c1 = repository.commit(&[], "C1");
    let c2 = repository.commit(&[&c1], "C2");
    repository.set_ref("refs/heads/master", &c2);
    repository.corrupt_object(&c1);

    bit_history_oneline(repository.path())
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("unable to read repository"));
}

#[rstest]
fn log_with_missing_parent_lists_what_is_there(mut repository: RepositoryFixture) {
    let c1 = repository.commit(&[], "C1");
    let c2 = repository.commit(&[&c1], "C2");
    repository.set_ref("refs/heads/master", &c2);
    let c1_path = repository
        .repository()
        .database()
        .objects_path()
        .join(c1.to_path());
    std::fs::remove_file(c1_path).unwrap();

    bit_history_oneline(repository.path())
        .assert()
        .success()
        .stdout(format!("{} (local) C2\n", c2.to_short_oid()))
        .stderr(predicate::str::contains("commit missing from object store"));
}
