use crate::common::command::{bit_history_oneline, repository};
use crate::common::repository::RepositoryFixture;
use predicates::prelude::predicate;
use rstest::rstest;

#[rstest]
fn show_nothing_when_no_head_resolves(mut repository: RepositoryFixture) {
    // objects exist but no branch points at them
    let c1 = repository.commit(&[], "C1");
    repository.commit(&[&c1], "C2");

    bit_history_oneline(repository.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[rstest]
fn show_nothing_for_a_freshly_initialised_repository(repository: RepositoryFixture) {
    bit_history_oneline(repository.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}
