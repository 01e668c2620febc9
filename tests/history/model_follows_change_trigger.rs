use crate::common::command::repository;
use crate::common::repository::RepositoryFixture;
use bit_history::areas::repository::Repository;
use bit_history::artifacts::history::model::HistoryModel;
use bit_history::artifacts::history::reconcile::ReconcileOptions;
use bit_history::artifacts::history::trigger::{ChangeTrigger, RepositoryEvent};
use rstest::rstest;
use std::time::Duration;

#[rstest]
#[tokio::test]
async fn model_follows_change_trigger(
    mut repository: RepositoryFixture,
) -> Result<(), Box<dyn std::error::Error>> {
    let c1 = repository.commit(&[], "C1");
    repository.set_ref("refs/heads/master", &c1);
    repository.set_ref("refs/remotes/origin/master", &c1);

    let trigger = ChangeTrigger::new();
    let model = HistoryModel::new(trigger.clone(), ReconcileOptions::default());
    let history = model
        .set_repository(Repository::open(repository.path())?)
        .await?;
    assert_eq!(history.len(), 1);
    assert!(history.get(0).unwrap().is_local_head());
    assert!(history.get(0).unwrap().is_remote_head());

    // someone commits locally and signals it
    let mut updates = model.watch_history();
    updates.mark_unchanged();
    let c2 = repository.commit(&[&c1], "C2");
    repository.set_ref("refs/heads/master", &c2);
    trigger.publish(RepositoryEvent::history_changed(
        repository.repository().id().clone(),
    ));

    tokio::time::timeout(Duration::from_secs(5), updates.changed()).await??;
    let history = model.current_history();
    assert_eq!(history.len(), 2);
    assert_eq!(history.position(&c2), Some(0));
    assert!(history.get(0).unwrap().is_local_head());
    assert!(history.get(1).unwrap().is_remote_head());
    assert!(!history.get(1).unwrap().is_local_head());

    Ok(())
}
