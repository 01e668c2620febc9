//! Repository change signals
//!
//! Anything that notices a repository changed (a poller, a command that
//! updated a ref) publishes a [`RepositoryEvent`]; history models subscribe
//! for the one repository they are bound to. Publishing never blocks. A
//! subscriber that falls behind loses the intermediate events and is told
//! its repository's history changed instead.

use crate::areas::repository::RepositoryId;
use derive_new::new;
use std::future::Future;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const TRIGGER_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryEventKind {
    HistoryChanged,
    RepositoryChanged,
}

impl RepositoryEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepositoryEventKind::HistoryChanged => "history-changed",
            RepositoryEventKind::RepositoryChanged => "repository-changed",
        }
    }
}

impl std::fmt::Display for RepositoryEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct RepositoryEvent {
    pub kind: RepositoryEventKind,
    pub repository: RepositoryId,
}

impl RepositoryEvent {
    pub fn history_changed(repository: RepositoryId) -> Self {
        RepositoryEvent::new(RepositoryEventKind::HistoryChanged, repository)
    }
}

#[derive(Debug, Clone)]
pub struct ChangeTrigger {
    sender: broadcast::Sender<RepositoryEvent>,
}

impl ChangeTrigger {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(TRIGGER_CAPACITY);
        ChangeTrigger { sender }
    }

    /// Publish an event, returning how many subscribers will see it
    pub fn publish(&self, event: RepositoryEvent) -> usize {
        debug!(kind = %event.kind, repository = %event.repository, "publishing repository event");
        // no subscribers is not an error
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Call `on_event` for every event about `repository` until the returned
    /// [`Subscription`] is dropped
    ///
    /// Events are handled one at a time, in publication order. Must be called
    /// within a tokio runtime.
    pub fn subscribe<F, Fut>(&self, repository: RepositoryId, on_event: F) -> Subscription
    where
        F: Fn(RepositoryEvent) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        // subscribe before spawning so no event published after this call is missed
        let mut receiver = self.sender.subscribe();
        let watched = repository.clone();

        let task = tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(event) if event.repository == watched => on_event(event).await,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(
                            repository = %watched,
                            skipped,
                            "change trigger lagged, assuming history changed"
                        );
                        on_event(RepositoryEvent::history_changed(watched.clone())).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Subscription { repository, task }
    }
}

impl Default for ChangeTrigger {
    fn default() -> Self {
        Self::new()
    }
}

/// Live subscription to a [`ChangeTrigger`]; dropping it unsubscribes
#[derive(Debug)]
pub struct Subscription {
    repository: RepositoryId,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn repository(&self) -> &RepositoryId {
        &self.repository
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
