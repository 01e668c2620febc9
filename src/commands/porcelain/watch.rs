//! Follow the heads of a repository and reprint its history when they move
//!
//! Head positions are polled; a change is published on the [`ChangeTrigger`]
//! and the history model bound to the repository reconciles in response.

use crate::areas::repository::Repository;
use crate::artifacts::history::model::HistoryModel;
use crate::artifacts::history::reconcile::HeadRefs;
use crate::artifacts::history::trigger::{ChangeTrigger, RepositoryEvent};
use crate::artifacts::objects::object_id::ObjectId;
use crate::commands::porcelain::log::{LogOptions, write_history};
use derive_new::new;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

#[derive(Debug, Clone, new)]
pub struct WatchOptions {
    pub log: LogOptions,
    pub interval: Duration,
}

/// Tracks where the two heads pointed at the last poll
#[derive(Debug)]
pub struct HeadPoller {
    repository: Repository,
    heads: HeadRefs,
    last: Option<(Option<ObjectId>, Option<ObjectId>)>,
}

impl HeadPoller {
    pub fn new(repository: Repository, heads: HeadRefs) -> Self {
        HeadPoller {
            repository,
            heads,
            last: None,
        }
    }

    /// Resolve both heads again; `true` when either moved since the last poll
    ///
    /// The first poll only records the positions.
    pub fn poll(&mut self) -> anyhow::Result<bool> {
        let current = (
            self.repository.resolve_head(&self.heads.local)?,
            self.repository.resolve_head(&self.heads.remote)?,
        );

        let moved = self.last.as_ref().is_some_and(|last| *last != current);
        if moved {
            debug!(local = ?current.0, remote = ?current.1, "heads moved");
        }
        self.last = Some(current);

        Ok(moved)
    }
}

/// Print the history, then reprint it after every change until interrupted
pub async fn watch(
    path: &Path,
    options: &WatchOptions,
    writer: &mut dyn Write,
) -> anyhow::Result<()> {
    let trigger = ChangeTrigger::new();
    let model = HistoryModel::new(trigger.clone(), options.log.reconcile.clone());

    let repository = Repository::open(path)?;
    let repository_id = repository.id().clone();
    let history = model.set_repository(repository).await?;
    write_history(&history, &options.log, writer)?;
    writer.flush()?;

    let mut updates = model.watch_history();
    updates.mark_unchanged();

    let mut poller = HeadPoller::new(
        Repository::open(path)?,
        options.log.reconcile.heads.clone(),
    );
    poller.poll()?;

    let mut interval = tokio::time::interval(options.interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(repository = %repository_id, interval = ?options.interval, "watching heads");

    loop {
        tokio::select! {
            _ = interval.tick() => {
                if poller.poll()? {
                    trigger.publish(RepositoryEvent::history_changed(repository_id.clone()));
                }
            }
            changed = updates.changed() => {
                changed?;
                let history = updates.borrow_and_update().clone();
                writeln!(writer)?;
                write_history(&history, &options.log, writer)?;
                writer.flush()?;
            }
            _ = &mut shutdown => break,
        }
    }

    Ok(())
}
