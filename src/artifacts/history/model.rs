//! History reconciliation model
//!
//! Owns the history currently shown for one repository and keeps it up to
//! date. Runs are requested explicitly ([`HistoryModel::reconcile`],
//! [`HistoryModel::set_repository`]) or by a `HistoryChanged` event on the
//! [`ChangeTrigger`]. At most one run is in flight per model: requests that
//! arrive meanwhile collapse into a single follow-up run.
//!
//! ## States
//!
//! ```text
//! Idle ──request──> Reconciling { pending: false } ──request──> Reconciling { pending: true }
//!   ^                        │                                              │
//!   └──── run done ──────────┘          run done: start the follow-up ─────┘
//! ```
//!
//! A successful run replaces the published sequence in one step; a failed
//! run leaves it untouched.

use crate::areas::repository::RepositoryId;
use crate::artifacts::history::error::HistoryError;
use crate::artifacts::history::reconcile::ReconcileOptions;
use crate::artifacts::history::sequence::HistorySequence;
use crate::artifacts::history::trigger::{ChangeTrigger, RepositoryEventKind, Subscription};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info};

/// Something a history can be reconciled from
///
/// Implemented by [`Repository`](crate::areas::repository::Repository).
/// `reconcile` blocks on I/O and is always called from the blocking pool.
pub trait HistorySource: Send + Sync + 'static {
    fn identity(&self) -> &RepositoryId;

    fn reconcile(&self, options: &ReconcileOptions) -> Result<HistorySequence, HistoryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Idle,
    Reconciling {
        /// Another run was requested while this one is in flight
        pending: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelStats {
    /// Number of runs requested so far
    pub requested: u64,
    /// Number of runs finished so far, successful or not
    pub completed: u64,
}

/// Outcome of the run that served every request up to `generation`
#[derive(Debug, Clone)]
struct RunReport {
    generation: u64,
    outcome: Result<(), HistoryError>,
}

struct Binding<S> {
    epoch: u64,
    source: Arc<S>,
}

impl<S> Clone for Binding<S> {
    fn clone(&self) -> Self {
        Binding {
            epoch: self.epoch,
            source: Arc::clone(&self.source),
        }
    }
}

struct Schedule<S> {
    state: ModelState,
    binding: Option<Binding<S>>,
    /// Bumped on every rebind; results of older epochs are dropped
    epoch: u64,
    requested: u64,
    completed: u64,
}

struct ModelInner<S> {
    options: ReconcileOptions,
    schedule: Mutex<Schedule<S>>,
    history: watch::Sender<Arc<HistorySequence>>,
    reports: watch::Sender<RunReport>,
}

pub struct HistoryModel<S: HistorySource> {
    inner: Arc<ModelInner<S>>,
    trigger: ChangeTrigger,
    subscription: Mutex<Option<Subscription>>,
}

impl<S: HistorySource> HistoryModel<S> {
    pub fn new(trigger: ChangeTrigger, options: ReconcileOptions) -> Self {
        let (history, _) = watch::channel(Arc::new(HistorySequence::empty(None)));
        let (reports, _) = watch::channel(RunReport {
            generation: 0,
            outcome: Ok(()),
        });

        HistoryModel {
            inner: Arc::new(ModelInner {
                options,
                schedule: Mutex::new(Schedule {
                    state: ModelState::Idle,
                    binding: None,
                    epoch: 0,
                    requested: 0,
                    completed: 0,
                }),
                history,
                reports,
            }),
            trigger,
            subscription: Mutex::new(None),
        }
    }

    /// Bind the model to `source` and wait for its first history
    ///
    /// An empty sequence for the new repository is published right away. The
    /// subscription for the previous repository is dropped, and a run still
    /// in flight for it will not publish.
    pub async fn set_repository(&self, source: S) -> Result<Arc<HistorySequence>, HistoryError> {
        let repository = source.identity().clone();

        {
            let mut schedule = self.inner.schedule.lock().await;
            schedule.epoch += 1;
            schedule.binding = Some(Binding {
                epoch: schedule.epoch,
                source: Arc::new(source),
            });
            self.inner
                .history
                .send_replace(Arc::new(HistorySequence::empty(Some(repository.clone()))));
        }

        let inner = Arc::clone(&self.inner);
        let subscription = self.trigger.subscribe(repository.clone(), move |event| {
            let inner = Arc::clone(&inner);
            async move {
                if event.kind == RepositoryEventKind::HistoryChanged {
                    debug!(repository = %event.repository, "history changed");
                    inner.request().await;
                }
            }
        });
        // replacing the old subscription stops its task
        *self.subscription.lock().await = Some(subscription);

        info!(%repository, "history model bound");
        self.reconcile().await
    }

    /// Reconcile now and return the resulting history
    ///
    /// Resolves with the outcome of the first run started after this call,
    /// which may be shared with other requests coalesced into it.
    pub async fn reconcile(&self) -> Result<Arc<HistorySequence>, HistoryError> {
        let mut reports = self.inner.reports.subscribe();
        let ticket = self.inner.request().await;

        let report = reports
            .wait_for(|report| report.generation >= ticket)
            .await
            .map_err(|err| HistoryError::Closed(err.to_string()))?
            .clone();

        report.outcome.map(|()| self.current_history())
    }

    pub fn current_history(&self) -> Arc<HistorySequence> {
        self.inner.history.borrow().clone()
    }

    /// Receiver notified each time a new history is published
    pub fn watch_history(&self) -> watch::Receiver<Arc<HistorySequence>> {
        self.inner.history.subscribe()
    }

    pub async fn repository(&self) -> Option<RepositoryId> {
        let schedule = self.inner.schedule.lock().await;
        schedule
            .binding
            .as_ref()
            .map(|binding| binding.source.identity().clone())
    }

    pub async fn state(&self) -> ModelState {
        self.inner.schedule.lock().await.state
    }

    pub async fn stats(&self) -> ModelStats {
        let schedule = self.inner.schedule.lock().await;
        ModelStats {
            requested: schedule.requested,
            completed: schedule.completed,
        }
    }
}

impl<S: HistorySource> ModelInner<S> {
    /// Ask for a run, returning the generation that will serve it
    async fn request(self: &Arc<Self>) -> u64 {
        let mut schedule = self.schedule.lock().await;
        schedule.requested += 1;

        match schedule.state {
            ModelState::Idle => {
                schedule.state = ModelState::Reconciling { pending: false };
                tokio::spawn(Arc::clone(self).drive());
            }
            ModelState::Reconciling { pending } => {
                if pending {
                    debug!(generation = schedule.requested, "coalescing history request");
                }
                schedule.state = ModelState::Reconciling { pending: true };
            }
        }

        schedule.requested
    }

    /// Run until no request is pending, then go back to idle
    async fn drive(self: Arc<Self>) {
        loop {
            let (generation, binding) = {
                let schedule = self.schedule.lock().await;
                (schedule.requested, schedule.binding.clone())
            };

            let outcome = self.run(binding).await;
            if let Err(err) = &outcome {
                error!(%err, "history reconciliation failed, keeping the previous history");
            }
            self.reports.send_replace(RunReport {
                generation,
                outcome,
            });

            let mut schedule = self.schedule.lock().await;
            schedule.completed += 1;
            match schedule.state {
                ModelState::Reconciling { pending: true } => {
                    schedule.state = ModelState::Reconciling { pending: false };
                }
                _ => {
                    schedule.state = ModelState::Idle;
                    break;
                }
            }
        }
    }

    async fn run(&self, binding: Option<Binding<S>>) -> Result<(), HistoryError> {
        let binding = binding.ok_or(HistoryError::Unbound)?;
        let source = Arc::clone(&binding.source);
        let options = self.options.clone();

        let sequence = tokio::task::spawn_blocking(move || source.reconcile(&options))
            .await
            .map_err(|err| HistoryError::Closed(err.to_string()))??;

        let schedule = self.schedule.lock().await;
        if schedule.epoch != binding.epoch {
            debug!(
                repository = %binding.source.identity(),
                "discarding history of a previously bound repository"
            );
            return Ok(());
        }

        info!(
            repository = %binding.source.identity(),
            rows = sequence.len(),
            "publishing history"
        );
        self.history.send_replace(Arc::new(sequence));

        Ok(())
    }
}
