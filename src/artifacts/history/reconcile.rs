//! A single reconciliation run
//!
//! Resolves the local and remote heads, walks everything reachable from the
//! resolved commits in topological order and annotates each commit with the
//! heads pointing at it.

use crate::areas::repository::{Repository, RepositoryId};
use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::history::error::HistoryError;
use crate::artifacts::history::model::HistorySource;
use crate::artifacts::history::row::HistoryRow;
use crate::artifacts::history::sequence::{HeadResolution, HistorySequence};
use crate::artifacts::log::rev_list::{RevList, RevOrder};
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;
use tracing::{debug, info};

/// The two refs whose histories are reconciled
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct HeadRefs {
    pub local: RefName,
    pub remote: RefName,
}

impl Default for HeadRefs {
    fn default() -> Self {
        HeadRefs {
            local: RefName::default_local(),
            remote: RefName::default_remote(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, new)]
pub struct ReconcileOptions {
    pub heads: HeadRefs,
    /// Stop after this many rows, `None` for the whole history
    pub max_count: Option<usize>,
}

/// Run one reconciliation against `repository`
///
/// Unresolved heads are recorded on the sequence; when neither head resolves
/// the sequence is empty. Failing to read refs or objects aborts the run, as
/// does a head pointing at a commit the object store does not hold. Missing
/// parents only cut the history short and are recorded as gaps.
pub fn reconcile(
    repository: &Repository,
    options: &ReconcileOptions,
) -> Result<HistorySequence, HistoryError> {
    let access = |error: anyhow::Error| HistoryError::access(repository.id(), error);

    let local = resolve(repository, &options.heads.local).map_err(access)?;
    let remote = resolve(repository, &options.heads.remote).map_err(access)?;

    let mut start_oids: Vec<ObjectId> = Vec::with_capacity(2);
    start_oids.extend(local.target.iter().cloned());
    start_oids.extend(remote.target.iter().cloned());

    if start_oids.is_empty() {
        debug!(repository = %repository.id(), "neither head resolves");
        return Ok(HistorySequence::new(
            Some(repository.id().clone()),
            Some(local),
            Some(remote),
            Vec::new(),
            Vec::new(),
            false,
        ));
    }

    let database = repository.database();
    let rev_list = RevList::new(
        |oid: &ObjectId| database.find_commit(oid),
        start_oids,
        RevOrder::Topological,
    );

    let limit = options.max_count.unwrap_or(usize::MAX);
    let mut rows = Vec::new();
    let mut truncated = false;
    let mut commits = rev_list.into_iter();

    for entry in commits.by_ref() {
        if rows.len() == limit {
            truncated = true;
            break;
        }

        let entry = entry.map_err(access)?;
        rows.push(HistoryRow::annotate(
            entry,
            local.target.as_ref(),
            remote.target.as_ref(),
        ));
    }

    let gaps = commits.into_gaps();
    // a head that resolves to an absent commit would read as an empty history
    if let Some(gap) = gaps.iter().find(|gap| gap.referenced_by.is_none()) {
        let head = if local.target.as_ref() == Some(&gap.missing) {
            &local.name
        } else {
            &remote.name
        };

        return Err(access(anyhow::anyhow!(
            "{head} points at {}, which is missing from the object store",
            gap.missing
        )));
    }

    info!(
        repository = %repository.id(),
        rows = rows.len(),
        gaps = gaps.len(),
        truncated,
        "reconciled history"
    );

    Ok(HistorySequence::new(
        Some(repository.id().clone()),
        Some(local),
        Some(remote),
        rows,
        gaps,
        truncated,
    ))
}

fn resolve(repository: &Repository, name: &RefName) -> anyhow::Result<HeadResolution> {
    Ok(HeadResolution::new(name.clone(), repository.resolve_head(name)?))
}

impl HistorySource for Repository {
    fn identity(&self) -> &RepositoryId {
        self.id()
    }

    fn reconcile(&self, options: &ReconcileOptions) -> Result<HistorySequence, HistoryError> {
        reconcile(self, options)
    }
}
