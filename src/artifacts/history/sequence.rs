use crate::areas::repository::RepositoryId;
use crate::artifacts::branch::ref_name::RefName;
use crate::artifacts::history::row::HistoryRow;
use crate::artifacts::log::rev_list::TraversalGap;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

/// A head name and the commit it resolved to, if any
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct HeadResolution {
    pub name: RefName,
    pub target: Option<ObjectId>,
}

/// Ordered, deduplicated history of one reconciliation run
///
/// Rows are in display order: every commit comes before its parents. Each
/// commit id appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct HistorySequence {
    repository: Option<RepositoryId>,
    local_head: Option<HeadResolution>,
    remote_head: Option<HeadResolution>,
    rows: Vec<HistoryRow>,
    gaps: Vec<TraversalGap>,
    /// More rows were reachable than the requested maximum
    truncated: bool,
}

impl HistorySequence {
    /// The sequence shown before (or instead of) any reconciliation result
    pub fn empty(repository: Option<RepositoryId>) -> Self {
        HistorySequence {
            repository,
            local_head: None,
            remote_head: None,
            rows: Vec::new(),
            gaps: Vec::new(),
            truncated: false,
        }
    }

    pub fn repository(&self) -> Option<&RepositoryId> {
        self.repository.as_ref()
    }

    pub fn local_head(&self) -> Option<&HeadResolution> {
        self.local_head.as_ref()
    }

    pub fn remote_head(&self) -> Option<&HeadResolution> {
        self.remote_head.as_ref()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HistoryRow> {
        self.rows.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryRow> {
        self.rows.iter()
    }

    /// Position of a commit in display order
    pub fn position(&self, oid: &ObjectId) -> Option<usize> {
        self.rows.iter().position(|row| row.oid() == oid)
    }

    /// Commits referenced by the history but absent from the object store
    pub fn gaps(&self) -> &[TraversalGap] {
        &self.gaps
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl<'a> IntoIterator for &'a HistorySequence {
    type Item = &'a HistoryRow;
    type IntoIter = std::slice::Iter<'a, HistoryRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
