//! Commit graph walker
//!
//! Produces every commit reachable from a set of start commits exactly once,
//! children before parents. Commits are loaded through a caller supplied
//! loader so the walker works against the on-disk database as well as the
//! in-memory graphs used in tests.
//!
//! ## Orders
//!
//! - [`RevOrder::Topological`]: a commit is never produced before any of its
//!   descendants, whatever the timestamps say. Commits whose relative order is
//!   not fixed by ancestry come newest first, then in discovery order. The
//!   commit headers of the reachable graph are read once before the first
//!   commit is produced; production itself stays lazy.
//! - [`RevOrder::Chronological`]: a priority queue keyed on commit time that
//!   only reads the commits it produces plus the current frontier. Children
//!   come before parents as long as commit times grow along parent links.
//!
//! ## Missing commits
//!
//! A commit id that is not in the store (shallow clone, partial object store)
//! ends that branch of the walk and is recorded as a [`TraversalGap`]. Any
//! other loader failure is yielded once as an error, after which the
//! iterator is exhausted.

use crate::artifacts::objects::commit::{Commit, CommitEntry};
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;
use derive_new::new;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};
use tracing::{debug, trace, warn};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct WalkMarks: u8 {
        /// Reached from a start commit or a parent link
        const SEEN = 0b001;
        /// Present in the store and loaded
        const PARSED = 0b010;
        /// Handed to the consumer
        const EMITTED = 0b100;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevOrder {
    #[default]
    Topological,
    Chronological,
}

/// A commit id referenced during the walk but absent from the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct TraversalGap {
    /// The id that could not be found
    pub missing: ObjectId,
    /// The commit whose parent link pointed at it, `None` for a start commit
    pub referenced_by: Option<ObjectId>,
}

#[derive(Clone, new)]
pub struct RevList<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<Option<Commit>>,
{
    commit_loader: CommitLoaderFn,
    start_oids: Vec<ObjectId>,
    order: RevOrder,
}

impl<CommitLoaderFn> IntoIterator for RevList<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<Option<Commit>>,
{
    type Item = anyhow::Result<CommitEntry>;
    type IntoIter = RevListIntoIter<CommitLoaderFn>;

    fn into_iter(self) -> Self::IntoIter {
        RevListIntoIter {
            commit_loader: self.commit_loader,
            order: self.order,
            pending_starts: Some(self.start_oids),
            marks: HashMap::new(),
            queue: BinaryHeap::new(),
            waiting: HashMap::new(),
            gaps: Vec::new(),
            next_sequence: 0,
            deferred_error: None,
            exhausted: false,
        }
    }
}

/// Queue entry, ordered newest first and then by discovery order
struct QueuedCommit {
    timestamp: i64,
    sequence: u64,
    entry: CommitEntry,
}

impl PartialEq for QueuedCommit {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueuedCommit {}

impl PartialOrd for QueuedCommit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueuedCommit {
    fn cmp(&self, other: &Self) -> Ordering {
        // max heap: later timestamps first, then earlier discovery
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// A loaded commit waiting for its remaining children to be produced
struct WaitingCommit {
    queued: QueuedCommit,
    unproduced_children: usize,
}

pub struct RevListIntoIter<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<Option<Commit>>,
{
    commit_loader: CommitLoaderFn,
    order: RevOrder,
    /// Start commits, consumed on the first call to `next`
    pending_starts: Option<Vec<ObjectId>>,
    marks: HashMap<ObjectId, WalkMarks>,
    /// Commits ready to be produced
    queue: BinaryHeap<QueuedCommit>,
    /// Topological order only: commits with children still to be produced
    waiting: HashMap<ObjectId, WaitingCommit>,
    gaps: Vec<TraversalGap>,
    next_sequence: u64,
    /// Failure met while preparing the commit after the one just produced
    deferred_error: Option<anyhow::Error>,
    exhausted: bool,
}

impl<CommitLoaderFn> RevListIntoIter<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<Option<Commit>>,
{
    /// Commits found missing so far
    pub fn gaps(&self) -> &[TraversalGap] {
        &self.gaps
    }

    pub fn into_gaps(self) -> Vec<TraversalGap> {
        self.gaps
    }

    /// Mark `oid` as seen and load it
    ///
    /// Returns `Ok(None)` if it was already seen or is missing from the store.
    fn visit(
        &mut self,
        oid: &ObjectId,
        referenced_by: Option<&ObjectId>,
    ) -> anyhow::Result<Option<QueuedCommit>> {
        let marks = self.marks.entry(oid.clone()).or_insert(WalkMarks::empty());
        if marks.contains(WalkMarks::SEEN) {
            return Ok(None);
        }
        marks.insert(WalkMarks::SEEN);

        match (self.commit_loader)(oid)? {
            Some(commit) => {
                self.marks
                    .entry(oid.clone())
                    .and_modify(|marks| marks.insert(WalkMarks::PARSED));

                let sequence = self.next_sequence;
                self.next_sequence += 1;

                Ok(Some(QueuedCommit {
                    timestamp: commit.timestamp().timestamp(),
                    sequence,
                    entry: CommitEntry::new(oid.clone(), commit),
                }))
            }
            None => {
                warn!(
                    missing = %oid,
                    referenced_by = ?referenced_by.map(ObjectId::to_short_oid),
                    "commit missing from object store, history below it is cut off"
                );
                self.gaps
                    .push(TraversalGap::new(oid.clone(), referenced_by.cloned()));

                Ok(None)
            }
        }
    }

    fn start(&mut self, start_oids: Vec<ObjectId>) -> anyhow::Result<()> {
        match self.order {
            RevOrder::Chronological => {
                for oid in &start_oids {
                    if let Some(queued) = self.visit(oid, None)? {
                        self.queue.push(queued);
                    }
                }
            }
            RevOrder::Topological => self.discover(&start_oids)?,
        }

        Ok(())
    }

    /// Read every reachable commit once and count, for each of them, the
    /// children that must be produced before it
    fn discover(&mut self, start_oids: &[ObjectId]) -> anyhow::Result<()> {
        let mut pending = start_oids
            .iter()
            .map(|oid| (oid.clone(), None))
            .collect::<VecDeque<(ObjectId, Option<ObjectId>)>>();
        let mut child_counts = HashMap::<ObjectId, usize>::new();
        let mut loaded = Vec::new();

        while let Some((oid, referenced_by)) = pending.pop_front() {
            let Some(queued) = self.visit(&oid, referenced_by.as_ref())? else {
                continue;
            };

            for parent_oid in queued.entry.commit.parents() {
                *child_counts.entry(parent_oid.clone()).or_default() += 1;
                pending.push_back((parent_oid.clone(), Some(oid.clone())));
            }
            loaded.push(queued);
        }

        debug!(
            commits = loaded.len(),
            gaps = self.gaps.len(),
            "discovered reachable history"
        );

        for queued in loaded {
            let unproduced_children = child_counts
                .get(&queued.entry.oid)
                .copied()
                .unwrap_or_default();

            if unproduced_children == 0 {
                self.queue.push(queued);
            } else {
                self.waiting.insert(
                    queued.entry.oid.clone(),
                    WaitingCommit {
                        queued,
                        unproduced_children,
                    },
                );
            }
        }

        Ok(())
    }

    /// Make the parents of a produced commit available for production
    fn release_parents(&mut self, produced: &CommitEntry) -> anyhow::Result<()> {
        match self.order {
            RevOrder::Chronological => {
                for parent_oid in produced.commit.parents() {
                    if let Some(queued) = self.visit(parent_oid, Some(&produced.oid))? {
                        self.queue.push(queued);
                    }
                }
            }
            RevOrder::Topological => {
                for parent_oid in produced.commit.parents() {
                    let ready = match self.waiting.get_mut(parent_oid) {
                        Some(waiting) => {
                            waiting.unproduced_children -= 1;
                            waiting.unproduced_children == 0
                        }
                        None => false,
                    };

                    if ready && let Some(waiting) = self.waiting.remove(parent_oid) {
                        self.queue.push(waiting.queued);
                    }
                }
            }
        }

        Ok(())
    }

    fn fail(&mut self, error: anyhow::Error) -> Option<anyhow::Result<CommitEntry>> {
        self.exhausted = true;
        self.queue.clear();
        self.waiting.clear();

        Some(Err(error))
    }
}

impl<CommitLoaderFn> Iterator for RevListIntoIter<CommitLoaderFn>
where
    CommitLoaderFn: Fn(&ObjectId) -> anyhow::Result<Option<Commit>>,
{
    type Item = anyhow::Result<CommitEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }

        if let Some(error) = self.deferred_error.take() {
            return self.fail(error);
        }

        if let Some(start_oids) = self.pending_starts.take()
            && let Err(error) = self.start(start_oids)
        {
            return self.fail(error);
        }

        let Some(queued) = self.queue.pop() else {
            self.exhausted = true;
            return None;
        };

        let entry = queued.entry;
        self.marks
            .entry(entry.oid.clone())
            .and_modify(|marks| marks.insert(WalkMarks::EMITTED));
        trace!(commit = %entry.oid.to_short_oid(), "produced commit");

        // the produced commit is still returned; the failure surfaces on the next call
        if let Err(error) = self.release_parents(&entry) {
            self.deferred_error = Some(error);
        }

        Some(Ok(entry))
    }
}
