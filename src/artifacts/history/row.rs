use crate::artifacts::objects::commit::{Commit, CommitEntry};
use crate::artifacts::objects::object_id::ObjectId;
use bitflags::bitflags;

bitflags! {
    /// Heads pointing at a commit
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HeadMarkers: u8 {
        const LOCAL = 0b01;
        const REMOTE = 0b10;
    }
}

impl HeadMarkers {
    pub fn label(&self) -> Option<&'static str> {
        if self.contains(HeadMarkers::LOCAL | HeadMarkers::REMOTE) {
            Some("(local/remote)")
        } else if self.contains(HeadMarkers::LOCAL) {
            Some("(local)")
        } else if self.contains(HeadMarkers::REMOTE) {
            Some("(remote)")
        } else {
            None
        }
    }
}

/// A commit of the reconciled history with the heads that point at it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    entry: CommitEntry,
    markers: HeadMarkers,
}

impl HistoryRow {
    /// Flag the row against the resolved local and remote heads
    pub fn annotate(
        entry: CommitEntry,
        local_head: Option<&ObjectId>,
        remote_head: Option<&ObjectId>,
    ) -> Self {
        let mut markers = HeadMarkers::empty();
        markers.set(HeadMarkers::LOCAL, local_head == Some(&entry.oid));
        markers.set(HeadMarkers::REMOTE, remote_head == Some(&entry.oid));

        HistoryRow { entry, markers }
    }

    pub fn oid(&self) -> &ObjectId {
        &self.entry.oid
    }

    pub fn commit(&self) -> &Commit {
        &self.entry.commit
    }

    pub fn markers(&self) -> HeadMarkers {
        self.markers
    }

    pub fn is_local_head(&self) -> bool {
        self.markers.contains(HeadMarkers::LOCAL)
    }

    pub fn is_remote_head(&self) -> bool {
        self.markers.contains(HeadMarkers::REMOTE)
    }
}
