use recompose_common::error::RecomposeResult;
use recompose_model::session::{SessionSnapshot, SnapshotMeta};

use crate::store::{SnapshotKind, SnapshotStore, SnapshotSummary, StoredSnapshot};

/// Storage contract for whole-session snapshots.
///
/// Payloads are opaque to the store; it only keys, orders, and evicts them.
pub trait SnapshotRepository {
    fn insert(
        &mut self,
        kind: SnapshotKind,
        snapshot: &SessionSnapshot,
        meta: SnapshotMeta,
    ) -> RecomposeResult<SnapshotSummary>;

    /// Summaries, newest first.
    fn list(&self, kind: SnapshotKind) -> RecomposeResult<Vec<SnapshotSummary>>;

    fn get(&self, kind: SnapshotKind, id: &str) -> RecomposeResult<StoredSnapshot>;

    fn remove(&mut self, kind: SnapshotKind, id: &str) -> RecomposeResult<()>;

    /// Most recent snapshot of `kind`, if any.
    fn latest(&self, kind: SnapshotKind) -> RecomposeResult<Option<StoredSnapshot>> {
        match self.list(kind)?.first() {
            Some(summary) => self.get(kind, &summary.id).map(Some),
            None => Ok(None),
        }
    }
}

impl SnapshotRepository for SnapshotStore {
    fn insert(
        &mut self,
        kind: SnapshotKind,
        snapshot: &SessionSnapshot,
        meta: SnapshotMeta,
    ) -> RecomposeResult<SnapshotSummary> {
        SnapshotStore::insert(self, kind, snapshot, meta)
    }

    fn list(&self, kind: SnapshotKind) -> RecomposeResult<Vec<SnapshotSummary>> {
        SnapshotStore::list(self, kind)
    }

    fn get(&self, kind: SnapshotKind, id: &str) -> RecomposeResult<StoredSnapshot> {
        SnapshotStore::get(self, kind, id)
    }

    fn remove(&mut self, kind: SnapshotKind, id: &str) -> RecomposeResult<()> {
        SnapshotStore::remove(self, kind, id)
    }
}
