// ── Ordered reactive record collection ──
//
// Backend order is the display order, so records are kept in a `Vec`
// inside the `watch` channel itself. Each mutation runs under the
// channel's write lock and publishes a fresh snapshot to subscribers.

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::{EntityId, Record};

/// Immutable view of a collection at one point in time.
pub type Snapshot = Arc<Vec<Arc<Record>>>;

/// The records one list screen currently shows.
pub(crate) struct RecordCollection {
    snapshot: watch::Sender<Snapshot>,
}

impl RecordCollection {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self { snapshot }
    }

    /// Swap in a freshly fetched set, keeping its order.
    pub(crate) fn replace_all(&self, records: Vec<Record>) {
        let records: Vec<Arc<Record>> = records.into_iter().map(Arc::new).collect();
        self.snapshot.send_replace(Arc::new(records));
    }

    /// Replace the record with the same id in place, or append it.
    /// Returns the stored record and `true` if the id was new.
    pub(crate) fn upsert(&self, record: Record) -> (Arc<Record>, bool) {
        let record = Arc::new(record);
        let mut is_new = false;
        self.snapshot.send_modify(|snap| {
            let records = Arc::make_mut(snap);
            if let Some(slot) = records.iter_mut().find(|r| r.id() == record.id()) {
                *slot = Arc::clone(&record);
            } else {
                records.push(Arc::clone(&record));
                is_new = true;
            }
        });
        (record, is_new)
    }

    /// Remove by id; the rest keep their relative order.
    pub(crate) fn remove(&self, id: &EntityId) -> Option<Arc<Record>> {
        let mut removed = None;
        self.snapshot.send_if_modified(|snap| {
            let Some(index) = snap.iter().position(|r| r.id() == id) else {
                return false;
            };
            removed = Some(Arc::make_mut(snap).remove(index));
            true
        });
        removed
    }

    pub(crate) fn get(&self, id: &EntityId) -> Option<Arc<Record>> {
        self.snapshot
            .borrow()
            .iter()
            .find(|r| r.id() == id)
            .map(Arc::clone)
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }
}
