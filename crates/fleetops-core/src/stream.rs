// ── Reactive record streams ──
//
// Subscription handle for consuming a list controller's changes.

use tokio::sync::watch;

use crate::store::Snapshot;

/// A subscription to one controller's collection.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed()`](Self::changed).
pub struct RecordStream {
    current: Snapshot,
    receiver: watch::Receiver<Snapshot>,
}

impl RecordStream {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation (or the last `changed()`).
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Snapshot {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the controller has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }
}
