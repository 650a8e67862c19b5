// ── List controller ──
//
// Owns the collection one list screen shows. Loads it through the
// gateway, patches it locally after successful mutations, and exposes
// snapshots for rendering and aggregates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use fleetops_api::{Filter, Query};

use crate::error::CoreError;
use crate::gateway::Gateway;
use crate::model::{EntityId, Record};
use crate::notify::{Notifier, Toast};
use crate::schema::{EntityDescriptor, EntityKind};
use crate::stats::Summary;
use crate::store::{RecordCollection, Snapshot};
use crate::stream::RecordStream;

// ── ListPhase ────────────────────────────────────────────────────

/// Load state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListPhase {
    /// Nothing fetched yet.
    Idle,
    Loading,
    Ready,
    /// The last load or background action failed. The previous
    /// collection is still shown.
    Error { message: String },
}

// ── ListController ───────────────────────────────────────────────

/// Per-entity owner of the displayed collection.
///
/// Cheaply cloneable via `Arc<ListInner>`; dialogs and quick actions
/// hold a clone to patch the collection after they mutate.
pub struct ListController<G: Gateway> {
    inner: Arc<ListInner<G>>,
}

struct ListInner<G: Gateway> {
    kind: EntityKind,
    query: Query,
    gateway: Arc<G>,
    notifier: Arc<dyn Notifier>,
    records: RecordCollection,
    phase: watch::Sender<ListPhase>,
}

impl<G: Gateway> Clone for ListController<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: Gateway> ListController<G> {
    /// Controller using the descriptor's default query.
    pub fn new(kind: EntityKind, gateway: Arc<G>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_query(kind, kind.descriptor().query(), gateway, notifier)
    }

    /// Controller with a narrowed query (extra filters, different limit).
    pub fn with_query(
        kind: EntityKind,
        query: Query,
        gateway: Arc<G>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let (phase, _) = watch::channel(ListPhase::Idle);
        Self {
            inner: Arc::new(ListInner {
                kind,
                query,
                gateway,
                notifier,
                records: RecordCollection::new(),
                phase,
            }),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.inner.kind
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.inner.kind.descriptor()
    }

    pub fn query(&self) -> &Query {
        &self.inner.query
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.inner.gateway
    }

    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.inner.notifier
    }

    // ── State ────────────────────────────────────────────────────

    pub fn phase(&self) -> ListPhase {
        self.inner.phase.borrow().clone()
    }

    fn set_phase(&self, phase: ListPhase) {
        self.inner.phase.send_replace(phase);
    }

    /// Current collection (cheap `Arc` clone).
    pub fn records(&self) -> Snapshot {
        self.inner.records.snapshot()
    }

    pub fn get(&self, id: &EntityId) -> Option<Arc<Record>> {
        self.inner.records.get(id)
    }

    pub fn len(&self) -> usize {
        self.inner.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> RecordStream {
        RecordStream::new(self.inner.records.subscribe())
    }

    /// Aggregates over the current collection, computed on demand.
    pub fn summary(&self, now: DateTime<Utc>) -> Summary {
        Summary::of(self.kind(), &self.records(), now)
    }

    // ── Fetch ────────────────────────────────────────────────────

    /// Fetch the collection. On failure the previous collection stays,
    /// the phase becomes `Error`, and an error toast is sent. No retry.
    pub async fn load(&self) -> Result<Snapshot, CoreError> {
        let descriptor = self.descriptor();
        self.set_phase(ListPhase::Loading);
        debug!(table = descriptor.table, "loading collection");

        match self
            .inner
            .gateway
            .fetch_all(self.kind(), &self.inner.query)
            .await
        {
            Ok(records) => {
                self.inner.records.replace_all(records);
                self.set_phase(ListPhase::Ready);
                Ok(self.records())
            }
            Err(e) => {
                let message = e.to_string();
                warn!(table = descriptor.table, error = %message, "load failed");
                self.set_phase(ListPhase::Error {
                    message: message.clone(),
                });
                self.inner.notifier.notify(Toast::error(format!(
                    "Failed to fetch {}",
                    descriptor.plural.to_lowercase()
                )));
                Err(CoreError::Fetch {
                    entity: descriptor.plural.to_owned(),
                    message,
                })
            }
        }
    }

    /// Fetch one record by id and merge it into the collection.
    pub async fn fetch_one(&self, id: &EntityId) -> Result<Arc<Record>, CoreError> {
        let query = Query::new()
            .select(self.descriptor().select)
            .filter(Filter::eq("id", id))
            .limit(1);
        let record = self
            .inner
            .gateway
            .fetch_all(self.kind(), &query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::NotFound {
                entity_type: self.descriptor().singular.to_owned(),
                identifier: id.to_string(),
            })?;
        Ok(self.inner.records.upsert(record).0)
    }

    // ── Local patches ────────────────────────────────────────────

    /// Add a freshly created record at the end of the collection.
    pub fn apply_insert(&self, record: Record) -> Arc<Record> {
        let (stored, is_new) = self.inner.records.upsert(record);
        if !is_new {
            debug!(id = %stored.id(), "insert patch replaced an existing record");
        }
        self.set_phase(ListPhase::Ready);
        stored
    }

    /// Replace a record in place, keeping its position.
    pub fn apply_update(&self, record: Record) -> Arc<Record> {
        let (stored, is_new) = self.inner.records.upsert(record);
        if is_new {
            debug!(id = %stored.id(), "update patch for a record not in the collection");
        }
        self.set_phase(ListPhase::Ready);
        stored
    }

    /// Drop a record; the rest keep their relative order.
    pub fn apply_delete(&self, id: &EntityId) -> Option<Arc<Record>> {
        let removed = self.inner.records.remove(id);
        self.set_phase(ListPhase::Ready);
        removed
    }

    /// Mark a failed background action. The collection is untouched.
    pub fn fail(&self, message: impl Into<String>) {
        self.set_phase(ListPhase::Error {
            message: message.into(),
        });
    }
}
