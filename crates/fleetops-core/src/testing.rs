// ── Test doubles ──
//
// In-memory gateway and recording notifier shared by the unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use tokio::sync::Semaphore;
use strum::IntoEnumIterator;
use uuid::Uuid;

use fleetops_api::{Filter, FilterOp, Query};

use crate::error::CoreError;
use crate::gateway::Gateway;
use crate::model::{EntityId, Fields, Record, display_value};
use crate::notify::{Notifier, Toast};
use crate::schema::{Choice, EntityKind, ReferenceTarget};

pub(crate) fn row(value: Value) -> Fields {
    value.as_object().cloned().unwrap()
}

/// One gateway invocation, as observed by the in-memory gateway.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Fetch(EntityKind),
    Insert(EntityKind, Fields),
    Update(EntityKind, EntityId, Fields),
    Delete(EntityKind, EntityId),
    Count(EntityKind, Vec<Filter>),
    Choices(&'static str),
}

/// Gateway over per-kind vectors. Rows keep insertion order; `eq`, `in`
/// and `is` filters and limits are honoured, ordering is not.
#[derive(Default)]
pub(crate) struct MemoryGateway {
    tables: Mutex<HashMap<EntityKind, Vec<Record>>>,
    /// Rows of tables no descriptor manages (e.g. `profiles`).
    others: Mutex<HashMap<&'static str, Vec<Record>>>,
    calls: Mutex<Vec<Call>>,
    failure: Mutex<Option<String>>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MemoryGateway {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn seed(&self, kind: EntityKind, rows: Vec<Fields>) {
        let records = rows
            .into_iter()
            .map(|r| Record::from_row(r).unwrap())
            .collect();
        self.tables.lock().unwrap().insert(kind, records);
    }

    pub(crate) fn seed_table(&self, table: &'static str, rows: Vec<Fields>) {
        let records = rows
            .into_iter()
            .map(|r| Record::from_row(r).unwrap())
            .collect();
        self.others.lock().unwrap().insert(table, records);
    }

    /// Make the next call fail with `message`.
    pub(crate) fn fail_next(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_owned());
    }

    /// Hold every call until a permit is added to the returned semaphore.
    pub(crate) fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap() = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Mutating calls only.
    pub(crate) fn mutations(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Fetch(_) | Call::Count(..) | Call::Choices(_)))
            .collect()
    }

    pub(crate) fn rows(&self, kind: EntityKind) -> Vec<Record> {
        self.tables
            .lock()
            .unwrap()
            .get(&kind)
            .cloned()
            .unwrap_or_default()
    }

    async fn enter(&self, call: Call) -> Result<(), CoreError> {
        self.calls.lock().unwrap().push(call);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
        match self.failure.lock().unwrap().take() {
            Some(message) => Err(CoreError::Gateway { message }),
            None => Ok(()),
        }
    }
}

fn filter_matches(record: &Record, filter: &Filter) -> bool {
    let actual = record
        .fields()
        .get(&filter.column)
        .map(display_value)
        .unwrap_or_default();
    match filter.op {
        FilterOp::Eq => actual == filter.value,
        FilterOp::Neq => actual != filter.value,
        FilterOp::In => filter.value.split(',').any(|v| v == actual),
        FilterOp::Is => match filter.value.as_str() {
            "null" => actual.is_empty(),
            other => actual == other,
        },
        _ => true,
    }
}

impl Gateway for MemoryGateway {
    async fn fetch_all(&self, kind: EntityKind, query: &Query) -> Result<Vec<Record>, CoreError> {
        self.enter(Call::Fetch(kind)).await?;
        let mut rows: Vec<Record> = self
            .rows(kind)
            .into_iter()
            .filter(|r| query.filters.iter().all(|f| filter_matches(r, f)))
            .collect();
        if let Some(limit) = query.limit {
            rows.truncate(usize::try_from(limit).unwrap());
        }
        Ok(rows)
    }

    async fn insert(&self, kind: EntityKind, fields: &Fields) -> Result<Record, CoreError> {
        self.enter(Call::Insert(kind, fields.clone())).await?;
        let mut row = fields.clone();
        row.insert("id".into(), Value::String(Uuid::new_v4().to_string()));
        row.insert(
            "created_at".into(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, false)),
        );
        let record = Record::from_row(row)?;
        self.tables
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        fields: &Fields,
    ) -> Result<Record, CoreError> {
        self.enter(Call::Update(kind, id.clone(), fields.clone()))
            .await?;
        let mut tables = self.tables.lock().unwrap();
        let slot = tables
            .entry(kind)
            .or_default()
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| CoreError::NotFound {
                entity_type: kind.descriptor().table.to_owned(),
                identifier: id.to_string(),
            })?;
        *slot = slot.merged(fields);
        Ok(slot.clone())
    }

    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<(), CoreError> {
        self.enter(Call::Delete(kind, id.clone())).await?;
        if let Some(rows) = self.tables.lock().unwrap().get_mut(&kind) {
            rows.retain(|r| r.id() != id);
        }
        Ok(())
    }

    async fn count(&self, kind: EntityKind, filters: &[Filter]) -> Result<u64, CoreError> {
        self.enter(Call::Count(kind, filters.to_vec())).await?;
        let n = self
            .rows(kind)
            .iter()
            .filter(|r| filters.iter().all(|f| filter_matches(r, f)))
            .count();
        Ok(u64::try_from(n).unwrap())
    }

    async fn choices(&self, target: ReferenceTarget) -> Result<Vec<Choice>, CoreError> {
        self.enter(Call::Choices(target.table)).await?;
        let managed = EntityKind::iter().find(|k| k.descriptor().table == target.table);
        let rows = match managed {
            Some(kind) => self.rows(kind),
            None => self
                .others
                .lock()
                .unwrap()
                .get(target.table)
                .cloned()
                .unwrap_or_default(),
        };
        let mut choices: Vec<Choice> = rows
            .iter()
            .map(|r| Choice {
                id: r.id().clone(),
                label: r.display(target.display),
            })
            .collect();
        choices.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(choices)
    }
}

/// Keeps every toast for inspection.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub(crate) fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    pub(crate) fn last(&self) -> Option<Toast> {
        self.toasts.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}
