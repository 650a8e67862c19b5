// ── Data access gateway ──
//
// The only component that touches persistence. Every call is one
// backend round trip: no retries, no caching, no client-side sorting.
// The process bootstrap owns the concrete gateway and passes it in;
// tests substitute an in-memory one.

use std::future::Future;

use tracing::{debug, info};

use fleetops_api::{Filter, Order, Query, TableClient};

use crate::error::CoreError;
use crate::model::{EntityId, Fields, Record};
use crate::schema::{Choice, EntityKind, ReferenceTarget};

/// Typed queries and mutations against the table store.
pub trait Gateway: Send + Sync + 'static {
    /// Rows of `kind` matching `query`, in backend order.
    fn fetch_all(
        &self,
        kind: EntityKind,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<Record>, CoreError>> + Send;

    /// Create a row and return it with its server-assigned id, shaped by
    /// the descriptor's projection so joined columns are present.
    fn insert(
        &self,
        kind: EntityKind,
        fields: &Fields,
    ) -> impl Future<Output = Result<Record, CoreError>> + Send;

    /// Patch the row `id` and return its new state, joins included.
    fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        fields: &Fields,
    ) -> impl Future<Output = Result<Record, CoreError>> + Send;

    fn delete(
        &self,
        kind: EntityKind,
        id: &EntityId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Exact number of rows of `kind` matching `filters`.
    fn count(
        &self,
        kind: EntityKind,
        filters: &[Filter],
    ) -> impl Future<Output = Result<u64, CoreError>> + Send;

    /// Rows a reference field may point at, ordered by their label.
    fn choices(
        &self,
        target: ReferenceTarget,
    ) -> impl Future<Output = Result<Vec<Choice>, CoreError>> + Send;
}

// ── REST implementation ──────────────────────────────────────────────

/// Gateway over the HTTP table interface.
#[derive(Debug, Clone)]
pub struct RestGateway {
    client: TableClient,
}

impl RestGateway {
    pub fn new(client: TableClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &TableClient {
        &self.client
    }
}

impl Gateway for RestGateway {
    async fn fetch_all(&self, kind: EntityKind, query: &Query) -> Result<Vec<Record>, CoreError> {
        let table = kind.descriptor().table;
        let rows = self.client.select(table, query).await?;
        debug!(table, count = rows.len(), "fetched rows");
        rows.into_iter().map(Record::from_row).collect()
    }

    async fn insert(&self, kind: EntityKind, fields: &Fields) -> Result<Record, CoreError> {
        let descriptor = kind.descriptor();
        let table = descriptor.table;
        let row = self
            .client
            .insert(table, fields, Some(descriptor.select))
            .await?;
        let record = Record::from_row(row)?;
        info!(table, id = %record.id(), "inserted row");
        Ok(record)
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: &EntityId,
        fields: &Fields,
    ) -> Result<Record, CoreError> {
        let descriptor = kind.descriptor();
        let table = descriptor.table;
        let row = self
            .client
            .update(table, &id.to_string(), fields, Some(descriptor.select))
            .await?;
        info!(table, %id, "updated row");
        Record::from_row(row)
    }

    async fn delete(&self, kind: EntityKind, id: &EntityId) -> Result<(), CoreError> {
        let table = kind.descriptor().table;
        self.client.delete(table, &id.to_string()).await?;
        info!(table, %id, "deleted row");
        Ok(())
    }

    async fn count(&self, kind: EntityKind, filters: &[Filter]) -> Result<u64, CoreError> {
        Ok(self.client.count(kind.descriptor().table, filters).await?)
    }

    async fn choices(&self, target: ReferenceTarget) -> Result<Vec<Choice>, CoreError> {
        let query = Query::new()
            .select(format!("id,{}", target.display))
            .order(Order::asc(target.display));
        let rows = self.client.select(target.table, &query).await?;
        debug!(table = target.table, count = rows.len(), "fetched choices");
        rows.into_iter()
            .map(|row| {
                let record = Record::from_row(row)?;
                Ok(Choice {
                    id: record.id().clone(),
                    label: record.display(target.display),
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use serde_json::json;

    use crate::actions::QuickAction;
    use crate::controller::ListController;
    use crate::notify::TracingNotifier;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> RestGateway {
        RestGateway::new(TableClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap())
    }

    #[tokio::test]
    async fn fetch_uses_descriptor_table_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/maintenance_schedule"))
            .and(query_param("order", "next_due.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "m1", "maintenance_type": "A-Check" },
                { "id": "m2", "maintenance_type": "C-Check" }
            ])))
            .mount(&server)
            .await;

        let gw = gateway(&server);
        let records = gw
            .fetch_all(
                EntityKind::Maintenance,
                &EntityKind::Maintenance.descriptor().query(),
            )
            .await
            .unwrap();

        let ids: Vec<String> = records.iter().map(|r| r.id().to_string()).collect();
        assert_eq!(ids, ["m1", "m2"]);
    }

    #[tokio::test]
    async fn backend_rejection_surfaces_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/aircraft"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({
                "code": "23505",
                "message": "duplicate key value violates unique constraint \"aircraft_tail_number_key\""
            })))
            .mount(&server)
            .await;

        let gw = gateway(&server);
        let err = gw
            .insert(EntityKind::Aircraft, &Fields::new())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint \"aircraft_tail_number_key\""
        );
    }

    #[tokio::test]
    async fn choices_read_id_and_label_in_label_order() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/profiles"))
            .and(query_param("select", "id,full_name"))
            .and(query_param("order", "full_name.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": "u2", "full_name": "Ana Ortiz" },
                { "id": "u1", "full_name": "Sam Reyes" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let choices = gateway(&server)
            .choices(ReferenceTarget::new("profiles", "full_name"))
            .await
            .unwrap();

        assert_eq!(
            choices,
            vec![
                Choice { id: EntityId::from("u2"), label: "Ana Ortiz".into() },
                Choice { id: EntityId::from("u1"), label: "Sam Reyes".into() },
            ]
        );
    }

    #[tokio::test]
    async fn mutations_return_rows_with_their_joins() {
        let server = MockServer::start().await;
        let joined = json!({
            "id": "wo-1",
            "title": "Replace brake assembly",
            "status": "pending",
            "aircraft_id": "ac-1",
            "aircraft": { "tail_number": "N101FO", "aircraft_type": "A320" },
            "profiles": { "full_name": "Dana Reyes" }
        });
        Mock::given(method("GET"))
            .and(path("/rest/v1/work_orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([joined])))
            .mount(&server)
            .await;

        let mut advanced = joined.clone();
        advanced["status"] = json!("in_progress");
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/work_orders"))
            .and(query_param("id", "eq.wo-1"))
            .and(query_param(
                "select",
                "*,aircraft(tail_number,aircraft_type),profiles(full_name)",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([advanced])))
            .expect(1)
            .mount(&server)
            .await;

        let controller = ListController::new(
            EntityKind::WorkOrders,
            Arc::new(gateway(&server)),
            Arc::new(TracingNotifier),
        );
        controller.load().await.unwrap();

        let id = EntityId::from("wo-1");
        controller
            .run(QuickAction::AdvanceWorkOrder, &id, Utc::now())
            .await
            .unwrap();

        let row = controller.get(&id).unwrap();
        assert_eq!(row.display("status"), "in_progress");
        assert_eq!(row.display("aircraft.tail_number"), "N101FO");
        assert_eq!(row.display("profiles.full_name"), "Dana Reyes");
    }
}
