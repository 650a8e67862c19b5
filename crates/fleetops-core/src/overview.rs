// ── Dashboard overview and analytics ──
//
// Cross-entity reads for the landing screen. Counts go through the
// gateway's exact-count call; short lists use their own narrow queries
// rather than a list controller.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use fleetops_api::{Filter, Order, Query};

use crate::error::CoreError;
use crate::gateway::Gateway;
use crate::model::Record;
use crate::schema::EntityKind;
use crate::stats::{count_where, percentage, sum_int};

const PREVIEW_LIMIT: u32 = 5;

/// Fleet status at a glance.
#[derive(Debug, Clone, Serialize)]
pub struct FleetOverview {
    pub total_aircraft: u64,
    pub operational: u64,
    pub in_maintenance: u64,
    pub active_work_orders: u64,
    pub pending_alerts: u64,
    pub availability_pct: u32,
    /// Newest unacknowledged alerts.
    pub recent_alerts: Vec<Record>,
    /// Schedules coming due soonest.
    pub upcoming_maintenance: Vec<Record>,
}

impl FleetOverview {
    pub async fn fetch<G: Gateway>(gateway: &G) -> Result<Self, CoreError> {
        let unacknowledged = Filter::eq("is_acknowledged", false);
        let recent_alerts = Query::new()
            .select("*, aircraft:aircraft_id(tail_number)")
            .filter(unacknowledged.clone())
            .order(Order::desc("created_at"))
            .limit(PREVIEW_LIMIT);
        let upcoming = Query::new()
            .select("*, aircraft:aircraft_id(tail_number, aircraft_type)")
            .order(Order::asc("next_due"))
            .limit(PREVIEW_LIMIT);

        let operational_filter = [Filter::eq("status", "operational")];
        let maintenance_filter = [Filter::eq("status", "maintenance")];
        let active_filter = [Filter::in_list("status", ["pending", "in_progress"])];
        let (
            total_aircraft,
            operational,
            in_maintenance,
            active_work_orders,
            pending_alerts,
            recent_alerts,
            upcoming_maintenance,
        ) = tokio::try_join!(
            gateway.count(EntityKind::Aircraft, &[]),
            gateway.count(
                EntityKind::Aircraft,
                &operational_filter
            ),
            gateway.count(
                EntityKind::Aircraft,
                &maintenance_filter
            ),
            gateway.count(
                EntityKind::WorkOrders,
                &active_filter
            ),
            gateway.count(EntityKind::Alerts, std::slice::from_ref(&unacknowledged)),
            gateway.fetch_all(EntityKind::Alerts, &recent_alerts),
            gateway.fetch_all(EntityKind::Maintenance, &upcoming),
        )?;

        debug!(total_aircraft, pending_alerts, "overview fetched");
        Ok(Self {
            total_aircraft,
            operational,
            in_maintenance,
            active_work_orders,
            pending_alerts,
            availability_pct: percentage(operational, total_aircraft),
            recent_alerts,
            upcoming_maintenance,
        })
    }
}

/// Fleet-wide performance figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetAnalytics {
    pub total_work_orders: u64,
    pub completed_work_orders: u64,
    pub completion_pct: u32,
    pub inventory_value: f64,
    pub total_flight_hours: i64,
}

impl FleetAnalytics {
    pub async fn fetch<G: Gateway>(gateway: &G) -> Result<Self, CoreError> {
        let work_orders_query = Query::new().select("id, status");
        let parts_query = Query::new().select("id, quantity_available, unit_cost");
        let aircraft_query = Query::new().select("id, total_flight_hours");
        let (work_orders, parts, aircraft) = tokio::try_join!(
            gateway.fetch_all(EntityKind::WorkOrders, &work_orders_query),
            gateway.fetch_all(EntityKind::Inventory, &parts_query),
            gateway.fetch_all(EntityKind::Aircraft, &aircraft_query),
        )?;
        Ok(Self::compute(
            &shared(work_orders),
            &shared(parts),
            &shared(aircraft),
        ))
    }

    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn compute(
        work_orders: &[Arc<Record>],
        parts: &[Arc<Record>],
        aircraft: &[Arc<Record>],
    ) -> Self {
        let total = u64::try_from(work_orders.len()).unwrap_or(u64::MAX);
        let completed = u64::try_from(count_where(work_orders, |r| {
            r.text("status") == Some("completed")
        }))
        .unwrap_or(u64::MAX);
        let inventory_value = parts
            .iter()
            .map(|p| {
                p.int("quantity_available").unwrap_or(0) as f64 * p.float("unit_cost").unwrap_or(0.0)
            })
            .sum();
        Self {
            total_work_orders: total,
            completed_work_orders: completed,
            completion_pct: percentage(completed, total),
            inventory_value,
            total_flight_hours: sum_int(aircraft, "total_flight_hours"),
        }
    }
}

fn shared(records: Vec<Record>) -> Vec<Arc<Record>> {
    records.into_iter().map(Arc::new).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{MemoryGateway, row};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn seeded() -> MemoryGateway {
        let gateway = MemoryGateway::new();
        gateway.seed(
            EntityKind::Aircraft,
            vec![
                row(json!({ "id": "a1", "status": "operational", "total_flight_hours": 1200 })),
                row(json!({ "id": "a2", "status": "operational", "total_flight_hours": 800 })),
                row(json!({ "id": "a3", "status": "maintenance", "total_flight_hours": 4000 })),
            ],
        );
        gateway.seed(
            EntityKind::WorkOrders,
            vec![
                row(json!({ "id": "w1", "status": "pending" })),
                row(json!({ "id": "w2", "status": "in_progress" })),
                row(json!({ "id": "w3", "status": "completed" })),
                row(json!({ "id": "w4", "status": "completed" })),
            ],
        );
        gateway.seed(
            EntityKind::Alerts,
            vec![
                row(json!({ "id": "x1", "is_acknowledged": false })),
                row(json!({ "id": "x2", "is_acknowledged": true })),
            ],
        );
        gateway.seed(
            EntityKind::Inventory,
            vec![
                row(json!({ "id": "p1", "quantity_available": 4, "unit_cost": 12.5 })),
                row(json!({ "id": "p2", "quantity_available": 2, "unit_cost": "100" })),
            ],
        );
        gateway
    }

    #[tokio::test]
    async fn overview_counts_and_previews() {
        let gateway = seeded();
        let overview = FleetOverview::fetch(&gateway).await.unwrap();

        assert_eq!(overview.total_aircraft, 3);
        assert_eq!(overview.operational, 2);
        assert_eq!(overview.in_maintenance, 1);
        assert_eq!(overview.active_work_orders, 2);
        assert_eq!(overview.pending_alerts, 1);
        assert_eq!(overview.availability_pct, 67);
        assert_eq!(overview.recent_alerts.len(), 1);
        assert!(overview.upcoming_maintenance.is_empty());
    }

    #[tokio::test]
    async fn analytics_aggregates_across_tables() {
        let gateway = seeded();
        let analytics = FleetAnalytics::fetch(&gateway).await.unwrap();
        assert_eq!(
            analytics,
            FleetAnalytics {
                total_work_orders: 4,
                completed_work_orders: 2,
                completion_pct: 50,
                inventory_value: 250.0,
                total_flight_hours: 6000,
            }
        );
    }

    #[tokio::test]
    async fn any_failed_read_fails_the_overview() {
        let gateway = seeded();
        gateway.fail_next("statement timeout");
        let err = FleetOverview::fetch(&gateway).await.unwrap_err();
        assert_eq!(err.to_string(), "statement timeout");
    }
}
