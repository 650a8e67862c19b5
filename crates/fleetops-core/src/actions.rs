// ── Quick actions ──
//
// One-click mutations launched from a list row. Each one computes its
// patch from the current record, makes exactly one gateway update, then
// patches the controller and sends one toast.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use tracing::{info, warn};

use crate::controller::ListController;
use crate::error::{CoreError, ValidationError};
use crate::gateway::Gateway;
use crate::model::{EntityId, Fields, Record};
use crate::notify::Toast;
use crate::schema::{EntityKind, next_due};

// ── Work order lifecycle ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum WorkOrderStatus {
    Pending,
    InProgress,
    Completed,
}

impl WorkOrderStatus {
    /// The status the advance action moves to. Completed reopens.
    pub fn next(self) -> Self {
        match self {
            Self::Pending => Self::InProgress,
            Self::InProgress => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    /// Button label for advancing from this status.
    pub fn action_label(self) -> &'static str {
        match self {
            Self::Pending => "Start Work",
            Self::InProgress => "Complete",
            Self::Completed => "Reopen",
        }
    }
}

// ── Stock adjustment ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustDirection {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdjustment {
    pub direction: AdjustDirection,
    pub quantity: i64,
}

impl StockAdjustment {
    pub fn add(quantity: i64) -> Self {
        Self {
            direction: AdjustDirection::Add,
            quantity,
        }
    }

    pub fn remove(quantity: i64) -> Self {
        Self {
            direction: AdjustDirection::Remove,
            quantity,
        }
    }

    /// New on-hand quantity, or why the adjustment is refused.
    pub fn apply(self, current: i64) -> Result<i64, ValidationError> {
        if self.quantity < 1 {
            return Err(ValidationError::InvalidAdjustment {
                quantity: self.quantity,
            });
        }
        match self.direction {
            AdjustDirection::Add => Ok(current.saturating_add(self.quantity)),
            AdjustDirection::Remove if self.quantity > current => {
                Err(ValidationError::InsufficientStock {
                    available: current,
                    requested: self.quantity,
                })
            }
            AdjustDirection::Remove => Ok(current - self.quantity),
        }
    }
}

// ── QuickAction ──────────────────────────────────────────────────────

/// A row-level mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    AdvanceWorkOrder,
    AdjustStock(StockAdjustment),
    CompleteMaintenance,
    AcknowledgeAlert,
}

impl QuickAction {
    /// The entity kind this action applies to.
    pub fn kind(self) -> EntityKind {
        match self {
            Self::AdvanceWorkOrder => EntityKind::WorkOrders,
            Self::AdjustStock(_) => EntityKind::Inventory,
            Self::CompleteMaintenance => EntityKind::Maintenance,
            Self::AcknowledgeAlert => EntityKind::Alerts,
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            Self::AdvanceWorkOrder => "Work order status updated",
            Self::AdjustStock(_) => "Stock adjusted successfully",
            Self::CompleteMaintenance => "Maintenance marked as complete",
            Self::AcknowledgeAlert => "Alert acknowledged",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            Self::AdvanceWorkOrder => "Failed to update status",
            Self::AdjustStock(_) => "Failed to adjust stock",
            Self::CompleteMaintenance => "Failed to mark maintenance complete",
            Self::AcknowledgeAlert => "Failed to acknowledge alert",
        }
    }

    /// The update payload for `record`, computed at `now`.
    pub fn fields(self, record: &Record, now: DateTime<Utc>) -> Result<Fields, CoreError> {
        let stamp = Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true));
        let mut fields = Fields::new();
        match self {
            Self::AdvanceWorkOrder => {
                let current = record
                    .text("status")
                    .and_then(|s| s.parse::<WorkOrderStatus>().ok())
                    .ok_or_else(|| CoreError::InvalidState {
                        message: format!(
                            "work order {} has unknown status {:?}",
                            record.id(),
                            record.display("status")
                        ),
                    })?;
                let next = current.next();
                fields.insert("status".into(), Value::String(next.to_string()));
                let completed_at = if next == WorkOrderStatus::Completed {
                    stamp
                } else {
                    Value::Null
                };
                fields.insert("completed_at".into(), completed_at);
            }
            Self::AdjustStock(adjustment) => {
                let current = record.int("quantity_available").unwrap_or(0);
                let updated = adjustment.apply(current)?;
                fields.insert("quantity_available".into(), updated.into());
            }
            Self::CompleteMaintenance => {
                let due = next_due(
                    now,
                    record.int("interval_hours"),
                    record.int("interval_cycles"),
                )
                .ok_or_else(|| CoreError::InvalidState {
                    message: format!("maintenance {} has an out-of-range interval", record.id()),
                })?;
                fields.insert("last_performed".into(), stamp);
                fields.insert(
                    "next_due".into(),
                    Value::String(due.to_rfc3339_opts(SecondsFormat::Millis, true)),
                );
            }
            Self::AcknowledgeAlert => {
                fields.insert("is_acknowledged".into(), Value::Bool(true));
                fields.insert("acknowledged_at".into(), stamp);
            }
        }
        Ok(fields)
    }
}

impl fmt::Display for QuickAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdvanceWorkOrder => f.write_str("advance work order"),
            Self::AdjustStock(adj) => match adj.direction {
                AdjustDirection::Add => write!(f, "add {} to stock", adj.quantity),
                AdjustDirection::Remove => write!(f, "remove {} from stock", adj.quantity),
            },
            Self::CompleteMaintenance => f.write_str("complete maintenance"),
            Self::AcknowledgeAlert => f.write_str("acknowledge alert"),
        }
    }
}

// ── Execution ────────────────────────────────────────────────────────

impl<G: Gateway> ListController<G> {
    /// Run `action` against the record `id` in this controller's collection.
    ///
    /// Rejections (bad adjustment, unknown status) happen before any
    /// gateway call and are reported with an error toast. A gateway
    /// failure marks the controller `Error` and keeps the collection.
    pub async fn run(
        &self,
        action: QuickAction,
        id: &EntityId,
        now: DateTime<Utc>,
    ) -> Result<Arc<Record>, CoreError> {
        if action.kind() != self.kind() {
            return Err(CoreError::InvalidState {
                message: format!("cannot {action} on {}", self.descriptor().plural),
            });
        }
        let record = self.get(id).ok_or_else(|| CoreError::NotFound {
            entity_type: self.descriptor().singular.to_owned(),
            identifier: id.to_string(),
        })?;

        let fields = match action.fields(&record, now) {
            Ok(fields) => fields,
            Err(e) => {
                warn!(%id, error = %e, "quick action rejected");
                self.notifier().notify(Toast::error(e.to_string()));
                return Err(e);
            }
        };

        match self.gateway().update(self.kind(), id, &fields).await {
            Ok(updated) => {
                info!(%id, %action, "quick action applied");
                let stored = self.apply_update(updated);
                self.notifier().notify(Toast::success(action.success_message()));
                Ok(stored)
            }
            Err(e) => {
                warn!(%id, %action, error = %e, "quick action failed");
                self.fail(e.to_string());
                self.notifier().notify(Toast::error(action.failure_message()));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::controller::ListPhase;
    use crate::notify::{Notifier, ToastKind};
    use crate::testing::{Call, MemoryGateway, RecordingNotifier, row};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 30, 0).unwrap()
    }

    async fn controller(
        kind: EntityKind,
        rows: Vec<Value>,
    ) -> (
        Arc<MemoryGateway>,
        Arc<RecordingNotifier>,
        ListController<MemoryGateway>,
    ) {
        let gateway = Arc::new(MemoryGateway::new());
        gateway.seed(kind, rows.into_iter().map(row).collect());
        let notifier = Arc::new(RecordingNotifier::default());
        let controller = ListController::new(
            kind,
            Arc::clone(&gateway),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
        );
        controller.load().await.unwrap();
        (gateway, notifier, controller)
    }

    #[test]
    fn adjustment_rules() {
        assert_eq!(StockAdjustment::add(5).apply(10), Ok(15));
        assert_eq!(StockAdjustment::remove(10).apply(10), Ok(0));
        assert_eq!(
            StockAdjustment::remove(15).apply(10),
            Err(ValidationError::InsufficientStock {
                available: 10,
                requested: 15
            })
        );
        assert_eq!(
            StockAdjustment::add(0).apply(10),
            Err(ValidationError::InvalidAdjustment { quantity: 0 })
        );
    }

    #[test]
    fn work_order_labels_follow_status() {
        assert_eq!(WorkOrderStatus::Pending.action_label(), "Start Work");
        assert_eq!(WorkOrderStatus::InProgress.action_label(), "Complete");
        assert_eq!(WorkOrderStatus::Completed.next(), WorkOrderStatus::Pending);
        assert_eq!(
            "in_progress".parse::<WorkOrderStatus>().unwrap(),
            WorkOrderStatus::InProgress
        );
    }

    #[tokio::test]
    async fn over_removal_never_reaches_gateway() {
        let (gateway, notifier, controller) = controller(
            EntityKind::Inventory,
            vec![json!({ "id": "p1", "part_number": "PN-1", "quantity_available": 10 })],
        )
        .await;

        let err = controller
            .run(
                QuickAction::AdjustStock(StockAdjustment::remove(15)),
                &EntityId::from("p1"),
                now(),
            )
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert!(gateway.mutations().is_empty());
        let toast = notifier.last().unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.description.starts_with("Cannot remove more than available quantity"));
        assert_eq!(
            controller
                .get(&EntityId::from("p1"))
                .unwrap()
                .int("quantity_available"),
            Some(10)
        );
    }

    #[tokio::test]
    async fn removal_writes_new_quantity() {
        let (gateway, notifier, controller) = controller(
            EntityKind::Inventory,
            vec![json!({ "id": "p1", "part_number": "PN-1", "quantity_available": 10 })],
        )
        .await;

        let updated = controller
            .run(
                QuickAction::AdjustStock(StockAdjustment::remove(5)),
                &EntityId::from("p1"),
                now(),
            )
            .await
            .unwrap();

        assert_eq!(updated.int("quantity_available"), Some(5));
        assert_eq!(
            gateway.mutations(),
            vec![Call::Update(
                EntityKind::Inventory,
                EntityId::from("p1"),
                row(json!({ "quantity_available": 5 })),
            )]
        );
        assert_eq!(
            notifier.last().unwrap().description,
            "Stock adjusted successfully"
        );
    }

    #[tokio::test]
    async fn work_order_walks_its_lifecycle() {
        let (_, _, controller) = controller(
            EntityKind::WorkOrders,
            vec![json!({ "id": "w1", "title": "Replace brake", "status": "pending" })],
        )
        .await;
        let id = EntityId::from("w1");

        let started = controller
            .run(QuickAction::AdvanceWorkOrder, &id, now())
            .await
            .unwrap();
        assert_eq!(started.text("status"), Some("in_progress"));
        assert_eq!(started.get("completed_at"), None);

        let done = controller
            .run(QuickAction::AdvanceWorkOrder, &id, now())
            .await
            .unwrap();
        assert_eq!(done.text("status"), Some("completed"));
        assert_eq!(done.timestamp("completed_at"), Some(now()));
    }

    #[tokio::test]
    async fn gateway_failure_marks_controller() {
        let (gateway, notifier, controller) = controller(
            EntityKind::Alerts,
            vec![json!({ "id": "x1", "alert_type": "Vibration", "is_acknowledged": false })],
        )
        .await;

        gateway.fail_next("permission denied for table predictive_alerts");
        let result = controller
            .run(QuickAction::AcknowledgeAlert, &EntityId::from("x1"), now())
            .await;

        assert!(result.is_err());
        assert!(matches!(controller.phase(), ListPhase::Error { .. }));
        assert!(!controller.get(&EntityId::from("x1")).unwrap().flag("is_acknowledged"));
        assert_eq!(
            notifier.last().unwrap().description,
            "Failed to acknowledge alert"
        );
    }

    #[tokio::test]
    async fn complete_maintenance_recomputes_next_due() {
        let (_, _, controller) = controller(
            EntityKind::Maintenance,
            vec![json!({
                "id": "m1", "maintenance_type": "A-check",
                "interval_hours": 240, "last_performed": "2024-01-01T00:00:00Z"
            })],
        )
        .await;

        let record = controller
            .run(QuickAction::CompleteMaintenance, &EntityId::from("m1"), now())
            .await
            .unwrap();
        assert_eq!(record.timestamp("last_performed"), Some(now()));
        assert_eq!(
            record.timestamp("next_due"),
            Some(Utc.with_ymd_and_hms(2024, 3, 25, 9, 30, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn action_for_another_entity_is_refused() {
        let (gateway, _, controller) = controller(
            EntityKind::Aircraft,
            vec![json!({ "id": "a1", "tail_number": "N1" })],
        )
        .await;
        let result = controller
            .run(QuickAction::AcknowledgeAlert, &EntityId::from("a1"), now())
            .await;
        assert!(matches!(result, Err(CoreError::InvalidState { .. })));
        assert!(gateway.mutations().is_empty());
    }
}
