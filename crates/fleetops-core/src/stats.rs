// ── Derived aggregates ──
//
// Pure functions of a collection snapshot. Nothing here is stored or
// cached: callers recompute whenever they render.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::model::Record;
use crate::schema::EntityKind;

// ── Primitives ───────────────────────────────────────────────────────

pub fn count_where(records: &[Arc<Record>], pred: impl Fn(&Record) -> bool) -> usize {
    records.iter().filter(|r| pred(r)).count()
}

/// Sum of an integer column; missing values count as zero. Saturates
/// instead of overflowing.
pub fn sum_int(records: &[Arc<Record>], field: &str) -> i64 {
    records
        .iter()
        .filter_map(|r| r.int(field))
        .fold(0, i64::saturating_add)
}

/// Mean of an integer column over *all* records, missing values as zero.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn average(records: &[Arc<Record>], field: &str) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    Some(sum_int(records, field) as f64 / records.len() as f64)
}

/// `part / whole` as a whole percentage, rounded; `0` for an empty whole.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
pub fn percentage(part: u64, whole: u64) -> u32 {
    if whole == 0 {
        return 0;
    }
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

fn count(records: &[Arc<Record>], field: &str, value: &str) -> u64 {
    to_u64(count_where(records, |r| r.text(field) == Some(value)))
}

fn to_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

// ── Per-entity summaries ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AircraftSummary {
    pub total: u64,
    pub operational: u64,
    pub in_maintenance: u64,
    pub grounded: u64,
    pub total_flight_hours: i64,
    pub availability_pct: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkOrderSummary {
    pub total: u64,
    pub pending: u64,
    pub in_progress: u64,
    pub completed: u64,
    pub critical_open: u64,
    pub completion_pct: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaintenanceSummary {
    pub total: u64,
    pub overdue: u64,
    pub due_within_week: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InventorySummary {
    pub parts: u64,
    pub low_stock: u64,
    pub total_units: i64,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceSummary {
    pub total: u64,
    pub compliant: u64,
    pub pending: u64,
    pub non_compliant: u64,
    pub compliance_pct: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertSummary {
    pub total: u64,
    pub active: u64,
    pub acknowledged: u64,
    pub critical_active: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySummary {
    pub readings: u64,
    pub avg_altitude: Option<i64>,
    pub avg_speed: Option<i64>,
    pub anomalies: u64,
}

/// Aggregates for one list screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Summary {
    Aircraft(AircraftSummary),
    WorkOrders(WorkOrderSummary),
    Maintenance(MaintenanceSummary),
    Inventory(InventorySummary),
    Compliance(ComplianceSummary),
    Alerts(AlertSummary),
    Telemetry(TelemetrySummary),
}

impl Summary {
    /// Summarize `records` of `kind`. `now` anchors due-date math.
    pub fn of(kind: EntityKind, records: &[Arc<Record>], now: DateTime<Utc>) -> Self {
        match kind {
            EntityKind::Aircraft => Self::Aircraft(aircraft(records)),
            EntityKind::WorkOrders => Self::WorkOrders(work_orders(records)),
            EntityKind::Maintenance => Self::Maintenance(maintenance(records, now)),
            EntityKind::Inventory => Self::Inventory(inventory(records)),
            EntityKind::Compliance => Self::Compliance(compliance(records)),
            EntityKind::Alerts => Self::Alerts(alerts(records)),
            EntityKind::Telemetry => Self::Telemetry(telemetry(records)),
        }
    }

    /// `(label, value)` lines for display.
    pub fn lines(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Aircraft(s) => vec![
                ("Total Aircraft", s.total.to_string()),
                ("Operational", s.operational.to_string()),
                ("In Maintenance", s.in_maintenance.to_string()),
                ("Grounded", s.grounded.to_string()),
                ("Total Flight Hours", s.total_flight_hours.to_string()),
                ("Fleet Availability", format!("{}%", s.availability_pct)),
            ],
            Self::WorkOrders(s) => vec![
                ("Total Work Orders", s.total.to_string()),
                ("Pending", s.pending.to_string()),
                ("In Progress", s.in_progress.to_string()),
                ("Completed", s.completed.to_string()),
                ("Critical Open", s.critical_open.to_string()),
                ("Completion Rate", format!("{}%", s.completion_pct)),
            ],
            Self::Maintenance(s) => vec![
                ("Scheduled", s.total.to_string()),
                ("Overdue", s.overdue.to_string()),
                ("Due Within 7 Days", s.due_within_week.to_string()),
            ],
            Self::Inventory(s) => vec![
                ("Total Parts", s.parts.to_string()),
                ("Low Stock", s.low_stock.to_string()),
                ("Units On Hand", s.total_units.to_string()),
                ("Inventory Value", format!("${:.2}", s.total_value)),
            ],
            Self::Compliance(s) => vec![
                ("Total Records", s.total.to_string()),
                ("Compliant", s.compliant.to_string()),
                ("Pending", s.pending.to_string()),
                ("Non-Compliant", s.non_compliant.to_string()),
                ("Compliance Rate", format!("{}%", s.compliance_pct)),
            ],
            Self::Alerts(s) => vec![
                ("Total Alerts", s.total.to_string()),
                ("Active", s.active.to_string()),
                ("Acknowledged", s.acknowledged.to_string()),
                ("Critical Active", s.critical_active.to_string()),
            ],
            Self::Telemetry(s) => vec![
                ("Readings", s.readings.to_string()),
                ("Avg Altitude (ft)", opt(s.avg_altitude)),
                ("Avg Speed (kts)", opt(s.avg_speed)),
                ("Anomalies", s.anomalies.to_string()),
            ],
        }
    }
}

fn opt(value: Option<i64>) -> String {
    value.map_or_else(|| "N/A".to_owned(), |v| v.to_string())
}

fn aircraft(records: &[Arc<Record>]) -> AircraftSummary {
    let total = to_u64(records.len());
    let operational = count(records, "status", "operational");
    AircraftSummary {
        total,
        operational,
        in_maintenance: count(records, "status", "maintenance"),
        grounded: count(records, "status", "grounded"),
        total_flight_hours: sum_int(records, "total_flight_hours"),
        availability_pct: percentage(operational, total),
    }
}

fn work_orders(records: &[Arc<Record>]) -> WorkOrderSummary {
    let total = to_u64(records.len());
    let completed = count(records, "status", "completed");
    WorkOrderSummary {
        total,
        pending: count(records, "status", "pending"),
        in_progress: count(records, "status", "in_progress"),
        completed,
        critical_open: to_u64(count_where(records, |r| {
            r.text("priority") == Some("critical") && r.text("status") != Some("completed")
        })),
        completion_pct: percentage(completed, total),
    }
}

fn maintenance(records: &[Arc<Record>], now: DateTime<Utc>) -> MaintenanceSummary {
    let week = now + TimeDelta::days(7);
    MaintenanceSummary {
        total: to_u64(records.len()),
        overdue: to_u64(count_where(records, |r| {
            r.timestamp("next_due").is_some_and(|due| due < now)
        })),
        due_within_week: to_u64(count_where(records, |r| {
            r.timestamp("next_due")
                .is_some_and(|due| due >= now && due < week)
        })),
    }
}

/// A part is low on stock once it is at or below its minimum.
pub fn is_low_stock(record: &Record) -> bool {
    record.int("quantity_available").unwrap_or(0) <= record.int("minimum_quantity").unwrap_or(0)
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn inventory(records: &[Arc<Record>]) -> InventorySummary {
    InventorySummary {
        parts: to_u64(records.len()),
        low_stock: to_u64(count_where(records, is_low_stock)),
        total_units: sum_int(records, "quantity_available"),
        total_value: records
            .iter()
            .map(|r| {
                r.int("quantity_available").unwrap_or(0) as f64 * r.float("unit_cost").unwrap_or(0.0)
            })
            .sum(),
    }
}

fn compliance(records: &[Arc<Record>]) -> ComplianceSummary {
    let total = to_u64(records.len());
    let compliant = count(records, "status", "compliant");
    ComplianceSummary {
        total,
        compliant,
        pending: count(records, "status", "pending"),
        non_compliant: count(records, "status", "non_compliant"),
        compliance_pct: percentage(compliant, total),
    }
}

fn alerts(records: &[Arc<Record>]) -> AlertSummary {
    let acknowledged = to_u64(count_where(records, |r| r.flag("is_acknowledged")));
    let total = to_u64(records.len());
    AlertSummary {
        total,
        active: total - acknowledged,
        acknowledged,
        critical_active: to_u64(count_where(records, |r| {
            !r.flag("is_acknowledged") && r.text("severity") == Some("critical")
        })),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
fn telemetry(records: &[Arc<Record>]) -> TelemetrySummary {
    TelemetrySummary {
        readings: to_u64(records.len()),
        avg_altitude: average(records, "altitude").map(|a| a.round() as i64),
        avg_speed: average(records, "speed").map(|a| a.round() as i64),
        anomalies: to_u64(count_where(records, |r| r.flag("anomaly_detected"))),
    }
}
