// ── Fleet tables ──
//
// One descriptor per managed table.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use serde_json::Value;

use super::{Column, EntityDescriptor, EntityKind, FieldSpec, ReferenceTarget, SortKey};
use crate::error::ValidationError;
use crate::model::{Fields, parse_timestamp};

const AIRCRAFT_STATUS: &[&str] = &["operational", "maintenance", "grounded"];
const PRIORITY: &[&str] = &["low", "medium", "high", "critical"];
const WORK_ORDER_STATUS: &[&str] = &["pending", "in_progress", "completed"];
const COMPLIANCE_STATUS: &[&str] = &["compliant", "pending", "non_compliant"];
const SEVERITY: &[&str] = &["low", "medium", "high", "critical"];

const AIRCRAFT_REF: ReferenceTarget = ReferenceTarget::new("aircraft", "tail_number");
const PROFILE_REF: ReferenceTarget = ReferenceTarget::new("profiles", "full_name");

/// Schedules with only a cycle interval come due after this many days.
const CYCLE_INTERVAL_DAYS: i64 = 30;

pub(crate) static AIRCRAFT: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Aircraft,
    table: "aircraft",
    singular: "Aircraft",
    plural: "Aircraft",
    select: "*",
    order: &[SortKey::asc("tail_number")],
    limit: None,
    fields: &[
        FieldSpec::text("tail_number", "Tail Number").required(),
        FieldSpec::text("aircraft_type", "Aircraft Type").required(),
        FieldSpec::text("manufacturer", "Manufacturer"),
        FieldSpec::text("model", "Model"),
        FieldSpec::integer("year_manufactured", "Year Manufactured"),
        FieldSpec::choice("status", "Status", AIRCRAFT_STATUS)
            .required()
            .default_text("operational"),
        FieldSpec::integer("total_flight_hours", "Total Flight Hours")
            .non_negative()
            .default_int(0),
        FieldSpec::integer("total_cycles", "Total Cycles")
            .non_negative()
            .default_int(0),
        FieldSpec::date("last_inspection", "Last Inspection"),
    ],
    title_field: "tail_number",
    columns: &[
        Column::new("tail_number", "Tail"),
        Column::new("aircraft_type", "Type"),
        Column::new("manufacturer", "Manufacturer"),
        Column::new("model", "Model"),
        Column::new("status", "Status"),
        Column::new("total_flight_hours", "Hours"),
        Column::new("total_cycles", "Cycles"),
        Column::new("last_inspection", "Inspected"),
    ],
    derive: None,
};

pub(crate) static WORK_ORDERS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::WorkOrders,
    table: "work_orders",
    singular: "Work order",
    plural: "Work orders",
    select: "*, aircraft(tail_number, aircraft_type), profiles(full_name)",
    order: &[SortKey::desc("created_at")],
    limit: None,
    fields: &[
        FieldSpec::text("title", "Title").required(),
        FieldSpec::text("description", "Description"),
        FieldSpec::choice("priority", "Priority", PRIORITY)
            .required()
            .default_text("medium"),
        FieldSpec::choice("status", "Status", WORK_ORDER_STATUS)
            .required()
            .default_text("pending"),
        FieldSpec::reference("aircraft_id", "Aircraft", AIRCRAFT_REF).required(),
        FieldSpec::reference("assigned_to", "Assigned To", PROFILE_REF),
    ],
    title_field: "title",
    columns: &[
        Column::new("title", "Title"),
        Column::new("aircraft.tail_number", "Aircraft"),
        Column::new("priority", "Priority"),
        Column::new("status", "Status"),
        Column::new("profiles.full_name", "Assignee"),
        Column::new("created_at", "Created"),
    ],
    derive: None,
};

pub(crate) static MAINTENANCE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Maintenance,
    table: "maintenance_schedule",
    singular: "Maintenance schedule",
    plural: "Maintenance schedules",
    select: "*, aircraft:aircraft_id(tail_number, aircraft_type)",
    order: &[SortKey::asc("next_due")],
    limit: None,
    fields: &[
        FieldSpec::text("maintenance_type", "Maintenance Type").required(),
        FieldSpec::reference("aircraft_id", "Aircraft", AIRCRAFT_REF).required(),
        FieldSpec::integer("interval_hours", "Interval (hours)").non_negative(),
        FieldSpec::integer("interval_cycles", "Interval (cycles)").non_negative(),
        FieldSpec::timestamp("last_performed", "Last Performed")
            .required()
            .default_today(),
        FieldSpec::text("notes", "Notes"),
    ],
    title_field: "maintenance_type",
    columns: &[
        Column::new("maintenance_type", "Type"),
        Column::new("aircraft.tail_number", "Aircraft"),
        Column::new("interval_hours", "Hours"),
        Column::new("interval_cycles", "Cycles"),
        Column::new("last_performed", "Last Performed"),
        Column::new("next_due", "Next Due"),
    ],
    derive: Some(derive_next_due),
};

pub(crate) static INVENTORY: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Inventory,
    table: "parts_inventory",
    singular: "Part",
    plural: "Parts",
    select: "*",
    order: &[SortKey::asc("part_number")],
    limit: None,
    fields: &[
        FieldSpec::text("part_number", "Part Number").required(),
        FieldSpec::text("part_name", "Part Name").required(),
        FieldSpec::integer("quantity_available", "Quantity Available")
            .required()
            .non_negative()
            .default_int(0),
        FieldSpec::integer("minimum_quantity", "Minimum Quantity")
            .non_negative()
            .default_int(0),
        FieldSpec::decimal("unit_cost", "Unit Cost")
            .non_negative()
            .default_int(0),
        FieldSpec::text("location", "Location"),
    ],
    title_field: "part_number",
    columns: &[
        Column::new("part_number", "Part #"),
        Column::new("part_name", "Name"),
        Column::new("quantity_available", "Qty"),
        Column::new("minimum_quantity", "Min"),
        Column::new("unit_cost", "Unit Cost"),
        Column::new("location", "Location"),
    ],
    derive: None,
};

pub(crate) static COMPLIANCE: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Compliance,
    table: "compliance_records",
    singular: "Compliance record",
    plural: "Compliance records",
    select: "*, aircraft:aircraft_id(tail_number, aircraft_type)",
    order: &[SortKey::desc("compliance_date")],
    limit: None,
    fields: &[
        FieldSpec::text("regulation_type", "Regulation Type").required(),
        FieldSpec::reference("aircraft_id", "Aircraft", AIRCRAFT_REF).required(),
        FieldSpec::choice("status", "Status", COMPLIANCE_STATUS)
            .required()
            .default_text("compliant"),
        FieldSpec::date("compliance_date", "Compliance Date")
            .required()
            .default_today(),
        FieldSpec::date("expiry_date", "Expiry Date"),
        FieldSpec::text("inspector_name", "Inspector"),
        FieldSpec::text("description", "Description"),
    ],
    title_field: "regulation_type",
    columns: &[
        Column::new("regulation_type", "Regulation"),
        Column::new("aircraft.tail_number", "Aircraft"),
        Column::new("status", "Status"),
        Column::new("compliance_date", "Date"),
        Column::new("expiry_date", "Expires"),
        Column::new("inspector_name", "Inspector"),
    ],
    derive: None,
};

pub(crate) static ALERTS: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Alerts,
    table: "predictive_alerts",
    singular: "Alert",
    plural: "Alerts",
    select: "*, aircraft:aircraft_id(tail_number, model, manufacturer)",
    order: &[SortKey::desc("created_at")],
    limit: None,
    fields: &[
        FieldSpec::text("alert_type", "Alert Type").required(),
        FieldSpec::choice("severity", "Severity", SEVERITY).required(),
        FieldSpec::text("description", "Description").required(),
        FieldSpec::text("component", "Component"),
        FieldSpec::decimal("confidence_score", "Confidence").non_negative(),
        FieldSpec::date("predicted_failure_date", "Predicted Failure"),
        FieldSpec::reference("aircraft_id", "Aircraft", AIRCRAFT_REF).required(),
    ],
    title_field: "alert_type",
    columns: &[
        Column::new("alert_type", "Alert"),
        Column::new("aircraft.tail_number", "Aircraft"),
        Column::new("severity", "Severity"),
        Column::new("component", "Component"),
        Column::new("confidence_score", "Confidence"),
        Column::new("is_acknowledged", "Ack"),
        Column::new("created_at", "Raised"),
    ],
    derive: None,
};

pub(crate) static TELEMETRY: EntityDescriptor = EntityDescriptor {
    kind: EntityKind::Telemetry,
    table: "atc_data",
    singular: "Telemetry reading",
    plural: "Telemetry readings",
    select: "*, aircraft(tail_number, aircraft_type)",
    order: &[SortKey::desc("timestamp")],
    limit: Some(50),
    fields: &[
        FieldSpec::reference("aircraft_id", "Aircraft", AIRCRAFT_REF).required(),
        FieldSpec::integer("altitude", "Altitude"),
        FieldSpec::integer("speed", "Speed").non_negative(),
        FieldSpec::integer("heading", "Heading").non_negative(),
        FieldSpec::boolean("anomaly_detected", "Anomaly"),
    ],
    title_field: "aircraft.tail_number",
    columns: &[
        Column::new("aircraft.tail_number", "Aircraft"),
        Column::new("altitude", "Altitude"),
        Column::new("speed", "Speed"),
        Column::new("heading", "Heading"),
        Column::new("anomaly_detected", "Anomaly"),
        Column::new("timestamp", "Time"),
    ],
    derive: None,
};

// ── Maintenance intervals ────────────────────────────────────────────

/// When a schedule performed at `last_performed` comes due again.
///
/// An hour interval adds whole days (`hours / 24`, rounded down). A
/// cycle-only interval adds 30 days. With neither, the schedule is due
/// again immediately. Zero counts as unset.
pub fn next_due(
    last_performed: DateTime<Utc>,
    interval_hours: Option<i64>,
    interval_cycles: Option<i64>,
) -> Option<DateTime<Utc>> {
    let days = match (
        interval_hours.filter(|h| *h != 0),
        interval_cycles.filter(|c| *c != 0),
    ) {
        (Some(hours), _) => hours.div_euclid(24),
        (None, Some(_)) => CYCLE_INTERVAL_DAYS,
        (None, None) => 0,
    };
    last_performed.checked_add_signed(TimeDelta::try_days(days)?)
}

fn derive_next_due(fields: &mut Fields) -> Result<(), ValidationError> {
    let Some(raw) = fields.get("last_performed").and_then(Value::as_str) else {
        return Ok(());
    };
    let last = parse_timestamp(raw).ok_or_else(|| ValidationError::InvalidTimestamp {
        field: "Last Performed".into(),
        value: raw.to_owned(),
    })?;

    let hours = fields.get("interval_hours").and_then(Value::as_i64);
    let cycles = fields.get("interval_cycles").and_then(Value::as_i64);
    let due = next_due(last, hours, cycles).ok_or_else(|| ValidationError::InvalidNumber {
        field: "Interval (hours)".into(),
        value: hours.unwrap_or_default().to_string(),
    })?;

    fields.insert(
        "next_due".into(),
        Value::String(due.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn hour_interval_adds_whole_days() {
        assert_eq!(next_due(at(2024, 1, 1), Some(500), None), Some(at(2024, 1, 21)));
        assert_eq!(next_due(at(2024, 1, 1), Some(23), Some(100)), Some(at(2024, 1, 1)));
    }

    #[test]
    fn cycle_interval_adds_thirty_days() {
        assert_eq!(next_due(at(2024, 1, 1), None, Some(100)), Some(at(2024, 1, 31)));
        assert_eq!(next_due(at(2024, 1, 1), Some(0), Some(100)), Some(at(2024, 1, 31)));
    }

    #[test]
    fn no_interval_is_due_immediately() {
        assert_eq!(next_due(at(2024, 1, 1), None, None), Some(at(2024, 1, 1)));
    }

    #[test]
    fn derive_fills_next_due() {
        let mut fields = json!({
            "last_performed": "2024-01-01T00:00:00.000Z",
            "interval_hours": 48,
            "interval_cycles": null
        })
        .as_object()
        .cloned()
        .unwrap();

        derive_next_due(&mut fields).unwrap();
        assert_eq!(fields["next_due"], "2024-01-03T00:00:00.000Z");
    }
}
