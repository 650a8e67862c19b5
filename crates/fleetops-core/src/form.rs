// ── Entity form model ──
//
// A `Draft` is the string-keyed working copy of a record's editable
// fields while a dialog is open. Nothing is coerced until submission:
// `to_submission()` validates required marks, converts each string to
// the column's JSON type, and turns empty optionals into `null`. A field
// whose text is unchanged from the stored record is submitted in the
// stored form (decimal strings, timestamp offsets).

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, SecondsFormat};
use serde_json::{Number, Value};

use crate::error::ValidationError;
use crate::model::{Fields, Record, parse_timestamp};
use crate::schema::{EntityDescriptor, EntityKind, FieldDefault, FieldKind, FieldSpec};

/// Unsaved field values for one record of `kind`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    kind: EntityKind,
    values: BTreeMap<&'static str, String>,
    /// Columns of the record an Edit draft was seeded from.
    stored: Fields,
}

impl Draft {
    /// Seed a draft from a stored record (Edit dialogs).
    pub fn from_record(kind: EntityKind, record: &Record) -> Self {
        let values = kind
            .descriptor()
            .fields
            .iter()
            .map(|f| (f.name, record.get(f.name).map(raw_string).unwrap_or_default()))
            .collect();
        Self {
            kind,
            values,
            stored: record.fields().clone(),
        }
    }

    /// A fresh draft with each field's default (Add dialogs).
    pub fn with_defaults(kind: EntityKind, today: NaiveDate) -> Self {
        let values = kind
            .descriptor()
            .fields
            .iter()
            .map(|f| {
                let value = match f.default {
                    FieldDefault::Empty => String::new(),
                    FieldDefault::Text(s) => s.to_owned(),
                    FieldDefault::Integer(n) => n.to_string(),
                    FieldDefault::Today => today.format("%Y-%m-%d").to_string(),
                };
                (f.name, value)
            })
            .collect();
        Self {
            kind,
            values,
            stored: Fields::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn descriptor(&self) -> &'static EntityDescriptor {
        self.kind.descriptor()
    }

    /// Replace one field's raw value. Unknown names are rejected.
    pub fn set_field(mut self, name: &str, raw: impl Into<String>) -> Result<Self, ValidationError> {
        let spec = self
            .descriptor()
            .field(name)
            .ok_or_else(|| ValidationError::UnknownField {
                entity: self.descriptor().singular.to_owned(),
                field: name.to_owned(),
            })?;
        self.values.insert(spec.name, raw.into());
        Ok(self)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// `(field, raw value)` pairs in descriptor order.
    pub fn entries(&self) -> impl Iterator<Item = (&'static FieldSpec, &str)> + '_ {
        self.descriptor()
            .fields
            .iter()
            .map(|f| (f, self.value(f.name).unwrap_or_default()))
    }

    /// Validate and coerce into the payload for an insert or update.
    pub fn to_submission(&self) -> Result<Fields, ValidationError> {
        let descriptor = self.descriptor();
        let mut fields = Fields::new();
        for spec in descriptor.fields {
            let raw = self.value(spec.name).unwrap_or_default();
            let value = coerce(spec, raw)?;
            let value = match self.stored.get(spec.name) {
                Some(stored) if raw_string(stored) == raw => stored.clone(),
                _ => value,
            };
            fields.insert(spec.name.to_owned(), value);
        }
        if let Some(derive) = descriptor.derive {
            derive(&mut fields)?;
            self.keep_stored_derived(&mut fields);
        }
        Ok(fields)
    }

    /// Derived columns that land on the instant already stored keep the
    /// stored text.
    fn keep_stored_derived(&self, fields: &mut Fields) {
        let descriptor = self.descriptor();
        for (name, value) in fields.iter_mut() {
            if descriptor.field(name).is_some() {
                continue;
            }
            let Some(stored) = self.stored.get(name) else {
                continue;
            };
            if same_value(stored, value) {
                value.clone_from(stored);
            }
        }
    }
}

fn same_value(a: &Value, b: &Value) -> bool {
    if a == b {
        return true;
    }
    match (a.as_str().and_then(parse_timestamp), b.as_str().and_then(parse_timestamp)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

/// The record's columns that a draft of `kind` edits.
pub fn editable_fields(kind: EntityKind, record: &Record) -> Fields {
    kind.descriptor()
        .fields
        .iter()
        .map(|f| {
            let value = record.fields().get(f.name).cloned().unwrap_or(Value::Null);
            (f.name.to_owned(), value)
        })
        .collect()
}

// ── Coercion ─────────────────────────────────────────────────────────

fn raw_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce(spec: &FieldSpec, raw: &str) -> Result<Value, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return if spec.required {
            Err(ValidationError::MissingField {
                field: spec.label.to_owned(),
            })
        } else {
            Ok(Value::Null)
        };
    }

    let invalid_number = || ValidationError::InvalidNumber {
        field: spec.label.to_owned(),
        value: raw.to_owned(),
    };

    match spec.kind {
        FieldKind::Text => Ok(Value::String(raw.to_owned())),
        FieldKind::Reference(_) => Ok(Value::String(trimmed.to_owned())),
        FieldKind::Integer => {
            let n: i64 = trimmed.parse().map_err(|_| invalid_number())?;
            check_sign(spec, n < 0, trimmed)?;
            Ok(Value::from(n))
        }
        FieldKind::Decimal => {
            // Whole numbers stay integers so unmodified rows round-trip.
            if let Ok(n) = trimmed.parse::<i64>() {
                check_sign(spec, n < 0, trimmed)?;
                return Ok(Value::from(n));
            }
            let f: f64 = trimmed.parse().map_err(|_| invalid_number())?;
            let number = Number::from_f64(f).ok_or_else(invalid_number)?;
            check_sign(spec, f < 0.0, trimmed)?;
            Ok(Value::Number(number))
        }
        FieldKind::Date => NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .map_err(|_| ValidationError::InvalidDate {
                field: spec.label.to_owned(),
                value: raw.to_owned(),
            }),
        FieldKind::Timestamp => coerce_timestamp(spec, trimmed),
        FieldKind::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(Value::Bool(true)),
            "false" | "no" | "0" => Ok(Value::Bool(false)),
            _ => Err(ValidationError::InvalidBoolean {
                field: spec.label.to_owned(),
                value: raw.to_owned(),
            }),
        },
        FieldKind::Choice(options) => {
            if options.contains(&trimmed) {
                Ok(Value::String(trimmed.to_owned()))
            } else {
                Err(ValidationError::NotAllowed {
                    field: spec.label.to_owned(),
                    value: raw.to_owned(),
                    allowed: options.join(", "),
                })
            }
        }
    }
}

/// Full timestamps are submitted as typed; a bare date becomes midnight UTC.
fn coerce_timestamp(spec: &FieldSpec, trimmed: &str) -> Result<Value, ValidationError> {
    let invalid = || ValidationError::InvalidTimestamp {
        field: spec.label.to_owned(),
        value: trimmed.to_owned(),
    };
    if NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").is_ok() {
        let ts = parse_timestamp(trimmed).ok_or_else(invalid)?;
        return Ok(Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true)));
    }
    if DateTime::parse_from_rfc3339(trimmed).is_ok() || parse_timestamp(trimmed).is_some() {
        return Ok(Value::String(trimmed.to_owned()));
    }
    Err(invalid())
}

fn check_sign(spec: &FieldSpec, negative: bool, raw: &str) -> Result<(), ValidationError> {
    if spec.non_negative && negative {
        return Err(ValidationError::Negative {
            field: spec.label.to_owned(),
            value: raw.to_owned(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_row(value.as_object().cloned().unwrap()).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn unmodified_draft_round_trips_aircraft() {
        let r = record(json!({
            "id": "a1",
            "tail_number": "N101",
            "aircraft_type": "A320",
            "manufacturer": "Airbus",
            "model": null,
            "year_manufactured": 2015,
            "status": "operational",
            "total_flight_hours": 12000,
            "total_cycles": 8000,
            "last_inspection": "2024-03-01",
            "created_at": "2024-01-01T00:00:00+00:00"
        }));

        let submission = Draft::from_record(EntityKind::Aircraft, &r)
            .to_submission()
            .unwrap();
        assert_eq!(submission, editable_fields(EntityKind::Aircraft, &r));
    }

    #[test]
    fn unmodified_draft_round_trips_parts_and_alerts() {
        let part = record(json!({
            "id": "p1",
            "part_number": "P-100",
            "part_name": "Brake pad",
            "quantity_available": 10,
            "minimum_quantity": 4,
            "unit_cost": 12.5,
            "location": "Hangar 2"
        }));
        assert_eq!(
            Draft::from_record(EntityKind::Inventory, &part)
                .to_submission()
                .unwrap(),
            editable_fields(EntityKind::Inventory, &part)
        );

        let alert = record(json!({
            "id": "al1",
            "alert_type": "Vibration",
            "severity": "high",
            "description": "Fan blade imbalance",
            "component": "Engine 2",
            "confidence_score": 87,
            "predicted_failure_date": "2024-07-01",
            "aircraft_id": "550e8400-e29b-41d4-a716-446655440000"
        }));
        assert_eq!(
            Draft::from_record(EntityKind::Alerts, &alert)
                .to_submission()
                .unwrap(),
            editable_fields(EntityKind::Alerts, &alert)
        );
    }

    #[test]
    fn empty_optional_submits_null() {
        let draft = Draft::with_defaults(EntityKind::Compliance, today())
            .set_field("regulation_type", "FAR 91.409")
            .unwrap()
            .set_field("aircraft_id", "a1")
            .unwrap()
            .set_field("inspector_name", "")
            .unwrap();

        let submission = draft.to_submission().unwrap();
        assert_eq!(submission["inspector_name"], Value::Null);
        assert_eq!(submission["expiry_date"], Value::Null);
        assert_eq!(submission["compliance_date"], "2024-06-01");
        assert_eq!(submission["status"], "compliant");
    }

    #[test]
    fn missing_required_field_names_its_label() {
        let err = Draft::with_defaults(EntityKind::Aircraft, today())
            .set_field("tail_number", "N101")
            .unwrap()
            .to_submission()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingField {
                field: "Aircraft Type".into()
            }
        );
    }

    #[test]
    fn numbers_are_coerced_and_guarded() {
        let base = Draft::with_defaults(EntityKind::Aircraft, today())
            .set_field("tail_number", "N101")
            .unwrap()
            .set_field("aircraft_type", "A320")
            .unwrap();

        let ok = base
            .clone()
            .set_field("total_flight_hours", " 1200 ")
            .unwrap()
            .to_submission()
            .unwrap();
        assert_eq!(ok["total_flight_hours"], json!(1200));
        assert_eq!(ok["total_cycles"], json!(0));

        let negative = base
            .clone()
            .set_field("total_flight_hours", "-5")
            .unwrap()
            .to_submission();
        assert!(matches!(negative, Err(ValidationError::Negative { .. })));

        let garbage = base
            .set_field("total_cycles", "lots")
            .unwrap()
            .to_submission();
        assert!(matches!(garbage, Err(ValidationError::InvalidNumber { .. })));
    }

    #[test]
    fn choices_are_closed() {
        let err = Draft::with_defaults(EntityKind::WorkOrders, today())
            .set_field("title", "Replace tyre")
            .unwrap()
            .set_field("aircraft_id", "a1")
            .unwrap()
            .set_field("priority", "urgent")
            .unwrap()
            .to_submission()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotAllowed {
                field: "Priority".into(),
                value: "urgent".into(),
                allowed: "low, medium, high, critical".into(),
            }
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = Draft::with_defaults(EntityKind::Inventory, today())
            .set_field("serial_number", "X")
            .unwrap_err();
        assert!(matches!(err, ValidationError::UnknownField { .. }));
    }

    #[test]
    fn set_field_leaves_original_untouched() {
        let original = Draft::with_defaults(EntityKind::Inventory, today());
        let edited = original.clone().set_field("location", "Bay 4").unwrap();
        assert_eq!(original.value("location"), Some(""));
        assert_eq!(edited.value("location"), Some("Bay 4"));
    }

    #[test]
    fn maintenance_submission_derives_next_due() {
        let submission = Draft::with_defaults(EntityKind::Maintenance, today())
            .set_field("maintenance_type", "A-Check")
            .unwrap()
            .set_field("aircraft_id", "a1")
            .unwrap()
            .set_field("interval_hours", "600")
            .unwrap()
            .to_submission()
            .unwrap();

        assert_eq!(submission["last_performed"], "2024-06-01T00:00:00.000Z");
        assert_eq!(submission["next_due"], "2024-06-26T00:00:00.000Z");
        assert_eq!(submission["interval_cycles"], Value::Null);
        assert_eq!(submission["notes"], Value::Null);
    }

    #[test]
    fn stored_timestamps_are_submitted_as_read() {
        let r = record(json!({
            "id": "m1",
            "maintenance_type": "A-Check",
            "aircraft_id": "a1",
            "interval_hours": null,
            "interval_cycles": 100,
            "last_performed": "2024-05-01T08:30:00+00:00",
            "notes": "done"
        }));
        let submission = Draft::from_record(EntityKind::Maintenance, &r)
            .to_submission()
            .unwrap();
        assert_eq!(submission["last_performed"], "2024-05-01T08:30:00+00:00");
        assert_eq!(submission["next_due"], "2024-05-31T08:30:00.000Z");
    }

    #[test]
    fn telemetry_booleans_accept_common_spellings() {
        let submission = Draft::with_defaults(EntityKind::Telemetry, today())
            .set_field("aircraft_id", "a1")
            .unwrap()
            .set_field("anomaly_detected", "Yes")
            .unwrap()
            .to_submission()
            .unwrap();
        assert_eq!(submission["anomaly_detected"], Value::Bool(true));
        assert_eq!(submission["altitude"], Value::Null);
    }

    #[test]
    fn decimal_strings_round_trip_unchanged() {
        let part = record(json!({
            "id": "p2",
            "part_number": "P-200",
            "part_name": "Hydraulic seal",
            "quantity_available": 3,
            "minimum_quantity": 1,
            "unit_cost": "12.50",
            "location": null
        }));

        let draft = Draft::from_record(EntityKind::Inventory, &part);
        assert_eq!(draft.value("unit_cost"), Some("12.50"));
        assert_eq!(
            draft.to_submission().unwrap(),
            editable_fields(EntityKind::Inventory, &part)
        );

        let repriced = draft
            .set_field("unit_cost", "13.75")
            .unwrap()
            .to_submission()
            .unwrap();
        assert_eq!(repriced["unit_cost"], json!(13.75));
    }

    #[test]
    fn unchanged_maintenance_edit_keeps_stored_next_due() {
        let r = record(json!({
            "id": "m2",
            "maintenance_type": "C-Check",
            "aircraft_id": "a1",
            "interval_hours": null,
            "interval_cycles": 100,
            "last_performed": "2024-05-01T08:30:00+00:00",
            "next_due": "2024-05-31T08:30:00+00:00",
            "notes": null
        }));

        let draft = Draft::from_record(EntityKind::Maintenance, &r);
        let submission = draft.to_submission().unwrap();
        assert_eq!(submission["next_due"], "2024-05-31T08:30:00+00:00");

        let mut editable = submission;
        editable.remove("next_due");
        assert_eq!(editable, editable_fields(EntityKind::Maintenance, &r));

        let stretched = draft
            .set_field("interval_hours", "240")
            .unwrap()
            .to_submission()
            .unwrap();
        assert_eq!(stretched["next_due"], "2024-05-11T08:30:00.000Z");
    }
}
