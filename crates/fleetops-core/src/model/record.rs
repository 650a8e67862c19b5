// ── Stored records ──
//
// A record is one row of one table, kept as the JSON map the backend
// returned (embedded joins included) plus its parsed id.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::EntityId;
use crate::error::CoreError;

/// Field name → value map, in backend column order.
pub type Fields = serde_json::Map<String, Value>;

/// One persisted row.
///
/// `id` is assigned by the store and never changes; every other column
/// lives in `fields` alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: EntityId,
    fields: Fields,
}

impl Record {
    /// Wrap a backend row. Rows without a usable `id` are rejected.
    pub fn from_row(row: Fields) -> Result<Self, CoreError> {
        let id = row
            .get("id")
            .and_then(EntityId::from_value)
            .ok_or_else(|| CoreError::Internal("row is missing an id".into()))?;
        Ok(Self { id, fields: row })
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// A copy with `patch` merged over the current columns. The id is
    /// never overwritten.
    pub fn merged(&self, patch: &Fields) -> Self {
        let mut fields = self.fields.clone();
        for (key, value) in patch {
            if key != "id" {
                fields.insert(key.clone(), value.clone());
            }
        }
        Self {
            id: self.id.clone(),
            fields,
        }
    }

    // ── Typed accessors ──────────────────────────────────────────────

    /// Column value, treating `null` as absent.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    /// Integer column. Accepts JSON integers and numeric strings.
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Decimal column. `numeric` columns may arrive as strings.
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean column; absent or null reads as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        self.text(name).and_then(parse_date_prefix)
    }

    pub fn timestamp(&self, name: &str) -> Option<DateTime<Utc>> {
        self.text(name).and_then(parse_timestamp)
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp("created_at")
    }

    /// Field of an embedded join, e.g. `embedded("aircraft", "tail_number")`.
    pub fn embedded(&self, relation: &str, field: &str) -> Option<&str> {
        self.get(relation)?.get(field)?.as_str()
    }

    /// Display string for a column or a dotted `relation.field` path.
    /// Absent values render as an empty string.
    pub fn display(&self, path: &str) -> String {
        let value = match path.split_once('.') {
            Some((relation, field)) => self.get(relation).and_then(|r| r.get(field)),
            None => self.get(path),
        };
        value.map(display_value).unwrap_or_default()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

/// Render a JSON value for people: strings unquoted, `null` empty.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Date parsing ─────────────────────────────────────────────────────

/// Parse an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS[.f]`
/// (taken as UTC), or a bare date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Date part of a `date` or timestamp column.
fn parse_date_prefix(raw: &str) -> Option<NaiveDate> {
    let prefix = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_row(value.as_object().cloned().unwrap()).unwrap()
    }

    #[test]
    fn rows_without_id_are_rejected() {
        let row = json!({ "tail_number": "N101" }).as_object().cloned().unwrap();
        assert!(matches!(Record::from_row(row), Err(CoreError::Internal(_))));
    }

    #[test]
    fn typed_accessors_read_backend_shapes() {
        let r = record(json!({
            "id": "a1",
            "total_flight_hours": 1200,
            "unit_cost": "12.50",
            "anomaly_detected": true,
            "last_inspection": "2024-03-01",
            "created_at": "2024-06-01T10:00:00.123456+00:00",
            "model": null
        }));

        assert_eq!(r.int("total_flight_hours"), Some(1200));
        assert_eq!(r.float("unit_cost"), Some(12.5));
        assert!(r.flag("anomaly_detected"));
        assert!(!r.flag("missing"));
        assert_eq!(
            r.date("last_inspection"),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
        assert_eq!(r.text("model"), None);
        assert_eq!(
            r.created_at().map(|t| t.date_naive()),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
    }

    #[test]
    fn display_follows_embedded_paths() {
        let r = record(json!({
            "id": "wo-1",
            "aircraft": { "tail_number": "N101", "aircraft_type": "A320" },
            "profiles": null
        }));
        assert_eq!(r.display("aircraft.tail_number"), "N101");
        assert_eq!(r.embedded("aircraft", "aircraft_type"), Some("A320"));
        assert_eq!(r.display("profiles.full_name"), "");
    }

    #[test]
    fn merged_keeps_id() {
        let r = record(json!({ "id": "p1", "quantity_available": 10 }));
        let patch = json!({ "id": "other", "quantity_available": 5 })
            .as_object()
            .cloned()
            .unwrap();
        let merged = r.merged(&patch);
        assert_eq!(merged.id(), &EntityId::from("p1"));
        assert_eq!(merged.int("quantity_available"), Some(5));
        assert_eq!(merged.fields()["id"], "p1");
    }

    #[test]
    fn timestamps_accept_three_shapes() {
        let expected = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-06-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-06-01T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-06-01"), Some(expected));
        assert_eq!(parse_timestamp("June 1st"), None);
    }
}
