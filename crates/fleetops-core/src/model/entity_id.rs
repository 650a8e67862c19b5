// ── Record identity ──
//
// The store assigns ids on insert. Most tables use UUID keys; anything
// else (serial integers, text keys) is kept as an opaque string.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Canonical identifier for any stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Uuid(Uuid),
    Text(String),
}

impl EntityId {
    /// Read an id out of a JSON row value. Numeric keys are stringified;
    /// `null`, booleans and containers are not ids.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self::from(s.as_str())),
            Value::Number(n) => Some(Self::Text(n.to_string())),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Self::Uuid(u) => Some(u),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<Uuid> for EntityId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        match Uuid::parse_str(&s) {
            Ok(u) => Self::Uuid(u),
            Err(_) => Self::Text(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn uuid_strings_parse_as_uuid() {
        let id = EntityId::from("550e8400-e29b-41d4-a716-446655440000");
        assert!(id.as_uuid().is_some());
        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn other_strings_stay_opaque() {
        let id: EntityId = "N101-wo-7".parse().unwrap();
        assert_eq!(id, EntityId::Text("N101-wo-7".into()));
    }

    #[test]
    fn numeric_keys_are_stringified() {
        assert_eq!(
            EntityId::from_value(&json!(42)),
            Some(EntityId::Text("42".into()))
        );
    }

    #[test]
    fn null_and_empty_are_not_ids() {
        assert_eq!(EntityId::from_value(&json!(null)), None);
        assert_eq!(EntityId::from_value(&json!("")), None);
        assert_eq!(EntityId::from_value(&json!({"id": 1})), None);
    }
}
