// ── Core error types ──
//
// User-facing errors from fleetops-core. Consumers never see HTTP status
// codes or JSON parse failures directly: `From<fleetops_api::Error>`
// flattens transport errors into a message string.

use thiserror::Error;

/// A draft or quick action was rejected before any gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    MissingField { field: String },

    #[error("{field} must be a number, got {value:?}")]
    InvalidNumber { field: String, value: String },

    #[error("{field} must be a date (YYYY-MM-DD), got {value:?}")]
    InvalidDate { field: String, value: String },

    #[error("{field} must be a date or RFC 3339 timestamp, got {value:?}")]
    InvalidTimestamp { field: String, value: String },

    #[error("{field} must be true or false, got {value:?}")]
    InvalidBoolean { field: String, value: String },

    #[error("{field} must be one of {allowed}, got {value:?}")]
    NotAllowed {
        field: String,
        value: String,
        allowed: String,
    },

    #[error("{field} cannot be negative, got {value}")]
    Negative { field: String, value: String },

    #[error("{entity} has no editable field {field:?}")]
    UnknownField { entity: String, field: String },

    #[error("Cannot remove more than available quantity ({requested} requested, {available} available)")]
    InsufficientStock { available: i64, requested: i64 },

    #[error("Adjustment quantity must be at least 1, got {quantity}")]
    InvalidAdjustment { quantity: i64 },
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    // ── Gateway errors ───────────────────────────────────────────────
    /// The backend rejected a mutation. The message is the backend's own.
    #[error("{message}")]
    Gateway { message: String },

    /// A list load failed.
    #[error("Failed to fetch {entity}: {message}")]
    Fetch { entity: String, message: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("Entity not found: {entity_type} with id {identifier}")]
    NotFound {
        entity_type: String,
        identifier: String,
    },

    // ── Dialog errors ────────────────────────────────────────────────
    #[error("A submission is already in progress")]
    SubmitInProgress,

    #[error("Invalid state: {message}")]
    InvalidState { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<fleetops_api::Error> for CoreError {
    fn from(err: fleetops_api::Error) -> Self {
        match err {
            fleetops_api::Error::Authentication { message } => Self::Authentication { message },
            fleetops_api::Error::RowNotFound { table, id } => Self::NotFound {
                entity_type: table,
                identifier: id,
            },
            fleetops_api::Error::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            fleetops_api::Error::Tls(message) => Self::Config {
                message: format!("TLS error: {message}"),
            },
            other => Self::Gateway {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_message_passes_through_verbatim() {
        let err = CoreError::from(fleetops_api::Error::Api {
            message: "duplicate key value violates unique constraint".into(),
            code: Some("23505".into()),
            status: 409,
        });
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
        assert!(matches!(err, CoreError::Gateway { .. }));
    }

    #[test]
    fn missing_row_becomes_not_found() {
        let err = CoreError::from(fleetops_api::Error::RowNotFound {
            table: "aircraft".into(),
            id: "a1".into(),
        });
        assert!(matches!(
            err,
            CoreError::NotFound { ref entity_type, ref identifier }
                if entity_type == "aircraft" && identifier == "a1"
        ));
    }

    #[test]
    fn stock_error_message_names_both_quantities() {
        let err = ValidationError::InsufficientStock {
            available: 10,
            requested: 15,
        };
        assert_eq!(
            err.to_string(),
            "Cannot remove more than available quantity (15 requested, 10 available)"
        );
    }
}
