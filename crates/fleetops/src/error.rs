//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use fleetops_config::ConfigError;
use fleetops_core::{CoreError, EntityKind};
use strum::IntoEnumIterator;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Backend ──────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(fleetops::rejected),
        help("The backend refused the change. Check the field values and your row permissions.")
    )]
    Rejected { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(fleetops::fetch_failed),
        help(
            "Check that the project URL is reachable and the API key is valid.\n\
             Try: fleetops whoami -v"
        )
    )]
    FetchFailed { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(fleetops::auth_failed),
        help(
            "Verify your credentials.\n\
             Run: fleetops config set-key"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(fleetops::no_credentials),
        help(
            "Configure credentials with: fleetops config init\n\
             Or set the FLEETOPS_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Records ──────────────────────────────────────────────────────
    #[error("{entity} '{identifier}' not found")]
    #[diagnostic(
        code(fleetops::not_found),
        help("Run: fleetops {command} list")
    )]
    NotFound {
        entity: String,
        identifier: String,
        command: String,
    },

    #[error("A submission is already in progress")]
    #[diagnostic(code(fleetops::busy))]
    Busy,

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(fleetops::validation))]
    Validation { field: String, reason: String },

    #[error("{0}")]
    #[diagnostic(code(fleetops::invalid_input))]
    InvalidInput(String),

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(fleetops::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: fleetops config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration file not found")]
    #[diagnostic(
        code(fleetops::no_config),
        help(
            "Create one with: fleetops config init\n\
             Or pass --url and --api-key.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("{message}")]
    #[diagnostic(code(fleetops::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(fleetops::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {0}")]
    #[diagnostic(code(fleetops::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(fleetops::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FetchFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } | Self::Busy => exit_code::CONFLICT,
            Self::Validation { .. }
            | Self::InvalidInput(_)
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => Self::InvalidInput(e.to_string()),
            CoreError::Gateway { message } => Self::Rejected { message },
            e @ CoreError::Fetch { .. } => Self::FetchFailed {
                message: e.to_string(),
            },
            CoreError::Authentication { message } => Self::AuthFailed { message },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                command: list_command(&entity_type),
                entity: entity_type,
                identifier,
            },
            CoreError::SubmitInProgress => Self::Busy,
            CoreError::InvalidState { message } => Self::InvalidInput(message),
            CoreError::Config { message } => Self::Config { message },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

/// The subcommand that lists `entity`, given a table or singular name.
fn list_command(entity: &str) -> String {
    EntityKind::iter()
        .find(|kind| {
            let d = kind.descriptor();
            d.table == entity || d.singular.eq_ignore_ascii_case(entity)
        })
        .map_or_else(|| "aircraft".into(), |kind| kind.to_string())
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_rejection_keeps_message_and_conflict_code() {
        let err = CliError::from(CoreError::Gateway {
            message: "duplicate key value violates unique constraint".into(),
        });
        assert_eq!(
            err.to_string(),
            "duplicate key value violates unique constraint"
        );
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
    }

    #[test]
    fn not_found_points_at_list_command() {
        let err = CliError::from(CoreError::NotFound {
            entity_type: "work_orders".into(),
            identifier: "w9".into(),
        });
        assert_eq!(err.exit_code(), exit_code::NOT_FOUND);
        assert!(matches!(err, CliError::NotFound { ref command, .. } if command == "work-orders"));
    }

    #[test]
    fn missing_credentials_exit_with_auth_code() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "hangar".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
