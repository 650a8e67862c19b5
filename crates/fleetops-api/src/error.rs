use thiserror::Error;

/// Top-level error type for the `fleetops-api` crate.
///
/// Covers every failure mode of the table and auth endpoints:
/// authentication, transport, structured REST errors, and malformed
/// responses. `fleetops-core` flattens these into user-facing messages.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Sign-in rejected or access token no longer valid.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── REST API ────────────────────────────────────────────────────
    /// Structured error body returned by the table interface.
    #[error("{message}")]
    Api {
        message: String,
        code: Option<String>,
        status: u16,
    },

    /// An update targeted an id that matched no row.
    #[error("No row in '{table}' with id {id}")]
    RowNotFound { table: String, id: String },

    /// A mutation asked for a representation but none came back.
    #[error("Empty response from '{table}'")]
    EmptyResponse { table: String },

    /// The exact-count header was missing or unparseable.
    #[error("Malformed Content-Range header: {0:?}")]
    InvalidCount(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the caller should sign in again.
    pub fn is_auth_expired(&self) -> bool {
        match self {
            Self::Authentication { .. } => true,
            Self::Api { status, .. } => *status == 401,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } | Self::RowNotFound { .. } => true,
            _ => false,
        }
    }

    /// Extract the backend error code (e.g. `23503` for a foreign key
    /// violation), if available.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
