// ── Runtime connection configuration ──
//
// These types describe *how* to reach the table store. They carry
// credential data and connection tuning, but never touch disk.
// The CLI constructs a `GatewayConfig` and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use fleetops_api::{TlsMode, TransportConfig};

/// How to authenticate with the backend.
///
/// Every mode carries the project API key, which the backend requires on
/// every request. The user-level modes add a bearer token on top.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Project API key only (anonymous or service role).
    ApiKey(SecretString),
    /// A previously issued user access token.
    Session {
        api_key: SecretString,
        access_token: SecretString,
    },
    /// Email + password, exchanged for an access token on connect.
    Password {
        api_key: SecretString,
        email: String,
        password: SecretString,
    },
}

impl AuthCredentials {
    pub fn api_key(&self) -> &SecretString {
        match self {
            Self::ApiKey(key)
            | Self::Session { api_key: key, .. }
            | Self::Password { api_key: key, .. } => key,
        }
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-hosted gateways with self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for connecting to one backend project.
///
/// Built by the CLI, passed to `Fleet`. Core never reads config files.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Project URL (e.g., `https://xyz.example.co`).
    pub url: Url,
    /// Authentication method and credentials.
    pub auth: AuthCredentials,
    /// Non-default database schema, if any.
    pub schema: Option<String>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            schema: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }
}
