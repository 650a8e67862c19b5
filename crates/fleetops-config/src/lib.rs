//! Shared configuration for the fleetops shell.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `fleetops_core::GatewayConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use fleetops_core::{AuthCredentials, GatewayConfig, TlsVerification};

const KEYRING_SERVICE: &str = "fleetops";
const ENV_PREFIX: &str = "FLEETOPS_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    /// The profile to use: `requested`, else the default profile.
    pub fn profile(&self, requested: Option<&str>) -> Result<(&str, &Profile), ConfigError> {
        let name = requested
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Project URL (e.g., "https://xyz.example.co").
    pub url: String,

    /// Non-default database schema.
    pub schema: Option<String>,

    /// Auth mode: "api_key", "password", or "session".
    #[serde(default = "default_auth_mode")]
    pub auth_mode: String,

    /// Project API key (plaintext; prefer keyring or env var).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// Account email for password sign-in.
    pub email: Option<String>,

    /// Account password (plaintext; prefer keyring).
    pub password: Option<String>,

    /// Previously issued user access token (plaintext; prefer keyring).
    pub access_token: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

fn default_auth_mode() -> String {
    "api_key".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "fleetops", "fleetops").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("fleetops");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load the full config from the canonical path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, then `FLEETOPS_`-prefixed environment variables
/// (nested keys split on `__`, e.g. `FLEETOPS_DEFAULTS__OUTPUT`).
/// A missing file yields the defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");
    let config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    Ok(config)
}

/// Load config, returning a default if anything goes wrong.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

/// Serialize to TOML and write to `path`, creating parent directories.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

/// Which secret a keyring entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretKind {
    ApiKey,
    Password,
    AccessToken,
}

impl SecretKind {
    fn suffix(self) -> &'static str {
        match self {
            Self::ApiKey => "api-key",
            Self::Password => "password",
            Self::AccessToken => "access-token",
        }
    }

    /// Keyring account name for `profile`.
    pub fn account(self, profile: &str) -> String {
        format!("{profile}/{}", self.suffix())
    }
}

/// Store a secret in the system keyring.
pub fn store_secret(profile: &str, kind: SecretKind, secret: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &kind.account(profile))?.set_password(secret)?;
    Ok(())
}

fn keyring_secret(profile: &str, kind: SecretKind) -> Option<SecretString> {
    keyring::Entry::new(KEYRING_SERVICE, &kind.account(profile))
        .ok()?
        .get_password()
        .ok()
        .map(SecretString::from)
}

// ── Credential resolution (without CLI flags) ───────────────────────

/// Resolve the project API key: `api_key_env` → keyring → plaintext.
pub fn resolve_api_key(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(secret) = keyring_secret(profile_name, SecretKind::ApiKey) {
        return Ok(secret);
    }

    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve email + password: `FLEETOPS_PASSWORD` → keyring → plaintext.
pub fn resolve_password_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<(String, SecretString), ConfigError> {
    let email = profile
        .email
        .clone()
        .or_else(|| std::env::var("FLEETOPS_EMAIL").ok())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    if let Ok(pw) = std::env::var("FLEETOPS_PASSWORD") {
        return Ok((email, SecretString::from(pw)));
    }

    if let Some(pw) = keyring_secret(profile_name, SecretKind::Password) {
        return Ok((email, pw));
    }

    if let Some(ref pw) = profile.password {
        return Ok((email, SecretString::from(pw.clone())));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Resolve a stored access token: `FLEETOPS_ACCESS_TOKEN` → keyring → plaintext.
pub fn resolve_access_token(
    profile: &Profile,
    profile_name: &str,
) -> Result<SecretString, ConfigError> {
    if let Ok(token) = std::env::var("FLEETOPS_ACCESS_TOKEN") {
        return Ok(SecretString::from(token));
    }
    if let Some(token) = keyring_secret(profile_name, SecretKind::AccessToken) {
        return Ok(token);
    }
    profile
        .access_token
        .clone()
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })
}

/// Resolve `AuthCredentials` from a profile's `auth_mode` field.
pub fn resolve_auth(profile: &Profile, profile_name: &str) -> Result<AuthCredentials, ConfigError> {
    match profile.auth_mode.as_str() {
        "api_key" => Ok(AuthCredentials::ApiKey(resolve_api_key(
            profile,
            profile_name,
        )?)),
        "password" => {
            let api_key = resolve_api_key(profile, profile_name)?;
            let (email, password) = resolve_password_credentials(profile, profile_name)?;
            Ok(AuthCredentials::Password {
                api_key,
                email,
                password,
            })
        }
        "session" => {
            let api_key = resolve_api_key(profile, profile_name)?;
            let access_token = resolve_access_token(profile, profile_name)?;
            Ok(AuthCredentials::Session {
                api_key,
                access_token,
            })
        }
        other => Err(ConfigError::Validation {
            field: "auth_mode".into(),
            reason: format!("expected 'api_key', 'password', or 'session', got '{other}'"),
        }),
    }
}

/// Parse and check a project URL.
pub fn parse_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|_| ConfigError::Validation {
        field: "url".into(),
        reason: format!("invalid URL: {raw}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "url".into(),
            reason: format!("expected http or https, got '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// TLS mode for a profile: insecure wins, then a custom CA, else strict.
pub fn tls_for(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `GatewayConfig` from a profile, with no CLI overrides.
pub fn profile_to_gateway_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<GatewayConfig, ConfigError> {
    let url = parse_url(&profile.url)?;
    let auth = resolve_auth(profile, profile_name)?;
    let mut config = GatewayConfig::new(url, auth);
    config.schema.clone_from(&profile.schema);
    config.tls = tls_for(profile, defaults);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn write(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    const SAMPLE: &str = r#"
default_profile = "hangar"

[defaults]
output = "json"

[profiles.hangar]
url = "https://fleet.example.co"
api_key = "plain-anon-key"
timeout = 10

[profiles.ops]
url = "https://ops.example.co"
schema = "fleet"
auth_mode = "password"
api_key = "ops-anon"
email = "ops@example.com"
password = "s3cret"
insecure = true
"#;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 30);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profiles_load_with_defaults_filled() {
        let (_dir, path) = write(SAMPLE);
        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg.defaults.output, "json");
        assert_eq!(cfg.defaults.color, "auto");
        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "hangar");
        assert_eq!(profile.auth_mode, "api_key");
        assert!(matches!(
            cfg.profile(Some("missing")),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn plaintext_api_key_builds_gateway_config() {
        let (_dir, path) = write(SAMPLE);
        let cfg = load_config_from(&path).unwrap();
        let (name, profile) = cfg.profile(Some("hangar")).unwrap();

        let gateway = profile_to_gateway_config(profile, name, &cfg.defaults).unwrap();
        assert_eq!(gateway.url.as_str(), "https://fleet.example.co/");
        assert_eq!(gateway.timeout, Duration::from_secs(10));
        assert_eq!(gateway.tls, TlsVerification::SystemDefaults);
        assert_eq!(
            gateway.auth.api_key().expose_secret(),
            "plain-anon-key"
        );
    }

    #[test]
    fn password_profile_resolves_all_parts() {
        let (_dir, path) = write(SAMPLE);
        let cfg = load_config_from(&path).unwrap();
        let (name, profile) = cfg.profile(Some("ops")).unwrap();

        let gateway = profile_to_gateway_config(profile, name, &cfg.defaults).unwrap();
        assert_eq!(gateway.schema.as_deref(), Some("fleet"));
        assert_eq!(gateway.tls, TlsVerification::DangerAcceptInvalid);
        let AuthCredentials::Password { email, .. } = gateway.auth else {
            panic!("expected password credentials");
        };
        assert_eq!(email, "ops@example.com");
    }

    #[test]
    fn api_key_env_takes_precedence() {
        let profile = Profile {
            url: "https://fleet.example.co".into(),
            api_key: Some("plaintext".into()),
            api_key_env: Some("PATH".into()),
            ..Profile::default()
        };
        let key = resolve_api_key(&profile, "env-precedence-test").unwrap();
        assert_eq!(key.expose_secret(), std::env::var("PATH").unwrap());
    }

    #[test]
    fn missing_credentials_are_reported() {
        let profile = Profile {
            url: "https://fleet.example.co".into(),
            auth_mode: "api_key".into(),
            ..Profile::default()
        };
        assert!(matches!(
            resolve_auth(&profile, "no-such-keyring-profile"),
            Err(ConfigError::NoCredentials { .. })
        ));
    }

    #[test]
    fn bad_auth_mode_and_url_are_rejected() {
        let profile = Profile {
            url: "ftp://fleet.example.co".into(),
            auth_mode: "oauth".into(),
            api_key: Some("k".into()),
            ..Profile::default()
        };
        assert!(matches!(
            resolve_auth(&profile, "p"),
            Err(ConfigError::Validation { .. })
        ));
        assert!(parse_url(&profile.url).is_err());
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                url: "https://fleet.example.co".into(),
                auth_mode: "session".into(),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles["default"].auth_mode, "session");
        assert_eq!(loaded.profiles["default"].url, "https://fleet.example.co");
    }
}
