//! CLI configuration: a thin wrapper around `fleetops_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--url, --api-key, --insecure, --timeout).

use std::time::Duration;

use secrecy::SecretString;

use fleetops_config::{Config, ConfigError, Profile};
use fleetops_core::{AuthCredentials, GatewayConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use fleetops_config::{config_path, load_config, save_config};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `GatewayConfig` from the config file, profile, and CLI overrides.
///
/// Without a matching profile, `--url` and `--api-key` alone are enough.
pub fn build_gateway_config(global: &GlobalOpts) -> Result<GatewayConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg, global);
    }
    if global.profile.is_some() {
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: available_profiles(&cfg),
        });
    }

    let url_str = global.url.as_deref().ok_or_else(|| CliError::NoConfig {
        path: config_path().display().to_string(),
    })?;
    let url = fleetops_config::parse_url(url_str)?;

    let Some(key) = global.api_key.as_ref() else {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    };

    let auth = AuthCredentials::ApiKey(SecretString::from(key.clone()));
    let mut config = GatewayConfig::new(url, auth);
    config.tls = if global.insecure || cfg.defaults.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        TlsVerification::SystemDefaults
    };
    config.timeout = Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout));
    Ok(config)
}

/// Translate a `Profile` plus global flags into a `GatewayConfig`.
///
/// CLI flag overrides take priority over profile values.
fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    cfg: &Config,
    global: &GlobalOpts,
) -> Result<GatewayConfig, CliError> {
    let mut profile = profile.clone();
    if let Some(url) = &global.url {
        profile.url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let resolved = fleetops_config::profile_to_gateway_config(&profile, profile_name, &cfg.defaults);
    let mut config = match (resolved, &global.api_key) {
        // A flag key stands in for missing stored credentials.
        (Err(ConfigError::NoCredentials { .. }), Some(key)) => {
            profile.api_key = Some(key.clone());
            fleetops_config::profile_to_gateway_config(&profile, profile_name, &cfg.defaults)?
        }
        (resolved, _) => resolved?,
    };

    if let Some(key) = &global.api_key {
        config.auth = with_api_key(config.auth, SecretString::from(key.clone()));
    }
    Ok(config)
}

/// Swap the project key, keeping the user-level credentials.
fn with_api_key(auth: AuthCredentials, key: SecretString) -> AuthCredentials {
    match auth {
        AuthCredentials::ApiKey(_) => AuthCredentials::ApiKey(key),
        AuthCredentials::Session { access_token, .. } => AuthCredentials::Session {
            api_key: key,
            access_token,
        },
        AuthCredentials::Password {
            email, password, ..
        } => AuthCredentials::Password {
            api_key: key,
            email,
            password,
        },
    }
}

pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        return "(none)".into();
    }
    cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}
