//! Config subcommand handlers.

use dialoguer::{Input, Select};

use fleetops_config::{Config, Profile, SecretKind, store_secret};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, available_profiles};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Format config for display, masking secrets.
fn format_config_redacted(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = writeln!(out, "timeout = {}", cfg.defaults.timeout);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "url = \"{}\"", p.url);
        if let Some(ref schema) = p.schema {
            let _ = writeln!(out, "schema = \"{schema}\"");
        }
        let _ = writeln!(out, "auth_mode = \"{}\"", p.auth_mode);
        if p.api_key.is_some() {
            let _ = writeln!(out, "api_key = \"****\"");
        }
        if let Some(ref env) = p.api_key_env {
            let _ = writeln!(out, "api_key_env = \"{env}\"");
        }
        if let Some(ref email) = p.email {
            let _ = writeln!(out, "email = \"{email}\"");
        }
        if p.password.is_some() {
            let _ = writeln!(out, "password = \"****\"");
        }
        if p.access_token.is_some() {
            let _ = writeln!(out, "access_token = \"****\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = writeln!(out, "insecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = writeln!(out, "timeout = {timeout}");
        }
    }

    out
}

/// The config with every stored secret replaced by a mask.
fn redacted(cfg: &Config) -> Config {
    let mask = |secret: &Option<String>| secret.as_ref().map(|_| "****".to_owned());
    let mut cfg = cfg.clone();
    for profile in cfg.profiles.values_mut() {
        profile.api_key = mask(&profile.api_key);
        profile.password = mask(&profile.password);
        profile.access_token = mask(&profile.access_token);
    }
    cfg
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Read a secret without echo, rejecting empty input.
fn prompt_secret(prompt: &str, field: &str) -> Result<String, CliError> {
    let secret = rpassword::prompt_password(prompt).map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: field.into(),
            reason: "value cannot be empty".into(),
        });
    }
    Ok(secret)
}

/// Offer to store a secret in the system keyring or return it for plaintext config.
///
/// Returns `Some(secret)` if the user chose plaintext, `None` if stored in keyring.
fn prompt_keyring_storage(
    secret: String,
    profile: &str,
    kind: SecretKind,
    label: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt(format!("Where to store the {label}?"))
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        store_secret(profile, kind, &secret)?;
        eprintln!("   ✓ {label} stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(secret))
    }
}

fn parse_flag<T: std::str::FromStr>(field: &str, value: &str, reason: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: reason.into(),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("fleetops configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let url: String = Input::new()
                .with_prompt("Project URL")
                .interact_text()
                .map_err(prompt_err)?;
            fleetops_config::parse_url(&url)?;

            let api_key = prompt_secret("Project API key: ", "api_key")?;
            let api_key =
                prompt_keyring_storage(api_key, &profile_name, SecretKind::ApiKey, "API key")?;

            let auth_choices = &[
                "Project API key only",
                "Email and password (signs in on every run)",
            ];
            let auth_selection = Select::new()
                .with_prompt("Authentication method")
                .items(auth_choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?;

            let mut profile = Profile {
                url,
                api_key,
                auth_mode: "api_key".into(),
                ..Profile::default()
            };

            if auth_selection == 1 {
                let email: String = Input::new()
                    .with_prompt("Email")
                    .interact_text()
                    .map_err(prompt_err)?;
                let password = prompt_secret("Password: ", "password")?;
                profile.auth_mode = "password".into();
                profile.email = Some(email);
                profile.password = prompt_keyring_storage(
                    password,
                    &profile_name,
                    SecretKind::Password,
                    "password",
                )?;
            }

            let mut cfg = config::load_config().unwrap_or_default();
            cfg.profiles.insert(profile_name.clone(), profile);
            cfg.default_profile = Some(profile_name.clone());
            config::save_config(&cfg)?;

            eprintln!("\n✓ Configuration written to {}", config_path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: fleetops whoami");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => {
                    format_config_redacted(&cfg)
                }
                ref structured => output::render_structured(structured, &redacted(&cfg))?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config()?;
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();

            match key.as_str() {
                "url" => {
                    fleetops_config::parse_url(&value)?;
                    profile.url = value;
                }
                "schema" => profile.schema = Some(value),
                "auth_mode" | "auth-mode" => {
                    if !matches!(value.as_str(), "api_key" | "password" | "session") {
                        return Err(CliError::Validation {
                            field: "auth_mode".into(),
                            reason: "must be 'api_key', 'password', or 'session'".into(),
                        });
                    }
                    profile.auth_mode = value;
                }
                "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
                "email" => profile.email = Some(value),
                "insecure" => {
                    profile.insecure =
                        Some(parse_flag("insecure", &value, "must be 'true' or 'false'")?);
                }
                "timeout" => {
                    profile.timeout =
                        Some(parse_flag("timeout", &value, "must be a number (seconds)")?);
                }
                "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
                other => {
                    return Err(CliError::Validation {
                        field: other.into(),
                        reason: format!(
                            "unknown config key '{other}'. Valid keys: url, schema, auth_mode, \
                             api_key_env, email, insecure, timeout, ca_cert \
                             (store secrets with: fleetops config set-key)"
                        ),
                    });
                }
            }

            config::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        // ── Profiles ────────────────────────────────────────────────
        ConfigCommand::Profiles => {
            let cfg = config::load_config()?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: fleetops config init");
            } else {
                for (name, profile) in &cfg.profiles {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}\t{}", profile.url);
                }
            }
            Ok(())
        }

        // ── Use <name> ─────────────────────────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        // ── SetKey ──────────────────────────────────────────────────
        ConfigCommand::SetKey { profile } => {
            let cfg = config::load_config()?;
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let prof = cfg
                .profiles
                .get(&profile_name)
                .ok_or_else(|| CliError::ProfileNotFound {
                    name: profile_name.clone(),
                    available: available_profiles(&cfg),
                })?;

            let key = prompt_secret("Project API key: ", "api_key")?;
            store_secret(&profile_name, SecretKind::ApiKey, &key)?;
            match prof.auth_mode.as_str() {
                "password" => {
                    let password = prompt_secret("Password: ", "password")?;
                    store_secret(&profile_name, SecretKind::Password, &password)?;
                }
                "session" => {
                    let token = prompt_secret("Access token: ", "access_token")?;
                    store_secret(&profile_name, SecretKind::AccessToken, &token)?;
                }
                _ => {}
            }

            eprintln!("✓ Secret(s) stored in system keyring for profile '{profile_name}'");
            Ok(())
        }
    }
}
