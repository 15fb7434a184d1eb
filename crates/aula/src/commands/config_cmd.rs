//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// A copy safe to print: plaintext passwords masked.
fn redacted(cfg: &Config) -> Config {
    let mut copy = cfg.clone();
    for profile in copy.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some("****".into());
        }
    }
    copy
}

/// Format config for display (already redacted).
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let d = &cfg.defaults;
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", d.output);
    let _ = writeln!(out, "color = \"{}\"", d.color);
    let _ = writeln!(out, "timeout_secs = {}", d.timeout_secs);
    let _ = writeln!(out, "log_poll_secs = {}", d.log_poll_secs);
    let _ = writeln!(out, "log_limit = {}", d.log_limit);

    for (name, p) in &cfg.profiles {
        let _ = writeln!(out);
        let _ = writeln!(out, "[profiles.{name}]");
        let _ = writeln!(out, "server = \"{}\"", p.server);
        if let Some(ref u) = p.username {
            let _ = writeln!(out, "username = \"{u}\"");
        }
        if let Some(ref pw) = p.password {
            let _ = writeln!(out, "password = \"{pw}\"");
        }
        if let Some(ref env) = p.password_env {
            let _ = writeln!(out, "password_env = \"{env}\"");
        }
        if p.insecure {
            let _ = writeln!(out, "insecure = true");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = writeln!(out, "ca_cert = \"{}\"", ca.display());
        }
        if let Some(timeout) = p.timeout_secs {
            let _ = writeln!(out, "timeout_secs = {timeout}");
        }
    }

    out.trim_end().to_owned()
}

fn save_config(cfg: &Config) -> Result<std::path::PathBuf, CliError> {
    Ok(config::save_config(cfg)?)
}

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Prompt(e.to_string())
}

fn profile_not_found(cfg: &Config, name: String) -> CliError {
    let available: Vec<_> = cfg.profiles.keys().cloned().collect();
    CliError::ProfileNotFound {
        name,
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Offer to store a password in the system keyring or return it for
/// the plaintext config field.
///
/// Returns `Some(password)` if the user chose plaintext, `None` if stored
/// in the keyring.
fn store_password_interactive(
    profile_name: &str,
    username: &str,
    password: &str,
) -> Result<Option<String>, CliError> {
    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the password?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        aula_config::store_password(profile_name, username, password)?;
        eprintln!("   ✓ Password stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(password.to_owned()))
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

fn parse_secs(field: &str, value: &str) -> Result<u64, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be a number (seconds)".into(),
    })
}

/// Apply `key = value` to a profile or to `[defaults]`.
fn set_value(cfg: &mut Config, profile_name: &str, key: &str, value: String) -> Result<(), CliError> {
    let optional = |v: String| if v.is_empty() { None } else { Some(v) };

    match key {
        "output" => {
            cfg.defaults.output = value;
            return Ok(());
        }
        "color" => {
            cfg.defaults.color = value;
            return Ok(());
        }
        "log_poll_secs" | "log-poll-secs" => {
            cfg.defaults.log_poll_secs = parse_secs(key, &value)?;
            return Ok(());
        }
        "log_limit" | "log-limit" => {
            let limit: u32 = value.parse().map_err(|_| CliError::Validation {
                field: "log_limit".into(),
                reason: "must be a number between 1 and 100".into(),
            })?;
            if !(1..=100).contains(&limit) {
                return Err(CliError::Validation {
                    field: "log_limit".into(),
                    reason: "must be a number between 1 and 100".into(),
                });
            }
            cfg.defaults.log_limit = limit;
            return Ok(());
        }
        _ => {}
    }

    let profile = cfg.profiles.entry(profile_name.to_owned()).or_default();
    match key {
        "server" => {
            url::Url::parse(&value).map_err(|e| CliError::Validation {
                field: "server".into(),
                reason: format!("invalid URL: {e}"),
            })?;
            profile.server = value;
        }
        "username" => profile.username = optional(value),
        "password_env" | "password-env" => profile.password_env = optional(value),
        "insecure" => profile.insecure = parse_bool(key, &value)?,
        "timeout" | "timeout_secs" => profile.timeout_secs = Some(parse_secs(key, &value)?),
        "ca_cert" | "ca-cert" => profile.ca_cert = optional(value).map(Into::into),
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: server, username, password_env, \
                     insecure, timeout, ca_cert, output, color, log_poll_secs, log_limit"
                ),
            });
        }
    }
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = redacted(&config::load_config_or_default());
            let out = output::render_single(&global.format(), &cfg, format_config, |c| {
                c.profiles.keys().cloned().collect::<Vec<_>>().join("\n")
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            set_value(&mut cfg, &profile_name, &key, value)?;
            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let default = cfg.active_profile_name(None);
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: aula config init");
            } else {
                for name in cfg.profiles.keys() {
                    let marker = if *name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(profile_not_found(&cfg, name));
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetPassword { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let prof = cfg
                .profiles
                .get(&profile_name)
                .ok_or_else(|| profile_not_found(&cfg, profile_name.clone()))?;
            let username = global
                .username
                .clone()
                .or_else(|| prof.username.clone())
                .ok_or_else(|| CliError::Validation {
                    field: "username".into(),
                    reason: format!("profile '{profile_name}' has no username"),
                })?;

            let secret = rpassword::prompt_password(format!("Password for {username}: "))
                .map_err(prompt_err)?;
            if secret.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            aula_config::store_password(&profile_name, &username, &secret)?;
            if !global.quiet {
                eprintln!("✓ Password stored in system keyring for profile '{profile_name}'");
            }
            Ok(())
        }
    }
}

/// Interactive wizard: one profile, written as the default.
fn init() -> Result<(), CliError> {
    let config_path = config::config_path();
    eprintln!("✨ aula -- configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let server: String = Input::new()
        .with_prompt("Server URL")
        .default("http://127.0.0.1:5000".into())
        .validate_with(|input: &String| {
            url::Url::parse(input)
                .map(drop)
                .map_err(|e| format!("invalid URL: {e}"))
        })
        .interact_text()
        .map_err(prompt_err)?;

    let username: String = Input::new()
        .with_prompt("Username")
        .interact_text()
        .map_err(prompt_err)?;
    let password = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if username.trim().is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "username and password cannot be empty".into(),
        });
    }
    let plaintext = store_password_interactive(&profile_name, &username, &password)?;

    let insecure = server.starts_with("https://")
        && Confirm::new()
            .with_prompt("Accept self-signed certificates?")
            .default(false)
            .interact()
            .map_err(prompt_err)?;

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(
        profile_name.clone(),
        Profile {
            server,
            username: Some(username),
            password: plaintext,
            insecure,
            ..Profile::default()
        },
    );
    cfg.default_profile = Some(profile_name.clone());

    let path = save_config(&cfg)?;
    eprintln!("\n✓ Configuration written to {}", path.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: aula status");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_creates_profile_and_validates() {
        let mut cfg = Config::default();
        set_value(&mut cfg, "sala", "server", "http://aula.local:5000".into()).unwrap();
        set_value(&mut cfg, "sala", "insecure", "true".into()).unwrap();
        set_value(&mut cfg, "sala", "timeout", "12".into()).unwrap();
        let p = &cfg.profiles["sala"];
        assert_eq!(p.server, "http://aula.local:5000");
        assert!(p.insecure);
        assert_eq!(p.timeout_secs, Some(12));

        assert!(set_value(&mut cfg, "sala", "insecure", "maybe".into()).is_err());
        assert!(set_value(&mut cfg, "sala", "server", "not a url".into()).is_err());
        assert!(set_value(&mut cfg, "sala", "api_key", "x".into()).is_err());
    }

    #[test]
    fn defaults_keys_skip_profiles() {
        let mut cfg = Config::default();
        set_value(&mut cfg, "sala", "log_limit", "50".into()).unwrap();
        assert_eq!(cfg.defaults.log_limit, 50);
        assert!(cfg.profiles.is_empty());
        assert!(set_value(&mut cfg, "sala", "log_limit", "500".into()).is_err());
    }

    #[test]
    fn show_masks_passwords() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "sala".into(),
            Profile {
                server: "http://aula.local".into(),
                password: Some("hunter2".into()),
                ..Profile::default()
            },
        );
        let out = format_config(&redacted(&cfg));
        assert!(out.contains("password = \"****\""));
        assert!(!out.contains("hunter2"));
    }
}
