//! CLI configuration -- thin layer over `aula_config`.
//!
//! Adds what only the CLI does: flag overrides (`--server`, `--username`,
//! `--insecure`, `--timeout`), config-file defaults for `--output` and
//! `--color`, and the interactive password prompt as the last resort.

use std::io::IsTerminal;
use std::time::Duration;

use clap::ValueEnum;
use secrecy::SecretString;

use aula_core::{ConsoleConfig, Credentials, TlsVerification};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use aula_config::{Config, Profile, config_path, load_config_or_default, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from `--profile` and the config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// Fill `--output` / `--color` from `[defaults]` when not given.
pub fn apply_defaults(global: &mut GlobalOpts, config: &Config) {
    if global.output.is_none() {
        global.output = OutputFormat::from_str(&config.defaults.output, true).ok();
    }
    if global.color.is_none() {
        global.color = ColorMode::from_str(&config.defaults.color, true).ok();
    }
}

/// Build the `ConsoleConfig` for one invocation.
///
/// Flags win over the profile; with no profile at all, `--server` alone
/// is enough. Background refresh is always off for CLI runs.
pub fn console_config(global: &GlobalOpts, cfg: &Config) -> Result<ConsoleConfig, CliError> {
    let profile_name = active_profile_name(global, cfg);
    let fallback = Profile::default();
    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile,
        None if global.server.is_some() => &fallback,
        None if global.profile.is_some() => {
            return Err(aula_config::ConfigError::ProfileNotFound { name: profile_name }.into());
        }
        None => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    // 1. Server URL (flag > env > profile)
    let url_str = global.server.as_deref().unwrap_or(&profile.server);
    let url: url::Url = url_str.parse().map_err(|_| CliError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {url_str}"),
    })?;

    // 2. TLS verification
    let tls = if global.insecure {
        TlsVerification::DangerAcceptInvalid
    } else {
        profile.tls()
    };

    // 3. Timeout
    let timeout_secs = global
        .timeout
        .or(profile.timeout_secs)
        .unwrap_or(cfg.defaults.timeout_secs);

    let mut config = ConsoleConfig::new(url);
    config.credentials = resolve_credentials(global, profile, &profile_name)?;
    config.tls = tls;
    config.timeout = Duration::from_secs(timeout_secs);
    config.log_poll_interval = Duration::ZERO;
    config.log_limit = cfg.defaults.log_limit;
    Ok(config)
}

/// Username from `--username`, then the profile; the password through
/// the shared lookup chain, then an interactive prompt.
fn resolve_credentials(
    global: &GlobalOpts,
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<Credentials>, CliError> {
    let username = global
        .username
        .clone()
        .filter(|u| !u.trim().is_empty())
        .or_else(|| aula_config::resolve_username(profile));
    let Some(username) = username else {
        return Ok(None);
    };

    if let Some(password) = aula_config::resolve_password(profile, profile_name, &username) {
        return Ok(Some(Credentials { username, password }));
    }

    if !std::io::stdin().is_terminal() {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
        });
    }
    let password = rpassword::prompt_password(format!("Password for {username}: "))
        .map_err(|e| CliError::Prompt(e.to_string()))?;
    if password.is_empty() {
        return Err(CliError::NoCredentials {
            profile: profile_name.into(),
        });
    }
    Ok(Some(Credentials {
        username,
        password: SecretString::from(password),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["aula"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn server_flag_works_without_profile() {
        let g = global(&["--server", "http://aula.local:5000", "--timeout", "5"]);
        let cfg = Config::default();
        let console = console_config(&g, &cfg).unwrap();
        assert_eq!(console.url.as_str(), "http://aula.local:5000/");
        assert_eq!(console.timeout, Duration::from_secs(5));
        assert!(console.credentials.is_none());
        assert!(console.log_poll_interval.is_zero());
    }

    #[test]
    fn missing_profile_and_server_needs_config() {
        let g = global(&[]);
        let err = console_config(&g, &Config::default()).unwrap_err();
        assert!(matches!(err, CliError::NoConfig { .. }));
    }

    #[test]
    fn insecure_flag_overrides_profile() {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                server: "https://aula.local".into(),
                ca_cert: Some("/etc/aula/ca.pem".into()),
                ..Profile::default()
            },
        );
        let console = console_config(&global(&[]), &cfg).unwrap();
        assert_eq!(
            console.tls,
            TlsVerification::CustomCa("/etc/aula/ca.pem".into())
        );
        let console = console_config(&global(&["-k"]), &cfg).unwrap();
        assert_eq!(console.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn output_default_comes_from_config() {
        let mut cfg = Config::default();
        cfg.defaults.output = "yaml".into();
        let mut g = global(&[]);
        apply_defaults(&mut g, &cfg);
        assert_eq!(g.format(), OutputFormat::Yaml);

        let mut g = global(&["-o", "json"]);
        apply_defaults(&mut g, &cfg);
        assert_eq!(g.format(), OutputFormat::Json);
    }
}
