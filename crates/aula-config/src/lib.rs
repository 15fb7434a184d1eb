//! Shared configuration for the `aula` CLI and the `aula-tui` dashboard.
//!
//! TOML profiles layered with `AULA_*` environment variables, credential
//! resolution (env + keyring + plaintext), and translation to
//! `aula_core::ConsoleConfig`. The CLI adds flag-aware wrappers on top.

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

use aula_core::{ConsoleConfig, Credentials, TlsVerification};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "aula";

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "AULA_CONFIG";

pub const PASSWORD_ENV: &str = "AULA_PASSWORD";
pub const USERNAME_ENV: &str = "AULA_USERNAME";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<keyring::Error> for ConfigError {
    fn from(err: keyring::Error) -> Self {
        Self::Keyring(err.to_string())
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is given explicitly.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
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
    /// The profile name to use: explicit choice, then `default_profile`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(String::from)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    /// `table`, `json`, `json-compact`, `yaml` or `plain`.
    #[serde(default = "default_output")]
    pub output: String,

    /// `auto`, `always` or `never`.
    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Dashboard log refresh period. `0` disables it.
    #[serde(default = "default_log_poll")]
    pub log_poll_secs: u64,

    #[serde(default = "default_log_limit")]
    pub log_limit: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout_secs: default_timeout(),
            log_poll_secs: default_log_poll(),
            log_limit: default_log_limit(),
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
fn default_log_poll() -> u64 {
    10
}
fn default_log_limit() -> u32 {
    aula_core::config::DEFAULT_LOG_LIMIT
}

/// A named server profile.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Server base URL (e.g., "http://aula.local:5000").
    pub server: String,

    /// Login name. Without one, requests go out without a session.
    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Skip TLS verification (self-signed lab servers).
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override the default request timeout.
    pub timeout_secs: Option<u64>,
}

impl Profile {
    pub fn server_url(&self) -> Result<url::Url, ConfigError> {
        self.server.parse().map_err(|_| ConfigError::Validation {
            field: "server".into(),
            reason: format!("invalid URL: {}", self.server),
        })
    }

    pub fn tls(&self) -> TlsVerification {
        if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `AULA_CONFIG`, else platform conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("", "", "aula").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("aula");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Layer defaults, the TOML file at `path` (if present) and `AULA_*`
/// variables. Nested keys use a double underscore:
/// `AULA_DEFAULTS__OUTPUT=json`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("AULA_").split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "config loaded");
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Keyring account for a profile's user: `<profile>/<username>`.
pub fn keyring_account(profile_name: &str, username: &str) -> String {
    format!("{profile_name}/{username}")
}

/// Login name: the profile's, else `AULA_USERNAME`.
pub fn resolve_username(profile: &Profile) -> Option<String> {
    profile
        .username
        .clone()
        .or_else(|| std::env::var(USERNAME_ENV).ok())
        .filter(|u| !u.trim().is_empty())
}

/// Look up a password without prompting.
///
/// Order: `AULA_PASSWORD`, the profile's `password_env` variable, the OS
/// keyring, then the plaintext profile value. `None` when all are empty.
pub fn resolve_password(
    profile: &Profile,
    profile_name: &str,
    username: &str,
) -> Option<SecretString> {
    // 1. Global env var
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        return Some(SecretString::from(pw));
    }

    // 2. Profile's password_env -> env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(pw) = std::env::var(env_name) {
            return Some(SecretString::from(pw));
        }
    }

    // 3. Keyring
    if let Ok(entry) =
        keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name, username))
    {
        if let Ok(pw) = entry.get_password() {
            return Some(SecretString::from(pw));
        }
    }

    // 4. Plaintext in config
    profile.password.clone().map(SecretString::from)
}

/// Store a password in the OS keyring.
pub fn store_password(profile_name: &str, username: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_account(profile_name, username))?;
    entry.set_password(password)?;
    Ok(())
}

/// Resolve full login credentials. `Ok(None)` when the profile has no
/// username (session-less access).
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Option<Credentials>, ConfigError> {
    let Some(username) = resolve_username(profile) else {
        return Ok(None);
    };
    let password = resolve_password(profile, profile_name, &username).ok_or_else(|| {
        ConfigError::NoCredentials {
            profile: profile_name.into(),
        }
    })?;
    Ok(Some(Credentials { username, password }))
}

// ── Translation to core config ──────────────────────────────────────

/// Build a `ConsoleConfig` from a profile, no CLI flag overrides.
///
/// Suitable for the TUI: the log refresh runs at the configured period.
pub fn profile_to_console_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ConsoleConfig, ConfigError> {
    let mut config = ConsoleConfig::new(profile.server_url()?);
    config.credentials = resolve_credentials(profile, profile_name)?;
    config.tls = profile.tls();
    config.timeout = Duration::from_secs(profile.timeout_secs.unwrap_or(defaults.timeout_secs));
    config.log_poll_interval = Duration::from_secs(defaults.log_poll_secs);
    config.log_limit = defaults.log_limit;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tls_prefers_insecure_over_ca() {
        let profile = Profile {
            insecure: true,
            ca_cert: Some("/etc/aula/ca.pem".into()),
            ..Profile::default()
        };
        assert_eq!(profile.tls(), TlsVerification::DangerAcceptInvalid);

        let profile = Profile {
            ca_cert: Some("/etc/aula/ca.pem".into()),
            ..Profile::default()
        };
        assert!(matches!(profile.tls(), TlsVerification::CustomCa(_)));
    }

    #[test]
    fn active_profile_falls_back_to_default() {
        let config = Config::default();
        assert_eq!(config.active_profile_name(None), "default");
        assert_eq!(config.active_profile_name(Some("sala-b")), "sala-b");
        assert!(matches!(
            config.profile("sala-b"),
            Err(ConfigError::ProfileNotFound { .. })
        ));
    }

    #[test]
    fn keyring_account_format() {
        assert_eq!(keyring_account("default", "admin"), "default/admin");
    }
}
