// ── Runtime connection configuration ──
//
// These types describe *how* to reach an auditorium server.
// They carry credential data and polling tuning, but never touch disk.
// The CLI/TUI constructs a `ConsoleConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

/// Log window size used when nothing else is configured.
pub const DEFAULT_LOG_LIMIT: u32 = 20;

/// Largest log window the server will return.
pub const MAX_LOG_LIMIT: u32 = 100;

/// Session login credentials.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed lab servers).
    DangerAcceptInvalid,
}

/// Configuration for one console session against one server.
///
/// Built by CLI/TUI, passed to `Console` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Server base URL (e.g., `http://aula.local:5000`).
    pub url: Url,
    /// Login credentials. `None` skips login (pre-authenticated proxies).
    pub credentials: Option<Credentials>,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Period of the background log refresh. `Duration::ZERO` disables it.
    pub log_poll_interval: Duration,
    /// Number of recent log entries to keep on display.
    pub log_limit: u32,
}

impl ConsoleConfig {
    /// A config with dashboard defaults: 10 s log refresh, 20-entry window.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            log_poll_interval: Duration::from_secs(10),
            log_limit: DEFAULT_LOG_LIMIT,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: SecretString) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password,
        });
        self
    }

    /// The log window size, clamped to what the server accepts.
    pub fn effective_log_limit(&self) -> u32 {
        self.log_limit.clamp(1, MAX_LOG_LIMIT)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn log_limit_is_clamped() {
        let mut config = ConsoleConfig::new(Url::parse("http://aula.local").unwrap());
        assert_eq!(config.effective_log_limit(), 20);
        config.log_limit = 500;
        assert_eq!(config.effective_log_limit(), 100);
        config.log_limit = 0;
        assert_eq!(config.effective_log_limit(), 1);
    }
}
