//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and a stable process exit code.

use miette::Diagnostic;
use thiserror::Error;

use aula_config::ConfigError;
use aula_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const NETWORK: i32 = 5;
    pub const RATE_LIMITED: i32 = 6;
    pub const CANCELLED: i32 = 7;
    pub const CONFIG: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the server at {url}")]
    #[diagnostic(
        code(aula::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             {reason}\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in the profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(aula::auth_failed),
        help(
            "Verify the username and password.\n\
             Run: aula config set-password --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    #[error("Access denied: {message}")]
    #[diagnostic(
        code(aula::forbidden),
        help("This command needs an account with the admin role.")
    )]
    Forbidden { message: String },

    #[error("No password available for profile '{profile}'")]
    #[diagnostic(
        code(aula::no_credentials),
        help(
            "Store one with: aula config set-password\n\
             Or set the AULA_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Server replies ───────────────────────────────────────────────
    #[error("Too many requests")]
    #[diagnostic(
        code(aula::rate_limited),
        help("The server throttles mode changes. Retry after {retry_after}.")
    )]
    RateLimited { retry_after: String },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(aula::not_found),
        help("Run: aula {list_command} to see what exists")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Server error ({code}): {message}")]
    #[diagnostic(code(aula::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(aula::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(aula::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: aula config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No server configured")]
    #[diagnostic(
        code(aula::no_config),
        help(
            "Create a profile with: aula config init\n\
             Or pass --server / set AULA_SERVER.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(aula::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' cancelled; nothing was sent")]
    #[diagnostic(code(aula::cancelled))]
    Cancelled { action: String },

    #[error("Prompt failed: {0}")]
    #[diagnostic(
        code(aula::prompt),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    Prompt(String),

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::NETWORK,
            Self::AuthFailed { .. } | Self::Forbidden { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::RateLimited { .. } => exit_code::RATE_LIMITED,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            Self::Cancelled { .. } => exit_code::CANCELLED,
            Self::ProfileNotFound { .. } | Self::NoConfig { .. } | Self::Config { .. } => {
                exit_code::CONFIG
            }
            Self::ApiError { .. } | Self::Prompt(_) | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url: if url.is_empty() { "(server)".into() } else { url },
                reason,
            },

            CoreError::Disconnected => CliError::ConnectionFailed {
                url: "(disconnected)".into(),
                reason: "The server session is not open".into(),
            },

            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },

            CoreError::AccessDenied { message } => CliError::Forbidden { message },

            CoreError::RateLimited { retry_after } => CliError::RateLimited {
                retry_after: retry_after.unwrap_or_else(|| "a moment".into()),
            },

            CoreError::NotFound { entity, identifier } => CliError::NotFound {
                list_command: list_command_for(&entity).into(),
                resource_type: entity,
                identifier,
            },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::Api { status, message } => CliError::ApiError {
                code: format!("HTTP {status}"),
                message,
            },

            CoreError::Rejected { message } => CliError::ApiError {
                code: "rejected".into(),
                message,
            },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::ApiError {
                code: "internal".into(),
                message,
            },
        }
    }
}

fn list_command_for(entity: &str) -> &'static str {
    match entity.to_ascii_lowercase().as_str() {
        "user" => "users list",
        "setting" | "configuration entry" => "settings list",
        _ => "--help",
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::ProfileNotFound { name } => {
                let available = aula_config::load_config_or_default()
                    .profiles
                    .into_keys()
                    .collect::<Vec<_>>();
                CliError::ProfileNotFound {
                    name,
                    available: if available.is_empty() {
                        "(none)".into()
                    } else {
                        available.join(", ")
                    },
                }
            }
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_get_distinct_exit_codes() {
        let cases = [
            (
                CoreError::ConnectionFailed {
                    url: "http://aula.local".into(),
                    reason: "refused".into(),
                },
                exit_code::NETWORK,
            ),
            (
                CoreError::AuthenticationFailed {
                    message: "Credenciales inválidas".into(),
                },
                exit_code::AUTH,
            ),
            (
                CoreError::RateLimited { retry_after: None },
                exit_code::RATE_LIMITED,
            ),
            (
                CoreError::NotFound {
                    entity: "Setting".into(),
                    identifier: "max_volumen".into(),
                },
                exit_code::NOT_FOUND,
            ),
            (
                CoreError::ValidationFailed {
                    message: "bad".into(),
                },
                exit_code::USAGE,
            ),
            (
                CoreError::Api {
                    status: 500,
                    message: "boom".into(),
                },
                exit_code::GENERAL,
            ),
        ];
        for (core, code) in cases {
            assert_eq!(CliError::from(core).exit_code(), code);
        }
    }

    #[test]
    fn missing_password_is_an_auth_failure() {
        let err = CliError::from(ConfigError::NoCredentials {
            profile: "sala".into(),
        });
        assert_eq!(err.exit_code(), exit_code::AUTH);
    }
}
