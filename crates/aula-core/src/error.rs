// ── Core error types ──
//
// User-facing errors from aula-core. Consumers never see raw HTTP
// plumbing; the `From<aula_api::Error>` impl sorts transport failures,
// HTTP statuses, rate limiting and in-band rejections into the variants
// the views pick their notice text from.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach server at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Access denied: {message}")]
    AccessDenied { message: String },

    #[error("Not connected to the server")]
    Disconnected,

    // ── Server replies ───────────────────────────────────────────────
    #[error("Too many requests{}", retry_hint(.retry_after.as_deref()))]
    RateLimited { retry_after: Option<String> },

    #[error("Server error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Request rejected: {message}")]
    Rejected { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{entity} not found: {identifier}")]
    NotFound { entity: String, identifier: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

fn retry_hint(retry_after: Option<&str>) -> String {
    retry_after.map_or_else(String::new, |hint| format!(" -- retry after {hint}"))
}

impl CoreError {
    /// Text for the transient notice shown to the user.
    ///
    /// Network failures always get the same generic connection message;
    /// server replies carry the server's own message when it sent one.
    pub fn notice_text(&self) -> String {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => {
                "Connection error: could not reach the server".into()
            }
            Self::RateLimited { .. } => {
                "Too many requests. Wait a moment before trying again.".into()
            }
            Self::Api { message, .. }
            | Self::Rejected { message }
            | Self::AuthenticationFailed { message }
            | Self::AccessDenied { message }
            | Self::ValidationFailed { message } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<aula_api::Error> for CoreError {
    fn from(err: aula_api::Error) -> Self {
        match err {
            aula_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            aula_api::Error::Forbidden { message } => CoreError::AccessDenied { message },
            aula_api::Error::Transport(ref e) => match e.status() {
                Some(status) => CoreError::Api {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => CoreError::ConnectionFailed {
                    url: e
                        .url()
                        .map_or_else(|| "<unknown>".into(), ToString::to_string),
                    reason: e.to_string(),
                },
            },
            aula_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            aula_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            aula_api::Error::RateLimited { retry_after } => CoreError::RateLimited { retry_after },
            aula_api::Error::Api { status, message } => {
                if status == 404 {
                    CoreError::NotFound {
                        entity: "Resource".into(),
                        identifier: message,
                    }
                } else {
                    CoreError::Api { status, message }
                }
            }
            aula_api::Error::Rejected { message } => CoreError::Rejected { message },
            aula_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_keep_server_message() {
        let err = CoreError::from(aula_api::Error::Api {
            status: 400,
            message: "Modo inválido".into(),
        });
        assert_eq!(err.notice_text(), "Modo inválido");
    }

    #[test]
    fn rate_limit_has_distinct_notice() {
        let err = CoreError::from(aula_api::Error::RateLimited { retry_after: None });
        assert!(err.is_rate_limited());
        assert_eq!(
            err.notice_text(),
            "Too many requests. Wait a moment before trying again."
        );
    }

    #[test]
    fn forbidden_maps_to_access_denied() {
        let err = CoreError::from(aula_api::Error::Forbidden {
            message: "Acceso denegado".into(),
        });
        assert!(matches!(err, CoreError::AccessDenied { .. }));
    }
}
