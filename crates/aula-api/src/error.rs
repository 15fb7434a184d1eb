use thiserror::Error;

/// Top-level error type for the `aula-api` crate.
///
/// Mirrors the failure modes of the auditorium server: session auth,
/// role checks, rate limiting, application-level `status: "error"` replies
/// and plain transport failures. `aula-core` maps these into user-facing
/// notices.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login rejected, or the session cookie is missing/expired (HTTP 401).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Authenticated, but the role may not use this endpoint (HTTP 403).
    #[error("Access denied: {message}")]
    Forbidden { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or HTTP client construction failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Rate limiting ───────────────────────────────────────────────
    /// HTTP 429. `retry_after` is whatever hint the server sent back.
    #[error("Too many requests{}", retry_hint(.retry_after.as_deref()))]
    RateLimited { retry_after: Option<String> },

    // ── Server replies ──────────────────────────────────────────────
    /// Non-2xx reply. `message` comes from the body's `msg`/`error` field
    /// when present.
    #[error("Server error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// 2xx reply whose body carried `"status": "error"`.
    #[error("Request rejected: {message}")]
    Rejected { message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

fn retry_hint(retry_after: Option<&str>) -> String {
    retry_after.map_or_else(String::new, |hint| format!(" -- retry after {hint}"))
}

impl Error {
    /// Returns `true` for HTTP 429 replies.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Returns `true` if the session has expired and logging in again
    /// might resolve it.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` when the request never got a reply from the server.
    pub fn is_network(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// The HTTP status carried by the error, if the server replied at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Authentication { .. } => Some(401),
            Self::Forbidden { .. } => Some(403),
            Self::RateLimited { .. } => Some(429),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_display_includes_hint() {
        let err = Error::RateLimited {
            retry_after: Some("30 per 1 minute".into()),
        };
        assert_eq!(err.to_string(), "Too many requests -- retry after 30 per 1 minute");

        let bare = Error::RateLimited { retry_after: None };
        assert_eq!(bare.to_string(), "Too many requests");
    }

    #[test]
    fn status_classification() {
        let server = Error::Api {
            status: 500,
            message: "boom".into(),
        };
        assert!(server.is_transient());
        assert_eq!(server.http_status(), Some(500));

        let missing = Error::Api {
            status: 404,
            message: "Recurso no encontrado".into(),
        };
        assert!(missing.is_not_found());
        assert!(!missing.is_transient());

        let denied = Error::Forbidden {
            message: "Acceso denegado".into(),
        };
        assert_eq!(denied.http_status(), Some(403));
        assert!(!denied.is_auth_expired());
    }
}
