// Auditorium server HTTP client
//
// Wraps `reqwest::Client` with URL construction and reply decoding.
// Endpoint groups (session, control, admin panels) are implemented as
// inherent methods in separate files to keep this module focused on
// transport mechanics.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::cookie::{CookieStore, Jar};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{ErrorBody, ReplyStatus};
use crate::transport::TransportConfig;

/// Longest body excerpt carried in error messages.
const PREVIEW_LEN: usize = 200;

/// Raw HTTP client for the auditorium server.
///
/// Authentication is a session cookie set by [`login`](Self::login); the
/// cookie jar replays it on every later request. All methods return the
/// decoded payload of the reply; application-level `status: "error"`
/// bodies and non-2xx statuses are surfaced as [`Error`].
pub struct AulaClient {
    http: reqwest::Client,
    base_url: Url,
    /// Cookie jar reference for inspecting the session cookie.
    cookie_jar: Option<Arc<Jar>>,
}

impl AulaClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// If the config doesn't already include a cookie jar, one is created
    /// automatically (the server's session auth requires cookies).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let cookie_jar = config.cookie_jar.clone();
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            cookie_jar,
        })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    ///
    /// Use this when the client already holds a session cookie, or in
    /// tests against a mock server.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            cookie_jar: None,
        }
    }

    /// The underlying HTTP client (for auth flows that need direct access).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Whether the jar currently holds a cookie for the server.
    pub fn has_session(&self) -> bool {
        self.cookie_jar
            .as_ref()
            .and_then(|jar| jar.cookies(&self.base_url))
            .is_some()
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a server path, keeping any path prefix the
    /// base URL carries (e.g. a reverse-proxy mount point).
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON reply.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;

        Self::parse_reply(resp).await
    }

    /// Send a POST request with JSON body and decode the JSON reply.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_reply(resp).await
    }

    /// Send a PUT request with JSON body and decode the JSON reply.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("PUT {}", url);

        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_reply(resp).await
    }

    /// Send a DELETE request and decode the JSON reply.
    pub(crate) async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("DELETE {}", url);

        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::parse_reply(resp).await
    }

    /// Send a GET request and return the raw body bytes (file downloads).
    pub(crate) async fn get_bytes(&self, url: Url) -> Result<bytes::Bytes, Error> {
        debug!("GET {} (download)", url);

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();
        if !status.is_success() {
            let retry_header = retry_after_header(&resp);
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &body, retry_header));
        }
        resp.bytes().await.map_err(Error::Transport)
    }

    // ── Reply decoding ───────────────────────────────────────────────

    /// Read a reply into `(status, body)` without judging either.
    pub(crate) async fn read_reply(resp: reqwest::Response) -> Result<RawReply, Error> {
        let status = resp.status();
        let retry_after = retry_after_header(&resp);
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(%status, len = body.len(), "reply received");
        Ok(RawReply {
            status,
            body,
            retry_after,
        })
    }

    /// Check the HTTP status and `status` field, then decode the payload.
    async fn parse_reply<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let reply = Self::read_reply(resp).await?;
        reply.check()?;
        reply.decode()
    }
}

/// A reply read off the wire, before any interpretation.
pub(crate) struct RawReply {
    pub status: StatusCode,
    pub body: String,
    pub retry_after: Option<String>,
}

impl RawReply {
    /// Map failure statuses and in-band `status: "error"` bodies to errors.
    pub(crate) fn check(&self) -> Result<(), Error> {
        if !self.status.is_success() {
            return Err(status_error(
                self.status,
                &self.body,
                self.retry_after.clone(),
            ));
        }

        if let Ok(body) = serde_json::from_str::<ErrorBody>(&self.body) {
            if body.status == Some(ReplyStatus::Error) {
                return Err(Error::Rejected {
                    message: body
                        .message()
                        .unwrap_or_else(|| "the server rejected the request".into()),
                });
            }
        }
        Ok(())
    }

    /// Decode the body as `T`, keeping a preview on failure.
    pub(crate) fn decode<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_str(&self.body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&self.body)),
            body: self.body.clone(),
        })
    }
}

/// Translate a non-2xx status plus its body into the matching error.
pub(crate) fn status_error(status: StatusCode, body: &str, retry_header: Option<String>) -> Error {
    let parsed = serde_json::from_str::<ErrorBody>(body).unwrap_or_default();

    match status {
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimited {
            retry_after: parsed.retry_after.clone().or(retry_header),
        },
        StatusCode::UNAUTHORIZED => Error::Authentication {
            message: parsed
                .message()
                .unwrap_or_else(|| "session expired or not logged in".into()),
        },
        StatusCode::FORBIDDEN => Error::Forbidden {
            message: parsed
                .message()
                .unwrap_or_else(|| "insufficient permissions (HTTP 403)".into()),
        },
        _ => Error::Api {
            status: status.as_u16(),
            message: parsed
                .message()
                .unwrap_or_else(|| generic_message(status, body)),
        },
    }
}

fn generic_message(status: StatusCode, body: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("unexpected status");
    if body.trim_start().starts_with('<') || body.trim().is_empty() {
        reason.to_owned()
    } else {
        format!("{reason}: {}", preview(body))
    }
}

fn retry_after_header(resp: &reqwest::Response) -> Option<String> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(PREVIEW_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> AulaClient {
        AulaClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn url_keeps_base_prefix() {
        let c = client("https://av.example.org/aula/");
        assert_eq!(
            c.url("/api/estado").unwrap().as_str(),
            "https://av.example.org/aula/api/estado"
        );
        let c = client("http://127.0.0.1:5000");
        assert_eq!(
            c.url("api/historial").unwrap().as_str(),
            "http://127.0.0.1:5000/api/historial"
        );
    }

    #[test]
    fn status_error_prefers_payload_message() {
        let err = status_error(
            StatusCode::BAD_REQUEST,
            r#"{"status":"error","msg":"Modo inválido"}"#,
            None,
        );
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Modo inválido");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn status_error_falls_back_to_reason() {
        let err = status_error(StatusCode::BAD_GATEWAY, "<html>oops</html>", None);
        assert_eq!(err.to_string(), "Server error (HTTP 502): Bad Gateway");
    }

    #[test]
    fn rate_limit_uses_body_then_header() {
        let err = status_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":"Demasiadas solicitudes","retry_after":"30 per 1 minute"}"#,
            Some("60".into()),
        );
        assert!(
            matches!(err, Error::RateLimited { retry_after: Some(ref r) } if r == "30 per 1 minute")
        );

        let err = status_error(StatusCode::TOO_MANY_REQUESTS, "", Some("60".into()));
        assert!(matches!(err, Error::RateLimited { retry_after: Some(ref r) } if r == "60"));
    }

    #[test]
    fn in_band_error_is_rejected() {
        let reply = RawReply {
            status: StatusCode::OK,
            body: r#"{"status":"error","msg":"Error al obtener estado"}"#.into(),
            retry_after: None,
        };
        let err = reply.check().unwrap_err();
        assert!(matches!(err, Error::Rejected { ref message } if message == "Error al obtener estado"));
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let body = "ñ".repeat(300);
        assert_eq!(preview(&body).chars().count(), PREVIEW_LEN);
    }
}
