// Session authentication
//
// `POST /login` sets the session cookie in the client's jar; subsequent
// requests replay it automatically. `GET /logout` clears it server-side.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::client::{AulaClient, status_error};
use crate::error::Error;
use crate::models::{LoginReply, ReplyStatus};

impl AulaClient {
    /// Authenticate with username/password.
    ///
    /// The server answers 400 for missing fields and 401 for bad
    /// credentials, both with an `{error}` body; either becomes
    /// [`Error::Authentication`]. HTTP 429 stays [`Error::RateLimited`].
    pub async fn login(
        &self,
        username: &str,
        password: &SecretString,
    ) -> Result<LoginReply, Error> {
        let url = self.url("login")?;

        debug!("logging in at {}", url);

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let reply = Self::read_reply(resp).await?;
        match reply.status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                let message = match status_error(reply.status, &reply.body, None) {
                    Error::Api { message, .. } | Error::Authentication { message } => message,
                    other => other.to_string(),
                };
                return Err(Error::Authentication {
                    message: format!("login failed: {message}"),
                });
            }
            _ => reply.check()?,
        }

        let login: LoginReply = reply.decode()?;
        if login.status != Some(ReplyStatus::Success) {
            return Err(Error::Authentication {
                message: login
                    .msg
                    .unwrap_or_else(|| "login was not accepted".into()),
            });
        }

        debug!("login successful");
        Ok(login)
    }

    /// End the current session.
    ///
    /// The server redirects to the login page afterwards; any non-error
    /// reply counts as success.
    pub async fn logout(&self) -> Result<(), Error> {
        let url = self.url("logout")?;

        debug!("logging out at {}", url);

        let resp = self
            .http()
            .get(url)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if status.is_client_error() || status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &body, None));
        }

        debug!("logout complete");
        Ok(())
    }
}
