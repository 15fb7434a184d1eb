// Dashboard endpoints
//
// Current system state, mode changes and the recent audit trail.

use reqwest::StatusCode;
use tracing::debug;

use crate::client::AulaClient;
use crate::error::Error;
use crate::models::{
    LogsReply, ModeChangeReply, ModeChangeRequest, RawState, ReplyStatus, StateReply,
};

impl AulaClient {
    /// Fetch the current system state.
    ///
    /// `GET /api/estado`
    pub async fn system_state(&self) -> Result<RawState, Error> {
        let url = self.url("api/estado")?;
        let reply: StateReply = self.get(url).await?;
        Ok(reply.estado)
    }

    /// Request a mode change.
    ///
    /// `POST /api/cambiar_modo` with `{modo, confirmado?}`.
    ///
    /// Outcomes the server reports in-band come back as `Ok`:
    /// `success` (new state attached), `info` (already in that mode) and
    /// `confirmation_required` (HTTP 403 when `OFF` lacks `confirmado`).
    /// HTTP 429 is [`Error::RateLimited`]; everything else is an error
    /// carrying the server's message.
    pub async fn change_mode(
        &self,
        mode: &str,
        confirmed: bool,
    ) -> Result<ModeChangeReply, Error> {
        let url = self.url("api/cambiar_modo")?;
        let body = ModeChangeRequest {
            modo: mode.to_owned(),
            confirmado: confirmed.then_some(true),
        };

        debug!(mode, confirmed, "POST {}", url);

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(Error::Transport)?;

        let reply = Self::read_reply(resp).await?;

        if reply.status == StatusCode::FORBIDDEN {
            if let Ok(parsed) = reply.decode::<ModeChangeReply>() {
                if parsed.status == ReplyStatus::ConfirmationRequired {
                    return Ok(parsed);
                }
            }
        }

        reply.check()?;
        reply.decode()
    }

    /// Fetch the most recent audit log entries, newest first.
    ///
    /// `GET /api/historial?limite=N`. The server caps `N` at 100.
    pub async fn recent_logs(&self, limit: u32) -> Result<LogsReply, Error> {
        let mut url = self.url("api/historial")?;
        url.query_pairs_mut()
            .append_pair("limite", &limit.to_string());
        self.get(url).await
    }
}
