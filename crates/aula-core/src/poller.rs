// ── State poller ──
//
// One-shot fetch of the system state. There is no periodic re-poll:
// the state changes only through mode commands, whose replies carry
// the new state themselves.

use tracing::warn;

use crate::console::Console;
use crate::error::CoreError;
use crate::model::SystemState;
use crate::notice::Notice;

impl Console {
    /// Fetch the current state and replace the displayed one wholesale.
    ///
    /// On failure an error notice is published and the previous display
    /// (possibly still empty) is left untouched.
    pub async fn refresh_state(&self) -> Result<SystemState, CoreError> {
        let result = self.fetch_state().await;
        match result {
            Ok(state) => {
                self.inner.state.send_replace(Some(state.clone()));
                Ok(state)
            }
            Err(e) => {
                warn!(error = %e, "state fetch failed");
                self.notify(Notice::error(e.notice_text()));
                Err(e)
            }
        }
    }

    async fn fetch_state(&self) -> Result<SystemState, CoreError> {
        let client = self.client().await?;
        let raw = client.system_state().await?;
        Ok(SystemState::from(raw))
    }
}
